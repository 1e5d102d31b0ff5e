//! Registry documents served by an HTTP object store.

use ronin_core::registry::DocumentSource;
use std::time::Duration;

/// Fetches `{base_url}/{filename}` with a blocking client.
///
/// Must be built and used off the async runtime (e.g. in `spawn_blocking`).
pub struct HttpDocumentSource {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpDocumentSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Object URL for `filename`. Each path segment is percent-encoded; the
    /// `/` separators are kept.
    pub fn url_for(&self, filename: &str) -> String {
        let path = filename
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}", self.base_url, path)
    }
}

impl DocumentSource for HttpDocumentSource {
    fn fetch(&self, filename: &str) -> Option<Vec<u8>> {
        let url = self.url_for(filename);
        let response = match self.client.get(&url).send() {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Registry document request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(url = %url, status = %response.status(), "Registry document not available");
            return None;
        }

        match response.bytes() {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Failed to read registry document body");
                None
            }
        }
    }
}
