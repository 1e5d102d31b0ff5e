//! ronin-server entry point

use ronin_core::registry::{DirectorySource, DocumentSource, RegistryCache, RegistryClient};
use ronin_core::ResourceNormalizer;
use ronin_store::{IssueLog, RedbDocumentStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ronin_server::{
    build_router,
    config::{RegistrySourceKind, ServerConfig},
    http_source::HttpDocumentSource,
    AppState,
};

#[tokio::main]
async fn main() {
    // Load configuration
    let loaded = ServerConfig::load(
        std::path::Path::new("config.yaml")
            .exists()
            .then_some("config.yaml"),
    );
    let level = loaded
        .as_ref()
        .map(|c| c.log.level.clone())
        .unwrap_or_else(|_| "info".to_string());

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .init();

    tracing::info!("Starting ronin-server...");

    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Failed to load config, using defaults: {}", e);
        ServerConfig::default()
    });

    // Create data directory
    if let Err(e) = std::fs::create_dir_all(&config.storage.data_dir) {
        tracing::error!("Failed to create data directory: {}", e);
        std::process::exit(1);
    }

    // Registry sources may block (redb import, HTTP client setup)
    let source_config = config.clone();
    let source = tokio::task::spawn_blocking(move || open_registry_source(&source_config))
        .await
        .unwrap_or_else(|e| Err(e.to_string()))
        .unwrap_or_else(|e| {
            tracing::error!("Failed to open registry source: {}", e);
            std::process::exit(1);
        });

    let mut issue_log = IssueLog::open(config.issue_log_path()).unwrap_or_else(|e| {
        tracing::error!("Failed to open issue log: {}", e);
        std::process::exit(1);
    });
    if config.storage.issue_log_max_entries > 0 {
        issue_log = issue_log.with_max_entries(config.storage.issue_log_max_entries);
    }

    let cache = Arc::new(RegistryCache::new(
        source,
        config.code_system_aliases(),
        config.registry.cache.clone(),
    ));

    // Warm the universal entries so the first request does not pay for it
    let warm_cache = Arc::clone(&cache);
    match tokio::task::spawn_blocking(move || warm_cache.reload(None)).await {
        Ok(generation) => tracing::info!(entries = generation.entries.len(), "Registry loaded"),
        Err(e) => tracing::warn!("Initial registry load failed: {}", e),
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    let state = Arc::new(AppState {
        normalizer: ResourceNormalizer::new(RegistryClient::new(cache)),
        issue_log: Arc::new(Mutex::new(issue_log)),
        config: config.clone(),
    });

    tracing::info!(
        "Registry source: {:?}, reload TTL {} min",
        config.registry.source,
        config.registry.cache.ttl_minutes
    );

    // Build router
    let app = build_router(state);

    // Bind TCP listener
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Server error: {}", e);
        });

    tracing::info!("Server shut down gracefully");
}

fn open_registry_source(config: &ServerConfig) -> Result<Arc<dyn DocumentSource>, String> {
    match config.registry.source {
        RegistrySourceKind::Directory => {
            tracing::info!("Registry documents from {}", config.registry.dir.display());
            Ok(Arc::new(DirectorySource::new(&config.registry.dir)))
        }
        RegistrySourceKind::Redb => {
            let store = RedbDocumentStore::open(config.registry_db_path()).map_err(|e| e.to_string())?;
            // Seed from the registry directory when one is present
            if config.registry.dir.is_dir() {
                store
                    .import_dir(&config.registry.dir)
                    .map_err(|e| e.to_string())?;
            }
            Ok(Arc::new(store))
        }
        RegistrySourceKind::Http => {
            let base_url = config
                .registry
                .base_url
                .as_deref()
                .ok_or_else(|| "registry.base_url is required for the http source".to_string())?;
            tracing::info!("Registry documents from {}", base_url);
            let source = HttpDocumentSource::new(
                base_url,
                Duration::from_secs(config.registry.timeout_secs),
            )
            .map_err(|e| e.to_string())?;
            Ok(Arc::new(source))
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
