use serde::{Serialize, Serializer};
use std::fmt;

/// One segment of a [`LocationPath`]: an element name and, for repeated
/// elements, the occurrence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationFrame {
    pub name: String,
    pub index: Option<usize>,
}

/// Dotted/bracketed path to an element occurrence, e.g. `Patient.telecom[0].system`.
///
/// Paths are immutable; `field` and `indexed` return extended copies so a
/// caller can hand a child path down into a nested transform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LocationPath {
    frames: Vec<LocationFrame>,
}

impl LocationPath {
    /// Path rooted at a resource or datatype name.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            frames: vec![LocationFrame {
                name: root.into(),
                index: None,
            }],
        }
    }

    pub fn field(&self, name: impl Into<String>) -> Self {
        let mut frames = self.frames.clone();
        frames.push(LocationFrame {
            name: name.into(),
            index: None,
        });
        Self { frames }
    }

    /// Marks the last frame as occurrence `index` of a repeated element.
    pub fn indexed(&self, index: usize) -> Self {
        let mut frames = self.frames.clone();
        if let Some(last) = frames.last_mut() {
            last.index = Some(index);
        }
        Self { frames }
    }

    /// Shorthand for `field(name).indexed(index)`.
    pub fn element(&self, name: impl Into<String>, index: usize) -> Self {
        self.field(name).indexed(index)
    }

    pub fn frames(&self) -> &[LocationFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl fmt::Display for LocationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&frame.name)?;
            if let Some(index) = frame.index {
                write!(f, "[{}]", index)?;
            }
        }
        Ok(())
    }
}

impl Serialize for LocationPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_nested_path() {
        let path = LocationPath::new("Patient").element("telecom", 0).field("system");
        assert_eq!(path.to_string(), "Patient.telecom[0].system");
    }

    #[test]
    fn test_paths_are_not_shared() {
        let root = LocationPath::new("Observation");
        let child = root.field("code");
        assert_eq!(root.to_string(), "Observation");
        assert_eq!(child.to_string(), "Observation.code");
    }

    #[test]
    fn test_serializes_as_string() {
        let path = LocationPath::new("Condition").element("category", 2);
        assert_eq!(
            serde_json::to_value(&path).unwrap(),
            serde_json::json!("Condition.category[2]")
        );
    }
}
