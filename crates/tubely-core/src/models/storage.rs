//! Storage location model: where a placed object lives.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Separator between container and key in the persisted composite form.
const COMPOSITE_SEPARATOR: char = ',';

/// The durable identity of a placed object: a (container, key) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageLocation {
    pub container: String,
    pub key: String,
}

/// Returned when a persisted location cannot be split into exactly a container and a key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid storage location '{0}': expected 'container,key'")]
pub struct InvalidLocation(pub String);

impl StorageLocation {
    pub fn new(container: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            key: key.into(),
        }
    }

    /// Composite form persisted on the video record in signed delivery mode.
    pub fn to_composite(&self) -> String {
        format!("{}{}{}", self.container, COMPOSITE_SEPARATOR, self.key)
    }

    /// Parse the composite form. Exactly two non-empty parts are required.
    pub fn parse_composite(value: &str) -> Result<Self, InvalidLocation> {
        let parts: Vec<&str> = value.split(COMPOSITE_SEPARATOR).collect();
        match parts.as_slice() {
            [container, key] if !container.trim().is_empty() && !key.trim().is_empty() => {
                Ok(Self::new(container.trim(), key.trim()))
            }
            _ => Err(InvalidLocation(value.to_string())),
        }
    }
}

impl Display for StorageLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}/{}", self.container, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_round_trip() {
        let location = StorageLocation::new("tubely-media", "landscape/abc123.mp4");
        let composite = location.to_composite();
        assert_eq!(composite, "tubely-media,landscape/abc123.mp4");
        assert_eq!(StorageLocation::parse_composite(&composite).unwrap(), location);
    }

    #[test]
    fn test_parse_composite_rejects_malformed_values() {
        assert!(StorageLocation::parse_composite("no-separator").is_err());
        assert!(StorageLocation::parse_composite("a,b,c").is_err());
        assert!(StorageLocation::parse_composite(",key.mp4").is_err());
        assert!(StorageLocation::parse_composite("bucket,").is_err());
        assert!(StorageLocation::parse_composite("").is_err());
    }

    #[test]
    fn test_parse_composite_rejects_urls() {
        // A direct-mode URL must never be mistaken for a composite.
        assert!(StorageLocation::parse_composite("https://cdn.example.com/portrait/x.mp4").is_err());
    }
}
