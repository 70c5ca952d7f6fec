use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// Defined in core because both configuration and the storage factory use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Local => write!(f, "local"),
        }
    }
}

/// How playback URLs are issued for stored objects.
///
/// Selected per deployment, never per object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Permanent public URL, formatted from container and key.
    Direct,
    /// Fresh time-limited URL minted by the object store on every read.
    Signed,
}

impl FromStr for DeliveryMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" | "public" => Ok(DeliveryMode::Direct),
            "signed" | "presigned" => Ok(DeliveryMode::Signed),
            _ => Err(anyhow::anyhow!("Invalid delivery mode: {}", s)),
        }
    }
}

impl Display for DeliveryMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DeliveryMode::Direct => write!(f, "direct"),
            DeliveryMode::Signed => write!(f, "signed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_round_trips_through_display() {
        for backend in [StorageBackend::S3, StorageBackend::Local] {
            assert_eq!(backend.to_string().parse::<StorageBackend>().unwrap(), backend);
        }
        assert!("nfs".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_delivery_mode_accepts_aliases() {
        assert_eq!("SIGNED".parse::<DeliveryMode>().unwrap(), DeliveryMode::Signed);
        assert_eq!("presigned".parse::<DeliveryMode>().unwrap(), DeliveryMode::Signed);
        assert_eq!("public".parse::<DeliveryMode>().unwrap(), DeliveryMode::Direct);
        assert!("cdn".parse::<DeliveryMode>().is_err());
    }
}
