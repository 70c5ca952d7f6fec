//! Storage key derivation.
//!
//! Keys look like `{prefix}/{random_id}{.ext}`. The prefix is the orientation for videos and
//! `thumbnails` for thumbnails; the random id is only there for uniqueness and cache busting.

use rand::RngCore;
use thiserror::Error;
use tubely_core::constants::RANDOM_KEY_BYTES;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("No file extension known for media type '{0}'")]
    UnknownMediaType(String),
}

/// Hex encoding of [`RANDOM_KEY_BYTES`] bytes from the thread-local CSPRNG.
pub fn random_id() -> String {
    let mut bytes = [0u8; RANDOM_KEY_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Resolve a MIME type to a dotted extension.
///
/// Preference: `mp4`, then the extension equal to the subtype, then the first candidate.
pub fn extension_for(media_type: &str) -> Result<String, KeyError> {
    let unknown = || KeyError::UnknownMediaType(media_type.to_string());

    let candidates = mime_guess::get_mime_extensions_str(media_type)
        .filter(|exts| !exts.is_empty())
        .ok_or_else(unknown)?;

    let subtype = media_type.split_once('/').map(|(_, sub)| sub);
    let ext = candidates
        .iter()
        .find(|ext| **ext == "mp4")
        .or_else(|| candidates.iter().find(|ext| Some(**ext) == subtype))
        .or_else(|| candidates.first())
        .ok_or_else(unknown)?;

    Ok(format!(".{}", ext))
}

/// Build `{prefix}/{random_id}{ext}` for a media type.
pub fn derive_key(random_id: &str, media_type: &str, prefix: &str) -> Result<String, KeyError> {
    let ext = extension_for(media_type)?;
    Ok(format!("{}/{}{}", prefix, random_id, ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_mp4_preferred() {
        assert_eq!(extension_for("video/mp4").unwrap(), ".mp4");
    }

    #[test]
    fn test_image_extensions() {
        assert_eq!(extension_for("image/png").unwrap(), ".png");
        assert_eq!(extension_for("image/jpeg").unwrap(), ".jpeg");
    }

    #[test]
    fn test_unknown_media_type() {
        assert_eq!(
            extension_for("application/x-tubely-unknown"),
            Err(KeyError::UnknownMediaType(
                "application/x-tubely-unknown".to_string()
            ))
        );
        assert!(derive_key("abc", "nonsense", "other").is_err());
    }

    #[test]
    fn test_derive_key_layout() {
        assert_eq!(
            derive_key("deadbeef", "video/mp4", "landscape").unwrap(),
            "landscape/deadbeef.mp4"
        );
        assert_eq!(
            derive_key("deadbeef", "image/png", "thumbnails").unwrap(),
            "thumbnails/deadbeef.png"
        );
    }

    #[test]
    fn test_random_id_entropy_and_uniqueness() {
        let id = random_id();
        assert_eq!(id.len(), RANDOM_KEY_BYTES * 2);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));

        let keys: HashSet<String> = (0..256)
            .map(|_| derive_key(&random_id(), "video/mp4", "portrait").unwrap())
            .collect();
        assert_eq!(keys.len(), 256);
    }
}
