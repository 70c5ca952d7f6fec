use thiserror::Error;
use tubely_core::constants::{THUMBNAIL_CONTENT_TYPES, VIDEO_CONTENT_TYPE};

/// Common validation errors for uploads
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File too large: exceeds {max} bytes")]
    FileTooLarge { max: u64 },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Missing content type")]
    MissingContentType,

    #[error("Empty file")]
    EmptyFile,
}

/// Upload validator
///
/// Holds the size ceiling and content-type allow-list for one upload kind.
#[derive(Debug, Clone)]
pub struct MediaValidator {
    max_file_size: u64,
    allowed_content_types: Vec<String>,
}

impl MediaValidator {
    pub fn new(max_file_size: u64, allowed_content_types: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_content_types,
        }
    }

    pub fn video(max_file_size: u64) -> Self {
        Self::new(max_file_size, vec![VIDEO_CONTENT_TYPE.to_string()])
    }

    pub fn thumbnail(max_file_size: u64) -> Self {
        Self::new(
            max_file_size,
            THUMBNAIL_CONTENT_TYPES.iter().map(|s| s.to_string()).collect(),
        )
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Check the declared type against the allow-list and return its normalized form.
    pub fn validate_content_type(
        &self,
        content_type: Option<&str>,
    ) -> Result<String, ValidationError> {
        let declared = content_type.ok_or(ValidationError::MissingContentType)?;
        let normalized = normalize_content_type(declared);

        if normalized.is_empty() {
            return Err(ValidationError::MissingContentType);
        }

        if !self.allowed_content_types.iter().any(|ct| ct == &normalized) {
            return Err(ValidationError::InvalidContentType {
                content_type: declared.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(normalized)
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: u64) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                max: self.max_file_size,
            });
        }
        Ok(())
    }
}

/// Strip parameters and lower-case a media type: `Video/MP4; codecs="avc1"` -> `video/mp4`.
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_content_type() {
        assert_eq!(normalize_content_type("video/mp4"), "video/mp4");
        assert_eq!(
            normalize_content_type("Video/MP4; codecs=\"avc1.42E01E\""),
            "video/mp4"
        );
        assert_eq!(normalize_content_type("  image/png ;charset=x"), "image/png");
    }

    #[test]
    fn test_video_accepts_only_mp4() {
        let v = MediaValidator::video(1024);
        assert_eq!(
            v.validate_content_type(Some("video/mp4; codecs=avc1")).unwrap(),
            "video/mp4"
        );
        assert!(matches!(
            v.validate_content_type(Some("video/quicktime")),
            Err(ValidationError::InvalidContentType { .. })
        ));
        assert_eq!(
            v.validate_content_type(None),
            Err(ValidationError::MissingContentType)
        );
        assert_eq!(
            v.validate_content_type(Some(" ; x=y")),
            Err(ValidationError::MissingContentType)
        );
    }

    #[test]
    fn test_thumbnail_types() {
        let v = MediaValidator::thumbnail(1024);
        assert!(v.validate_content_type(Some("image/jpeg")).is_ok());
        assert!(v.validate_content_type(Some("image/png")).is_ok());
        assert!(v.validate_content_type(Some("image/gif")).is_err());
        assert!(v.validate_content_type(Some("video/mp4")).is_err());
    }

    #[test]
    fn test_file_size() {
        let v = MediaValidator::video(10);
        assert!(v.validate_file_size(10).is_ok());
        assert_eq!(v.validate_file_size(0), Err(ValidationError::EmptyFile));
        assert_eq!(
            v.validate_file_size(11),
            Err(ValidationError::FileTooLarge { max: 10 })
        );
    }
}
