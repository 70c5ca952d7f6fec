//! Common utilities for file upload handlers

use tubely_core::AppError;
use uuid::Uuid;

/// Parse a path segment as a video id, or 400.
pub fn parse_video_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidInput("Invalid video ID".to_string()))
}

pub fn missing_field(name: &str) -> AppError {
    AppError::InvalidInput(format!("Missing form field '{}'", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_video_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_video_id(&id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_video_id("not-a-uuid"),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_missing_field_message() {
        assert_eq!(
            missing_field("video").to_string(),
            "Invalid input: Missing form field 'video'"
        );
    }
}
