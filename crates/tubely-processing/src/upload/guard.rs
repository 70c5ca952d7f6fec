use tubely_core::models::Video;
use uuid::Uuid;

use super::types::PipelineError;

/// The single ownership check every mutating upload path goes through.
pub fn authorize(video: &Video, user_id: Uuid) -> Result<(), PipelineError> {
    if !video.is_owned_by(user_id) {
        tracing::warn!(
            video_id = %video.id,
            owner_id = %video.user_id,
            user_id = %user_id,
            "Upload rejected: user does not own video"
        );
        return Err(PipelineError::NotOwner {
            video_id: video.id,
            user_id,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn video_owned_by(user_id: Uuid) -> Video {
        let now = Utc::now();
        Video {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            title: "Clip".to_string(),
            description: String::new(),
            user_id,
            thumbnail_url: None,
            video_url: None,
        }
    }

    #[test]
    fn test_owner_allowed() {
        let owner = Uuid::new_v4();
        assert!(authorize(&video_owned_by(owner), owner).is_ok());
    }

    #[test]
    fn test_stranger_rejected() {
        let video = video_owned_by(Uuid::new_v4());
        let stranger = Uuid::new_v4();
        match authorize(&video, stranger) {
            Err(PipelineError::NotOwner { video_id, user_id }) => {
                assert_eq!(video_id, video.id);
                assert_eq!(user_id, stranger);
            }
            other => panic!("expected NotOwner, got {:?}", other),
        }
    }
}
