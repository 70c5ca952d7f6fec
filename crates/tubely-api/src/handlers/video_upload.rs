use crate::auth::AuthUser;
use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::upload::{missing_field, parse_video_id};
use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tubely_core::constants::VIDEO_FORM_FIELD;

/// `POST /api/video_upload/{videoID}`: stream the `video` field through the upload pipeline.
#[tracing::instrument(
    skip_all,
    fields(user_id = %user.user_id, video_id = %video_id, operation = "upload_video")
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let video_id = parse_video_id(&video_id)?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(VIDEO_FORM_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);

        let video = state
            .pipeline
            .upload_video(video_id, user.user_id, content_type.as_deref(), field)
            .await?;
        return Ok(Json(video));
    }

    Err(missing_field(VIDEO_FORM_FIELD).into())
}
