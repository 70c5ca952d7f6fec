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
use tubely_core::constants::THUMBNAIL_FORM_FIELD;

/// `POST /api/thumbnail_upload/{videoID}`
#[tracing::instrument(
    skip_all,
    fields(user_id = %user.user_id, video_id = %video_id, operation = "upload_thumbnail")
)]
pub async fn upload_thumbnail(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let video_id = parse_video_id(&video_id)?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(THUMBNAIL_FORM_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);

        let video = state
            .pipeline
            .upload_thumbnail(video_id, user.user_id, content_type.as_deref(), field)
            .await?;
        return Ok(Json(video));
    }

    Err(missing_field(THUMBNAIL_FORM_FIELD).into())
}
