//! `GET /assets/{*key}` for the local storage backend.
//!
//! In signed delivery the request must carry a valid, unexpired `expires`/`signature` pair.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tubely_core::{AppError, DeliveryMode};
use tubely_storage::Storage;

#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub expires: Option<u64>,
    pub signature: Option<String>,
}

pub async fn get_asset(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<SignedQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let local = state
        .local_assets
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Asset not found".to_string()))?;

    if state.resolver.mode() == DeliveryMode::Signed {
        let (Some(expires), Some(signature)) = (query.expires, query.signature.as_deref()) else {
            return Err(AppError::Unauthorized("Missing URL signature".to_string()).into());
        };
        local.verify_signature(&key, expires, signature)?;
    }

    let data = local.get_object(&key).await?;
    let content_type = mime_guess::from_path(&key)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    tracing::debug!(key = %key, size_bytes = data.len(), "Served local asset");

    Ok(([(CONTENT_TYPE, content_type)], data))
}
