//! Application state shared by all handlers.

use crate::auth::JwtService;
use std::sync::Arc;
use tubely_core::Config;
use tubely_db::VideoRepository;
use tubely_processing::UploadPipeline;
use tubely_storage::{LocalStorage, UrlResolver};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jwt: Arc<JwtService>,
    pub repository: Arc<dyn VideoRepository>,
    pub pipeline: Arc<UploadPipeline>,
    pub resolver: UrlResolver,
    /// Present when objects live on local disk and `/assets` serves them.
    pub local_assets: Option<Arc<LocalStorage>>,
}
