//! Upload pipeline: stage → optimize → probe → classify → key → store → record.

pub mod guard;
pub mod pipeline;
pub mod staging;
pub mod types;

pub use guard::authorize;
pub use pipeline::UploadPipeline;
pub use staging::{stage_body, ScratchFile, StagedFile, StagingError};
pub use types::{PipelineError, UploadConfig, UploadStage};
