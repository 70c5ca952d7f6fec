//! Tubely Media Processing Library
//!
//! This crate turns a raw upload into a stored, streamable object: it stages the request body
//! to disk, remuxes it for fast start, probes and classifies its geometry, derives an
//! orientation-partitioned key, puts it in the object store and updates the video record.

pub mod command;
pub mod keys;
pub mod upload;
pub mod validator;
pub mod video;

// Re-export commonly used types
pub use command::{ToolError, ToolOutput};
pub use keys::KeyError;
pub use upload::{
    authorize, PipelineError, UploadConfig, UploadPipeline, UploadStage,
};
pub use validator::{MediaValidator, ValidationError};
pub use video::{
    classify, orientation_of, AspectError, AspectLabel, Geometry, GeometryProber, OptimizeError,
    Orientation, ProbeError, StreamOptimizer,
};
