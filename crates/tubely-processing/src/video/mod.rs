//! Video geometry and container handling backed by ffprobe/ffmpeg.

pub mod aspect;
pub mod faststart;
pub mod probe;

pub use aspect::{classify, orientation_of, AspectError, AspectLabel, Orientation};
pub use faststart::{OptimizeError, StreamOptimizer};
pub use probe::{Geometry, GeometryProber, ProbeError};
