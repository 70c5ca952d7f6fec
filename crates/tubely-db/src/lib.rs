//! Database repositories for the metadata store.
//!
//! The upload pipeline only reads and updates video records; creation and deletion belong to
//! the rest of the product and are not exposed here.

pub mod video;

pub use video::{PgVideoRepository, VideoRepository};
