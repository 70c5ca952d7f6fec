pub mod storage;
pub mod video;

pub use storage::{InvalidLocation, StorageLocation};
pub use video::Video;
