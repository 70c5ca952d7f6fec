//! Tubely Storage Library
//!
//! This crate provides the object-store abstraction used for every uploaded asset, its S3
//! and local-filesystem implementations, and the URL resolver that turns a stored location
//! into a playable URL.
//!
//! # Container and key
//!
//! Every backend is bound to a single container (the S3 bucket, or `local`). Keys are
//! path-like, relative, and must not contain `..` or a leading `/`.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod resolver;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use resolver::{SigningError, UrlResolver};
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
pub use tubely_core::StorageBackend;
