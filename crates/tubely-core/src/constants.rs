//! Limits and fixed values used across the upload pipeline.

/// Maximum accepted video upload (1 GiB).
pub const MAX_VIDEO_SIZE_BYTES: u64 = 1 << 30;

/// Maximum accepted thumbnail upload (10 MiB).
pub const MAX_THUMBNAIL_SIZE_BYTES: u64 = 10 << 20;

/// The only container accepted on the video path.
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Image types accepted on the thumbnail path.
pub const THUMBNAIL_CONTENT_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// Multipart field carrying the video file.
pub const VIDEO_FORM_FIELD: &str = "video";

/// Multipart field carrying the thumbnail image.
pub const THUMBNAIL_FORM_FIELD: &str = "thumbnail";

/// Key prefix for thumbnails (videos are partitioned by orientation instead).
pub const THUMBNAIL_KEY_PREFIX: &str = "thumbnails";

/// Default lifetime of a signed read URL.
pub const SIGNED_URL_TTL_SECS: u64 = 3600;

/// Number of random bytes in every generated object key.
pub const RANDOM_KEY_BYTES: usize = 32;
