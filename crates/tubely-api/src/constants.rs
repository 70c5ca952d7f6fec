//! Route prefixes and header constants.

/// Prefix of the authenticated JSON API.
pub const API_PREFIX: &str = "/api";

/// Path the local storage backend serves objects from.
pub const ASSETS_PREFIX: &str = "/assets";

/// Bearer scheme prefix of the `Authorization` header.
pub const BEARER_PREFIX: &str = "Bearer ";
