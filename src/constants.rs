//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Default base URL of the formatting service API
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment variable that overrides the API base URL
pub const API_URL_ENV: &str = "BINDERY_API_URL";

/// Manuscript extensions the service accepts
pub const ALLOWED_EXTENSIONS: [&str; 2] = ["docx", "pdf"];

/// Application name
pub const APP_NAME: &str = "Bindery TUI";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
