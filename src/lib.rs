//! # Bindery TUI
//!
//! A terminal client for the Bindery manuscript formatting service.
//!
//! ## Features
//! - Account registration, login, Google sign-in, password reset
//! - Manuscript upload (.docx/.pdf) with trim size, font and genre
//! - Monthly usage tracking and processing history
//! - Subscription tiers with an in-app upgrade flow
//! - Download of the formatted artifact
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - synchronous
//! - App Layer (State machine)
//! - Network Layer (Tokio runtime)

pub mod app;
pub mod constants;
pub mod error;
pub mod messages;
pub mod models;
pub mod network;
pub mod session;
pub mod ui;

// Re-export commonly used types
pub use app::{AppActor, AppState, View};
pub use error::{ApiError, ValidationError};
pub use messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
pub use models::{
    BookSize, FileStatus, Font, GenreOption, HistoryEntry, SubscriptionTier, Tier, UploadRequest,
    UsageSnapshot,
};
pub use network::{Gateway, NetworkActor};
pub use session::SessionStore;
