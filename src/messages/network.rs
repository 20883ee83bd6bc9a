//! Network messages - communication between App and Network layers

use crate::error::ApiError;
use crate::models::{GenreOption, HistoryEntry, SubscriptionTier, Tier, UploadRequest, UsageSnapshot};
use std::path::PathBuf;

/// Commands sent from App layer to Network layer.
///
/// Every command carries the request id the response will echo back. None of
/// these retry on failure.
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    Register {
        id: u64,
        email: String,
        password: String,
    },
    Authenticate {
        id: u64,
        email: String,
        password: String,
    },
    AuthenticateGoogle {
        id: u64,
        id_token: String,
    },
    RequestPasswordReset {
        id: u64,
        email: String,
    },
    ResetPassword {
        id: u64,
        token: String,
        new_password: String,
    },
    FetchTiers {
        id: u64,
    },
    FetchGenres {
        id: u64,
        credential: String,
    },
    FetchUsage {
        id: u64,
        credential: String,
    },
    FetchHistory {
        id: u64,
        credential: String,
    },
    FetchStandards {
        id: u64,
    },
    Upload {
        id: u64,
        credential: String,
        request: UploadRequest,
    },
    Upgrade {
        id: u64,
        credential: String,
        tier_id: String,
    },
    Download {
        id: u64,
        credential: String,
        file_id: String,
        original_filename: String,
    },

    /// Shutdown the network actor
    Shutdown,
}

/// Responses sent from Network layer to App layer
#[derive(Debug, Clone)]
pub enum NetworkResponse {
    Registered {
        id: u64,
    },
    /// Login or external sign-in succeeded
    SessionEstablished {
        id: u64,
        credential: String,
        tier: Tier,
    },
    /// Accepted regardless of whether the account exists
    ResetRequested {
        id: u64,
    },
    PasswordChanged {
        id: u64,
    },
    Tiers {
        id: u64,
        tiers: Vec<SubscriptionTier>,
    },
    Genres {
        id: u64,
        genres: Vec<GenreOption>,
    },
    Usage {
        id: u64,
        usage: UsageSnapshot,
    },
    History {
        id: u64,
        entries: Vec<HistoryEntry>,
    },
    Standards {
        id: u64,
        text: String,
    },
    Uploaded {
        id: u64,
        file_id: String,
    },
    Upgraded {
        id: u64,
        tier: Tier,
    },
    Downloaded {
        id: u64,
        path: PathBuf,
    },
    Failed {
        id: u64,
        error: ApiError,
    },
}

impl NetworkResponse {
    /// Get the request ID from the response
    pub fn id(&self) -> u64 {
        match self {
            NetworkResponse::Registered { id }
            | NetworkResponse::SessionEstablished { id, .. }
            | NetworkResponse::ResetRequested { id }
            | NetworkResponse::PasswordChanged { id }
            | NetworkResponse::Tiers { id, .. }
            | NetworkResponse::Genres { id, .. }
            | NetworkResponse::Usage { id, .. }
            | NetworkResponse::History { id, .. }
            | NetworkResponse::Standards { id, .. }
            | NetworkResponse::Uploaded { id, .. }
            | NetworkResponse::Upgraded { id, .. }
            | NetworkResponse::Downloaded { id, .. }
            | NetworkResponse::Failed { id, .. } => *id,
        }
    }
}
