//! App state - pure data structure with no I/O logic beyond session persistence

use std::collections::HashMap;

use crate::constants::ALLOWED_EXTENSIONS;
use crate::error::ValidationError;
use crate::messages::ui_events::{InputMode, Tab, ViewKind};
use crate::messages::RenderState;
use crate::models::{BookSize, Font, GenreOption, HistoryEntry, SubscriptionTier, UploadRequest, UsageSnapshot};
use crate::session::SessionStore;

/// The single view state machine. One tagged variant per screen; no
/// combinations of boolean flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum View {
    Landing,
    LoggingIn,
    Registering,
    ResettingPassword,
    GoogleSignIn,
    Authenticated(Tab),
    PaymentPending { tier_id: String },
}

impl View {
    pub fn kind(&self) -> ViewKind {
        match self {
            View::Landing => ViewKind::Landing,
            View::LoggingIn => ViewKind::LoggingIn,
            View::Registering => ViewKind::Registering,
            View::ResettingPassword => ViewKind::ResettingPassword,
            View::GoogleSignIn => ViewKind::GoogleSignIn,
            View::Authenticated(tab) => ViewKind::Authenticated(*tab),
            View::PaymentPending { .. } => ViewKind::PaymentPending,
        }
    }
}

impl Default for View {
    fn default() -> Self {
        View::Landing
    }
}

/// Focused field of the email/password forms
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CredField {
    #[default]
    Email,
    Password,
}

/// Email + password input, shared by login and registration
#[derive(Clone, Debug, Default)]
pub struct CredentialsForm {
    pub email: String,
    pub password: String,
    pub focus: CredField,
}

impl CredentialsForm {
    pub fn field(&self) -> &str {
        match self.focus {
            CredField::Email => &self.email,
            CredField::Password => &self.password,
        }
    }

    pub fn field_mut(&mut self) -> &mut String {
        match self.focus {
            CredField::Email => &mut self.email,
            CredField::Password => &mut self.password,
        }
    }

    pub fn next_field(&mut self) {
        self.focus = match self.focus {
            CredField::Email => CredField::Password,
            CredField::Password => CredField::Email,
        };
    }

    pub fn reset(&mut self) {
        self.email.clear();
        self.password.clear();
        self.focus = CredField::Email;
    }
}

/// Password reset runs in two stages against the forgot/reset endpoint pair
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ResetStage {
    #[default]
    Request,
    Confirm,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ResetField {
    #[default]
    Email,
    Token,
    NewPassword,
}

#[derive(Clone, Debug, Default)]
pub struct ResetForm {
    pub stage: ResetStage,
    pub email: String,
    pub token: String,
    pub new_password: String,
    pub focus: ResetField,
}

impl ResetForm {
    pub fn field(&self) -> &str {
        match self.focus {
            ResetField::Email => &self.email,
            ResetField::Token => &self.token,
            ResetField::NewPassword => &self.new_password,
        }
    }

    pub fn field_mut(&mut self) -> &mut String {
        match self.focus {
            ResetField::Email => &mut self.email,
            ResetField::Token => &mut self.token,
            ResetField::NewPassword => &mut self.new_password,
        }
    }

    pub fn next_field(&mut self) {
        self.focus = match self.stage {
            ResetStage::Request => ResetField::Email,
            ResetStage::Confirm => match self.focus {
                ResetField::Token => ResetField::NewPassword,
                _ => ResetField::Token,
            },
        };
    }

    pub fn reset(&mut self) {
        *self = ResetForm::default();
    }
}

/// External identity sign-in: the provider-issued ID token is pasted in
#[derive(Clone, Debug, Default)]
pub struct GoogleForm {
    pub id_token: String,
}

/// Upload parameters under construction
#[derive(Clone, Debug)]
pub struct UploadForm {
    pub file_path: String,
    pub book_size: BookSize,
    pub font: Font,
    /// Selected genre id; defaults to the first allowed genre of the
    /// freshest fetch, unset when none is available
    pub genre: Option<String>,
}

impl Default for UploadForm {
    fn default() -> Self {
        UploadForm {
            file_path: String::new(),
            book_size: BookSize::default(),
            font: Font::default(),
            genre: None,
        }
    }
}

impl UploadForm {
    /// Validation gate before submission. The server re-validates
    /// authoritatively; this only blocks obviously bad submissions.
    pub fn validate(&self, genres: Option<&[GenreOption]>) -> Result<UploadRequest, ValidationError> {
        let path = self.file_path.trim();
        if path.is_empty() {
            return Err(ValidationError::NoFile);
        }

        let request = UploadRequest {
            file_path: path.into(),
            book_size: self.book_size,
            font: self.font,
            genre: self.genre.clone().ok_or(ValidationError::NoGenre)?,
        };

        match request.extension() {
            Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
            _ => return Err(ValidationError::BadExtension),
        }

        let option = genres
            .and_then(|list| list.iter().find(|g| g.id == request.genre))
            .ok_or(ValidationError::NoGenre)?;
        if !option.allowed {
            return Err(ValidationError::GenreNotAllowed(option.name.clone()));
        }

        Ok(request)
    }
}

/// Cached dashboard reads, refreshed wholesale by the refresh cascade.
///
/// Each field is applied independently as its response lands. Data from the
/// previous generation stays visible during a refresh; `ready` is the render
/// gate that makes the UI label it as stale until all four fresh reads land.
#[derive(Clone, Debug, Default)]
pub struct Dashboard {
    pub generation: u64,
    fresh_reads: u8,
    pub tiers: Option<Vec<SubscriptionTier>>,
    pub genres: Option<Vec<GenreOption>>,
    pub usage: Option<UsageSnapshot>,
    pub history: Option<Vec<HistoryEntry>>,
}

impl Dashboard {
    /// All four reads of the current generation have been applied
    pub fn ready(&self) -> bool {
        self.fresh_reads >= 4
    }

    /// Count one applied cascade read toward the render gate
    pub fn mark_read_applied(&mut self) {
        self.fresh_reads += 1;
    }

    /// Start a new generation; retained data renders as stale until the
    /// fresh reads land
    pub fn start_refresh(&mut self) {
        self.generation += 1;
        self.fresh_reads = 0;
    }

    pub fn clear(&mut self) {
        self.fresh_reads = 0;
        self.tiers = None;
        self.genres = None;
        self.usage = None;
        self.history = None;
    }
}

/// What an in-flight request was for. Responses whose id is no longer in the
/// pending map (logout, superseded cascade) are dropped on arrival.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingCall {
    Register,
    Authenticate,
    GoogleAuth,
    ResetRequest,
    ResetConfirm,
    Tiers { generation: u64 },
    Genres { generation: u64 },
    Usage { generation: u64 },
    History { generation: u64 },
    Standards,
    Upload,
    Upgrade { tier_id: String },
    Download,
}

/// Main application state - pure data, no network I/O
pub struct AppState {
    pub view: View,
    pub session: SessionStore,

    // Input
    pub input_mode: InputMode,
    pub cursor_position: usize,

    // Forms
    pub login: CredentialsForm,
    pub register: CredentialsForm,
    pub reset: ResetForm,
    pub google: GoogleForm,
    pub upload: UploadForm,

    // Server caches
    pub dashboard: Dashboard,
    pub standards: Option<String>,

    // List/scroll state
    pub selected_row: usize,
    pub scroll: u16,

    // Transient notices, mutually exclusive
    pub error: Option<String>,
    pub notice: Option<String>,

    /// Upload or upgrade in flight; their triggering keys are disabled
    pub busy: bool,
    pub show_help: bool,
    pub last_file_id: Option<String>,

    next_request_id: u64,
    pending: HashMap<u64, PendingCall>,
}

impl AppState {
    pub fn new() -> Self {
        AppState::with_session(SessionStore::new())
    }

    /// State over an explicit session store (used by tests)
    pub fn with_session(session: SessionStore) -> Self {
        AppState {
            view: View::Landing,
            session,
            input_mode: InputMode::Normal,
            cursor_position: 0,
            login: CredentialsForm::default(),
            register: CredentialsForm::default(),
            reset: ResetForm::default(),
            google: GoogleForm::default(),
            upload: UploadForm::default(),
            dashboard: Dashboard::default(),
            standards: None,
            selected_row: 0,
            scroll: 0,
            error: None,
            notice: None,
            busy: false,
            show_help: false,
            last_file_id: None,
            next_request_id: 1,
            pending: HashMap::new(),
        }
    }

    /// Generate a unique request ID
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    pub fn track(&mut self, id: u64, call: PendingCall) {
        self.pending.insert(id, call);
    }

    pub fn take_pending(&mut self, id: u64) -> Option<PendingCall> {
        self.pending.remove(&id)
    }

    pub fn drop_pending(&mut self) {
        self.pending.clear();
    }

    /// Forget stale cascade reads so their late responses are ignored
    pub fn drop_pending_reads(&mut self) {
        self.pending.retain(|_, call| {
            !matches!(
                call,
                PendingCall::Tiers { .. }
                    | PendingCall::Genres { .. }
                    | PendingCall::Usage { .. }
                    | PendingCall::History { .. }
            )
        });
    }

    pub fn has_pending(&self, call: &PendingCall) -> bool {
        self.pending.values().any(|c| c == call)
    }

    /// Get the current text input field content
    pub fn current_input(&self) -> &str {
        match &self.view {
            View::LoggingIn => self.login.field(),
            View::Registering => self.register.field(),
            View::ResettingPassword => self.reset.field(),
            View::GoogleSignIn => &self.google.id_token,
            View::Authenticated(Tab::Upload) => &self.upload.file_path,
            _ => "",
        }
    }

    /// Get mutable reference to the current text input field, if the view
    /// has one
    pub fn current_input_mut(&mut self) -> Option<&mut String> {
        match &self.view {
            View::LoggingIn => Some(self.login.field_mut()),
            View::Registering => Some(self.register.field_mut()),
            View::ResettingPassword => Some(self.reset.field_mut()),
            View::GoogleSignIn => Some(&mut self.google.id_token),
            View::Authenticated(Tab::Upload) => Some(&mut self.upload.file_path),
            _ => None,
        }
    }

    /// Length of the list the row selector currently navigates
    pub fn row_count(&self) -> usize {
        match &self.view {
            View::Authenticated(Tab::History) => {
                self.dashboard.history.as_ref().map(|h| h.len()).unwrap_or(0)
            }
            View::Authenticated(Tab::Subscription) => {
                self.dashboard.tiers.as_ref().map(|t| t.len()).unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self) -> RenderState {
        RenderState {
            view: self.view.clone(),
            input_mode: self.input_mode,
            cursor_position: self.cursor_position,
            login: self.login.clone(),
            register: self.register.clone(),
            reset: self.reset.clone(),
            google: self.google.clone(),
            upload: self.upload.clone(),
            tier: self.session.tier(),
            dashboard_ready: self.dashboard.ready(),
            tiers: self.dashboard.tiers.clone(),
            genres: self.dashboard.genres.clone(),
            usage: self.dashboard.usage.clone(),
            history: self.dashboard.history.clone(),
            standards: self.standards.clone(),
            selected_row: self.selected_row,
            scroll: self.scroll,
            error: self.error.clone(),
            notice: self.notice.clone(),
            busy: self.busy,
            show_help: self.show_help,
            last_file_id: self.last_file_id.clone(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genres() -> Vec<GenreOption> {
        vec![
            GenreOption {
                id: "novel".into(),
                name: "Novel".into(),
                description: "Fiction narrative".into(),
                allowed: true,
            },
            GenreOption {
                id: "poetry".into(),
                name: "Poetry".into(),
                description: "Verse".into(),
                allowed: false,
            },
        ]
    }

    #[test]
    fn test_upload_form_accepts_supported_extensions() {
        for name in ["draft.docx", "draft.pdf", "DRAFT.PDF"] {
            let form = UploadForm {
                file_path: name.into(),
                genre: Some("novel".into()),
                ..UploadForm::default()
            };
            assert!(form.validate(Some(&genres())).is_ok(), "{name} should pass");
        }
    }

    #[test]
    fn test_upload_form_rejects_other_extensions() {
        for name in ["draft.txt", "draft.doc", "draft", "draft.docx.exe"] {
            let form = UploadForm {
                file_path: name.into(),
                genre: Some("novel".into()),
                ..UploadForm::default()
            };
            assert_eq!(
                form.validate(Some(&genres())),
                Err(ValidationError::BadExtension),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_upload_form_requires_file() {
        let form = UploadForm {
            file_path: "   ".into(),
            genre: Some("novel".into()),
            ..UploadForm::default()
        };
        assert_eq!(form.validate(Some(&genres())), Err(ValidationError::NoFile));
    }

    #[test]
    fn test_blocked_genre_never_reaches_a_request() {
        let form = UploadForm {
            file_path: "draft.docx".into(),
            genre: Some("poetry".into()),
            ..UploadForm::default()
        };
        assert_eq!(
            form.validate(Some(&genres())),
            Err(ValidationError::GenreNotAllowed("Poetry".into()))
        );
    }

    #[test]
    fn test_upload_form_requires_genre_catalog() {
        let form = UploadForm {
            file_path: "draft.docx".into(),
            genre: None,
            ..UploadForm::default()
        };
        assert_eq!(form.validate(Some(&genres())), Err(ValidationError::NoGenre));

        let form = UploadForm {
            file_path: "draft.docx".into(),
            genre: Some("novel".into()),
            ..UploadForm::default()
        };
        assert_eq!(form.validate(None), Err(ValidationError::NoGenre));
    }

    #[test]
    fn test_dashboard_ready_needs_all_four_reads() {
        let mut dash = Dashboard::default();
        assert!(!dash.ready());
        for _ in 0..3 {
            dash.mark_read_applied();
            assert!(!dash.ready());
        }
        dash.mark_read_applied();
        assert!(dash.ready());
    }

    #[test]
    fn test_dashboard_refresh_regates_but_keeps_data() {
        let mut dash = Dashboard::default();
        dash.usage = Some(UsageSnapshot {
            current_usage: 0,
            limit: 1,
            tier: crate::models::Tier::Free,
        });
        for _ in 0..4 {
            dash.mark_read_applied();
        }
        assert!(dash.ready());

        dash.start_refresh();
        assert!(!dash.ready());
        assert!(dash.usage.is_some(), "previous snapshot survives the refresh");
    }

    #[test]
    fn test_pending_bookkeeping() {
        let mut state = AppState::with_session(SessionStore::with_dir(std::env::temp_dir().join("bindery-test-unused")));
        let id = state.next_id();
        state.track(id, PendingCall::Upload);
        assert!(state.has_pending(&PendingCall::Upload));
        assert_eq!(state.take_pending(id), Some(PendingCall::Upload));
        assert_eq!(state.take_pending(id), None);
    }

    #[test]
    fn test_drop_pending_reads_keeps_mutations() {
        let mut state = AppState::with_session(SessionStore::with_dir(std::env::temp_dir().join("bindery-test-unused")));
        let a = state.next_id();
        let b = state.next_id();
        state.track(a, PendingCall::Usage { generation: 1 });
        state.track(b, PendingCall::Upload);
        state.drop_pending_reads();
        assert_eq!(state.take_pending(a), None);
        assert_eq!(state.take_pending(b), Some(PendingCall::Upload));
    }
}
