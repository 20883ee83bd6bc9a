//! Render state - data structure sent from App layer to UI for rendering

use crate::app::state::{CredentialsForm, GoogleForm, ResetForm, UploadForm, View};
use crate::messages::ui_events::InputMode;
use crate::models::{GenreOption, HistoryEntry, SubscriptionTier, Tier, UsageSnapshot};

/// Complete state needed by the UI to render
#[derive(Clone, Debug)]
pub struct RenderState {
    pub view: View,
    pub input_mode: InputMode,
    pub cursor_position: usize,

    // Forms
    pub login: CredentialsForm,
    pub register: CredentialsForm,
    pub reset: ResetForm,
    pub google: GoogleForm,
    pub upload: UploadForm,

    // Session
    pub tier: Tier,

    // Dashboard caches; `dashboard_ready` gates rendering them as fresh
    pub dashboard_ready: bool,
    pub tiers: Option<Vec<SubscriptionTier>>,
    pub genres: Option<Vec<GenreOption>>,
    pub usage: Option<UsageSnapshot>,
    pub history: Option<Vec<HistoryEntry>>,
    pub standards: Option<String>,

    // List/scroll state
    pub selected_row: usize,
    pub scroll: u16,

    // Transient notices
    pub error: Option<String>,
    pub notice: Option<String>,

    pub busy: bool,
    pub show_help: bool,
    pub last_file_id: Option<String>,
}

impl Default for RenderState {
    fn default() -> Self {
        RenderState {
            view: View::Landing,
            input_mode: InputMode::Normal,
            cursor_position: 0,
            login: CredentialsForm::default(),
            register: CredentialsForm::default(),
            reset: ResetForm::default(),
            google: GoogleForm::default(),
            upload: UploadForm::default(),
            tier: Tier::Free,
            dashboard_ready: false,
            tiers: None,
            genres: None,
            usage: None,
            history: None,
            standards: None,
            selected_row: 0,
            scroll: 0,
            error: None,
            notice: None,
            busy: false,
            show_help: false,
            last_file_id: None,
        }
    }
}
