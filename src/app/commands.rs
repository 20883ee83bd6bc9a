//! Command handlers - business logic for processing UI events

use crate::app::state::{AppState, PendingCall, ResetStage, View};
use crate::error::{ApiError, ValidationError};
use crate::messages::ui_events::{InputMode, Tab};
use crate::messages::{NetworkCommand, NetworkResponse};
use crate::models::GenreOption;

impl AppState {
    // ========================
    // Transient notices
    // ========================

    /// Errors and successes are mutually exclusive and cleared at the start
    /// of the next action
    fn clear_transient(&mut self) {
        self.error = None;
        self.notice = None;
    }

    // ========================
    // Unauthenticated navigation
    // ========================

    pub fn show_login(&mut self) {
        self.clear_transient();
        self.login.reset();
        self.view = View::LoggingIn;
        self.input_mode = InputMode::Editing;
        self.cursor_position = 0;
    }

    pub fn show_register(&mut self) {
        self.clear_transient();
        self.register.reset();
        self.view = View::Registering;
        self.input_mode = InputMode::Editing;
        self.cursor_position = 0;
    }

    pub fn show_forgot_password(&mut self) {
        self.clear_transient();
        self.reset.reset();
        self.view = View::ResettingPassword;
        self.input_mode = InputMode::Editing;
        self.cursor_position = 0;
    }

    pub fn show_google_sign_in(&mut self) {
        self.clear_transient();
        self.google.id_token.clear();
        self.view = View::GoogleSignIn;
        self.input_mode = InputMode::Editing;
        self.cursor_position = 0;
    }

    pub fn back_to_landing(&mut self) {
        self.clear_transient();
        self.input_mode = InputMode::Normal;
        self.view = View::Landing;
    }

    // ========================
    // Input editing
    // ========================

    pub fn start_editing(&mut self) {
        self.input_mode = InputMode::Editing;
        self.cursor_position = self.current_input().len();
    }

    pub fn stop_editing(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn next_field(&mut self) {
        match &self.view {
            View::LoggingIn => self.login.next_field(),
            View::Registering => self.register.next_field(),
            View::ResettingPassword => self.reset.next_field(),
            _ => {}
        }
        self.cursor_position = self.current_input().len();
    }

    pub fn move_cursor_left(&mut self) {
        let input = self.current_input();
        if self.cursor_position > 0 {
            let new_pos = input[..self.cursor_position]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.cursor_position = new_pos;
        }
    }

    pub fn move_cursor_right(&mut self) {
        let input = self.current_input();
        if self.cursor_position < input.len() {
            let new_pos = input[self.cursor_position..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor_position + i)
                .unwrap_or(input.len());
            self.cursor_position = new_pos;
        }
    }

    pub fn enter_char(&mut self, c: char) {
        let cursor_pos = self.cursor_position;
        if let Some(input) = self.current_input_mut() {
            if cursor_pos <= input.len() {
                input.insert(cursor_pos, c);
                self.cursor_position = cursor_pos + c.len_utf8();
            }
        }
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        let cursor_pos = self.cursor_position;
        if let Some(input) = self.current_input_mut() {
            let prev_pos = input[..cursor_pos]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            input.remove(prev_pos);
            self.cursor_position = prev_pos;
        }
    }

    // ========================
    // Scrolling and lists
    // ========================

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
    }

    pub fn next_row(&mut self) {
        let count = self.row_count();
        if count > 0 {
            self.selected_row = (self.selected_row + 1) % count;
        }
    }

    pub fn prev_row(&mut self) {
        let count = self.row_count();
        if count > 0 {
            self.selected_row = self.selected_row.checked_sub(1).unwrap_or(count - 1);
        }
    }

    // ========================
    // Popups
    // ========================

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn close_help(&mut self) {
        self.show_help = false;
    }

    // ========================
    // Session lifecycle
    // ========================

    /// Restore a persisted session at startup; a restored session triggers
    /// the full refresh cascade
    pub fn startup(&mut self) -> Vec<NetworkCommand> {
        if self.session.restore() {
            self.view = View::Authenticated(Tab::Upload);
            self.begin_refresh()
        } else {
            self.view = View::Landing;
            Vec::new()
        }
    }

    pub fn logout(&mut self) {
        self.clear_transient();
        self.session.clear();
        // Late responses must not be applied to a torn-down session
        self.drop_pending();
        self.busy = false;
        self.dashboard.clear();
        self.standards = None;
        self.last_file_id = None;
        self.upload = Default::default();
        self.login.reset();
        self.register.reset();
        self.reset.reset();
        self.selected_row = 0;
        self.scroll = 0;
        self.input_mode = InputMode::Normal;
        self.view = View::Landing;
    }

    /// Any authenticated call answering 401 forces the whole app back to
    /// Landing, surfaced as a session-expiry notice rather than an error
    fn session_expired(&mut self) {
        self.logout();
        self.notice = Some("Your session has expired. Please sign in again.".into());
    }

    // ========================
    // Tab navigation
    // ========================

    pub fn switch_tab(&mut self, tab: Tab) -> Option<NetworkCommand> {
        self.clear_transient();
        self.selected_row = 0;
        self.scroll = 0;
        self.input_mode = InputMode::Normal;
        self.view = View::Authenticated(tab);

        // The standards text is a static document, fetched once per session
        if tab == Tab::Standards && self.standards.is_none() && !self.has_pending(&PendingCall::Standards) {
            let id = self.next_id();
            self.track(id, PendingCall::Standards);
            return Some(NetworkCommand::FetchStandards { id });
        }
        None
    }

    // ========================
    // Refresh cascade
    // ========================

    /// Re-fetch tiers, genres, usage and history as a batch. The four reads
    /// run concurrently and are applied independently; retained data stays
    /// visible, labeled stale, until all four of this generation have landed.
    pub fn begin_refresh(&mut self) -> Vec<NetworkCommand> {
        let Some(credential) = self.session.credential().map(String::from) else {
            return Vec::new();
        };

        self.dashboard.start_refresh();
        self.drop_pending_reads();
        let generation = self.dashboard.generation;

        let mut cmds = Vec::with_capacity(4);

        let id = self.next_id();
        self.track(id, PendingCall::Tiers { generation });
        cmds.push(NetworkCommand::FetchTiers { id });

        let id = self.next_id();
        self.track(id, PendingCall::Genres { generation });
        cmds.push(NetworkCommand::FetchGenres {
            id,
            credential: credential.clone(),
        });

        let id = self.next_id();
        self.track(id, PendingCall::Usage { generation });
        cmds.push(NetworkCommand::FetchUsage {
            id,
            credential: credential.clone(),
        });

        let id = self.next_id();
        self.track(id, PendingCall::History { generation });
        cmds.push(NetworkCommand::FetchHistory { id, credential });

        cmds
    }

    pub fn refresh(&mut self) -> Vec<NetworkCommand> {
        self.clear_transient();
        self.begin_refresh()
    }

    // ========================
    // Form submission
    // ========================

    /// Submit the form of the current view
    pub fn submit(&mut self) -> Vec<NetworkCommand> {
        match &self.view {
            View::LoggingIn => self.submit_login().into_iter().collect(),
            View::Registering => self.submit_register().into_iter().collect(),
            View::ResettingPassword => self.submit_reset().into_iter().collect(),
            View::GoogleSignIn => self.submit_google().into_iter().collect(),
            _ => Vec::new(),
        }
    }

    fn submit_login(&mut self) -> Option<NetworkCommand> {
        self.clear_transient();
        if self.has_pending(&PendingCall::Authenticate) {
            return None;
        }
        if let Err(e) = require_credentials(&self.login.email, &self.login.password) {
            self.error = Some(e.to_string());
            return None;
        }
        let id = self.next_id();
        self.track(id, PendingCall::Authenticate);
        Some(NetworkCommand::Authenticate {
            id,
            email: self.login.email.trim().to_string(),
            password: self.login.password.clone(),
        })
    }

    fn submit_register(&mut self) -> Option<NetworkCommand> {
        self.clear_transient();
        if self.has_pending(&PendingCall::Register) {
            return None;
        }
        if let Err(e) = require_credentials(&self.register.email, &self.register.password) {
            self.error = Some(e.to_string());
            return None;
        }
        let id = self.next_id();
        self.track(id, PendingCall::Register);
        Some(NetworkCommand::Register {
            id,
            email: self.register.email.trim().to_string(),
            password: self.register.password.clone(),
        })
    }

    fn submit_reset(&mut self) -> Option<NetworkCommand> {
        self.clear_transient();
        match self.reset.stage {
            ResetStage::Request => {
                if self.has_pending(&PendingCall::ResetRequest) {
                    return None;
                }
                if self.reset.email.trim().is_empty() {
                    self.error = Some(ValidationError::EmptyField("email").to_string());
                    return None;
                }
                let id = self.next_id();
                self.track(id, PendingCall::ResetRequest);
                Some(NetworkCommand::RequestPasswordReset {
                    id,
                    email: self.reset.email.trim().to_string(),
                })
            }
            ResetStage::Confirm => {
                if self.has_pending(&PendingCall::ResetConfirm) {
                    return None;
                }
                if self.reset.token.trim().is_empty() {
                    self.error = Some(ValidationError::EmptyField("reset token").to_string());
                    return None;
                }
                if self.reset.new_password.is_empty() {
                    self.error = Some(ValidationError::EmptyField("new password").to_string());
                    return None;
                }
                let id = self.next_id();
                self.track(id, PendingCall::ResetConfirm);
                Some(NetworkCommand::ResetPassword {
                    id,
                    token: self.reset.token.trim().to_string(),
                    new_password: self.reset.new_password.clone(),
                })
            }
        }
    }

    fn submit_google(&mut self) -> Option<NetworkCommand> {
        self.clear_transient();
        if self.has_pending(&PendingCall::GoogleAuth) {
            return None;
        }
        if self.google.id_token.trim().is_empty() {
            self.error = Some(ValidationError::EmptyField("ID token").to_string());
            return None;
        }
        let id = self.next_id();
        self.track(id, PendingCall::GoogleAuth);
        Some(NetworkCommand::AuthenticateGoogle {
            id,
            id_token: self.google.id_token.trim().to_string(),
        })
    }

    // ========================
    // Upload
    // ========================

    pub fn cycle_book_size(&mut self) {
        if !self.busy {
            self.upload.book_size = self.upload.book_size.next();
        }
    }

    pub fn cycle_font(&mut self) {
        if !self.busy {
            self.upload.font = self.upload.font.next();
        }
    }

    pub fn next_genre(&mut self) {
        self.step_genre(1);
    }

    pub fn prev_genre(&mut self) {
        self.step_genre(-1);
    }

    fn step_genre(&mut self, delta: isize) {
        let Some(genres) = self.dashboard.genres.as_ref() else {
            return;
        };
        if genres.is_empty() {
            return;
        }
        let current = self
            .upload
            .genre
            .as_ref()
            .and_then(|id| genres.iter().position(|g| &g.id == id))
            .unwrap_or(0);
        let len = genres.len() as isize;
        let next = (current as isize + delta).rem_euclid(len) as usize;
        self.upload.genre = Some(genres[next].id.clone());
    }

    /// Validate and submit the upload. A tier-blocked genre routes the user
    /// to the Subscription tab instead of the network.
    pub fn submit_upload(&mut self) -> Option<NetworkCommand> {
        self.clear_transient();
        if self.busy {
            return None;
        }
        let credential = self.session.credential()?.to_string();

        let request = match self.upload.validate(self.dashboard.genres.as_deref()) {
            Ok(request) => request,
            Err(e) => {
                let redirect = matches!(e, ValidationError::GenreNotAllowed(_));
                self.error = Some(e.to_string());
                if redirect {
                    self.view = View::Authenticated(Tab::Subscription);
                    self.selected_row = 0;
                }
                return None;
            }
        };

        self.busy = true;
        let id = self.next_id();
        self.track(id, PendingCall::Upload);
        Some(NetworkCommand::Upload {
            id,
            credential,
            request,
        })
    }

    // ========================
    // History / download
    // ========================

    pub fn download_selected(&mut self) -> Option<NetworkCommand> {
        self.clear_transient();
        if self.has_pending(&PendingCall::Download) {
            return None;
        }
        let credential = self.session.credential()?.to_string();
        let entry = self
            .dashboard
            .history
            .as_ref()
            .and_then(|h| h.get(self.selected_row))?
            .clone();

        if !entry.status.is_downloadable() {
            self.error = Some(format!(
                "'{}' is not ready yet (status: {})",
                entry.original_filename,
                entry.status.as_str()
            ));
            return None;
        }

        let id = self.next_id();
        self.track(id, PendingCall::Download);
        Some(NetworkCommand::Download {
            id,
            credential,
            file_id: entry.file_id,
            original_filename: entry.original_filename,
        })
    }

    // ========================
    // Subscription / payment
    // ========================

    /// Choosing a paid tier opens the payment confirmation; a free tier
    /// upgrades directly
    pub fn choose_tier(&mut self) -> Option<NetworkCommand> {
        self.clear_transient();
        if self.busy {
            return None;
        }
        let tier = self
            .dashboard
            .tiers
            .as_ref()
            .and_then(|t| t.get(self.selected_row))?
            .clone();

        if tier.requires_payment() {
            self.view = View::PaymentPending { tier_id: tier.id };
            return None;
        }
        self.request_upgrade(tier.id)
    }

    /// Confirm the pending payment: issues the upgrade exactly once
    pub fn confirm_payment(&mut self) -> Option<NetworkCommand> {
        self.clear_transient();
        if self.busy {
            return None;
        }
        let View::PaymentPending { tier_id } = &self.view else {
            return None;
        };
        let tier_id = tier_id.clone();
        self.request_upgrade(tier_id)
    }

    /// Abandon the pending tier, back to the subscription view unchanged
    pub fn cancel_payment(&mut self) {
        self.clear_transient();
        if matches!(self.view, View::PaymentPending { .. }) {
            self.view = View::Authenticated(Tab::Subscription);
        }
    }

    fn request_upgrade(&mut self, tier_id: String) -> Option<NetworkCommand> {
        let credential = self.session.credential()?.to_string();
        self.busy = true;
        let id = self.next_id();
        self.track(id, PendingCall::Upgrade { tier_id: tier_id.clone() });
        Some(NetworkCommand::Upgrade {
            id,
            credential,
            tier_id,
        })
    }

    // ========================
    // Network responses
    // ========================

    /// Apply a network response. Responses whose id is unknown (logout or a
    /// superseded cascade dropped them) are ignored. Returns follow-up
    /// commands, e.g. the refresh cascade after a state-changing operation.
    pub fn handle_response(&mut self, response: NetworkResponse) -> Vec<NetworkCommand> {
        let Some(call) = self.take_pending(response.id()) else {
            tracing::debug!(id = response.id(), "dropping late response for unknown request");
            return Vec::new();
        };

        match response {
            NetworkResponse::SessionEstablished { credential, tier, .. } => {
                self.session.establish(credential, tier);
                self.view = View::Authenticated(Tab::Upload);
                self.input_mode = InputMode::Normal;
                self.login.reset();
                self.google.id_token.clear();
                self.notice = Some("Signed in.".into());
                self.begin_refresh()
            }
            NetworkResponse::Registered { .. } => {
                // Hand the fresh account over to the login form
                self.login.reset();
                self.login.email = self.register.email.trim().to_string();
                self.register.reset();
                self.view = View::LoggingIn;
                self.notice = Some("Account created. Please sign in.".into());
                Vec::new()
            }
            NetworkResponse::ResetRequested { .. } => {
                self.reset.stage = ResetStage::Confirm;
                self.reset.next_field();
                self.notice = Some("If that address exists, a reset token has been sent.".into());
                Vec::new()
            }
            NetworkResponse::PasswordChanged { .. } => {
                self.login.reset();
                self.login.email = self.reset.email.trim().to_string();
                self.reset.reset();
                self.view = View::LoggingIn;
                self.notice = Some("Password updated. Please sign in.".into());
                Vec::new()
            }
            NetworkResponse::Tiers { tiers, .. } => {
                if self.cascade_is_current(&call) {
                    self.dashboard.tiers = Some(tiers);
                    self.dashboard.mark_read_applied();
                    self.clamp_selection();
                }
                Vec::new()
            }
            NetworkResponse::Genres { genres, .. } => {
                if self.cascade_is_current(&call) {
                    self.apply_genres(genres);
                    self.dashboard.mark_read_applied();
                }
                Vec::new()
            }
            NetworkResponse::Usage { usage, .. } => {
                if self.cascade_is_current(&call) {
                    self.dashboard.usage = Some(usage);
                    self.dashboard.mark_read_applied();
                }
                Vec::new()
            }
            NetworkResponse::History { entries, .. } => {
                if self.cascade_is_current(&call) {
                    self.dashboard.history = Some(entries);
                    self.dashboard.mark_read_applied();
                    self.clamp_selection();
                }
                Vec::new()
            }
            NetworkResponse::Standards { text, .. } => {
                self.standards = Some(text);
                Vec::new()
            }
            NetworkResponse::Uploaded { file_id, .. } => {
                self.busy = false;
                self.last_file_id = Some(file_id);
                self.upload.file_path.clear();
                self.notice = Some("File processed successfully!".into());
                self.begin_refresh()
            }
            NetworkResponse::Upgraded { tier, .. } => {
                self.busy = false;
                self.session.set_tier(tier);
                self.view = View::Authenticated(Tab::Subscription);
                self.notice = Some(format!("Subscription updated to {}.", tier.as_str()));
                self.begin_refresh()
            }
            NetworkResponse::Downloaded { path, .. } => {
                self.notice = Some(format!("Saved to {}", path.display()));
                Vec::new()
            }
            NetworkResponse::Failed { error, .. } => {
                self.handle_failure(call, error);
                Vec::new()
            }
        }
    }

    fn handle_failure(&mut self, call: PendingCall, error: ApiError) {
        if matches!(call, PendingCall::Upload | PendingCall::Upgrade { .. }) {
            self.busy = false;
        }

        // 401 from any authenticated call tears the session down, no matter
        // which tab was active
        if error == ApiError::Unauthorized && call_is_authenticated(&call) {
            self.session_expired();
            return;
        }

        self.error = Some(error.to_string());
    }

    /// A cascade read only applies if it belongs to the current generation
    fn cascade_is_current(&self, call: &PendingCall) -> bool {
        let generation = match call {
            PendingCall::Tiers { generation }
            | PendingCall::Genres { generation }
            | PendingCall::Usage { generation }
            | PendingCall::History { generation } => *generation,
            _ => return true,
        };
        if generation != self.dashboard.generation {
            tracing::debug!(generation, current = self.dashboard.generation, "dropping stale cascade read");
            return false;
        }
        true
    }

    /// Keep the selected genre if the fresh catalog still lists it,
    /// otherwise fall back to the first allowed option
    fn apply_genres(&mut self, genres: Vec<GenreOption>) {
        let keep = self
            .upload
            .genre
            .as_ref()
            .map(|id| genres.iter().any(|g| &g.id == id))
            .unwrap_or(false);
        if !keep {
            self.upload.genre = genres.iter().find(|g| g.allowed).map(|g| g.id.clone());
        }
        self.dashboard.genres = Some(genres);
    }

    fn clamp_selection(&mut self) {
        let count = self.row_count();
        if count == 0 {
            self.selected_row = 0;
        } else if self.selected_row >= count {
            self.selected_row = count - 1;
        }
    }
}

fn require_credentials(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }
    Ok(())
}

fn call_is_authenticated(call: &PendingCall) -> bool {
    matches!(
        call,
        PendingCall::Genres { .. }
            | PendingCall::Usage { .. }
            | PendingCall::History { .. }
            | PendingCall::Upload
            | PendingCall::Upgrade { .. }
            | PendingCall::Download
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileStatus, HistoryEntry, SubscriptionTier, Tier, UsageSnapshot};
    use crate::session::SessionStore;
    use chrono::Utc;
    use tempfile::{tempdir, TempDir};

    fn fresh_state() -> (AppState, TempDir) {
        let dir = tempdir().unwrap();
        let state = AppState::with_session(SessionStore::with_dir(dir.path().to_path_buf()));
        (state, dir)
    }

    fn authenticated_state() -> (AppState, TempDir) {
        let (mut state, dir) = fresh_state();
        state.session.establish("tok".into(), Tier::Free);
        state.view = View::Authenticated(Tab::Upload);
        (state, dir)
    }

    fn tiers_catalog() -> Vec<SubscriptionTier> {
        vec![
            SubscriptionTier {
                id: "free".into(),
                name: "Free".into(),
                price: 0.0,
                monthly_limit: 2,
                allowed_genres: vec!["non-fiction".into()],
            },
            SubscriptionTier {
                id: "business".into(),
                name: "Business".into(),
                price: 25.0,
                monthly_limit: 100,
                allowed_genres: vec!["non-fiction".into(), "novel".into(), "poetry".into()],
            },
        ]
    }

    fn cmd_id(cmd: &NetworkCommand) -> u64 {
        match cmd {
            NetworkCommand::Register { id, .. }
            | NetworkCommand::Authenticate { id, .. }
            | NetworkCommand::AuthenticateGoogle { id, .. }
            | NetworkCommand::RequestPasswordReset { id, .. }
            | NetworkCommand::ResetPassword { id, .. }
            | NetworkCommand::FetchTiers { id }
            | NetworkCommand::FetchGenres { id, .. }
            | NetworkCommand::FetchUsage { id, .. }
            | NetworkCommand::FetchHistory { id, .. }
            | NetworkCommand::FetchStandards { id }
            | NetworkCommand::Upload { id, .. }
            | NetworkCommand::Upgrade { id, .. }
            | NetworkCommand::Download { id, .. } => *id,
            NetworkCommand::Shutdown => 0,
        }
    }

    #[test]
    fn test_startup_without_persisted_session_lands_unauthenticated() {
        let (mut state, _dir) = fresh_state();
        let cmds = state.startup();
        assert!(cmds.is_empty());
        assert_eq!(state.view, View::Landing);
    }

    #[test]
    fn test_startup_with_persisted_session_triggers_cascade() {
        let dir = tempdir().unwrap();
        let mut seed = SessionStore::with_dir(dir.path().to_path_buf());
        seed.establish("tok".into(), Tier::Creator);

        let mut state = AppState::with_session(SessionStore::with_dir(dir.path().to_path_buf()));
        let cmds = state.startup();
        assert_eq!(state.view, View::Authenticated(Tab::Upload));
        assert_eq!(cmds.len(), 4);
    }

    #[test]
    fn test_login_success_enters_upload_and_refreshes() {
        let (mut state, _dir) = fresh_state();
        state.show_login();
        state.login.email = "reader@example.com".into();
        state.login.password = "hunter2".into();

        let cmds = state.submit();
        assert_eq!(cmds.len(), 1);
        let id = cmd_id(&cmds[0]);

        let follow_up = state.handle_response(NetworkResponse::SessionEstablished {
            id,
            credential: "tok-abc".into(),
            tier: Tier::Free,
        });
        assert_eq!(state.view, View::Authenticated(Tab::Upload));
        assert_eq!(state.session.credential(), Some("tok-abc"));
        assert_eq!(follow_up.len(), 4, "cascade must refetch all four reads");
    }

    #[test]
    fn test_login_requires_both_fields() {
        let (mut state, _dir) = fresh_state();
        state.show_login();
        state.login.email = "reader@example.com".into();
        assert!(state.submit().is_empty());
        assert!(state.error.is_some());
    }

    #[test]
    fn test_wrong_password_shows_server_detail() {
        let (mut state, _dir) = fresh_state();
        state.show_login();
        state.login.email = "reader@example.com".into();
        state.login.password = "wrong".into();

        let cmds = state.submit();
        state.handle_response(NetworkResponse::Failed {
            id: cmd_id(&cmds[0]),
            error: ApiError::Request("Incorrect email or password".into()),
        });
        assert_eq!(state.view, View::LoggingIn, "stays on the login form");
        assert_eq!(state.error.as_deref(), Some("Incorrect email or password"));
        assert!(state.notice.is_none(), "no session-expired notice for a login rejection");
    }

    #[test]
    fn test_duplicate_login_submission_is_serialized() {
        let (mut state, _dir) = fresh_state();
        state.show_login();
        state.login.email = "reader@example.com".into();
        state.login.password = "hunter2".into();
        assert_eq!(state.submit().len(), 1);
        assert!(state.submit().is_empty(), "second submit while in flight");
    }

    #[test]
    fn test_paid_tier_opens_payment_and_cancel_restores() {
        let (mut state, _dir) = authenticated_state();
        state.view = View::Authenticated(Tab::Subscription);
        state.dashboard.tiers = Some(tiers_catalog());
        state.selected_row = 1; // business, price > 0

        assert!(state.choose_tier().is_none());
        assert_eq!(state.view, View::PaymentPending { tier_id: "business".into() });

        state.cancel_payment();
        assert_eq!(state.view, View::Authenticated(Tab::Subscription));
        assert_eq!(state.session.tier(), Tier::Free, "tier unchanged on cancel");
    }

    #[test]
    fn test_confirm_payment_upgrades_exactly_once() {
        let (mut state, _dir) = authenticated_state();
        state.view = View::PaymentPending { tier_id: "business".into() };

        let first = state.confirm_payment();
        assert!(matches!(
            first,
            Some(NetworkCommand::Upgrade { ref tier_id, .. }) if tier_id == "business"
        ));
        assert!(state.confirm_payment().is_none(), "busy flag serializes the upgrade");
    }

    #[test]
    fn test_free_tier_skips_payment() {
        let (mut state, _dir) = authenticated_state();
        state.session.set_tier(Tier::Business);
        state.view = View::Authenticated(Tab::Subscription);
        state.dashboard.tiers = Some(tiers_catalog());
        state.selected_row = 0; // free

        let cmd = state.choose_tier();
        assert!(matches!(cmd, Some(NetworkCommand::Upgrade { ref tier_id, .. }) if tier_id == "free"));
    }

    #[test]
    fn test_upgrade_success_updates_tier_and_refreshes() {
        let (mut state, _dir) = authenticated_state();
        state.view = View::PaymentPending { tier_id: "business".into() };
        let cmd = state.confirm_payment().unwrap();

        let follow_up = state.handle_response(NetworkResponse::Upgraded {
            id: cmd_id(&cmd),
            tier: Tier::Business,
        });
        assert_eq!(state.session.tier(), Tier::Business);
        assert_eq!(state.view, View::Authenticated(Tab::Subscription));
        assert_eq!(follow_up.len(), 4);
        assert!(!state.busy);
    }

    #[test]
    fn test_upload_success_triggers_cascade() {
        let (mut state, _dir) = authenticated_state();
        state.dashboard.genres = Some(vec![GenreOption {
            id: "novel".into(),
            name: "Novel".into(),
            description: String::new(),
            allowed: true,
        }]);
        state.upload.file_path = "draft.docx".into();
        state.upload.genre = Some("novel".into());

        let cmd = state.submit_upload().unwrap();
        assert!(state.busy);

        let follow_up = state.handle_response(NetworkResponse::Uploaded {
            id: cmd_id(&cmd),
            file_id: "f-1".into(),
        });
        assert!(!state.busy);
        assert_eq!(state.last_file_id.as_deref(), Some("f-1"));
        assert_eq!(follow_up.len(), 4);
    }

    #[test]
    fn test_blocked_genre_redirects_to_subscription() {
        let (mut state, _dir) = authenticated_state();
        state.dashboard.genres = Some(vec![GenreOption {
            id: "poetry".into(),
            name: "Poetry".into(),
            description: String::new(),
            allowed: false,
        }]);
        state.upload.file_path = "draft.docx".into();
        state.upload.genre = Some("poetry".into());

        assert!(state.submit_upload().is_none());
        assert_eq!(state.view, View::Authenticated(Tab::Subscription));
        assert!(state.error.as_deref().unwrap().contains("Poetry"));
    }

    #[test]
    fn test_quota_rejection_comes_from_server_not_client() {
        // Usage at the limit must not block the submission client-side;
        // only the server's quota rejection stops it.
        let (mut state, _dir) = authenticated_state();
        state.dashboard.usage = Some(UsageSnapshot {
            current_usage: 2,
            limit: 2,
            tier: Tier::Free,
        });
        state.dashboard.genres = Some(vec![GenreOption {
            id: "novel".into(),
            name: "Novel".into(),
            description: String::new(),
            allowed: true,
        }]);
        state.upload.file_path = "draft.docx".into();
        state.upload.genre = Some("novel".into());

        let cmd = state.submit_upload();
        assert!(cmd.is_some(), "client must not preemptively enforce the quota");

        state.handle_response(NetworkResponse::Failed {
            id: cmd_id(&cmd.unwrap()),
            error: ApiError::Request("Monthly upload limit reached".into()),
        });
        assert_eq!(state.error.as_deref(), Some("Monthly upload limit reached"));
        assert!(!state.busy);
    }

    #[test]
    fn test_unauthorized_on_history_forces_landing() {
        let (mut state, _dir) = authenticated_state();
        state.view = View::Authenticated(Tab::History);
        let cmds = state.begin_refresh();
        let history_id = cmds
            .iter()
            .find_map(|c| match c {
                NetworkCommand::FetchHistory { id, .. } => Some(*id),
                _ => None,
            })
            .unwrap();

        state.handle_response(NetworkResponse::Failed {
            id: history_id,
            error: ApiError::Unauthorized,
        });
        assert_eq!(state.view, View::Landing);
        assert!(!state.session.is_authenticated());
        assert!(state.notice.as_deref().unwrap().contains("expired"));
    }

    #[test]
    fn test_late_response_after_logout_is_ignored() {
        let (mut state, _dir) = authenticated_state();
        let cmds = state.begin_refresh();
        let usage_id = cmds
            .iter()
            .find_map(|c| match c {
                NetworkCommand::FetchUsage { id, .. } => Some(*id),
                _ => None,
            })
            .unwrap();

        state.logout();
        state.handle_response(NetworkResponse::Usage {
            id: usage_id,
            usage: UsageSnapshot {
                current_usage: 1,
                limit: 2,
                tier: Tier::Free,
            },
        });
        assert!(state.dashboard.usage.is_none(), "torn-down session must not absorb the response");
    }

    #[test]
    fn test_stale_cascade_generation_is_dropped() {
        let (mut state, _dir) = authenticated_state();
        let first = state.begin_refresh();
        let stale_usage_id = first
            .iter()
            .find_map(|c| match c {
                NetworkCommand::FetchUsage { id, .. } => Some(*id),
                _ => None,
            })
            .unwrap();

        // A second cascade supersedes the first before it answers
        let _second = state.begin_refresh();
        state.handle_response(NetworkResponse::Usage {
            id: stale_usage_id,
            usage: UsageSnapshot {
                current_usage: 9,
                limit: 10,
                tier: Tier::Free,
            },
        });
        assert!(state.dashboard.usage.is_none());
    }

    #[test]
    fn test_genre_default_is_first_allowed() {
        let (mut state, _dir) = authenticated_state();
        let cmds = state.begin_refresh();
        let genres_id = cmds
            .iter()
            .find_map(|c| match c {
                NetworkCommand::FetchGenres { id, .. } => Some(*id),
                _ => None,
            })
            .unwrap();

        state.handle_response(NetworkResponse::Genres {
            id: genres_id,
            genres: vec![
                GenreOption {
                    id: "poetry".into(),
                    name: "Poetry".into(),
                    description: String::new(),
                    allowed: false,
                },
                GenreOption {
                    id: "novel".into(),
                    name: "Novel".into(),
                    description: String::new(),
                    allowed: true,
                },
            ],
        });
        assert_eq!(state.upload.genre.as_deref(), Some("novel"));
    }

    #[test]
    fn test_empty_genre_catalog_leaves_selection_unset() {
        let (mut state, _dir) = authenticated_state();
        let cmds = state.begin_refresh();
        let genres_id = cmds
            .iter()
            .find_map(|c| match c {
                NetworkCommand::FetchGenres { id, .. } => Some(*id),
                _ => None,
            })
            .unwrap();

        state.handle_response(NetworkResponse::Genres {
            id: genres_id,
            genres: Vec::new(),
        });
        assert!(state.upload.genre.is_none());
        assert!(state.submit_upload().is_none(), "submission disabled with no genres");
    }

    #[test]
    fn test_dashboard_renders_only_after_all_four() {
        let (mut state, _dir) = authenticated_state();
        let cmds = state.begin_refresh();
        assert!(!state.dashboard.ready());

        for cmd in &cmds {
            let id = cmd_id(cmd);
            let response = match cmd {
                NetworkCommand::FetchTiers { .. } => NetworkResponse::Tiers { id, tiers: tiers_catalog() },
                NetworkCommand::FetchGenres { .. } => NetworkResponse::Genres { id, genres: Vec::new() },
                NetworkCommand::FetchUsage { .. } => NetworkResponse::Usage {
                    id,
                    usage: UsageSnapshot { current_usage: 1, limit: 2, tier: Tier::Free },
                },
                NetworkCommand::FetchHistory { .. } => NetworkResponse::History { id, entries: Vec::new() },
                _ => unreachable!(),
            };
            assert!(!state.dashboard.ready());
            state.handle_response(response);
        }
        assert!(state.dashboard.ready());
        assert!((state.dashboard.usage.as_ref().unwrap().ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_refresh_keeps_previous_data_regated_as_stale() {
        let (mut state, _dir) = authenticated_state();
        let cmds = state.begin_refresh();
        for cmd in &cmds {
            let id = cmd_id(cmd);
            let response = match cmd {
                NetworkCommand::FetchTiers { .. } => NetworkResponse::Tiers { id, tiers: tiers_catalog() },
                NetworkCommand::FetchGenres { .. } => NetworkResponse::Genres { id, genres: Vec::new() },
                NetworkCommand::FetchUsage { .. } => NetworkResponse::Usage {
                    id,
                    usage: UsageSnapshot { current_usage: 1, limit: 2, tier: Tier::Free },
                },
                NetworkCommand::FetchHistory { .. } => NetworkResponse::History { id, entries: Vec::new() },
                _ => unreachable!(),
            };
            state.handle_response(response);
        }
        assert!(state.dashboard.ready());

        state.begin_refresh();
        assert!(!state.dashboard.ready(), "new generation re-gates the dashboard");
        assert!(state.dashboard.usage.is_some(), "previous snapshot stays visible as stale");
    }

    #[test]
    fn test_failed_cascade_read_leaves_applied_reads_visible() {
        let (mut state, _dir) = authenticated_state();
        let cmds = state.begin_refresh();
        for cmd in &cmds {
            let id = cmd_id(cmd);
            let response = match cmd {
                NetworkCommand::FetchTiers { .. } => NetworkResponse::Tiers { id, tiers: tiers_catalog() },
                NetworkCommand::FetchGenres { .. } => NetworkResponse::Genres { id, genres: Vec::new() },
                NetworkCommand::FetchUsage { .. } => NetworkResponse::Usage {
                    id,
                    usage: UsageSnapshot { current_usage: 1, limit: 2, tier: Tier::Free },
                },
                NetworkCommand::FetchHistory { .. } => NetworkResponse::Failed {
                    id,
                    error: ApiError::Request("history unavailable".into()),
                },
                _ => unreachable!(),
            };
            state.handle_response(response);
        }
        assert!(!state.dashboard.ready(), "a failed read never completes the gate");
        assert!(state.dashboard.usage.is_some(), "the reads that landed are kept");
        assert_eq!(state.error.as_deref(), Some("history unavailable"));
    }

    #[test]
    fn test_download_refused_until_completed() {
        let (mut state, _dir) = authenticated_state();
        state.view = View::Authenticated(Tab::History);
        state.dashboard.history = Some(vec![HistoryEntry {
            file_id: "f-1".into(),
            original_filename: "draft.docx".into(),
            genre: "novel".into(),
            book_size: "6x9".into(),
            created_at: Utc::now(),
            status: FileStatus::Processing,
        }]);

        assert!(state.download_selected().is_none());
        assert!(state.error.as_deref().unwrap().contains("not ready"));
    }

    #[test]
    fn test_download_completed_entry() {
        let (mut state, _dir) = authenticated_state();
        state.view = View::Authenticated(Tab::History);
        state.dashboard.history = Some(vec![HistoryEntry {
            file_id: "f-1".into(),
            original_filename: "draft.docx".into(),
            genre: "novel".into(),
            book_size: "6x9".into(),
            created_at: Utc::now(),
            status: FileStatus::Completed,
        }]);

        let cmd = state.download_selected();
        assert!(matches!(
            cmd,
            Some(NetworkCommand::Download { ref file_id, .. }) if file_id == "f-1"
        ));
    }

    #[test]
    fn test_register_success_hands_off_to_login() {
        let (mut state, _dir) = fresh_state();
        state.show_register();
        state.register.email = "new@example.com".into();
        state.register.password = "secret".into();

        let cmds = state.submit();
        state.handle_response(NetworkResponse::Registered { id: cmd_id(&cmds[0]) });
        assert_eq!(state.view, View::LoggingIn);
        assert_eq!(state.login.email, "new@example.com");
    }

    #[test]
    fn test_reset_flow_advances_stages() {
        let (mut state, _dir) = fresh_state();
        state.show_forgot_password();
        state.reset.email = "reader@example.com".into();

        let cmds = state.submit();
        state.handle_response(NetworkResponse::ResetRequested { id: cmd_id(&cmds[0]) });
        assert_eq!(state.reset.stage, ResetStage::Confirm);

        state.reset.token = "tok-reset".into();
        state.reset.new_password = "newpass".into();
        let cmds = state.submit();
        state.handle_response(NetworkResponse::PasswordChanged { id: cmd_id(&cmds[0]) });
        assert_eq!(state.view, View::LoggingIn);
    }

    #[test]
    fn test_standards_fetched_once_per_session() {
        let (mut state, _dir) = authenticated_state();
        let cmd = state.switch_tab(Tab::Standards);
        assert!(matches!(cmd, Some(NetworkCommand::FetchStandards { .. })));

        let id = cmd_id(&cmd.unwrap());
        state.handle_response(NetworkResponse::Standards {
            id,
            text: "Margins: 1 inch.".into(),
        });
        assert!(state.switch_tab(Tab::Standards).is_none(), "cached after first fetch");
    }

    #[test]
    fn test_error_cleared_at_next_action() {
        let (mut state, _dir) = authenticated_state();
        state.error = Some("old error".into());
        state.switch_tab(Tab::History);
        assert!(state.error.is_none());
    }
}
