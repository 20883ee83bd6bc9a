//! App actor - message loop processing UI events and network responses

use tokio::sync::mpsc;

use crate::app::state::AppState;
use crate::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};

/// App actor that processes UI events and network responses
pub struct AppActor {
    state: AppState,
    network_tx: mpsc::UnboundedSender<NetworkCommand>,
    render_tx: mpsc::UnboundedSender<RenderState>,
}

impl AppActor {
    pub fn new(
        network_tx: mpsc::UnboundedSender<NetworkCommand>,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        AppActor {
            state: AppState::new(),
            network_tx,
            render_tx,
        }
    }

    /// Run the actor message loop
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut net_rx: mpsc::UnboundedReceiver<NetworkResponse>,
    ) {
        // Restore any persisted session; a restored session starts with a
        // full refresh cascade
        for cmd in self.state.startup() {
            let _ = self.network_tx.send(cmd);
        }
        let _ = self.render_tx.send(self.state.to_render_state());

        loop {
            tokio::select! {
                Some(event) = ui_rx.recv() => {
                    if self.handle_ui_event(event) {
                        // Quit signal received
                        let _ = self.network_tx.send(NetworkCommand::Shutdown);
                        break;
                    }
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                Some(response) = net_rx.recv() => {
                    for cmd in self.state.handle_response(response) {
                        let _ = self.network_tx.send(cmd);
                    }
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                else => break,
            }
        }
    }

    fn send_all(&self, cmds: Vec<NetworkCommand>) {
        for cmd in cmds {
            let _ = self.network_tx.send(cmd);
        }
    }

    /// Handle a UI event, returns true if quit was requested
    fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        match event {
            // Tab switching
            UiEvent::SwitchTab(tab) => {
                if let Some(cmd) = self.state.switch_tab(tab) {
                    let _ = self.network_tx.send(cmd);
                }
            }

            // Unauthenticated navigation
            UiEvent::ShowLogin => self.state.show_login(),
            UiEvent::ShowRegister => self.state.show_register(),
            UiEvent::ShowForgotPassword => self.state.show_forgot_password(),
            UiEvent::ShowGoogleSignIn => self.state.show_google_sign_in(),
            UiEvent::BackToLanding => self.state.back_to_landing(),

            // Input editing
            UiEvent::StartEditing => self.state.start_editing(),
            UiEvent::StopEditing => self.state.stop_editing(),
            UiEvent::CharInput(c) => self.state.enter_char(c),
            UiEvent::Backspace => self.state.delete_char(),
            UiEvent::CursorLeft => self.state.move_cursor_left(),
            UiEvent::CursorRight => self.state.move_cursor_right(),
            UiEvent::NextField => self.state.next_field(),

            // Forms
            UiEvent::Submit => {
                let cmds = self.state.submit();
                self.send_all(cmds);
            }

            // Session
            UiEvent::Logout => self.state.logout(),
            UiEvent::Refresh => {
                let cmds = self.state.refresh();
                self.send_all(cmds);
            }

            // Upload form
            UiEvent::CycleBookSize => self.state.cycle_book_size(),
            UiEvent::CycleFont => self.state.cycle_font(),
            UiEvent::NextGenre => self.state.next_genre(),
            UiEvent::PrevGenre => self.state.prev_genre(),
            UiEvent::SubmitUpload => {
                if let Some(cmd) = self.state.submit_upload() {
                    let _ = self.network_tx.send(cmd);
                }
            }

            // Lists
            UiEvent::NextRow => self.state.next_row(),
            UiEvent::PrevRow => self.state.prev_row(),
            UiEvent::DownloadSelected => {
                if let Some(cmd) = self.state.download_selected() {
                    let _ = self.network_tx.send(cmd);
                }
            }

            // Subscription / payment
            UiEvent::ChooseTier => {
                if let Some(cmd) = self.state.choose_tier() {
                    let _ = self.network_tx.send(cmd);
                }
            }
            UiEvent::ConfirmPayment => {
                if let Some(cmd) = self.state.confirm_payment() {
                    let _ = self.network_tx.send(cmd);
                }
            }
            UiEvent::CancelPayment => self.state.cancel_payment(),

            // Scrolling
            UiEvent::ScrollUp => self.state.scroll_up(),
            UiEvent::ScrollDown => self.state.scroll_down(),

            // Popups
            UiEvent::ToggleHelp => self.state.toggle_help(),
            UiEvent::CloseHelp => self.state.close_help(),

            // System
            UiEvent::Quit => return true,
        }

        false
    }
}
