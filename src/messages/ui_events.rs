//! UI events - messages from UI layer to App layer

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Tabs available once authenticated
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tab {
    #[default]
    Upload,
    History,
    Subscription,
    Standards,
}

/// Discriminant of the current view, enough context for key mapping
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ViewKind {
    #[default]
    Landing,
    LoggingIn,
    Registering,
    ResettingPassword,
    GoogleSignIn,
    Authenticated(Tab),
    PaymentPending,
}

/// Input mode
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
}

/// Events generated from user input in the UI layer
#[derive(Debug, Clone)]
pub enum UiEvent {
    // Tab navigation
    SwitchTab(Tab),

    // Unauthenticated navigation
    ShowLogin,
    ShowRegister,
    ShowForgotPassword,
    ShowGoogleSignIn,
    BackToLanding,

    // Input editing
    StartEditing,
    StopEditing,
    CharInput(char),
    Backspace,
    CursorLeft,
    CursorRight,
    NextField,

    // Form submission (login/register/reset/google, by current view)
    Submit,

    // Session
    Logout,
    Refresh,

    // Upload form
    CycleBookSize,
    CycleFont,
    NextGenre,
    PrevGenre,
    SubmitUpload,

    // List navigation (history entries, subscription tiers)
    NextRow,
    PrevRow,
    DownloadSelected,

    // Subscription / payment
    ChooseTier,
    ConfirmPayment,
    CancelPayment,

    // Scrolling
    ScrollUp,
    ScrollDown,

    // Popups
    ToggleHelp,
    CloseHelp,

    // System
    Quit,
}

/// Convert a key event to a UiEvent based on current UI context
pub fn key_to_ui_event(
    key: KeyEvent,
    view: ViewKind,
    input_mode: InputMode,
    show_help: bool,
) -> Option<UiEvent> {
    use crossterm::event::KeyEventKind;

    if key.kind != KeyEventKind::Press {
        return None;
    }

    // Global Ctrl shortcuts
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if let KeyCode::Char('c') = key.code {
            return Some(UiEvent::Quit);
        }
    }

    if show_help {
        return Some(UiEvent::CloseHelp);
    }

    match view {
        ViewKind::Landing => handle_landing_keys(key),
        ViewKind::LoggingIn
        | ViewKind::Registering
        | ViewKind::ResettingPassword
        | ViewKind::GoogleSignIn => handle_form_keys(key, input_mode),
        ViewKind::Authenticated(tab) => handle_authenticated_keys(key, tab, input_mode),
        ViewKind::PaymentPending => handle_payment_keys(key),
    }
}

fn handle_landing_keys(key: KeyEvent) -> Option<UiEvent> {
    match key.code {
        KeyCode::Char('l') | KeyCode::Enter => Some(UiEvent::ShowLogin),
        KeyCode::Char('r') => Some(UiEvent::ShowRegister),
        KeyCode::Char('f') => Some(UiEvent::ShowForgotPassword),
        KeyCode::Char('g') => Some(UiEvent::ShowGoogleSignIn),
        KeyCode::Char('?') => Some(UiEvent::ToggleHelp),
        KeyCode::Char('q') => Some(UiEvent::Quit),
        _ => None,
    }
}

/// Keys for the credential/reset/google-token forms
fn handle_form_keys(key: KeyEvent, input_mode: InputMode) -> Option<UiEvent> {
    match input_mode {
        InputMode::Normal => match key.code {
            KeyCode::Esc => Some(UiEvent::BackToLanding),
            KeyCode::Char('q') => Some(UiEvent::Quit),
            KeyCode::Char('?') => Some(UiEvent::ToggleHelp),
            KeyCode::Char('e') => Some(UiEvent::StartEditing),
            KeyCode::Tab => Some(UiEvent::NextField),
            KeyCode::Enter => Some(UiEvent::Submit),
            _ => None,
        },
        InputMode::Editing => match key.code {
            KeyCode::Esc => Some(UiEvent::StopEditing),
            KeyCode::Tab => Some(UiEvent::NextField),
            KeyCode::Enter => Some(UiEvent::Submit),
            KeyCode::Left => Some(UiEvent::CursorLeft),
            KeyCode::Right => Some(UiEvent::CursorRight),
            KeyCode::Backspace => Some(UiEvent::Backspace),
            KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
            _ => None,
        },
    }
}

fn handle_authenticated_keys(key: KeyEvent, tab: Tab, input_mode: InputMode) -> Option<UiEvent> {
    if input_mode == InputMode::Editing {
        // Only the upload file-path field is editable
        return match key.code {
            KeyCode::Esc | KeyCode::Enter => Some(UiEvent::StopEditing),
            KeyCode::Left => Some(UiEvent::CursorLeft),
            KeyCode::Right => Some(UiEvent::CursorRight),
            KeyCode::Backspace => Some(UiEvent::Backspace),
            KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
            _ => None,
        };
    }

    // Tab switching works from every authenticated tab
    match key.code {
        KeyCode::Char('1') => return Some(UiEvent::SwitchTab(Tab::Upload)),
        KeyCode::Char('2') => return Some(UiEvent::SwitchTab(Tab::History)),
        KeyCode::Char('3') => return Some(UiEvent::SwitchTab(Tab::Subscription)),
        KeyCode::Char('4') => return Some(UiEvent::SwitchTab(Tab::Standards)),
        KeyCode::Char('q') => return Some(UiEvent::Quit),
        KeyCode::Char('?') => return Some(UiEvent::ToggleHelp),
        KeyCode::Char('o') => return Some(UiEvent::Logout),
        KeyCode::Char('r') => return Some(UiEvent::Refresh),
        _ => {}
    }

    match tab {
        Tab::Upload => match key.code {
            KeyCode::Char('e') => Some(UiEvent::StartEditing),
            KeyCode::Char('b') => Some(UiEvent::CycleBookSize),
            KeyCode::Char('f') => Some(UiEvent::CycleFont),
            KeyCode::Char('g') | KeyCode::Down => Some(UiEvent::NextGenre),
            KeyCode::Char('G') | KeyCode::Up => Some(UiEvent::PrevGenre),
            KeyCode::Char('s') | KeyCode::Enter => Some(UiEvent::SubmitUpload),
            _ => None,
        },
        Tab::History => match key.code {
            KeyCode::Up => Some(UiEvent::PrevRow),
            KeyCode::Down => Some(UiEvent::NextRow),
            KeyCode::Char('d') | KeyCode::Enter => Some(UiEvent::DownloadSelected),
            _ => None,
        },
        Tab::Subscription => match key.code {
            KeyCode::Up => Some(UiEvent::PrevRow),
            KeyCode::Down => Some(UiEvent::NextRow),
            KeyCode::Enter => Some(UiEvent::ChooseTier),
            _ => None,
        },
        Tab::Standards => match key.code {
            KeyCode::Up => Some(UiEvent::ScrollUp),
            KeyCode::Down => Some(UiEvent::ScrollDown),
            _ => None,
        },
    }
}

fn handle_payment_keys(key: KeyEvent) -> Option<UiEvent> {
    match key.code {
        KeyCode::Enter => Some(UiEvent::ConfirmPayment),
        KeyCode::Esc => Some(UiEvent::CancelPayment),
        KeyCode::Char('q') => Some(UiEvent::Quit),
        _ => None,
    }
}
