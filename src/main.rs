//! Bindery TUI - terminal client for the manuscript formatting service
//!
//! Architecture:
//! - UI Layer (Ratatui) - synchronous terminal rendering
//! - App Layer - central state machine processing events
//! - Network Layer (Tokio) - async HTTP execution

mod app;
mod constants;
mod error;
mod messages;
mod models;
mod network;
mod session;
mod ui;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::*};
use tokio::sync::mpsc;

use app::state::{CredField, ResetField, ResetStage, View};
use app::AppActor;
use constants::{API_URL_ENV, APP_NAME, APP_VERSION, DEFAULT_API_URL};
use messages::ui_events::{key_to_ui_event, InputMode, Tab};
use messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
use network::{Gateway, NetworkActor};
use ui::{format_price, render_tabs, status_color, tier_color, usage_color};

/// Terminal cleanup guard
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging to file
    let file_appender = tracing_appender::rolling::never(".", "bindery.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (net_cmd_tx, net_cmd_rx) = mpsc::unbounded_channel::<NetworkCommand>();
    let (net_resp_tx, net_resp_rx) = mpsc::unbounded_channel::<NetworkResponse>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn network actor
    let base_url = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    let network_actor = NetworkActor::new(Gateway::new(base_url), net_resp_tx);
    tokio::spawn(network_actor.run(net_cmd_rx));

    // Spawn app actor
    let app_actor = AppActor::new(net_cmd_tx, render_tx);
    tokio::spawn(app_actor.run(ui_rx, net_resp_rx));

    // Run UI loop (synchronous with async polling)
    run_ui_loop(&mut terminal, ui_tx, &mut render_rx).await?;

    Ok(())
}

/// Run the synchronous UI rendering loop
async fn run_ui_loop(
    terminal: &mut Terminal<impl Backend>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut current_state = RenderState::default();

    loop {
        // Draw with current state
        terminal.draw(|f| draw_ui(f, &current_state))?;

        // Poll for events with timeout
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Some(event) = key_to_ui_event(
                    key,
                    current_state.view.kind(),
                    current_state.input_mode,
                    current_state.show_help,
                ) {
                    if matches!(event, UiEvent::Quit) {
                        let _ = ui_tx.send(event);
                        break;
                    }
                    let _ = ui_tx.send(event);
                }
            }
        }

        // Check for state updates (non-blocking)
        while let Ok(state) = render_rx.try_recv() {
            current_state = state;
        }
    }

    Ok(())
}

// ============================================================================
// UI Drawing Functions
// ============================================================================

fn draw_ui(f: &mut Frame, state: &RenderState) {
    let area = f.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header / tab bar
            Constraint::Length(1), // Notice line
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    draw_header(f, state, main_chunks[0]);
    draw_notice_line(f, state, main_chunks[1]);

    match &state.view {
        View::Landing => draw_landing(f, main_chunks[2]),
        View::LoggingIn => draw_credentials_form(f, state, " Sign In ", &state.login, main_chunks[2]),
        View::Registering => {
            draw_credentials_form(f, state, " Create Account ", &state.register, main_chunks[2])
        }
        View::ResettingPassword => draw_reset_form(f, state, main_chunks[2]),
        View::GoogleSignIn => draw_google_form(f, state, main_chunks[2]),
        View::Authenticated(tab) => draw_authenticated(f, state, *tab, main_chunks[2]),
        View::PaymentPending { tier_id } => draw_payment(f, state, tier_id, main_chunks[2]),
    }

    draw_status_bar(f, state, main_chunks[3]);

    if state.show_help {
        draw_help_popup(f, state, area);
    }
}

fn draw_header(f: &mut Frame, state: &RenderState, area: Rect) {
    match &state.view {
        View::Authenticated(tab) => {
            let selected = match tab {
                Tab::Upload => 0,
                Tab::History => 1,
                Tab::Subscription => 2,
                Tab::Standards => 3,
            };
            let titles = [" 1:Upload ", " 2:History ", " 3:Subscription ", " 4:Standards "];
            f.render_widget(render_tabs(&titles, selected), area);
        }
        _ => {
            let title = Line::from(vec![
                Span::styled(" Bindery ", Style::default().fg(Color::Black).bg(Color::Cyan).bold()),
                Span::styled(" Manuscript Formatter", Style::default().fg(Color::Gray)),
                Span::styled(format!(" v{APP_VERSION}"), Style::default().fg(Color::DarkGray)),
            ]);
            f.render_widget(Paragraph::new(title), area);
        }
    }
}

fn draw_notice_line(f: &mut Frame, state: &RenderState, area: Rect) {
    let line = if let Some(error) = &state.error {
        Line::from(Span::styled(
            format!(" {error}"),
            Style::default().fg(Color::Red),
        ))
    } else if let Some(notice) = &state.notice {
        Line::from(Span::styled(
            format!(" {notice}"),
            Style::default().fg(Color::Green),
        ))
    } else if state.busy {
        Line::from(Span::styled(" Working...", Style::default().fg(Color::Yellow)))
    } else {
        Line::default()
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_landing(f: &mut Frame, area: Rect) {
    let content = "\
Format your manuscript for KDP and Google Books publishing.

  l / Enter   Sign in
  r           Create an account
  g           Sign in with Google
  f           Forgot password

  ?           Help
  q           Quit";

    let block = Block::default().borders(Borders::ALL).title(" Welcome ");
    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, centered_rect(60, 60, area));
}

fn input_border(is_focused: bool, editing: bool) -> Style {
    if is_focused && editing {
        Style::default().fg(Color::Yellow)
    } else if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

/// Character column of a byte cursor, so multibyte input places the
/// terminal cursor correctly
fn cursor_col(text: &str, cursor: usize) -> usize {
    text.get(..cursor)
        .map(|s| s.chars().count())
        .unwrap_or_else(|| text.chars().count())
}

fn draw_input_box(
    f: &mut Frame,
    title: &str,
    content: &str,
    is_focused: bool,
    editing: bool,
    cursor_col: usize,
    area: Rect,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(input_border(is_focused, editing))
        .title(title.to_string());
    f.render_widget(Paragraph::new(content).block(block), area);

    if is_focused && editing {
        let max_x = area.x + area.width.saturating_sub(2);
        let col = u16::try_from(cursor_col).unwrap_or(u16::MAX);
        let cursor_x = area.x.saturating_add(1).saturating_add(col).min(max_x);
        f.set_cursor_position(Position::new(cursor_x, area.y + 1));
    }
}

fn draw_credentials_form(
    f: &mut Frame,
    state: &RenderState,
    title: &str,
    form: &app::state::CredentialsForm,
    area: Rect,
) {
    let form_area = centered_rect(60, 50, area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
        ])
        .split(form_area);

    let editing = state.input_mode == InputMode::Editing;
    let masked = "*".repeat(form.password.chars().count());

    draw_input_box(
        f,
        &format!("{title}- Email "),
        &form.email,
        form.focus == CredField::Email,
        editing,
        cursor_col(&form.email, state.cursor_position),
        chunks[0],
    );
    draw_input_box(
        f,
        " Password ",
        &masked,
        form.focus == CredField::Password,
        editing,
        cursor_col(&form.password, state.cursor_position),
        chunks[1],
    );

    let hint = Paragraph::new("Tab: next field | Enter: submit | Esc: back")
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(hint, chunks[2]);
}

fn draw_reset_form(f: &mut Frame, state: &RenderState, area: Rect) {
    let form_area = centered_rect(60, 60, area);
    let editing = state.input_mode == InputMode::Editing;

    match state.reset.stage {
        ResetStage::Request => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(1)])
                .split(form_area);

            draw_input_box(
                f,
                " Reset Password - Email ",
                &state.reset.email,
                state.reset.focus == ResetField::Email,
                editing,
                cursor_col(&state.reset.email, state.cursor_position),
                chunks[0],
            );

            let hint = Paragraph::new("Enter: request reset token | Esc: back")
                .style(Style::default().fg(Color::DarkGray));
            f.render_widget(hint, chunks[1]);
        }
        ResetStage::Confirm => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Length(3),
                    Constraint::Min(1),
                ])
                .split(form_area);

            let masked = "*".repeat(state.reset.new_password.chars().count());
            draw_input_box(
                f,
                " Reset Token ",
                &state.reset.token,
                state.reset.focus == ResetField::Token,
                editing,
                cursor_col(&state.reset.token, state.cursor_position),
                chunks[0],
            );
            draw_input_box(
                f,
                " New Password ",
                &masked,
                state.reset.focus == ResetField::NewPassword,
                editing,
                cursor_col(&state.reset.new_password, state.cursor_position),
                chunks[1],
            );

            let hint = Paragraph::new("Tab: next field | Enter: set password | Esc: back")
                .style(Style::default().fg(Color::DarkGray));
            f.render_widget(hint, chunks[2]);
        }
    }
}

fn draw_google_form(f: &mut Frame, state: &RenderState, area: Rect) {
    let form_area = centered_rect(70, 50, area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(form_area);

    draw_input_box(
        f,
        " Google Sign-In - ID Token ",
        &state.google.id_token,
        true,
        state.input_mode == InputMode::Editing,
        cursor_col(&state.google.id_token, state.cursor_position),
        chunks[0],
    );

    let hint = Paragraph::new(
        "Paste the ID token issued by your Google sign-in flow.\nEnter: sign in | Esc: back",
    )
    .style(Style::default().fg(Color::DarkGray))
    .wrap(Wrap { trim: false });
    f.render_widget(hint, chunks[1]);
}

fn draw_authenticated(f: &mut Frame, state: &RenderState, tab: Tab, area: Rect) {
    match tab {
        Tab::Upload => draw_upload_tab(f, state, area),
        Tab::History => draw_history_tab(f, state, area),
        Tab::Subscription => draw_subscription_tab(f, state, area),
        Tab::Standards => draw_standards_tab(f, state, area),
    }
}

/// Placeholder for a dashboard section that has never been fetched
fn draw_refreshing(f: &mut Frame, area: Rect) {
    let paragraph = Paragraph::new("Refreshing account data...")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}

/// Block title, marked stale while retained data awaits the current refresh;
/// a partially-updated dashboard is never rendered as fresh
fn gated_title(base: &str, ready: bool) -> String {
    if ready {
        base.to_string()
    } else {
        format!("{base}[stale] ")
    }
}

fn draw_upload_tab(f: &mut Frame, state: &RenderState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // File path
            Constraint::Length(4), // Book size + font
            Constraint::Min(5),    // Genres
            Constraint::Length(3), // Usage gauge
        ])
        .split(area);

    let busy = if state.busy { " [...]" } else { "" };
    draw_input_box(
        f,
        &format!(" Manuscript (.docx/.pdf){busy} "),
        &state.upload.file_path,
        true,
        state.input_mode == InputMode::Editing,
        cursor_col(&state.upload.file_path, state.cursor_position),
        chunks[0],
    );

    // Formatting options
    let options = vec![
        Line::from(vec![
            Span::styled("Book size: ", Style::default().fg(Color::Gray)),
            Span::styled(state.upload.book_size.label(), Style::default().bold()),
            Span::styled("  (b to change)", Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(vec![
            Span::styled("Font:      ", Style::default().fg(Color::Gray)),
            Span::styled(state.upload.font.as_str(), Style::default().bold()),
            Span::styled("  (f to change)", Style::default().fg(Color::DarkGray)),
        ]),
    ];
    let options_block = Block::default().borders(Borders::ALL).title(" Formatting ");
    f.render_widget(Paragraph::new(options).block(options_block), chunks[1]);

    draw_genre_list(f, state, chunks[2]);
    draw_usage_gauge(f, state, chunks[3]);
}

fn draw_genre_list(f: &mut Frame, state: &RenderState, area: Rect) {
    let Some(genres) = state.genres.as_deref() else {
        draw_refreshing(f, area);
        return;
    };

    let items: Vec<ListItem> = genres
        .iter()
        .map(|g| {
            let selected = state.upload.genre.as_deref() == Some(g.id.as_str());
            let marker = if selected { "(*)" } else { "( )" };
            let mut style = if selected {
                Style::default().fg(Color::Yellow).bold()
            } else {
                Style::default()
            };
            let lock = if g.allowed {
                ""
            } else {
                style = Style::default().fg(Color::DarkGray);
                "  [upgrade required]"
            };
            ListItem::new(format!("{marker} {} - {}{lock}", g.name, g.description)).style(style)
        })
        .collect();

    let title = if genres.is_empty() {
        gated_title(" Genre (none available) ", state.dashboard_ready)
    } else {
        gated_title(" Genre (g/G to select) ", state.dashboard_ready)
    };
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(list, area);
}

fn draw_usage_gauge(f: &mut Frame, state: &RenderState, area: Rect) {
    let Some(usage) = &state.usage else {
        draw_refreshing(f, area);
        return;
    };

    let ratio = usage.ratio();
    let title = gated_title(
        &format!(" Monthly usage ({} plan) ", usage.tier.as_str()),
        state.dashboard_ready,
    );
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .gauge_style(Style::default().fg(usage_color(ratio)))
        .ratio(ratio)
        .label(format!("{} / {} uploads", usage.current_usage, usage.limit));
    f.render_widget(gauge, area);
}

fn draw_history_tab(f: &mut Frame, state: &RenderState, area: Rect) {
    let Some(entries) = state.history.as_deref() else {
        draw_refreshing(f, area);
        return;
    };

    if entries.is_empty() {
        let paragraph = Paragraph::new("No uploads yet. Format your first manuscript from the Upload tab.")
            .style(Style::default().fg(Color::DarkGray))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(gated_title(" History ", state.dashboard_ready)),
            );
        f.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = entries
        .iter()
        .map(|entry| {
            let status_span = Span::styled(
                format!("{:<10}", entry.status.as_str()),
                Style::default().fg(status_color(entry.status)),
            );
            let detail = Span::raw(format!(
                " {}  {}  {}  {}",
                entry.created_at.format("%Y-%m-%d %H:%M"),
                entry.original_filename,
                entry.genre,
                entry.book_size,
            ));
            ListItem::new(Line::from(vec![status_span, detail]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(gated_title(" History (Enter/d: download completed) ", state.dashboard_ready)),
        )
        .highlight_style(Style::default().fg(Color::Yellow).bold())
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    list_state.select(Some(state.selected_row));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_subscription_tab(f: &mut Frame, state: &RenderState, area: Rect) {
    let Some(tiers) = state.tiers.as_deref() else {
        draw_refreshing(f, area);
        return;
    };

    let items: Vec<ListItem> = tiers
        .iter()
        .map(|tier| {
            let current = state.tier.as_str() == tier.id;
            let marker = if current { " (current)" } else { "" };
            let name_span = Span::styled(
                format!("{:<10}", tier.name),
                Style::default()
                    .fg(models::Tier::parse(&tier.id).map(tier_color).unwrap_or(Color::White))
                    .bold(),
            );
            let detail = Span::raw(format!(
                " {:<10} {} uploads/mo  genres: {}{marker}",
                format_price(tier.price),
                tier.monthly_limit,
                tier.allowed_genres.join(", "),
            ));
            ListItem::new(Line::from(vec![name_span, detail]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(gated_title(" Subscription (Enter: choose plan) ", state.dashboard_ready)),
        )
        .highlight_style(Style::default().fg(Color::Yellow).bold())
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    list_state.select(Some(state.selected_row));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_standards_tab(f: &mut Frame, state: &RenderState, area: Rect) {
    let content = state
        .standards
        .as_deref()
        .unwrap_or("Loading formatting standards...");

    let paragraph = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Formatting Standards "),
        )
        .wrap(Wrap { trim: false })
        .scroll((state.scroll, 0));
    f.render_widget(paragraph, area);
}

fn draw_payment(f: &mut Frame, state: &RenderState, tier_id: &str, area: Rect) {
    let popup_area = centered_rect(60, 40, area);

    let detail = state
        .tiers
        .as_deref()
        .and_then(|tiers| tiers.iter().find(|t| t.id == tier_id))
        .map(|t| format!("{} plan at {}", t.name, format_price(t.price)))
        .unwrap_or_else(|| format!("{tier_id} plan"));

    let content = format!(
        "You are subscribing to the {detail}.\n\n\
         Enter    Complete Subscription\n\
         Esc      Cancel"
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Confirm Subscription ")
        .style(Style::default().bg(Color::Black));
    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(paragraph, popup_area);
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let status = match &state.view {
        View::Landing => " l:sign in | r:register | g:google | f:forgot password | q:quit ",
        View::LoggingIn | View::Registering | View::ResettingPassword | View::GoogleSignIn => {
            if state.input_mode == InputMode::Editing {
                " Tab:next field | Enter:submit | Esc:stop editing "
            } else {
                " e:edit | Tab:next field | Enter:submit | Esc:back "
            }
        }
        View::Authenticated(Tab::Upload) => {
            " e:file | b:size | f:font | g:genre | s:format | 1-4:tabs | r:refresh | o:sign out "
        }
        View::Authenticated(Tab::History) => {
            " up/down:select | d:download | 1-4:tabs | r:refresh | o:sign out "
        }
        View::Authenticated(Tab::Subscription) => {
            " up/down:select | Enter:choose plan | 1-4:tabs | r:refresh | o:sign out "
        }
        View::Authenticated(Tab::Standards) => {
            " up/down:scroll | 1-4:tabs | r:refresh | o:sign out "
        }
        View::PaymentPending { .. } => " Enter:complete subscription | Esc:cancel ",
    };

    let bar = Paragraph::new(status).style(Style::default().fg(Color::DarkGray));
    f.render_widget(bar, area);
}

fn draw_help_popup(f: &mut Frame, state: &RenderState, area: Rect) {
    let popup_area = centered_rect(60, 70, area);

    let help_text = match &state.view {
        View::Authenticated(_) => {
            r#"
 BINDERY TUI - Keyboard Shortcuts

 TABS
   1 / 2 / 3 / 4      Upload, History, Subscription, Standards

 UPLOAD
   e                  Edit manuscript path
   b / f              Cycle book size / font
   g / G              Next / previous genre
   s / Enter          Submit for formatting

 HISTORY
   Up / Down          Select entry
   d / Enter          Download formatted file

 SUBSCRIPTION
   Up / Down          Select plan
   Enter              Choose plan

 GENERAL
   r                  Refresh account data
   o                  Sign out
   ?                  Toggle this help
   q / Ctrl+C         Quit

 Press any key to close..."#
        }
        _ => {
            r#"
 BINDERY TUI - Keyboard Shortcuts

 WELCOME
   l / Enter          Sign in
   r                  Create an account
   g                  Sign in with Google
   f                  Forgot password

 FORMS
   e                  Edit focused field
   Tab                Next field
   Enter              Submit
   Esc                Back

 GENERAL
   ?                  Toggle this help
   q / Ctrl+C         Quit

 Press any key to close..."#
        }
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Help - {APP_NAME} "))
        .style(Style::default().bg(Color::Black));
    let help = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_col_counts_chars_not_bytes() {
        let text = "café.pdf";
        let after_accent = "café".len(); // 5 bytes, 4 chars
        assert_eq!(cursor_col(text, after_accent), 4);
        assert_eq!(cursor_col("draft.pdf", 5), 5);
    }

    #[test]
    fn test_cursor_col_clamps_bad_positions() {
        assert_eq!(cursor_col("été", 100), 3);
        // 1 is inside the first multibyte char
        assert_eq!(cursor_col("été", 1), 3);
    }

    #[test]
    fn test_gated_title_marks_stale_data() {
        assert_eq!(gated_title(" History ", true), " History ");
        assert_eq!(gated_title(" History ", false), " History [stale] ");
    }
}
