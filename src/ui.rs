use ratatui::{prelude::*, widgets::*};

use crate::models::{FileStatus, Tier};

/// Renders tabs
pub fn render_tabs<'a>(titles: &[&'a str], selected: usize) -> Tabs<'a> {
    let titles: Vec<Line> = titles.iter().map(|t| Line::from(*t)).collect();

    Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Yellow).bold())
        .divider("|")
}

/// Processing status color
pub fn status_color(status: FileStatus) -> Color {
    match status {
        FileStatus::Pending => Color::DarkGray,
        FileStatus::Processing => Color::Yellow,
        FileStatus::Completed => Color::Green,
        FileStatus::Failed => Color::Red,
    }
}

/// Tier accent color
pub fn tier_color(tier: Tier) -> Color {
    match tier {
        Tier::Free => Color::Gray,
        Tier::Creator => Color::Cyan,
        Tier::Business => Color::Magenta,
    }
}

/// Price label for the subscription list
pub fn format_price(price: f64) -> String {
    if price <= 0.0 {
        "Free".to_string()
    } else {
        format!("${price:.2}/mo")
    }
}

/// Gauge color shifts as the quota fills up
pub fn usage_color(ratio: f64) -> Color {
    if ratio >= 1.0 {
        Color::Red
    } else if ratio >= 0.75 {
        Color::Yellow
    } else {
        Color::Green
    }
}
