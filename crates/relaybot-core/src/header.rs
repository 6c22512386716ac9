//! Sender header prepended to everything forwarded to operators.

use chrono::{DateTime, TimeZone};

use crate::domain::Sender;

const SEPARATOR_WIDTH: usize = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderStyle {
    /// First message of a conversation: name line plus a separator.
    Verbose,
    Compact,
}

/// Render `👤 First Last (@handle) | HH:MM` followed by a blank line.
pub fn render<Tz>(sender: &Sender, at: &DateTime<Tz>, style: HeaderStyle) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let name = match sender.last_name.as_deref().filter(|s| !s.is_empty()) {
        Some(last) => format!("{} {last}", sender.first_name),
        None => sender.first_name.clone(),
    };
    let handle = sender
        .username
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or("no_username");
    let time = at.format("%H:%M");

    match style {
        HeaderStyle::Verbose => format!(
            "👤 {name} (@{handle}) | {time}\n{}\n\n",
            "─".repeat(SEPARATOR_WIDTH)
        ),
        HeaderStyle::Compact => format!("👤 {name} (@{handle}) | {time}\n\n"),
    }
}
