//! Text output for the console: views and update batches become lines.

use gochat_client::render::message_line;
use gochat_client::{MessageLine, RosterItem, Session, Update, View, render};

/// Lines to print for one batch of updates from the active client.
///
/// A redraw (`Connected` or `Conversation`) prints the whole view once.
/// Messages, roster changes and unread counts that follow it in the same
/// batch are already part of that view and are skipped.
pub fn update_lines(
    session: &Session,
    filter: &str,
    updates: &[Update],
    history_limit: usize,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut redrawn = false;

    for update in updates {
        match update {
            Update::Connected | Update::Conversation => {
                if !redrawn {
                    lines.extend(view_lines(&render(session, filter), history_limit));
                    redrawn = true;
                }
            }
            Update::ConnectFailed(message) => lines.push(format!("! {message}")),
            Update::Disconnected => lines.push("-- disconnected --".to_string()),
            Update::Message(_) | Update::Roster | Update::Unread { .. } if redrawn => {}
            Update::Message(message) => lines.push(line_text(&message_line(session, message))),
            Update::Roster => lines.push(format!("({} Online)", session.roster().len())),
            Update::Unread { identifier, count } => {
                lines.push(format!("({identifier}: {count} unread)"))
            }
        }
    }

    lines
}

/// Title bar, roster panel, then the last `history_limit` messages (0 = all).
pub fn view_lines(view: &View, history_limit: usize) -> Vec<String> {
    let lock = if view.encrypted { " [encrypted]" } else { "" };
    let mut lines = vec![format!("=== {}{} | {} ===", view.title, lock, view.online_label)];

    for item in &view.roster {
        lines.push(match item {
            RosterItem::Public {
                label,
                avatar,
                active,
            } => format!("{} ({}) {}", marker(*active), avatar.icon, label),
            RosterItem::User {
                identifier,
                avatar,
                unread,
                active,
                ..
            } => {
                let badge = if *unread > 0 {
                    format!(" [{unread}]")
                } else {
                    String::new()
                };
                format!("{} ({}) {}{}", marker(*active), avatar.icon, identifier, badge)
            }
        });
    }
    lines.push("---".to_string());

    let skip = match history_limit {
        0 => 0,
        limit => view.messages.len().saturating_sub(limit),
    };
    lines.extend(view.messages[skip..].iter().map(line_text));
    lines
}

pub fn line_text(line: &MessageLine) -> String {
    match line {
        MessageLine::Event { text } => format!("  * {text}"),
        MessageLine::Chat {
            sender,
            avatar,
            content,
            timestamp,
            own,
            ..
        } => {
            let at = timestamp
                .as_deref()
                .map(|t| format!("[{t}] "))
                .unwrap_or_default();
            let who = if *own {
                format!("{sender} (you)")
            } else {
                sender.clone()
            };
            format!("  {at}{} {who}: {content}", avatar.icon)
        }
    }
}

fn marker(active: bool) -> &'static str {
    if active { ">" } else { " " }
}
