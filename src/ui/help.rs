//! Help overlay rendering.
//!
//! Displays keyboard shortcuts in a modal overlay.

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::centered_rect;

/// Key binding entry for the help display.
struct KeyBinding {
    key: &'static str,
    description: &'static str,
}

const GENERAL_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "?",
        description: "Toggle this help",
    },
    KeyBinding {
        key: "q / Esc",
        description: "Quit",
    },
    KeyBinding {
        key: "Ctrl+C",
        description: "Force quit",
    },
    KeyBinding {
        key: "l",
        description: "Switch language (English / 日本語)",
    },
];

const UPLOAD_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "o / Enter",
        description: "Select a MIDI file",
    },
    KeyBinding {
        key: "u",
        description: "Upload the selected file",
    },
    KeyBinding {
        key: "r",
        description: "Dismiss the error and try again",
    },
    KeyBinding {
        key: "c",
        description: "Copy the share link",
    },
];

const BROWSER_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "Up / k",
        description: "Previous entry",
    },
    KeyBinding {
        key: "Down / j",
        description: "Next entry",
    },
    KeyBinding {
        key: "Enter",
        description: "Open directory or choose file",
    },
    KeyBinding {
        key: "Backspace",
        description: "Parent directory",
    },
    KeyBinding {
        key: "Esc",
        description: "Cancel",
    },
];

/// Renders the help overlay.
pub fn render_help(frame: &mut Frame) {
    let area = centered_rect(60, 70, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Help - Keyboard Shortcuts ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let section_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(Color::White);

    let mut lines: Vec<Line<'static>> = Vec::new();
    for (title, bindings) in [
        ("General", GENERAL_BINDINGS),
        ("Upload", UPLOAD_BINDINGS),
        ("File Browser", BROWSER_BINDINGS),
    ] {
        lines.push(Line::from(Span::styled(title, section_style)));
        for binding in bindings {
            lines.push(Line::from(vec![
                Span::styled(format!("{:12}", binding.key), key_style),
                Span::styled(binding.description, desc_style),
            ]));
        }
        lines.push(Line::from(""));
    }

    frame.render_widget(Paragraph::new(lines), chunks[0]);

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "Close: ?/Esc",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))),
        chunks[1],
    );
}
