//! Terminal user interface.
//!
//! A single centered column mirrors the upload form: language selector,
//! title, file selection, error alert, privacy notice, upload button, the
//! share link after success, and the deletion notice. The file browser and
//! help are drawn as overlays on top.

mod dialogs;
mod help;

use crate::app::App;
use crate::i18n::{text, LanguageCode, MessageKey};
use crate::presenter::{error_message, selected_label, upload_button_label};
use crate::session::Phase;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

pub use dialogs::render_file_browser;
pub use help::render_help;

/// Widest the form column gets.
const FORM_WIDTH: u16 = 72;

fn key_hint(key: &'static str, enabled: bool) -> Span<'static> {
    let color = if enabled { Color::Yellow } else { Color::DarkGray };
    Span::styled(key, Style::default().fg(color))
}

fn button_style(enabled: bool, color: Color) -> Style {
    if enabled {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

/// Rows a paragraph of `text` needs at `width`, counting wide characters.
fn wrapped_height(text: &str, width: u16) -> u16 {
    let width = width.max(1) as usize;
    let cols: usize = text
        .chars()
        .map(|c| if c.is_ascii() { 1 } else { 2 })
        .sum();
    cols.div_ceil(width).max(1) as u16
}

/// Renders the complete UI.
pub fn render(frame: &mut Frame, app: &App) {
    let size = frame.area();
    let lang = app.language();
    let session = app.session();

    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(size);

    let column = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(FORM_WIDTH.min(outer[0].width)),
            Constraint::Min(0),
        ])
        .split(outer[0])[1];

    let inner_width = column.width.saturating_sub(2);
    let error_text = session.error().map(|e| error_message(lang, e));
    let success_url = match session.phase() {
        Phase::Succeeded { location } => Some(location.as_str()),
        _ => None,
    };
    let privacy = text(lang, MessageKey::Privacy);
    let deletion = text(lang, MessageKey::Deletion);

    let mut constraints = vec![
        Constraint::Length(1), // Language selector
        Constraint::Length(1), // Spacer
        Constraint::Length(1), // Title
        Constraint::Length(1), // Spacer
        Constraint::Length(1), // Select button
        Constraint::Length(1), // Selected file
    ];
    if let Some(error_text) = &error_text {
        constraints.push(Constraint::Length(wrapped_height(error_text, inner_width) + 3));
    }
    constraints.push(Constraint::Length(wrapped_height(privacy, column.width)));
    constraints.push(Constraint::Length(1)); // Spacer
    constraints.push(Constraint::Length(1)); // Upload button
    if success_url.is_some() {
        constraints.push(Constraint::Length(5));
    }
    constraints.push(Constraint::Length(1)); // Spacer
    constraints.push(Constraint::Length(wrapped_height(deletion, column.width)));
    constraints.push(Constraint::Min(0));

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(column);

    let mut row = 0;
    let mut next = || {
        let area = rows[row];
        row += 1;
        area
    };

    render_language_selector(frame, next(), lang);
    next();
    frame.render_widget(
        Paragraph::new(Span::styled(
            text(lang, MessageKey::Title),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        next(),
    );
    next();

    let can_choose = app.can_choose();
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            key_hint("[o] ", can_choose),
            Span::styled(
                text(lang, MessageKey::SelectFile),
                button_style(can_choose, Color::Cyan),
            ),
            if app.is_reading() {
                Span::styled(format!(" {}", app.spinner()), Style::default().fg(Color::Cyan))
            } else {
                Span::raw("")
            },
        ]))
        .alignment(Alignment::Center),
        next(),
    );

    let selected_area = next();
    if let Some(selected) = session.selected() {
        frame.render_widget(
            Paragraph::new(selected_label(lang, &selected.file)).alignment(Alignment::Center),
            selected_area,
        );
    }

    if let Some(error_text) = error_text {
        render_error_alert(frame, next(), lang, &error_text);
    }

    frame.render_widget(
        Paragraph::new(privacy)
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        next(),
    );
    next();

    let can_upload = app.can_upload();
    let uploading = session.is_uploading();
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            if uploading {
                Span::styled(format!("{} ", app.spinner()), Style::default().fg(Color::Green))
            } else {
                key_hint("[u] ", can_upload)
            },
            Span::styled(
                upload_button_label(lang, uploading),
                button_style(can_upload || uploading, Color::Green),
            ),
        ]))
        .alignment(Alignment::Center),
        next(),
    );

    if let Some(url) = success_url {
        render_success_panel(frame, next(), lang, url);
    }

    next();
    frame.render_widget(
        Paragraph::new(deletion)
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        next(),
    );

    render_status_line(frame, outer[1], app);

    render_file_browser(frame, app);
    if app.show_help {
        render_help(frame);
    }
}

fn render_language_selector(frame: &mut Frame, area: Rect, current: LanguageCode) {
    let mut spans = vec![key_hint("[l] ", true)];
    for (i, lang) in LanguageCode::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        }
        let style = if *lang == current {
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(lang.native_name(), style));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Right),
        area,
    );
}

fn render_error_alert(frame: &mut Frame, area: Rect, lang: LanguageCode, message: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let lines = vec![
        Line::from(Span::styled(message.to_string(), Style::default().fg(Color::Red))),
        Line::from(vec![
            key_hint("[r] ", true),
            Span::styled(text(lang, MessageKey::Retry), Style::default().fg(Color::White)),
        ]),
    ];

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_success_panel(frame: &mut Frame, area: Rect, lang: LanguageCode, url: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    // The notice and the link go on separate lines so the URL stays intact.
    let lines = vec![
        Line::from(Span::styled(
            text(lang, MessageKey::Success),
            Style::default().fg(Color::Green),
        )),
        Line::from(Span::styled(
            url.to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::UNDERLINED),
        )),
        Line::from(vec![
            key_hint("[c] ", true),
            Span::styled(text(lang, MessageKey::Copy), Style::default().fg(Color::White)),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status_line(frame: &mut Frame, area: Rect, app: &App) {
    let line = match &app.status_message {
        Some((message, _)) => Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::from(vec![
            Span::styled("[?]", Style::default().fg(Color::Yellow)),
            Span::styled(" Help  ", Style::default().fg(Color::DarkGray)),
            Span::styled("[q]", Style::default().fg(Color::Yellow)),
            Span::styled(" Quit", Style::default().fg(Color::DarkGray)),
        ]),
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Helper function to center a rectangle within another rectangle.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
