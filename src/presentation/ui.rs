use crate::application::{
    App, AppMode, InputBuffer, NotificationKind, SuggestionDialog, SuggestionStatus,
};
use crate::domain::{FieldId, FieldKind, Step};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
};

pub fn render_ui(f: &mut Frame, app: &App) {
    if matches!(app.mode, AppMode::Crashed) {
        render_crash_screen(f, app);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(7),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_progress(f, app, chunks[1]);
    render_form(f, app, chunks[2]);
    render_field_detail(f, app, chunks[3]);
    render_status_bar(f, app, chunks[4]);

    match app.mode {
        AppMode::Help => render_help_popup(f, app.help_scroll),
        AppMode::Suggestion => {
            if let Some(dialog) = &app.suggestion {
                render_suggestion_popup(f, dialog);
            }
        }
        AppMode::Submitting => render_submitting_overlay(f),
        _ => {}
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let step = app.step();
    let header = Paragraph::new(format!(
        "Social Support Application | Step {} of {}: {}",
        step.number(),
        Step::ALL.len(),
        step.title()
    ))
    .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

fn render_progress(f: &mut Frame, app: &App, area: Rect) {
    let current = app.step();
    let mut spans = Vec::new();
    for (index, step) in Step::ALL.into_iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled(" ── ", Style::default().fg(Color::DarkGray)));
        }
        let (marker, style) = if step < current {
            ("✔", Style::default().fg(Color::Green))
        } else if step == current {
            (
                "●",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            ("○", Style::default().fg(Color::DarkGray))
        };
        spans.push(Span::styled(
            format!("{marker} {}. {}", step.number(), step.title()),
            style,
        ));
    }

    let progress = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Progress"));
    f.render_widget(progress, area);
}

fn render_form(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focused_field();
    let mut rows = Vec::new();

    for field in app.step().fields() {
        let is_focused = *field == focused;
        let error = app.field_errors.get(*field);

        let label_style = match (is_focused, error.is_some()) {
            (true, _) => Style::default().bg(Color::Blue).fg(Color::White),
            (false, true) => Style::default().fg(Color::Red),
            (false, false) => Style::default().fg(Color::Yellow),
        };
        let marker = if is_focused { "▸ " } else { "  " };

        let value = if is_focused && matches!(app.mode, AppMode::Editing) {
            app.input.text().to_string()
        } else {
            app.forms.value(*field)
        };
        let value_cell = match field.kind() {
            FieldKind::Choice => format!("‹ {} ›", placeholder(&value, "select")),
            FieldKind::LongText => single_line(&value),
            _ => value,
        };

        rows.push(Row::new(vec![
            Cell::from(format!("{marker}{}", field.label())).style(label_style),
            Cell::from(value_cell),
        ]));
        if let Some(message) = error {
            rows.push(Row::new(vec![
                Cell::from(""),
                Cell::from(format!("⚠ {message}")).style(Style::default().fg(Color::Red)),
            ]));
        }
    }

    let title = format!("{} ({})", app.step().title(), app.step().section().key());
    let table = Table::new(rows, [Constraint::Length(32), Constraint::Min(10)])
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(1);
    f.render_widget(table, area);
}

fn render_field_detail(f: &mut Frame, app: &App, area: Rect) {
    let field = app.focused_field();
    let mut lines = Vec::new();

    if matches!(app.mode, AppMode::Editing) {
        lines.push(cursor_line(&app.input));
    } else {
        let value = app.forms.value(field);
        lines.push(Line::from(placeholder(&value, "(empty)").to_string()));
    }
    if let Some(message) = app.field_errors.get(field) {
        lines.push(Line::styled(message.to_string(), Style::default().fg(Color::Red)));
    }
    lines.push(Line::styled(field_hint(field), Style::default().fg(Color::DarkGray)));

    let style = if matches!(app.mode, AppMode::Editing) {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };
    let detail = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(field.label()))
        .style(style)
        .wrap(Wrap { trim: false });
    f.render_widget(detail, area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let (text, style) = match (&app.mode, &app.notification) {
        (AppMode::Normal, Some(notification)) => (
            notification.message.clone(),
            match notification.kind {
                NotificationKind::Success => Style::default().fg(Color::Green),
                NotificationKind::Error => Style::default().fg(Color::Red),
                NotificationKind::Info => Style::default().fg(Color::Cyan),
            },
        ),
        (AppMode::Normal, None) => {
            let next = if app.step() == Step::Three { "submit" } else { "next" };
            let mut text = format!(
                "Enter: edit | ←→: choose | Ctrl+N: {next} | Ctrl+B: back | F1/?: help | q: quit"
            );
            if app.focused_field().supports_suggestions() {
                text.push_str(" | Ctrl+G: help me write");
            }
            (text, Style::default())
        }
        (AppMode::Editing, _) => (
            "Editing (Enter to save, Esc to cancel)".to_string(),
            Style::default().fg(Color::Green),
        ),
        (AppMode::Suggestion, _) => (
            "Ctrl+A: accept | Ctrl+E: accept and edit | Esc: discard".to_string(),
            Style::default().fg(Color::Magenta),
        ),
        (AppMode::Submitting, _) => (
            "Submitting application...".to_string(),
            Style::default().fg(Color::Yellow),
        ),
        (AppMode::Help, _) => (
            "↑↓/jk: scroll | PgUp/PgDn: fast scroll | Home: top | Esc/q: close help".to_string(),
            Style::default().fg(Color::Cyan),
        ),
        (AppMode::Crashed, _) => (String::new(), Style::default()),
    };

    let status = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(style);
    f.render_widget(status, area);
}

fn render_suggestion_popup(f: &mut Frame, dialog: &SuggestionDialog) {
    let popup_area = centered_rect(70, 60, f.area());
    f.render_widget(Clear, popup_area);

    let mut lines = Vec::new();
    match &dialog.status {
        SuggestionStatus::Loading => {
            lines.push(Line::styled(
                "Generating a suggestion...",
                Style::default().fg(Color::Yellow),
            ));
            lines.push(Line::from(""));
            lines.push(Line::styled(
                "Esc cancels the request.",
                Style::default().fg(Color::DarkGray),
            ));
        }
        SuggestionStatus::Ready => lines.push(cursor_line(&dialog.buffer)),
        SuggestionStatus::Failed(error) => {
            lines.push(Line::styled(error.to_string(), Style::default().fg(Color::Red)));
            lines.push(Line::from(""));
            lines.push(Line::styled(
                "You can type your own text below, or press Esc to close.",
                Style::default().fg(Color::DarkGray),
            ));
            lines.push(Line::from(""));
            lines.push(cursor_line(&dialog.buffer));
        }
    }

    let accept_hint = if dialog.can_accept() {
        "Ctrl+A: accept | Ctrl+E: accept and edit | Esc: discard"
    } else {
        "Esc: discard"
    };
    let popup = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Suggestion for {}", dialog.field.label()))
                .title_bottom(accept_hint)
                .style(Style::default().fg(Color::Magenta)),
        )
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: false });
    f.render_widget(popup, popup_area);
}

fn render_submitting_overlay(f: &mut Frame) {
    let area = centered_rect(40, 20, f.area());
    f.render_widget(Clear, area);
    let overlay = Paragraph::new("Submitting your application, please wait...")
        .block(Block::default().borders(Borders::ALL).title("Submitting"))
        .style(Style::default().fg(Color::Yellow))
        .wrap(Wrap { trim: true });
    f.render_widget(overlay, area);
}

fn render_crash_screen(f: &mut Frame, app: &App) {
    let message = app.crash_message.as_deref().unwrap_or("unknown error");
    let lines = vec![
        Line::styled(
            "Something went wrong.",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Line::from(""),
        Line::from(message.to_string()),
        Line::from(""),
        Line::from("Your last saved answers are safe on disk."),
        Line::from(""),
        Line::styled("r: reload saved application | q: quit", Style::default().fg(Color::Cyan)),
    ];
    let screen = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Error"))
        .wrap(Wrap { trim: false });
    f.render_widget(screen, centered_rect(60, 50, f.area()));
}

fn render_help_popup(f: &mut Frame, scroll: usize) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    };

    f.render_widget(Clear, popup_area);

    let help_text = get_help_text();
    let help_lines: Vec<&str> = help_text.lines().collect();
    let visible_height = popup_area.height.saturating_sub(2) as usize;

    let start_line = scroll.min(help_lines.len().saturating_sub(visible_height));
    let end_line = (start_line + visible_height).min(help_lines.len());

    let visible_text = help_lines[start_line..end_line].join("\n");

    let help_widget = Paragraph::new(visible_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(
                    "Help (Line {}/{})",
                    start_line + 1,
                    help_lines.len()
                ))
                .style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White));

    f.render_widget(help_widget, popup_area);
}

/// Number of lines in the help text, for scroll clamping.
pub fn help_line_count() -> usize {
    get_help_text().lines().count()
}

fn get_help_text() -> &'static str {
    r#"SOCIAL SUPPORT APPLICATION

=== HOW IT WORKS ===
The application has three steps:
  1. Personal Information
  2. Family & Financial Info
  3. Situation Descriptions
Each step is checked when you move forward. Your answers are saved
on this computer every time a step is accepted, so you can quit and
come back later. After a successful submission the saved answers are
cleared.

=== MOVING AROUND ===
↑↓ or j/k       Move between fields
Tab/Shift+Tab   Move between fields
Enter/F2        Edit the selected text field
←→, h/l, Space  Change the selected choice field
Backspace/Del   Clear the selected text field
Ctrl+N          Check this step and continue (submit on step 3)
Ctrl+B          Go back one step (unsaved edits on this step are lost)
F1 or ?         Show this help
q               Quit

=== EDITING A FIELD ===
Enter           Keep the new text
Esc             Cancel and keep the old text
←→ Home/End     Move the cursor

=== HELP ME WRITE (STEP 3) ===
Ctrl+G          Ask the AI assistant to draft the selected description
                from the notes already typed in the field.
In the suggestion window:
Typing          Edit the suggested text
Ctrl+A          Use the suggestion
Ctrl+E          Use the suggestion and keep editing it
Esc             Discard it (a running request is cancelled)
The assistant needs OPENAI_API_KEY to be set. If it fails, the rest
of the form keeps working and you can write the text yourself.

=== RULES ===
All fields are required.
Date of birth uses YYYY-MM-DD and you must be at least 18 years old.
Email must look like name@domain.
Dependents must be a whole number, income a number; neither negative.

=== HELP NAVIGATION ===
↑↓ or j/k       Scroll help text up/down one line
Page Up/Down    Scroll help text up/down 5 lines
Home            Jump to top of help text
Esc/F1/?/q      Close this help window"#
}

fn field_hint(field: FieldId) -> &'static str {
    match field.kind() {
        FieldKind::Choice => "Use ←/→ or Space to choose an option.",
        FieldKind::Date => "Format: YYYY-MM-DD. Press Enter to edit.",
        FieldKind::Number => "Numbers only. Press Enter to edit.",
        FieldKind::LongText => "Press Enter to edit, or Ctrl+G for writing help.",
        FieldKind::Text => "Press Enter to edit.",
    }
}

fn cursor_line(buffer: &InputBuffer) -> Line<'_> {
    let (before, after) = buffer.split_at_cursor();
    let mut rest = after.chars();
    let under_cursor = rest.next().map(String::from).unwrap_or_else(|| " ".to_string());
    Line::from(vec![
        Span::raw(before),
        Span::styled(under_cursor, Style::default().add_modifier(Modifier::REVERSED)),
        Span::raw(rest.as_str()),
    ])
}

fn placeholder<'a>(value: &'a str, empty: &'a str) -> &'a str {
    if value.is_empty() { empty } else { value }
}

fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
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
        .split(vertical[1])[1]
}
