use super::ui::help_line_count;
use crate::application::{App, AppMode, Effect, InputBuffer};
use chrono::{Local, NaiveDate};
use crossterm::event::{KeyCode, KeyModifiers};

pub struct InputHandler;

impl InputHandler {
    /// Routes a key press by mode. Returns background work the key started.
    pub fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) -> Option<Effect> {
        Self::handle_key_event_at(app, key, modifiers, Local::now().date_naive())
    }

    /// Same as [`InputHandler::handle_key_event`] with an explicit date for age checks.
    pub fn handle_key_event_at(
        app: &mut App,
        key: KeyCode,
        modifiers: KeyModifiers,
        today: NaiveDate,
    ) -> Option<Effect> {
        match app.mode {
            AppMode::Normal => Self::handle_normal_mode(app, key, modifiers, today),
            AppMode::Editing => {
                Self::handle_editing_mode(app, key);
                None
            }
            AppMode::Suggestion => Self::handle_suggestion_mode(app, key, modifiers),
            AppMode::Help => {
                Self::handle_help_mode(app, key);
                None
            }
            AppMode::Crashed => {
                if key == KeyCode::Char('r') {
                    app.reload();
                }
                None
            }
            // Nothing can change while the application is in flight.
            AppMode::Submitting => None,
        }
    }

    fn handle_normal_mode(
        app: &mut App,
        key: KeyCode,
        modifiers: KeyModifiers,
        today: NaiveDate,
    ) -> Option<Effect> {
        app.notification = None;

        if modifiers.contains(KeyModifiers::CONTROL) {
            return match key {
                KeyCode::Char('n') => app.next_step(today),
                KeyCode::Char('b') => {
                    app.previous_step();
                    None
                }
                KeyCode::Char('g') => app.open_suggestion(),
                _ => None,
            };
        }

        match key {
            KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => app.focus_previous(),
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => app.focus_next(),
            KeyCode::Left | KeyCode::Char('h') => app.cycle_choice(false),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => app.cycle_choice(true),
            KeyCode::Enter | KeyCode::F(2) => app.start_editing(),
            KeyCode::Backspace | KeyCode::Delete => app.clear_field(),
            KeyCode::F(1) | KeyCode::Char('?') => app.open_help(),
            KeyCode::Char('q') => {
                // Will be handled by main loop
            }
            _ => {}
        }
        None
    }

    fn handle_editing_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => app.finish_editing(),
            KeyCode::Esc => app.cancel_editing(),
            _ => Self::edit_buffer(&mut app.input, key),
        }
    }

    fn handle_suggestion_mode(app: &mut App, key: KeyCode, modifiers: KeyModifiers) -> Option<Effect> {
        if key == KeyCode::Esc {
            return app.close_suggestion();
        }
        if modifiers.contains(KeyModifiers::CONTROL) {
            match key {
                KeyCode::Char('a') => app.accept_suggestion(false),
                KeyCode::Char('e') => app.accept_suggestion(true),
                _ => {}
            }
            return None;
        }
        if let Some(dialog) = app.suggestion.as_mut().filter(|dialog| !dialog.is_loading()) {
            Self::edit_buffer(&mut dialog.buffer, key);
        }
        None
    }

    fn handle_help_mode(app: &mut App, key: KeyCode) {
        let max_scroll = help_line_count().saturating_sub(1);
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('q') => {
                app.close_help()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.help_scroll = app.help_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.help_scroll = (app.help_scroll + 1).min(max_scroll);
            }
            KeyCode::PageUp => {
                app.help_scroll = app.help_scroll.saturating_sub(5);
            }
            KeyCode::PageDown => {
                app.help_scroll = (app.help_scroll + 5).min(max_scroll);
            }
            KeyCode::Home => app.help_scroll = 0,
            _ => {}
        }
    }

    fn edit_buffer(buffer: &mut InputBuffer, key: KeyCode) {
        match key {
            KeyCode::Char(c) => buffer.insert(c),
            KeyCode::Backspace => buffer.backspace(),
            KeyCode::Delete => buffer.delete(),
            KeyCode::Left => buffer.left(),
            KeyCode::Right => buffer.right(),
            KeyCode::Home => buffer.home(),
            KeyCode::End => buffer.end(),
            _ => {}
        }
    }
}
