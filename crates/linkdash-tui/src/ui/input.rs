//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{
    can_add_password_char, can_add_slug_char, can_add_url_char, App, AppState, Focus,
    PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.state = AppState::Quitting;
        return true;
    }

    // A notice blocks everything until dismissed
    if app.notice.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            app.dismiss_notice();
        }
        return false;
    }

    match app.state {
        AppState::LoggingIn => handle_login_input(app, key),
        AppState::EditingLink => {
            handle_edit_input(app, key);
            false
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_delete(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_delete(),
                _ => {}
            }
            false
        }
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            false
        }
        AppState::ConfirmingQuit => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                true
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
                false
            }
            _ => false,
        },
        AppState::Quitting => true,
        AppState::Normal => {
            match app.focus {
                Focus::Slug | Focus::Url => handle_form_input(app, key),
                Focus::Table => handle_table_input(app, key),
            }
            false
        }
    }
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return true;
        }
        KeyCode::Enter => app.attempt_login(),
        KeyCode::Backspace => {
            app.login_password.pop();
        }
        KeyCode::Char(c) => {
            if can_add_password_char(app.login_password.chars().count(), c) {
                app.login_password.push(c);
                app.login_error = None;
            }
        }
        _ => {}
    }
    false
}

fn handle_form_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::BackTab => app.focus = app.focus.prev(),
        KeyCode::Esc => app.focus = Focus::Table,
        KeyCode::Down => {
            app.focus = match app.focus {
                Focus::Slug => Focus::Url,
                _ => Focus::Table,
            };
        }
        KeyCode::Up => app.focus = Focus::Slug,
        KeyCode::Enter => match app.focus {
            Focus::Slug => app.focus = Focus::Url,
            _ => app.submit_create(),
        },
        KeyCode::Backspace => {
            match app.focus {
                Focus::Slug => app.slug_input.pop(),
                _ => app.url_input.pop(),
            };
        }
        KeyCode::Char(c) => match app.focus {
            Focus::Slug => {
                if can_add_slug_char(app.slug_input.chars().count(), c) {
                    app.slug_input.push(c);
                }
            }
            _ => {
                if can_add_url_char(app.url_input.chars().count(), c) {
                    app.url_input.push(c);
                }
            }
        },
        _ => {}
    }
}

fn handle_table_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::BackTab => app.focus = app.focus.prev(),
        KeyCode::Char('n') => app.focus = Focus::Slug,
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::PageUp => {
            app.selection = app.selection.saturating_sub(PAGE_SCROLL_SIZE);
        }
        KeyCode::PageDown => {
            app.selection =
                (app.selection + PAGE_SCROLL_SIZE).min(app.links.len().saturating_sub(1));
        }
        KeyCode::Home => app.selection = 0,
        KeyCode::End => app.selection = app.links.len().saturating_sub(1),
        KeyCode::Char('c') => app.copy_selected(),
        KeyCode::Char('o') => app.open_selected(),
        KeyCode::Char('e') | KeyCode::Enter => app.open_edit(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
        KeyCode::Char('r') => app.load_links(),
        KeyCode::Char('L') => app.logout(),
        _ => {}
    }
}

fn handle_edit_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_edit(),
        KeyCode::Enter => app.save_edit(),
        KeyCode::Backspace => {
            if let Some(edit) = app.edit.as_mut() {
                edit.url_input.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(edit) = app.edit.as_mut() {
                if can_add_url_char(edit.url_input.chars().count(), c) {
                    edit.url_input.push(c);
                }
            }
        }
        _ => {}
    }
}
