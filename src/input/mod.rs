//! Input module - Keyboard handling for board controls

pub mod handler;

pub use handler::InputHandler;

use crate::types::UiAction;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Map keyboard input to ui actions
pub fn handle_key_event(key: KeyEvent) -> Option<UiAction> {
    match key.code {
        // Cursor
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(UiAction::CursorLeft),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(UiAction::CursorRight),
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(UiAction::CursorUp),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(UiAction::CursorDown),

        // Grab and swap
        KeyCode::Enter | KeyCode::Char(' ') => Some(UiAction::Select),

        // Actions
        KeyCode::Char('h') | KeyCode::Char('H') => Some(UiAction::Hint),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(UiAction::Pause),

        // Restart
        KeyCode::Char('r') | KeyCode::Char('R') => Some(UiAction::Restart),

        KeyCode::Char('q') | KeyCode::Char('Q') => Some(UiAction::Quit),

        _ => None,
    }
}

/// Check if key should quit the game
pub fn should_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}
