//! Action enum — what a key press asks for, before it is resolved against
//! the cursor and the active view.

use podcast_core::view_state::Intent;
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Goes straight to the view-state machine.
    Intent(Intent),
    Move(isize),
    /// Enter: open the item under the cursor (or play it, for episodes).
    Activate,
    Back,
    ToggleFavourite,
    Play,
    Remove,
    TogglePause,
    Quit,
}

pub fn action_for_key(key: KeyEvent) -> Option<Action> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }
    let action = match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Up | KeyCode::Char('k') => Action::Move(-1),
        KeyCode::Down | KeyCode::Char('j') => Action::Move(1),
        KeyCode::PageUp => Action::Move(-10),
        KeyCode::PageDown => Action::Move(10),
        KeyCode::Enter => Action::Activate,
        KeyCode::Esc | KeyCode::Backspace => Action::Back,
        KeyCode::Char('F') => Action::Intent(Intent::ViewFavourites),
        KeyCode::Char('f') => Action::ToggleFavourite,
        KeyCode::Char('p') => Action::Play,
        KeyCode::Char('d') => Action::Remove,
        KeyCode::Char(' ') => Action::TogglePause,
        KeyCode::Char('s') => Action::Intent(Intent::StopPlayback),
        KeyCode::Char('r') => Action::Intent(Intent::RetryPreviews),
        _ => return None,
    };
    Some(action)
}
