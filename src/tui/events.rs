//! Event handling for the TUI
//!
//! Vim-style keybindings: j/k to move, Tab to switch tabs, q to quit.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Tab};

/// Handle a key event, returns true if app should quit
pub fn handle_event(app: &mut App, key: KeyEvent) -> bool {
    // Help overlay swallows everything but its close keys
    if app.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')) {
            app.show_help = false;
        }
        return false;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('?') => app.show_help = true,

        // Tabs
        KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => app.next_tab(),
        KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => app.prev_tab(),
        KeyCode::Char(c @ '1'..='5') => {
            let index = c as usize - '1' as usize;
            app.select_tab(Tab::ALL[index]);
        }

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => app.move_down(),
        KeyCode::Char('k') | KeyCode::Up => app.move_up(),
        KeyCode::Char('g') | KeyCode::Home => app.jump_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.jump_to_bottom(),

        // Period of history and statistics
        KeyCode::Char('+') | KeyCode::Char('=') => app.change_days(1),
        KeyCode::Char('-') => app.change_days(-1),

        // Problems
        KeyCode::Char('s') if app.tab == Tab::Problems => app.cycle_selected_status(),
        KeyCode::Char('a') if app.tab == Tab::Problems => app.toggle_resolved(),

        KeyCode::Char('r') => {
            app.on_data_changed();
        }
        _ => {}
    }
    false
}
