use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    Cancel,
    NextField,
    Submit,
    Backspace,
    Up,
    Down,
    ToggleRegister,
    Input(char),
    None,
}

/// Chrome-level bindings only. Printable characters are forwarded as
/// `Input` and interpreted per screen, so typing an email or a file
/// path never collides with a shortcut.
pub fn map_key(key: KeyEvent) -> AppAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => AppAction::Quit,
            KeyCode::Char('r') => AppAction::ToggleRegister,
            _ => AppAction::None,
        };
    }

    match key.code {
        KeyCode::Esc => AppAction::Cancel,
        KeyCode::Tab => AppAction::NextField,
        KeyCode::Enter => AppAction::Submit,
        KeyCode::Backspace => AppAction::Backspace,
        KeyCode::Up => AppAction::Up,
        KeyCode::Down => AppAction::Down,
        KeyCode::Char(ch) => AppAction::Input(ch),
        _ => AppAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    #[test]
    fn ctrl_c_quits() {
        assert_eq!(
            map_key(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            AppAction::Quit
        );
    }

    #[test]
    fn plain_q_is_input_not_quit() {
        assert_eq!(
            map_key(key(KeyCode::Char('q'), KeyModifiers::NONE)),
            AppAction::Input('q')
        );
    }

    #[test]
    fn ctrl_r_toggles_register() {
        assert_eq!(
            map_key(key(KeyCode::Char('r'), KeyModifiers::CONTROL)),
            AppAction::ToggleRegister
        );
    }

    #[test]
    fn enter_submits_and_esc_cancels() {
        assert_eq!(map_key(key(KeyCode::Enter, KeyModifiers::NONE)), AppAction::Submit);
        assert_eq!(map_key(key(KeyCode::Esc, KeyModifiers::NONE)), AppAction::Cancel);
    }
}
