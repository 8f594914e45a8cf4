use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum NavigationCommand {
    PrevChat,
    NextChat,
    BackToRecent,
}

/// A recognised shortcut. `consumed` tells the host to suppress the key's
/// default navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutOutcome {
    pub command: NavigationCommand,
    pub consumed: bool,
}

/// Ctrl/Cmd+`[` and `]` walk the session list; adding Shift jumps back to the
/// most recently left session.
pub fn match_shortcut(key: &KeyEvent) -> Option<ShortcutOutcome> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if !key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER)
    {
        return None;
    }

    let shifted = key.modifiers.contains(KeyModifiers::SHIFT);
    let command = match key.code {
        KeyCode::Char('{') => NavigationCommand::BackToRecent,
        KeyCode::Char('[') if shifted => NavigationCommand::BackToRecent,
        KeyCode::Char('[') => NavigationCommand::PrevChat,
        KeyCode::Char(']') if !shifted => NavigationCommand::NextChat,
        _ => return None,
    };

    Some(ShortcutOutcome {
        command,
        consumed: true,
    })
}
