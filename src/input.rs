//! Keyboard and pointer mapping. Pure functions over the latest snapshot so the
//! bindings can be tested without a browser.

use crate::game::{Command, GameState};
use crate::view::Snapshot;

/// Map a `keydown` (`KeyboardEvent.code`, `KeyboardEvent.key`) to a command.
/// `None` means the key is not bound in the current state and should be left to
/// the browser.
pub fn command_for_key(code: &str, key: &str, snap: &Snapshot) -> Option<Command> {
    if code == "Space" {
        match snap.state {
            GameState::Playing if snap.can_start_recitation => {
                return Some(Command::StartRecitation);
            }
            GameState::Result => return Some(Command::Resume),
            _ => {}
        }
    }
    if snap.state != GameState::Playing {
        return None;
    }
    let slot = digit_slot(key)?;
    snap.card_in_slot(slot).map(Command::SelectCard)
}

/// Pointer activation of a displayed hand slot.
pub fn command_for_slot(slot: usize, snap: &Snapshot) -> Option<Command> {
    if snap.state != GameState::Playing {
        return None;
    }
    snap.card_in_slot(slot).map(Command::SelectCard)
}

// "1".."9" -> 0..8, "0" -> 9
fn digit_slot(key: &str) -> Option<usize> {
    let mut chars = key.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    match c.to_digit(10)? {
        0 => Some(9),
        d => Some(d as usize - 1),
    }
}
