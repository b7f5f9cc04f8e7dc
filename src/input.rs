//! Key bindings (arrows and vim-style) and mouse drag resolution.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use match3tui::Direction;

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Move the keyboard cursor.
    Cursor(Direction),
    /// Select the tile under the cursor (or confirm in a menu).
    Select,
    /// Swap the cursor tile with its neighbour: keyboard drag.
    Swap(Direction),
    Hint,
    Restart,
    Quit,
    None,
}

/// Map key event to action. Arrows and hjkl move; with Shift (or HJKL) they swap.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let shift = modifiers == KeyModifiers::SHIFT;
    if !modifiers.is_empty() && !shift {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('?') => Action::Hint,
        KeyCode::Char('r') => Action::Restart,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Select,
        KeyCode::Left if shift => Action::Swap(Direction::Left),
        KeyCode::Right if shift => Action::Swap(Direction::Right),
        KeyCode::Up if shift => Action::Swap(Direction::Up),
        KeyCode::Down if shift => Action::Swap(Direction::Down),
        KeyCode::Char('H') => Action::Swap(Direction::Left),
        KeyCode::Char('L') => Action::Swap(Direction::Right),
        KeyCode::Char('K') => Action::Swap(Direction::Up),
        KeyCode::Char('J') => Action::Swap(Direction::Down),
        KeyCode::Left | KeyCode::Char('h') => Action::Cursor(Direction::Left),
        KeyCode::Right | KeyCode::Char('l') => Action::Cursor(Direction::Right),
        KeyCode::Up | KeyCode::Char('k') => Action::Cursor(Direction::Up),
        KeyCode::Down | KeyCode::Char('j') => Action::Cursor(Direction::Down),
        _ => Action::None,
    }
}

/// Direction of a mouse drag, measured in tiles: the dominant axis wins,
/// and a drag shorter than half a tile on both axes is a plain click.
pub fn drag_direction(
    from: (u16, u16),
    to: (u16, u16),
    tile_width: u16,
    tile_height: u16,
) -> Option<Direction> {
    let dx = (f32::from(to.0) - f32::from(from.0)) / f32::from(tile_width.max(1));
    let dy = (f32::from(to.1) - f32::from(from.1)) / f32::from(tile_height.max(1));
    if dx.abs() < 0.5 && dy.abs() < 0.5 {
        return None;
    }
    Some(if dx.abs() >= dy.abs() {
        if dx > 0.0 { Direction::Right } else { Direction::Left }
    } else if dy > 0.0 {
        Direction::Down
    } else {
        Direction::Up
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_cursor_and_swap_keys() {
        let none = KeyModifiers::NONE;
        assert_eq!(key_to_action(key(KeyCode::Left, none)), Action::Cursor(Direction::Left));
        assert_eq!(key_to_action(key(KeyCode::Char('j'), none)), Action::Cursor(Direction::Down));
        assert_eq!(
            key_to_action(key(KeyCode::Up, KeyModifiers::SHIFT)),
            Action::Swap(Direction::Up)
        );
        assert_eq!(
            key_to_action(key(KeyCode::Char('L'), KeyModifiers::SHIFT)),
            Action::Swap(Direction::Right)
        );
        assert_eq!(key_to_action(key(KeyCode::Char(' '), none)), Action::Select);
        assert_eq!(
            key_to_action(key(KeyCode::Char('?'), KeyModifiers::SHIFT)),
            Action::Hint
        );
    }

    #[test]
    fn test_control_chords_ignored() {
        assert_eq!(
            key_to_action(key(KeyCode::Char('q'), KeyModifiers::CONTROL)),
            Action::None
        );
    }

    #[test]
    fn test_drag_dominant_axis() {
        // 4-wide, 2-tall tiles: 3 columns right beats 1 row down.
        assert_eq!(drag_direction((10, 10), (13, 11), 4, 2), Some(Direction::Right));
        assert_eq!(drag_direction((10, 10), (9, 13), 4, 2), Some(Direction::Down));
        assert_eq!(drag_direction((10, 10), (10, 8), 4, 2), Some(Direction::Up));
        assert_eq!(drag_direction((10, 10), (6, 10), 4, 2), Some(Direction::Left));
    }

    #[test]
    fn test_short_drag_is_click() {
        assert_eq!(drag_direction((10, 10), (11, 10), 4, 2), None);
        assert_eq!(drag_direction((10, 10), (10, 10), 4, 2), None);
    }
}
