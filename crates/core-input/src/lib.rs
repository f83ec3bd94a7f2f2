//! Decoded input model and the crossterm translation layer.
//!
//! The editor core works with this small event vocabulary only; crossterm
//! never leaks past this crate. Printable keys are bytes (`0x20..=0x7E`),
//! control chords carry a modifier bitmask, and mouse events use the wire
//! button numbering (0/1/2 buttons, 64/65 for the scroll wheel).

use bitflags::bitflags;
use crossterm::event::{
    Event as CtEvent, KeyCode as CtKeyCode, KeyEventKind, MouseButton as CtMouseButton,
    MouseEventKind as CtMouseKind,
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const CTRL = 1 << 0;
        const ALT = 1 << 1;
        const SHIFT = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Printable byte `0x20..=0x7E`.
    Char(u8),
    Enter,
    Backspace,
    Esc,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyInput {
    pub key: Key,
    pub mods: Modifiers,
}

impl KeyInput {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            mods: Modifiers::empty(),
        }
    }

    pub fn ctrl(c: u8) -> Self {
        Self {
            key: Key::Char(c.to_ascii_lowercase()),
            mods: Modifiers::CTRL,
        }
    }
}

pub const MOUSE_LEFT: u8 = 0;
pub const MOUSE_MIDDLE: u8 = 1;
pub const MOUSE_RIGHT: u8 = 2;
pub const MOUSE_SCROLL_UP: u8 = 64;
pub const MOUSE_SCROLL_DOWN: u8 = 65;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseKind {
    Press,
    Release,
    Drag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseInput {
    pub x: u16,
    pub y: u16,
    pub button: u8,
    pub kind: MouseKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyInput),
    Mouse(MouseInput),
    Resize(u16, u16),
}

fn button_code(button: CtMouseButton) -> u8 {
    match button {
        CtMouseButton::Left => MOUSE_LEFT,
        CtMouseButton::Middle => MOUSE_MIDDLE,
        CtMouseButton::Right => MOUSE_RIGHT,
    }
}

/// Map a crossterm event into the editor vocabulary. Returns `None` for
/// events the editor ignores (key releases, bare mouse motion, focus and
/// paste notifications).
pub fn translate(event: CtEvent) -> Option<InputEvent> {
    match event {
        CtEvent::Key(key) => {
            if key.kind == KeyEventKind::Release {
                return None;
            }
            let mut mods = Modifiers::empty();
            if key.modifiers.contains(crossterm::event::KeyModifiers::CONTROL) {
                mods |= Modifiers::CTRL;
            }
            if key.modifiers.contains(crossterm::event::KeyModifiers::ALT) {
                mods |= Modifiers::ALT;
            }
            if key.modifiers.contains(crossterm::event::KeyModifiers::SHIFT) {
                mods |= Modifiers::SHIFT;
            }
            let key = match key.code {
                CtKeyCode::Char(c) if c.is_ascii() && !c.is_ascii_control() => {
                    // Shift is already encoded in the character itself.
                    mods.remove(Modifiers::SHIFT);
                    Key::Char(c as u8)
                }
                CtKeyCode::Enter => Key::Enter,
                CtKeyCode::Backspace => Key::Backspace,
                CtKeyCode::Esc => Key::Esc,
                CtKeyCode::Tab => Key::Tab,
                CtKeyCode::Left => Key::Left,
                CtKeyCode::Right => Key::Right,
                CtKeyCode::Up => Key::Up,
                CtKeyCode::Down => Key::Down,
                CtKeyCode::Home => Key::Home,
                CtKeyCode::End => Key::End,
                CtKeyCode::PageUp => Key::PageUp,
                CtKeyCode::PageDown => Key::PageDown,
                CtKeyCode::Delete => Key::Delete,
                // Anything the editor has no vocabulary for (function keys,
                // media keys, partial sequences) collapses to Esc.
                _ => Key::Esc,
            };
            Some(InputEvent::Key(KeyInput { key, mods }))
        }
        CtEvent::Mouse(mouse) => {
            let (button, kind) = match mouse.kind {
                CtMouseKind::Down(b) => (button_code(b), MouseKind::Press),
                CtMouseKind::Up(b) => (button_code(b), MouseKind::Release),
                CtMouseKind::Drag(b) => (button_code(b), MouseKind::Drag),
                CtMouseKind::ScrollUp => (MOUSE_SCROLL_UP, MouseKind::Press),
                CtMouseKind::ScrollDown => (MOUSE_SCROLL_DOWN, MouseKind::Press),
                CtMouseKind::Moved | CtMouseKind::ScrollLeft | CtMouseKind::ScrollRight => {
                    return None;
                }
            };
            Some(InputEvent::Mouse(MouseInput {
                x: mouse.column,
                y: mouse.row,
                button,
                kind,
            }))
        }
        CtEvent::Resize(w, h) => Some(InputEvent::Resize(w, h)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers, MouseEvent};

    fn key_event(code: CtKeyCode, mods: KeyModifiers) -> CtEvent {
        CtEvent::Key(KeyEvent::new(code, mods))
    }

    #[test]
    fn printable_char_translates_without_shift() {
        let ev = translate(key_event(CtKeyCode::Char('A'), KeyModifiers::SHIFT)).unwrap();
        assert_eq!(
            ev,
            InputEvent::Key(KeyInput {
                key: Key::Char(b'A'),
                mods: Modifiers::empty(),
            })
        );
    }

    #[test]
    fn ctrl_chord_keeps_modifier() {
        let ev = translate(key_event(CtKeyCode::Char('s'), KeyModifiers::CONTROL)).unwrap();
        assert_eq!(ev, InputEvent::Key(KeyInput::ctrl(b's')));
    }

    #[test]
    fn ctrl_arrow_keeps_modifier() {
        let ev = translate(key_event(CtKeyCode::Right, KeyModifiers::CONTROL)).unwrap();
        assert_eq!(
            ev,
            InputEvent::Key(KeyInput {
                key: Key::Right,
                mods: Modifiers::CTRL,
            })
        );
    }

    #[test]
    fn unknown_key_collapses_to_esc() {
        let ev = translate(key_event(CtKeyCode::F(5), KeyModifiers::NONE)).unwrap();
        assert_eq!(ev, InputEvent::Key(KeyInput::plain(Key::Esc)));
    }

    #[test]
    fn scroll_wheel_uses_wire_button_numbers() {
        let ev = translate(CtEvent::Mouse(MouseEvent {
            kind: CtMouseKind::ScrollDown,
            column: 3,
            row: 4,
            modifiers: KeyModifiers::NONE,
        }))
        .unwrap();
        assert_eq!(
            ev,
            InputEvent::Mouse(MouseInput {
                x: 3,
                y: 4,
                button: MOUSE_SCROLL_DOWN,
                kind: MouseKind::Press,
            })
        );
    }

    #[test]
    fn drag_is_reported_as_drag() {
        let ev = translate(CtEvent::Mouse(MouseEvent {
            kind: CtMouseKind::Drag(CtMouseButton::Left),
            column: 1,
            row: 2,
            modifiers: KeyModifiers::NONE,
        }))
        .unwrap();
        assert!(matches!(
            ev,
            InputEvent::Mouse(MouseInput {
                button: MOUSE_LEFT,
                kind: MouseKind::Drag,
                ..
            })
        ));
    }

    #[test]
    fn mouse_motion_is_ignored() {
        assert!(
            translate(CtEvent::Mouse(MouseEvent {
                kind: CtMouseKind::Moved,
                column: 0,
                row: 0,
                modifiers: KeyModifiers::NONE,
            }))
            .is_none()
        );
    }
}
