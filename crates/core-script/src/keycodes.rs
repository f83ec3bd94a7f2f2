//! Integer key codes and modifier masks shared with scripts.
//!
//! Printable keys use their ASCII value; named keys sit above the printable
//! range so the two never collide. The modifier mask matches the
//! `core-input` bitflags bit for bit.

use core_input::{Key, Modifiers};

pub const KEY_TAB: i64 = 9;
pub const KEY_ENTER: i64 = 13;
pub const KEY_ESC: i64 = 27;
pub const KEY_BACKSPACE: i64 = 127;
pub const KEY_ARROW_LEFT: i64 = 1000;
pub const KEY_ARROW_RIGHT: i64 = 1001;
pub const KEY_ARROW_UP: i64 = 1002;
pub const KEY_ARROW_DOWN: i64 = 1003;
pub const KEY_DELETE: i64 = 1004;
pub const KEY_HOME: i64 = 1005;
pub const KEY_END: i64 = 1006;
pub const KEY_PAGE_UP: i64 = 1007;
pub const KEY_PAGE_DOWN: i64 = 1008;

pub fn key_from_code(code: i64) -> Option<Key> {
    match code {
        32..=126 => Some(Key::Char(code as u8)),
        KEY_TAB => Some(Key::Tab),
        KEY_ENTER => Some(Key::Enter),
        KEY_ESC => Some(Key::Esc),
        KEY_BACKSPACE => Some(Key::Backspace),
        KEY_ARROW_LEFT => Some(Key::Left),
        KEY_ARROW_RIGHT => Some(Key::Right),
        KEY_ARROW_UP => Some(Key::Up),
        KEY_ARROW_DOWN => Some(Key::Down),
        KEY_DELETE => Some(Key::Delete),
        KEY_HOME => Some(Key::Home),
        KEY_END => Some(Key::End),
        KEY_PAGE_UP => Some(Key::PageUp),
        KEY_PAGE_DOWN => Some(Key::PageDown),
        _ => None,
    }
}

pub fn code_from_key(key: Key) -> i64 {
    match key {
        Key::Char(b) => i64::from(b),
        Key::Tab => KEY_TAB,
        Key::Enter => KEY_ENTER,
        Key::Esc => KEY_ESC,
        Key::Backspace => KEY_BACKSPACE,
        Key::Left => KEY_ARROW_LEFT,
        Key::Right => KEY_ARROW_RIGHT,
        Key::Up => KEY_ARROW_UP,
        Key::Down => KEY_ARROW_DOWN,
        Key::Delete => KEY_DELETE,
        Key::Home => KEY_HOME,
        Key::End => KEY_END,
        Key::PageUp => KEY_PAGE_UP,
        Key::PageDown => KEY_PAGE_DOWN,
    }
}

pub fn mods_from_mask(mask: i64) -> Modifiers {
    Modifiers::from_bits_truncate(mask as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_codes_round_trip() {
        for code in 32..=126 {
            assert_eq!(code_from_key(key_from_code(code).unwrap()), code);
        }
    }

    #[test]
    fn named_codes_round_trip() {
        for code in [
            KEY_TAB,
            KEY_ENTER,
            KEY_ESC,
            KEY_BACKSPACE,
            KEY_ARROW_LEFT,
            KEY_ARROW_RIGHT,
            KEY_ARROW_UP,
            KEY_ARROW_DOWN,
            KEY_DELETE,
            KEY_HOME,
            KEY_END,
            KEY_PAGE_UP,
            KEY_PAGE_DOWN,
        ] {
            assert_eq!(code_from_key(key_from_code(code).unwrap()), code);
        }
    }

    #[test]
    fn unknown_codes_are_rejected() {
        assert!(key_from_code(0).is_none());
        assert!(key_from_code(5000).is_none());
    }

    #[test]
    fn modifier_mask_matches_bitflags() {
        assert_eq!(mods_from_mask(1), Modifiers::CTRL);
        assert_eq!(mods_from_mask(2), Modifiers::ALT);
        assert_eq!(mods_from_mask(4), Modifiers::SHIFT);
        assert_eq!(mods_from_mask(5), Modifiers::CTRL | Modifiers::SHIFT);
    }
}
