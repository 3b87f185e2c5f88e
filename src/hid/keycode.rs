//! 16-bit key codes used in key combos
//!
//! | code     | meaning                                |
//! |----------|----------------------------------------|
//! | `0xE0mm` | modifier keys with bits `mm`           |
//! | `0xF0uu` | keyboard usage `uu`                    |
//! | `0x00cc` | ASCII character `cc` (implied shift)   |
//! | other    | keyboard usage in the low byte         |

use super::Modifiers;
use super::ascii;

/// Keyboard usage IDs (HID usage page 0x07)
pub mod usage {
    pub const A: u8 = 0x04;
    pub const N1: u8 = 0x1e;
    pub const N0: u8 = 0x27;
    pub const ENTER: u8 = 0x28;
    pub const TAB: u8 = 0x2b;
    pub const SPACE: u8 = 0x2c;
    pub const MINUS: u8 = 0x2d;
    pub const EQUAL: u8 = 0x2e;
    pub const LEFT_BRACE: u8 = 0x2f;
    pub const RIGHT_BRACE: u8 = 0x30;
    pub const BACKSLASH: u8 = 0x31;
    pub const SEMICOLON: u8 = 0x33;
    pub const QUOTE: u8 = 0x34;
    pub const TILDE: u8 = 0x35;
    pub const COMMA: u8 = 0x36;
    pub const PERIOD: u8 = 0x37;
    pub const SLASH: u8 = 0x38;

    // Rarely used function keys, claimed by the desktop companion
    pub const F15: u8 = 0x6a;
    pub const F18: u8 = 0x6d;
    pub const F20: u8 = 0x6f;
    pub const F21: u8 = 0x70;
    pub const F22: u8 = 0x71;
}

const PREFIX_MASK: u16 = 0xff00;
const MODIFIER_PREFIX: u16 = 0xe000;
const USAGE_PREFIX: u16 = 0xf000;

/// Decoded key code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyCode {
    Modifiers(Modifiers),
    /// Usage with the modifiers it implies
    Key { usage: u8, modifiers: Modifiers },
}

impl KeyCode {
    /// Decode 16-bit code, `None` for the null code and unmapped ASCII
    pub fn decode(code: u16) -> Option<Self> {
        let low = (code & 0xff) as u8;
        match code & PREFIX_MASK {
            _ if code == 0 => None,
            MODIFIER_PREFIX => Some(KeyCode::Modifiers(Modifiers::from_bits(low))),
            USAGE_PREFIX => Some(KeyCode::Key { usage: low, modifiers: Modifiers::NONE }),
            0 => ascii::lookup(low).map(|(shift, usage)| KeyCode::Key {
                usage,
                modifiers: if shift { Modifiers::LEFT_SHIFT } else { Modifiers::NONE },
            }),
            _ => Some(KeyCode::Key { usage: low, modifiers: Modifiers::NONE }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode() {
        assert_eq!(KeyCode::decode(0), None);
        assert_eq!(
            KeyCode::decode(0xe003),
            Some(KeyCode::Modifiers(Modifiers::LEFT_CTRL.union(Modifiers::LEFT_SHIFT)))
        );
        assert_eq!(
            KeyCode::decode(0xf000 | usage::F18 as u16),
            Some(KeyCode::Key { usage: usage::F18, modifiers: Modifiers::NONE })
        );
        assert_eq!(
            KeyCode::decode(b'c' as u16),
            Some(KeyCode::Key { usage: 0x06, modifiers: Modifiers::NONE })
        );
        assert_eq!(
            KeyCode::decode(b'C' as u16),
            Some(KeyCode::Key { usage: 0x06, modifiers: Modifiers::LEFT_SHIFT })
        );
        assert_eq!(KeyCode::decode(0x0001), None);
        assert_eq!(
            KeyCode::decode(0x4229),
            Some(KeyCode::Key { usage: 0x29, modifiers: Modifiers::NONE })
        );
    }
}
