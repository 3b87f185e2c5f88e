//! ASCII to HID usage translation for the US keyboard layout

use super::keycode::usage;

const SHIFT: u8 = 0x80;

/// Usage code for each 7-bit ASCII character, highest bit marks implied shift
static TABLE: [u8; 128] = make_table();

const fn make_table() -> [u8; 128] {
    let mut t = [0u8; 128];

    t[b'\t' as usize] = usage::TAB;
    t[b'\n' as usize] = usage::ENTER;
    t[b'\r' as usize] = usage::ENTER;
    t[b' ' as usize] = usage::SPACE;

    let mut i = 0;
    while i < 26 {
        t[b'a' as usize + i] = usage::A + i as u8;
        t[b'A' as usize + i] = (usage::A + i as u8) | SHIFT;
        i += 1;
    }
    let mut i = 0;
    while i < 9 {
        t[b'1' as usize + i] = usage::N1 + i as u8;
        i += 1;
    }
    t[b'0' as usize] = usage::N0;

    // Shifted digit row
    t[b'!' as usize] = usage::N1 | SHIFT;
    t[b'@' as usize] = (usage::N1 + 1) | SHIFT;
    t[b'#' as usize] = (usage::N1 + 2) | SHIFT;
    t[b'$' as usize] = (usage::N1 + 3) | SHIFT;
    t[b'%' as usize] = (usage::N1 + 4) | SHIFT;
    t[b'^' as usize] = (usage::N1 + 5) | SHIFT;
    t[b'&' as usize] = (usage::N1 + 6) | SHIFT;
    t[b'*' as usize] = (usage::N1 + 7) | SHIFT;
    t[b'(' as usize] = (usage::N1 + 8) | SHIFT;
    t[b')' as usize] = usage::N0 | SHIFT;

    t[b'-' as usize] = usage::MINUS;
    t[b'_' as usize] = usage::MINUS | SHIFT;
    t[b'=' as usize] = usage::EQUAL;
    t[b'+' as usize] = usage::EQUAL | SHIFT;
    t[b'[' as usize] = usage::LEFT_BRACE;
    t[b'{' as usize] = usage::LEFT_BRACE | SHIFT;
    t[b']' as usize] = usage::RIGHT_BRACE;
    t[b'}' as usize] = usage::RIGHT_BRACE | SHIFT;
    t[b'\\' as usize] = usage::BACKSLASH;
    t[b'|' as usize] = usage::BACKSLASH | SHIFT;
    t[b';' as usize] = usage::SEMICOLON;
    t[b':' as usize] = usage::SEMICOLON | SHIFT;
    t[b'\'' as usize] = usage::QUOTE;
    t[b'"' as usize] = usage::QUOTE | SHIFT;
    t[b'`' as usize] = usage::TILDE;
    t[b'~' as usize] = usage::TILDE | SHIFT;
    t[b',' as usize] = usage::COMMA;
    t[b'<' as usize] = usage::COMMA | SHIFT;
    t[b'.' as usize] = usage::PERIOD;
    t[b'>' as usize] = usage::PERIOD | SHIFT;
    t[b'/' as usize] = usage::SLASH;
    t[b'?' as usize] = usage::SLASH | SHIFT;

    t
}

/// Translate character to `(needs_shift, usage)`, `None` for unmapped characters
pub fn lookup(c: u8) -> Option<(bool, u8)> {
    let entry = *TABLE.get(c as usize)?;
    if entry == 0 {
        None
    } else {
        Some((entry & SHIFT != 0, entry & !SHIFT))
    }
}
