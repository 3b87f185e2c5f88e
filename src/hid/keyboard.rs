use bitfield::bitfield;
use heapless::Vec;

use super::Error;

const ROLLOVER: usize = 6;

bitfield! {
    /// Modifier keys, as in the first byte of a boot keyboard report
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct Modifiers(u8);
    impl Debug;
    pub left_ctrl, set_left_ctrl: 0;
    pub left_shift, set_left_shift: 1;
    pub left_alt, set_left_alt: 2;
    pub left_gui, set_left_gui: 3;
    pub right_ctrl, set_right_ctrl: 4;
    pub right_shift, set_right_shift: 5;
    pub right_alt, set_right_alt: 6;
    pub right_gui, set_right_gui: 7;
}

impl Modifiers {
    pub const NONE: Self = Self(0);
    pub const LEFT_CTRL: Self = Self(1 << 0);
    pub const LEFT_SHIFT: Self = Self(1 << 1);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Modifiers {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Modifiers({=u8:08b})", self.0)
    }
}

/// Set of held (non-modifier) keys with 6-key rollover
///
/// Keys are kept in press order. Releasing a key shifts all following keys
/// towards the front so that reports never contain holes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet {
    keys: Vec<u8, ROLLOVER>,
}

impl KeySet {
    pub const CAPACITY: usize = ROLLOVER;

    pub const fn new() -> Self {
        Self { keys: Vec::new() }
    }

    /// Add key usage; `Ok(false)` if it was already held or is the null usage
    pub fn insert(&mut self, usage: u8) -> Result<bool, Error> {
        if usage == 0 || self.contains(usage) {
            return Ok(false);
        }
        self.keys.push(usage).map_err(|_| Error::CapacityExceeded)?;
        Ok(true)
    }

    /// Remove key usage; `false` if it was not held
    pub fn remove(&mut self, usage: u8) -> bool {
        match self.keys.iter().position(|&k| k == usage) {
            Some(i) => {
                self.keys.remove(i);
                true
            },
            None => false,
        }
    }

    pub fn contains(&self, usage: u8) -> bool {
        self.keys.contains(&usage)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Report representation, unused slots are 0
    pub fn to_array(&self) -> [u8; ROLLOVER] {
        let mut array = [0; ROLLOVER];
        array[..self.keys.len()].copy_from_slice(&self.keys);
        array
    }
}

/// Boot keyboard input report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    pub modifiers: Modifiers,
    pub keys: [u8; ROLLOVER],
}

impl KeyboardReport {
    /// Report with a single key
    pub fn single(modifiers: Modifiers, usage: u8) -> Self {
        let mut keys = [0; ROLLOVER];
        keys[0] = usage;
        Self { modifiers, keys }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_bits() {
        let mut m = Modifiers::default();
        m.set_left_shift(true);
        m.set_right_gui(true);
        assert_eq!(m.bits(), 0b1000_0010);
        assert_eq!(Modifiers::LEFT_CTRL.union(Modifiers::LEFT_SHIFT).bits(), 0b11);
        m.remove(Modifiers::LEFT_SHIFT);
        assert_eq!(m.bits(), 0b1000_0000);
        assert!(m.right_gui());
        assert!(!m.left_shift());
    }

    #[test]
    fn key_set_dedup() {
        let mut keys = KeySet::new();
        assert_eq!(keys.insert(0x04), Ok(true));
        assert_eq!(keys.insert(0x04), Ok(false));
        assert_eq!(keys.insert(0), Ok(false));
        assert_eq!(keys.as_slice(), &[0x04]);
    }

    #[test]
    fn key_set_compacts_on_release() {
        let mut keys = KeySet::new();
        for k in [0x04, 0x05, 0x06] {
            keys.insert(k).unwrap();
        }
        assert!(keys.remove(0x05));
        assert_eq!(keys.as_slice(), &[0x04, 0x06]);
        assert_eq!(keys.to_array(), [0x04, 0x06, 0, 0, 0, 0]);
        assert!(!keys.remove(0x05));
        keys.insert(0x07).unwrap();
        assert_eq!(keys.to_array(), [0x04, 0x06, 0x07, 0, 0, 0]);
    }

    #[test]
    fn key_set_capacity() {
        let mut keys = KeySet::new();
        for k in 0x04..0x0a {
            assert_eq!(keys.insert(k), Ok(true));
        }
        assert_eq!(keys.insert(0x0a), Err(Error::CapacityExceeded));
        // Already held key is still accepted when full
        assert_eq!(keys.insert(0x04), Ok(false));
        assert_eq!(keys.to_array(), [0x04, 0x05, 0x06, 0x07, 0x08, 0x09]);
    }
}
