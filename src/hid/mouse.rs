use bitfield::bitfield;

bitfield! {
    /// Pressed mouse buttons, as in the first byte of a boot mouse report
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct MouseButtons(u8);
    impl Debug;
    pub left, set_left: 0;
    pub right, set_right: 1;
    pub middle, set_middle: 2;
}

#[cfg(feature = "defmt")]
impl defmt::Format for MouseButtons {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "MouseButtons({=u8:03b})", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButtons {
    pub const NONE: Self = Self(0);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub fn set(&mut self, button: MouseButton, pressed: bool) {
        match button {
            MouseButton::Left => self.set_left(pressed),
            MouseButton::Right => self.set_right(pressed),
            MouseButton::Middle => self.set_middle(pressed),
        }
    }

    pub fn is_pressed(&self, button: MouseButton) -> bool {
        match button {
            MouseButton::Left => self.left(),
            MouseButton::Right => self.right(),
            MouseButton::Middle => self.middle(),
        }
    }
}

/// Mouse input report; the device never moves the pointer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseReport {
    pub buttons: MouseButtons,
    pub x: i8,
    pub y: i8,
    pub wheel: i8,
}
