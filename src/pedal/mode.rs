use core::convert::TryFrom;

use crate::hid::{keycode::usage, Modifiers, MouseButton};

/// Behavior assigned to a pedal
///
/// Discriminants are the mode bytes used by the serial protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PedalMode {
    None = 0,
    MouseLeft = 1,
    MouseRight = 2,
    MouseMiddle = 4,
    MouseDouble = 8,
    CtrlClick = 15,
    ShiftClick = 18,
    ShiftMiddleClick = 19,
    ScrollBar = 32,
    ScrollAnywhere = 64,
    Function = 65,
    Orbit = 67,
    KeyCombo = 128,
}

/// Modes that hold a mouse button for as long as the pedal is engaged
const MOUSE_MODES: [(PedalMode, MouseButton); 3] = [
    (PedalMode::MouseLeft, MouseButton::Left),
    (PedalMode::MouseRight, MouseButton::Right),
    (PedalMode::MouseMiddle, MouseButton::Middle),
];

/// Modes that hold a dedicated function key
const FUNCTION_KEYS: [(PedalMode, u8); 4] = [
    (PedalMode::ScrollBar, usage::F18),
    (PedalMode::ScrollAnywhere, usage::F20),
    (PedalMode::Function, usage::F21),
    (PedalMode::Orbit, usage::F22),
];

/// Modes that click once per engage with extra modifiers
const MODIFIED_CLICKS: [(PedalMode, Modifiers, MouseButton); 3] = [
    (PedalMode::CtrlClick, Modifiers::LEFT_CTRL, MouseButton::Left),
    (PedalMode::ShiftClick, Modifiers::LEFT_SHIFT, MouseButton::Left),
    (PedalMode::ShiftMiddleClick, Modifiers::LEFT_SHIFT, MouseButton::Middle),
];

impl PedalMode {
    pub const ALL: [PedalMode; 13] = {
        use PedalMode::*;
        [
            None, MouseLeft, MouseRight, MouseMiddle, MouseDouble, CtrlClick, ShiftClick,
            ShiftMiddleClick, ScrollBar, ScrollAnywhere, Function, Orbit, KeyCombo,
        ]
    };

    /// Mouse button held by the direct mouse-button modes
    pub fn mouse_button(self) -> Option<MouseButton> {
        MOUSE_MODES.iter()
            .find(|(mode, _)| *mode == self)
            .map(|(_, button)| *button)
    }

    /// Function key usage held by the dedicated-function modes
    pub fn function_key(self) -> Option<u8> {
        FUNCTION_KEYS.iter()
            .find(|(mode, _)| *mode == self)
            .map(|(_, usage)| *usage)
    }

    /// Modifiers and button of the modifier+click modes
    pub fn modified_click(self) -> Option<(Modifiers, MouseButton)> {
        MODIFIED_CLICKS.iter()
            .find(|(mode, _, _)| *mode == self)
            .map(|(_, modifiers, button)| (*modifiers, *button))
    }
}

impl TryFrom<u8> for PedalMode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL.iter()
            .copied()
            .find(|mode| *mode as u8 == value)
            .ok_or(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::MouseButtons;

    #[test]
    fn mode_bytes() {
        for mode in PedalMode::ALL {
            assert_eq!(PedalMode::try_from(mode as u8), Ok(mode));
        }
        assert_eq!(PedalMode::try_from(3), Err(3));
        assert_eq!(PedalMode::try_from(66), Err(66));
        assert_eq!(PedalMode::try_from(255), Err(255));
    }

    #[test]
    fn mouse_mode_mapping() {
        // Host tools treat the direct mouse mode bytes as button bit masks
        for (mode, button) in MOUSE_MODES {
            let mut buttons = MouseButtons::default();
            buttons.set(button, true);
            assert_eq!(buttons.bits(), mode as u8, "{:?}", mode);
            assert_eq!(mode.mouse_button(), Some(button));
        }
        assert_eq!(PedalMode::MouseDouble.mouse_button(), None);
        assert_eq!(PedalMode::CtrlClick.mouse_button(), None);
        assert_eq!(PedalMode::KeyCombo.mouse_button(), None);
    }

    #[test]
    fn function_keys() {
        assert_eq!(PedalMode::ScrollBar.function_key(), Some(0x6d));
        assert_eq!(PedalMode::ScrollAnywhere.function_key(), Some(0x6f));
        assert_eq!(PedalMode::Function.function_key(), Some(0x70));
        assert_eq!(PedalMode::Orbit.function_key(), Some(0x71));
        assert_eq!(PedalMode::MouseLeft.function_key(), None);
    }

    #[test]
    fn behavior_classes_are_disjoint() {
        for mode in PedalMode::ALL {
            let classes = [
                mode.mouse_button().is_some(),
                mode.function_key().is_some(),
                mode.modified_click().is_some(),
                matches!(mode, PedalMode::None | PedalMode::MouseDouble | PedalMode::KeyCombo),
            ];
            assert_eq!(classes.iter().filter(|c| **c).count(), 1, "{:?}", mode);
        }
    }
}
