//! Translation of pedal transitions into HID actions

use embedded_hal::blocking::delay::DelayMs;

use crate::hid::{self, Hid, HidTransport, Modifiers, MouseButton};
use crate::pedal::{Pedal, PedalMode, Transition};

/// Behavior class of a pedal mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    None,
    /// Hold mouse button while engaged
    Hold(MouseButton),
    /// Two clicks on engage
    DoubleClick(MouseButton),
    /// Single click with additional modifiers on engage
    ModifiedClick(Modifiers, MouseButton),
    /// Hold key usage while engaged
    FunctionKey(u8),
    /// Hold all keys from the pedal key combo while engaged
    KeyCombo,
}

impl From<PedalMode> for Action {
    fn from(mode: PedalMode) -> Self {
        if let Some(button) = mode.mouse_button() {
            Action::Hold(button)
        } else if let Some(usage) = mode.function_key() {
            Action::FunctionKey(usage)
        } else if let Some((modifiers, button)) = mode.modified_click() {
            Action::ModifiedClick(modifiers, button)
        } else {
            match mode {
                PedalMode::MouseDouble => Action::DoubleClick(MouseButton::Left),
                PedalMode::KeyCombo => Action::KeyCombo,
                _ => Action::None,
            }
        }
    }
}

/// Perform the action of `pedal` for the given transition
pub fn apply<T, D>(pedal: &Pedal, transition: Transition, hid: &mut Hid<'_, T, D>) -> Result<(), hid::Error>
where
    T: HidTransport,
    D: DelayMs<u32>,
{
    let engage = transition == Transition::Engage;
    match Action::from(pedal.mode) {
        Action::None => Ok(()),
        Action::Hold(button) if engage => hid.mouse_press(button),
        Action::Hold(button) => hid.mouse_release(button),
        Action::DoubleClick(button) if engage => {
            hid.mouse_click(button)?;
            hid.mouse_click(button)
        },
        Action::ModifiedClick(modifiers, button) if engage => hid.modified_click(modifiers, button),
        Action::DoubleClick(_) | Action::ModifiedClick(..) => Ok(()),
        Action::FunctionKey(usage) if engage => hid.press_key(usage),
        Action::FunctionKey(usage) => hid.release_key(usage),
        Action::KeyCombo if engage => pedal.keycombo().iter()
            .try_for_each(|&code| hid.press_code(code)),
        // Release everything even if some report fails
        Action::KeyCombo => pedal.keycombo().iter().rev()
            .map(|&code| hid.release_code(code))
            .fold(Ok(()), |acc, r| acc.and(r)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PedalDefaults;
    use crate::hid::{HidState, KeyboardReport, MouseButtons, MouseReport};
    use crate::mock::{MockDelay, MockHid, Report};
    use crate::pedal::Pedals;
    use std::vec::Vec;

    fn pedals(mode: PedalMode) -> Pedals<1> {
        Pedals::new(&[PedalDefaults { mode, inverted: false, enabled: true }])
    }

    fn run(pedals: &Pedals<1>, transitions: &[Transition]) -> (Vec<Report>, HidState) {
        let mut state = HidState::new();
        let (mut transport, mut delay) = (MockHid::new(), MockDelay::new());
        let mut hid = Hid::new(&mut state, (&mut transport, &mut delay));
        for &t in transitions {
            apply(pedals.get(0).unwrap(), t, &mut hid).unwrap();
        }
        (transport.reports, state)
    }

    fn mouse(bits: u8) -> Report {
        Report::Mouse(MouseReport { buttons: MouseButtons::from_bits(bits), ..Default::default() })
    }

    fn kbd(modifiers: u8, keys: &[u8]) -> Report {
        let mut array = [0; 6];
        array[..keys.len()].copy_from_slice(keys);
        Report::Keyboard(KeyboardReport { modifiers: Modifiers::from_bits(modifiers), keys: array })
    }

    use Transition::{Disengage, Engage};

    #[test]
    fn action_classes() {
        assert_eq!(Action::from(PedalMode::None), Action::None);
        assert_eq!(Action::from(PedalMode::MouseMiddle), Action::Hold(MouseButton::Middle));
        assert_eq!(Action::from(PedalMode::MouseDouble), Action::DoubleClick(MouseButton::Left));
        assert_eq!(
            Action::from(PedalMode::ShiftMiddleClick),
            Action::ModifiedClick(Modifiers::LEFT_SHIFT, MouseButton::Middle)
        );
        assert_eq!(Action::from(PedalMode::Orbit), Action::FunctionKey(0x71));
        assert_eq!(Action::from(PedalMode::KeyCombo), Action::KeyCombo);
    }

    #[test]
    fn hold_mouse_button() {
        let (reports, state) = run(&pedals(PedalMode::MouseRight), &[Engage]);
        assert_eq!(reports, [mouse(0b010)]);
        assert!(state.buttons().right());
        let (reports, _) = run(&pedals(PedalMode::MouseRight), &[Engage, Disengage]);
        assert_eq!(reports, [mouse(0b010), mouse(0)]);
    }

    #[test]
    fn double_click() {
        let (reports, _) = run(&pedals(PedalMode::MouseDouble), &[Engage, Disengage]);
        assert_eq!(reports, [mouse(1), mouse(0), mouse(1), mouse(0)]);
    }

    #[test]
    fn ctrl_click() {
        let (reports, state) = run(&pedals(PedalMode::CtrlClick), &[Engage, Disengage]);
        assert_eq!(reports, [kbd(0b01, &[]), mouse(1), mouse(0), kbd(0, &[])]);
        assert_eq!(state, HidState::new());
    }

    #[test]
    fn shift_middle_click() {
        let (reports, _) = run(&pedals(PedalMode::ShiftMiddleClick), &[Engage]);
        assert_eq!(reports, [kbd(0b10, &[]), mouse(0b100), mouse(0), kbd(0, &[])]);
    }

    #[test]
    fn function_key() {
        let (reports, _) = run(&pedals(PedalMode::ScrollAnywhere), &[Engage, Disengage]);
        assert_eq!(reports, [kbd(0, &[0x6f]), kbd(0, &[])]);
    }

    #[test]
    fn none_does_nothing() {
        let (reports, _) = run(&pedals(PedalMode::None), &[Engage, Disengage]);
        assert!(reports.is_empty());
    }

    #[test]
    fn key_combo() {
        let mut p = pedals(PedalMode::None);
        // Ctrl + Shift + 't'
        p.configure_keycombo(0, false, &[0xe001, 0xe002, b't' as u16]).unwrap();
        let (reports, state) = run(&p, &[Engage, Disengage]);
        assert_eq!(reports, [
            kbd(0b01, &[]),
            kbd(0b11, &[]),
            kbd(0b11, &[0x17]),
            kbd(0b11, &[]),
            kbd(0b01, &[]),
            kbd(0, &[]),
        ]);
        assert_eq!(state, HidState::new());
    }

    #[test]
    fn key_combo_with_shifted_ascii() {
        let mut p = pedals(PedalMode::None);
        p.configure_keycombo(0, false, &[b'A' as u16, 0xf000 | 0x29]).unwrap();
        let (reports, _) = run(&p, &[Engage]);
        assert_eq!(reports, [kbd(0b10, &[0x04]), kbd(0b10, &[0x04, 0x29])]);
    }

    #[test]
    fn key_combo_over_rollover() {
        let mut p = pedals(PedalMode::None);
        let codes: Vec<u16> = (b'a'..=b'g').map(u16::from).collect();
        p.configure_keycombo(0, false, &codes).unwrap();

        let mut state = HidState::new();
        let (mut transport, mut delay) = (MockHid::new(), MockDelay::new());
        let mut hid = Hid::new(&mut state, (&mut transport, &mut delay));
        let pedal = p.get(0).unwrap();
        assert_eq!(apply(pedal, Engage, &mut hid), Err(hid::Error::CapacityExceeded));
        assert_eq!(hid.state().keys().len(), 6);
        apply(pedal, Disengage, &mut hid).unwrap();
        assert!(hid.state().keys().is_empty());
    }
}
