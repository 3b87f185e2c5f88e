//! HID keyboard/mouse output state and report generation
//!
//! [`HidState`] holds what the host should currently see: modifiers, held
//! keys and pressed mouse buttons. It is shared by all pedals. To change it a
//! [`Hid`] view is created that borrows the state together with a
//! [`HidTransport`] and a delay; every mutation through the view is followed
//! by sending the resulting report.

pub mod ascii;
pub mod keycode;
mod keyboard;
mod mouse;

use embedded_hal::blocking::delay::DelayMs;

use crate::config::{CLICK_DELAY_MS, HID_READY_RETRIES};
pub use keyboard::{KeyboardReport, KeySet, Modifiers};
pub use keycode::KeyCode;
pub use mouse::{MouseButton, MouseButtons, MouseReport};

/// HID output error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Transport did not become ready in time
    NotReady,
    /// Transport refused the report
    Transport,
    /// No free slot for another held key
    CapacityExceeded,
}

/// Sink for keyboard and mouse reports
pub trait HidTransport {
    /// Whether a new report can be sent now
    fn ready(&mut self) -> bool;

    fn send_keyboard(&mut self, report: &KeyboardReport) -> Result<(), Error>;

    fn send_mouse(&mut self, report: &MouseReport) -> Result<(), Error>;
}

/// Current keyboard/mouse state as seen by the host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HidState {
    modifiers: Modifiers,
    keys: KeySet,
    buttons: MouseButtons,
}

impl HidState {
    pub const fn new() -> Self {
        Self {
            modifiers: Modifiers::NONE,
            keys: KeySet::new(),
            buttons: MouseButtons::NONE,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn keys(&self) -> &[u8] {
        self.keys.as_slice()
    }

    pub fn buttons(&self) -> MouseButtons {
        self.buttons
    }

    pub fn keyboard_report(&self) -> KeyboardReport {
        KeyboardReport {
            modifiers: self.modifiers,
            keys: self.keys.to_array(),
        }
    }

    pub fn mouse_report(&self) -> MouseReport {
        MouseReport {
            buttons: self.buttons,
            ..Default::default()
        }
    }
}

/// Mutable view of [`HidState`] that sends reports on every change
pub struct Hid<'a, T, D> {
    state: &'a mut HidState,
    transport: &'a mut T,
    delay: &'a mut D,
}

impl<'a, T, D> Hid<'a, T, D>
where
    T: HidTransport,
    D: DelayMs<u32>,
{
    pub fn new(state: &'a mut HidState, (transport, delay): (&'a mut T, &'a mut D)) -> Self {
        Self { state, transport, delay }
    }

    pub fn state(&self) -> &HidState {
        self.state
    }

    /// Hold key usage and send report
    pub fn press_key(&mut self, usage: u8) -> Result<(), Error> {
        if let Err(e) = self.state.keys.insert(usage) {
            warn!("Cannot hold key {=u8:x}, all slots taken", usage);
            return Err(e);
        }
        self.send_keyboard()
    }

    /// Release key usage and send report
    pub fn release_key(&mut self, usage: u8) -> Result<(), Error> {
        self.state.keys.remove(usage);
        self.send_keyboard()
    }

    /// Press a 16-bit key code, see [`keycode`]
    pub fn press_code(&mut self, code: u16) -> Result<(), Error> {
        match KeyCode::decode(code) {
            Some(KeyCode::Modifiers(modifiers)) => {
                self.state.modifiers.insert(modifiers);
                self.send_keyboard()
            },
            Some(KeyCode::Key { usage, modifiers }) => {
                if self.state.keys.len() == KeySet::CAPACITY && !self.state.keys.contains(usage) {
                    warn!("Cannot hold key {=u8:x}, all slots taken", usage);
                    return Err(Error::CapacityExceeded);
                }
                self.state.modifiers.insert(modifiers);
                self.press_key(usage)
            },
            None => Ok(()),
        }
    }

    /// Release a 16-bit key code together with its implied modifiers
    pub fn release_code(&mut self, code: u16) -> Result<(), Error> {
        match KeyCode::decode(code) {
            Some(KeyCode::Modifiers(modifiers)) => {
                self.state.modifiers.remove(modifiers);
                self.send_keyboard()
            },
            Some(KeyCode::Key { usage, modifiers }) => {
                self.state.modifiers.remove(modifiers);
                self.release_key(usage)
            },
            None => Ok(()),
        }
    }

    /// Type a single ASCII character without disturbing held keys
    ///
    /// Sends one report with only this character (and the current modifiers,
    /// plus shift if needed), then sends the unchanged state again.
    /// Characters without a usage are dropped.
    pub fn write(&mut self, c: u8) -> Result<(), Error> {
        match ascii::lookup(c) {
            Some((shift, usage)) => {
                let mut modifiers = self.state.modifiers;
                if shift {
                    modifiers.insert(Modifiers::LEFT_SHIFT);
                }
                self.tap(modifiers, usage)
            },
            None => {
                trace!("Dropping unmapped character {=u8:x}", c);
                Ok(())
            },
        }
    }

    /// [`Self::write`] every character
    pub fn type_str(&mut self, text: &[u8]) -> Result<(), Error> {
        text.iter().try_for_each(|&c| self.write(c))
    }

    /// Send a report with only `usage` held, then restore the current state
    pub fn tap(&mut self, modifiers: Modifiers, usage: u8) -> Result<(), Error> {
        self.send_keyboard_report(&KeyboardReport::single(modifiers, usage))?;
        self.send_keyboard()
    }

    pub fn mouse_press(&mut self, button: MouseButton) -> Result<(), Error> {
        self.state.buttons.set(button, true);
        self.send_mouse()
    }

    pub fn mouse_release(&mut self, button: MouseButton) -> Result<(), Error> {
        self.state.buttons.set(button, false);
        self.send_mouse()
    }

    /// Press, wait [`CLICK_DELAY_MS`], release
    pub fn mouse_click(&mut self, button: MouseButton) -> Result<(), Error> {
        self.mouse_press(button)?;
        self.delay.delay_ms(CLICK_DELAY_MS);
        self.mouse_release(button)
    }

    /// Click while holding additional modifiers, restoring the previous ones afterwards
    pub fn modified_click(&mut self, modifiers: Modifiers, button: MouseButton) -> Result<(), Error> {
        let saved = self.state.modifiers;
        self.state.modifiers.insert(modifiers);
        let clicked = self.send_keyboard().and_then(|_| self.mouse_click(button));
        self.state.modifiers = saved;
        let restored = self.send_keyboard();
        clicked.and(restored)
    }

    /// Send current keyboard state
    pub fn send_keyboard(&mut self) -> Result<(), Error> {
        let report = self.state.keyboard_report();
        self.send_keyboard_report(&report)
    }

    /// Send current mouse state
    pub fn send_mouse(&mut self) -> Result<(), Error> {
        self.wait_ready()?;
        let report = self.state.mouse_report();
        self.transport.send_mouse(&report)
            .map_err(|e| {
                error!("Mouse report failed: {}", e);
                e
            })
    }

    fn send_keyboard_report(&mut self, report: &KeyboardReport) -> Result<(), Error> {
        self.wait_ready()?;
        self.transport.send_keyboard(report)
            .map_err(|e| {
                error!("Keyboard report failed: {}", e);
                e
            })
    }

    fn wait_ready(&mut self) -> Result<(), Error> {
        for _ in 0..HID_READY_RETRIES {
            if self.transport.ready() {
                return Ok(());
            }
            self.delay.delay_ms(1);
        }
        error!("HID transport not ready");
        Err(Error::NotReady)
    }
}
