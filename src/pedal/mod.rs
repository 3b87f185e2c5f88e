//! Pedal configuration and debouncing

mod debounce;
mod mode;

use embedded_hal::blocking::delay::DelayMs;
use heapless::Vec;

use crate::config::{PedalDefaults, GLITCH_SAMPLE_CNT, MAX_KEYCOMBO};
use crate::hid::{self, Hid, HidTransport};
use crate::protocol::CommandError;
pub use debounce::{GlitchFilter, Level};
pub use mode::PedalMode;

/// Logical pedal event after applying inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    Engage,
    Disengage,
}

/// Configuration and debounce state of a single pedal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pedal {
    pub mode: PedalMode,
    /// Engage when released instead of when pressed
    pub inverted: bool,
    pub enabled: bool,
    default_mode: PedalMode,
    default_inverted: bool,
    keycombo: Vec<u16, MAX_KEYCOMBO>,
    filter: GlitchFilter<GLITCH_SAMPLE_CNT>,
}

impl Pedal {
    pub const fn new(defaults: &PedalDefaults) -> Self {
        Self {
            mode: defaults.mode,
            inverted: defaults.inverted,
            enabled: defaults.enabled,
            default_mode: defaults.mode,
            default_inverted: defaults.inverted,
            keycombo: Vec::new(),
            filter: GlitchFilter::new(),
        }
    }

    pub fn default_mode(&self) -> PedalMode {
        self.default_mode
    }

    pub fn default_inverted(&self) -> bool {
        self.default_inverted
    }

    /// Key codes pressed in [`PedalMode::KeyCombo`]
    pub fn keycombo(&self) -> &[u16] {
        &self.keycombo
    }

    /// Debounced physical position
    pub fn level(&self) -> Level {
        self.filter.level()
    }

    /// Whether the pedal is currently in its active position
    pub fn should_engage(&self) -> bool {
        (self.filter.level() == Level::Down) != self.inverted
    }

    /// Advance debouncing with a raw sample (`true` = pressed)
    pub fn poll(&mut self, sample: bool, now_us: u32) -> Option<Transition> {
        if !self.enabled {
            return None;
        }
        self.filter.update(sample, now_us)?;
        Some(if self.should_engage() {
            Transition::Engage
        } else {
            Transition::Disengage
        })
    }

    /// Restore mode and inversion, releasing a held mouse button first
    pub fn reset_to_defaults<T, D>(&mut self, hid: &mut Hid<'_, T, D>) -> Result<(), hid::Error>
    where
        T: HidTransport,
        D: DelayMs<u32>,
    {
        let released = match self.mode.mouse_button() {
            Some(button) => hid.mouse_release(button),
            None => Ok(()),
        };
        self.mode = self.default_mode;
        self.inverted = self.default_inverted;
        released
    }
}

/// All pedals of the device, indexed by their position
pub struct Pedals<const N: usize> {
    pedals: [Pedal; N],
}

impl<const N: usize> Pedals<N> {
    pub fn new(defaults: &[PedalDefaults; N]) -> Self {
        Self {
            pedals: core::array::from_fn(|i| Pedal::new(&defaults[i])),
        }
    }

    pub fn get(&self, index: usize) -> Option<&Pedal> {
        self.pedals.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pedal> {
        self.pedals.iter()
    }

    pub const fn len(&self) -> usize {
        N
    }

    fn pedal_mut(&mut self, index: u8) -> Result<&mut Pedal, CommandError> {
        self.pedals.get_mut(index as usize)
            .ok_or(CommandError::IndexOutOfRange(index))
    }

    pub fn configure(&mut self, index: u8, mode: PedalMode, inverted: bool) -> Result<(), CommandError> {
        let pedal = self.pedal_mut(index)?;
        pedal.mode = mode;
        pedal.inverted = inverted;
        Ok(())
    }

    /// Store key combo and switch the pedal to [`PedalMode::KeyCombo`]
    pub fn configure_keycombo(&mut self, index: u8, inverted: bool, codes: &[u16]) -> Result<(), CommandError> {
        let combo = Vec::from_slice(codes).map_err(|_| CommandError::CapacityExceeded)?;
        let pedal = self.pedal_mut(index)?;
        pedal.keycombo = combo;
        pedal.mode = PedalMode::KeyCombo;
        pedal.inverted = inverted;
        Ok(())
    }

    pub fn set_enabled(&mut self, index: u8, enabled: bool) -> Result<(), CommandError> {
        self.pedal_mut(index)?.enabled = enabled;
        Ok(())
    }

    /// Reset every pedal, returning the first HID error if any
    pub fn reset_all_to_defaults<T, D>(&mut self, hid: &mut Hid<'_, T, D>) -> Result<(), hid::Error>
    where
        T: HidTransport,
        D: DelayMs<u32>,
    {
        self.pedals.iter_mut()
            .map(|pedal| pedal.reset_to_defaults(hid))
            .fold(Ok(()), |acc, r| acc.and(r))
    }

    /// Debounce a raw sample of pedal `index`
    ///
    /// Returns `None` for an out of range index.
    pub fn poll(&mut self, index: usize, sample: bool, now_us: u32) -> Option<Transition> {
        let transition = self.pedals.get_mut(index)?.poll(sample, now_us);
        if let Some(t) = transition {
            debug!("Pedal {=usize}: {}", index, t);
        }
        transition
    }
}
