//! Board support package
//!
//! Code that builds on top of the MCU-specific HAL to implement support for
//! the board: pedal switches, USB classes and a blocking delay.

pub mod usb;

use core::convert::Infallible;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::InputPin;
use static_assertions::const_assert_eq;
use stm32f0xx_hal::gpio;

/// Number of pedal inputs on the board
pub const N_PEDAL_PINS: usize = 3;

// Configuration must describe exactly the pedals present on the board
const_assert_eq!(crate::config::N_PEDALS, N_PEDAL_PINS);

pub type PedalPin = gpio::Pin<gpio::Input<gpio::PullUp>>;

/// Helper trait to resolve Infallible Results
pub trait InfallibleResult<T> {
    fn infallible(self) -> T;
}

impl<T> InfallibleResult<T> for Result<T, Infallible> {
    fn infallible(self) -> T {
        match self {
            Ok(v) => v,
            Err(never) => match never {},
        }
    }
}

/// Pedal switches
///
/// Each switch shorts its pin to ground, so a low level means pressed.
pub struct PedalInputs {
    pins: [PedalPin; N_PEDAL_PINS],
}

impl PedalInputs {
    pub fn new(pins: [PedalPin; N_PEDAL_PINS]) -> Self {
        Self { pins }
    }

    /// Sample all pedals, `true` when pressed
    pub fn read(&self) -> [bool; N_PEDAL_PINS] {
        core::array::from_fn(|i| self.pins[i].is_low().infallible())
    }
}

/// Busy-wait delay based on core clock cycles
///
/// SysTick stays free and the delay may be used from any task.
#[derive(Clone, Copy)]
pub struct AsmDelay {
    cycles_per_ms: u32,
}

impl AsmDelay {
    pub const fn new(sysclk_hz: u32) -> Self {
        Self { cycles_per_ms: sysclk_hz / 1000 }
    }
}

impl DelayMs<u32> for AsmDelay {
    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            cortex_m::asm::delay(self.cycles_per_ms);
        }
    }
}
