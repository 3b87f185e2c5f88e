//! Firmware core of a USB foot pedal
//!
//! Raw pedal samples are debounced into engage/disengage transitions, which
//! are translated into HID keyboard/mouse reports according to the mode of
//! each pedal. Pedal behavior is reconfigured at runtime through a framed,
//! CRC-32 protected serial protocol.
//!
//! Everything except [`bsp`] is hardware independent and tested on the host.

#![no_std]

// Use std when running tests, see: https://stackoverflow.com/a/28186509
// Make sure to use different target when testing, e.g.
//   cargo test --target x86_64-unknown-linux-gnu
#[cfg(test)]
#[macro_use]
extern crate std;

#[macro_use]
mod fmt;

pub mod actions;
pub mod config;
pub mod crc;
pub mod device;
pub mod hid;
pub mod keep_awake;
pub mod pedal;
pub mod protocol;

#[cfg(feature = "firmware")]
pub mod bsp;

#[cfg(test)]
mod mock;

pub use device::Footmouse;

/// Build information generated by `built`
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
