//! Device configuration
//!
//! Timing and capacity constants are fixed at compile time. Per-device
//! defaults ([`CONFIG`]) are either written by hand below or, with the
//! `json-config` feature, generated by the build script from a JSON file.

use static_assertions::const_assert;

use crate::pedal::PedalMode;

#[cfg(feature = "json-config")]
pub use generated::{CONFIG, N_PEDALS};

#[cfg(not(feature = "json-config"))]
pub use code::{CONFIG, N_PEDALS};

/// Number of consecutive equal samples needed to change pedal state
pub const GLITCH_SAMPLE_CNT: u8 = 5;
/// Pedal sampling period
pub const POLL_PERIOD_US: u32 = 20;
/// Minimum time between two accepted pedal state changes
pub const DEBOUNCE_RESET_US: u32 = 20_000;
/// Retries (1 ms apart) when waiting for a single frame byte
pub const READ_TIMEOUT_MS: u32 = 20;
/// Retries (1 ms apart) when waiting for the HID transport
pub const HID_READY_RETRIES: u32 = 1000;
/// Time between mouse button press and release in a click
pub const CLICK_DELAY_MS: u32 = 2;
pub const MAX_PAYLOAD_SIZE: usize = 256;
pub const MAX_KEYCOMBO: usize = 64;
pub const VAULT_CAPACITY: usize = 256;
/// Reply to the identify command
pub const DEVICE_ID: &[u8] = b"footmouse\n";
pub const KEEP_AWAKE_PERIOD_MS: u32 = 60_000;

const_assert!(GLITCH_SAMPLE_CNT >= 1 && GLITCH_SAMPLE_CNT <= 8);
// Full key combo command must fit in a single frame
const_assert!(3 + 2 * MAX_KEYCOMBO <= MAX_PAYLOAD_SIZE);
const_assert!(DEBOUNCE_RESET_US > GLITCH_SAMPLE_CNT as u32 * POLL_PERIOD_US);

/// Power-on settings of a pedal, restored by the reset command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PedalDefaults {
    pub mode: PedalMode,
    pub inverted: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Reject frames with CRC mismatch instead of only logging it
    pub strict_crc: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAwakeConfig {
    pub period_ms: u32,
    pub enabled_at_boot: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig<const N: usize> {
    pub pedals: [PedalDefaults; N],
    pub protocol: ProtocolConfig,
    pub keep_awake: KeepAwakeConfig,
}

#[cfg(feature = "json-config")]
mod generated {
    include!(concat!(env!("OUT_DIR"), "/config.rs"));
}

#[cfg(not(feature = "json-config"))]
mod code {
    use super::*;

    pub const N_PEDALS: usize = 3;

    const fn pedal(mode: PedalMode) -> PedalDefaults {
        PedalDefaults { mode, inverted: false, enabled: true }
    }

    pub static CONFIG: DeviceConfig<N_PEDALS> = DeviceConfig {
        pedals: [
            pedal(PedalMode::MouseLeft),
            pedal(PedalMode::MouseMiddle),
            pedal(PedalMode::MouseRight),
        ],
        protocol: ProtocolConfig {
            strict_crc: true,
        },
        keep_awake: KeepAwakeConfig {
            period_ms: KEEP_AWAKE_PERIOD_MS,
            enabled_at_boot: false,
        },
    };
}
