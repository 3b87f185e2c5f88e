use core::convert::TryFrom;

use heapless::Vec;

use crate::config::MAX_KEYCOMBO;
use crate::pedal::PedalMode;

/// Command code carried in the frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum CommandCode {
    Identify = 4,
    SetButtonMode = 5,
    ResetButtonsToDefault = 6,
    Echo = 7,
    SendAsciiKeys = 8,
    SetVault = 10,
    KeyboardTypeVault = 11,
    SetKeycombo = 12,
    ReturnCrc = 13,
    KeepAwakeEnable = 14,
    KeepAwakeDisable = 15,
}

impl TryFrom<u32> for CommandCode {
    type Error = CommandError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        use CommandCode::*;
        Ok(match value {
            4 => Identify,
            5 => SetButtonMode,
            6 => ResetButtonsToDefault,
            7 => Echo,
            8 => SendAsciiKeys,
            10 => SetVault,
            11 => KeyboardTypeVault,
            12 => SetKeycombo,
            13 => ReturnCrc,
            14 => KeepAwakeEnable,
            15 => KeepAwakeDisable,
            other => return Err(CommandError::UnknownCommand(other)),
        })
    }
}

/// Reason for refusing a decoded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    UnknownCommand(u32),
    UnknownMode(u8),
    PayloadTooShort { expected: usize, received: usize },
    /// Pedal index beyond the configured pedals
    IndexOutOfRange(u8),
    /// Key combo or vault contents do not fit
    CapacityExceeded,
}

/// Typed command, borrowing variable-length data from the frame payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    /// Reply with the device identifier
    Identify,
    SetButtonMode {
        pedal: u8,
        mode: PedalMode,
        inverted: bool,
    },
    /// Store a key combo and switch the pedal to [`PedalMode::KeyCombo`]
    SetKeycombo {
        pedal: u8,
        inverted: bool,
        codes: Vec<u16, MAX_KEYCOMBO>,
    },
    ResetButtonsToDefault,
    /// Reply with the payload
    Echo(&'a [u8]),
    /// Type the ASCII text
    SendAsciiKeys(&'a [u8]),
    SetVault(&'a [u8]),
    KeyboardTypeVault,
    /// Reply with the CRC of the previous frame
    ReturnCrc,
    KeepAwake(bool),
}

impl<'a> Command<'a> {
    /// Interpret frame payload according to the command code
    pub fn parse(code: u32, payload: &'a [u8]) -> Result<Self, CommandError> {
        let cmd = match CommandCode::try_from(code)? {
            CommandCode::Identify => Command::Identify,
            CommandCode::SetButtonMode => {
                let [pedal, mode, inverted] = fixed::<3>(payload)?;
                let mode = PedalMode::try_from(mode).map_err(CommandError::UnknownMode)?;
                Command::SetButtonMode { pedal, mode, inverted: inverted != 0 }
            },
            CommandCode::SetKeycombo => {
                let [pedal, inverted, count] = fixed::<3>(payload)?;
                let codes = keycombo_codes(count as usize, payload)?;
                Command::SetKeycombo { pedal, inverted: inverted != 0, codes }
            },
            CommandCode::ResetButtonsToDefault => Command::ResetButtonsToDefault,
            CommandCode::Echo => Command::Echo(payload),
            CommandCode::SendAsciiKeys => Command::SendAsciiKeys(until_nul(payload)),
            CommandCode::SetVault => Command::SetVault(until_nul(payload)),
            CommandCode::KeyboardTypeVault => Command::KeyboardTypeVault,
            CommandCode::ReturnCrc => Command::ReturnCrc,
            CommandCode::KeepAwakeEnable => Command::KeepAwake(true),
            CommandCode::KeepAwakeDisable => Command::KeepAwake(false),
        };
        Ok(cmd)
    }
}

fn fixed<const L: usize>(payload: &[u8]) -> Result<[u8; L], CommandError> {
    payload.get(..L)
        .and_then(|bytes| <[u8; L]>::try_from(bytes).ok())
        .ok_or(CommandError::PayloadTooShort { expected: L, received: payload.len() })
}

fn keycombo_codes(count: usize, payload: &[u8]) -> Result<Vec<u16, MAX_KEYCOMBO>, CommandError> {
    if count > MAX_KEYCOMBO {
        return Err(CommandError::CapacityExceeded);
    }
    let expected = 3 + 2 * count;
    let raw = payload.get(3..expected)
        .ok_or(CommandError::PayloadTooShort { expected, received: payload.len() })?;

    let mut codes = Vec::new();
    for pair in raw.chunks_exact(2) {
        codes.push(u16::from_le_bytes([pair[0], pair[1]]))
            .map_err(|_| CommandError::CapacityExceeded)?;
    }
    Ok(codes)
}

/// Host tools send C strings, ignore everything from the terminator on
fn until_nul(text: &[u8]) -> &[u8] {
    match text.iter().position(|&b| b == 0) {
        Some(end) => &text[..end],
        None => text,
    }
}
