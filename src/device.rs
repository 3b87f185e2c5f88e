//! Top-level device state

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::serial;

use crate::actions;
use crate::config::{DeviceConfig, DEVICE_ID, VAULT_CAPACITY};
use crate::hid::{self, keycode::usage, Hid, HidState, HidTransport, Modifiers};
use crate::keep_awake::KeepAwake;
use crate::pedal::Pedals;
use crate::protocol::{Command, CommandError, DecodeError, Frame};

/// Any error while running the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    Decode(DecodeError),
    Command(CommandError),
    Hid(hid::Error),
    /// Reply could not be written to the serial port
    Response,
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

impl From<hid::Error> for Error {
    fn from(e: hid::Error) -> Self {
        Self::Hid(e)
    }
}

/// Secret text that can be typed on request
pub struct Vault {
    data: [u8; VAULT_CAPACITY],
    len: usize,
}

impl Vault {
    pub const fn new() -> Self {
        Self { data: [0; VAULT_CAPACITY], len: 0 }
    }

    /// Replace contents, previous secret is overwritten with zeros
    pub fn store(&mut self, secret: &[u8]) -> Result<(), CommandError> {
        if secret.len() > VAULT_CAPACITY {
            return Err(CommandError::CapacityExceeded);
        }
        self.clear();
        self.data[..secret.len()].copy_from_slice(secret);
        self.len = secret.len();
        Ok(())
    }

    pub fn clear(&mut self) {
        for byte in self.data[..self.len].iter_mut() {
            // SAFETY: `byte` is a valid, exclusive reference
            unsafe { core::ptr::write_volatile(byte, 0) };
        }
        self.len = 0;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

/// Foot pedal device
///
/// Owns all mutable device state. Hardware access is passed in on each call:
/// `io` is the HID transport with a blocking delay, `sink` receives command
/// replies.
pub struct Footmouse<const N: usize> {
    pedals: Pedals<N>,
    hid: HidState,
    vault: Vault,
    keep_awake: KeepAwake,
}

impl<const N: usize> Footmouse<N> {
    pub fn new(config: &DeviceConfig<N>) -> Self {
        Self {
            pedals: Pedals::new(&config.pedals),
            hid: HidState::new(),
            vault: Vault::new(),
            keep_awake: KeepAwake::new(&config.keep_awake),
        }
    }

    pub fn pedals(&self) -> &Pedals<N> {
        &self.pedals
    }

    pub fn hid_state(&self) -> &HidState {
        &self.hid
    }

    pub fn keep_awake(&self) -> &KeepAwake {
        &self.keep_awake
    }

    /// Single poll cycle: debounce all pedals and perform resulting actions
    ///
    /// `samples[i]` is `true` when pedal `i` is physically pressed. All pedals
    /// are processed even if sending some reports fails; the first error is
    /// returned.
    pub fn tick<T, D>(&mut self, io: (&mut T, &mut D), samples: &[bool; N], now_us: u32) -> Result<(), hid::Error>
    where
        T: HidTransport,
        D: DelayMs<u32>,
    {
        let mut hid = Hid::new(&mut self.hid, io);
        let mut result = Ok(());

        for (i, &sample) in samples.iter().enumerate() {
            let transition = self.pedals.poll(i, sample, now_us);
            if let (Some(transition), Some(pedal)) = (transition, self.pedals.get(i)) {
                result = result.and(actions::apply(pedal, transition, &mut hid));
            }
        }

        if self.keep_awake.poll(now_us) {
            trace!("Keep-awake tap");
            result = result.and(hid.tap(Modifiers::NONE, usage::F15));
        }

        result
    }

    /// Execute a decoded frame
    ///
    /// Refused commands do not change any state. [`Command::ReturnCrc`]
    /// replies with the CRC the decoder computed before this frame.
    pub fn execute<W, T, D>(&mut self, frame: &Frame<'_>, sink: &mut W, io: (&mut T, &mut D)) -> Result<(), Error>
    where
        W: serial::Write<u8>,
        T: HidTransport,
        D: DelayMs<u32>,
    {
        info!("Command {=u32} with {=usize} bytes", frame.command, frame.payload.len());
        let result = Command::parse(frame.command, frame.payload)
            .map_err(Error::from)
            .and_then(|command| self.dispatch(command, frame, sink, io));
        if let Err(e) = result {
            warn!("Command {=u32} failed: {}", frame.command, e);
        }
        result
    }

    fn dispatch<W, T, D>(
        &mut self,
        command: Command<'_>,
        frame: &Frame<'_>,
        sink: &mut W,
        io: (&mut T, &mut D),
    ) -> Result<(), Error>
    where
        W: serial::Write<u8>,
        T: HidTransport,
        D: DelayMs<u32>,
    {
        match command {
            Command::Identify => respond(sink, DEVICE_ID)?,
            Command::SetButtonMode { pedal, mode, inverted } => {
                self.pedals.configure(pedal, mode, inverted)?;
            },
            Command::SetKeycombo { pedal, inverted, codes } => {
                self.pedals.configure_keycombo(pedal, inverted, &codes)?;
            },
            Command::ResetButtonsToDefault => {
                let mut hid = Hid::new(&mut self.hid, io);
                self.pedals.reset_all_to_defaults(&mut hid)?;
            },
            Command::Echo(data) => respond(sink, data)?,
            Command::SendAsciiKeys(text) => {
                Hid::new(&mut self.hid, io).type_str(text)?;
            },
            Command::SetVault(secret) => {
                self.vault.store(secret)?;
                debug!("Vault set ({=usize} bytes)", secret.len());
            },
            Command::KeyboardTypeVault => {
                Hid::new(&mut self.hid, io).type_str(self.vault.as_bytes())?;
            },
            Command::ReturnCrc => respond(sink, &frame.previous_crc.to_le_bytes())?,
            Command::KeepAwake(enabled) => self.keep_awake.set_enabled(enabled),
        }
        Ok(())
    }
}

fn respond<W: serial::Write<u8>>(sink: &mut W, data: &[u8]) -> Result<(), Error> {
    for &byte in data {
        nb::block!(sink.write(byte)).map_err(|_| Error::Response)?;
    }
    nb::block!(sink.flush()).map_err(|_| Error::Response)
}
