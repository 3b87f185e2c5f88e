//! Test doubles for the hardware interfaces

use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::serial;

use crate::hid::{self, HidTransport, KeyboardReport, MouseReport};

/// Report as observed by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Keyboard(KeyboardReport),
    Mouse(MouseReport),
}

/// HID transport that records every report sent
pub struct MockHid {
    pub reports: Vec<Report>,
    pub ready: bool,
    /// Refuse all reports
    pub fail: bool,
}

impl MockHid {
    pub fn new() -> Self {
        Self { reports: Vec::new(), ready: true, fail: false }
    }

    fn push(&mut self, report: Report) -> Result<(), hid::Error> {
        if self.fail {
            return Err(hid::Error::Transport);
        }
        self.reports.push(report);
        Ok(())
    }
}

impl HidTransport for MockHid {
    fn ready(&mut self) -> bool {
        self.ready
    }

    fn send_keyboard(&mut self, report: &KeyboardReport) -> Result<(), hid::Error> {
        self.push(Report::Keyboard(*report))
    }

    fn send_mouse(&mut self, report: &MouseReport) -> Result<(), hid::Error> {
        self.push(Report::Mouse(*report))
    }
}

/// Delay that only accumulates requested time
pub struct MockDelay {
    total_ms: u32,
}

impl MockDelay {
    pub fn new() -> Self {
        Self { total_ms: 0 }
    }

    pub fn total_ms(&self) -> u32 {
        self.total_ms
    }
}

impl DelayMs<u32> for MockDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += ms;
    }
}

/// Serial port with scripted input and recorded output
///
/// Input is a sequence of bytes and gaps, each gap makes one read return
/// `WouldBlock`. Reads past the end always return `WouldBlock`.
pub struct MockSerial {
    rx: VecDeque<Option<u8>>,
    pub tx: Vec<u8>,
    fail: bool,
}

impl MockSerial {
    pub fn new() -> Self {
        Self { rx: VecDeque::new(), tx: Vec::new(), fail: false }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied().map(Some));
    }

    pub fn gap(&mut self, reads: usize) {
        self.rx.extend(std::iter::repeat(None).take(reads));
    }

    /// Remaining scripted bytes and gaps
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Make every read fail with a hardware error
    pub fn fail_reads(&mut self) {
        self.fail = true;
    }
}

impl serial::Read<u8> for MockSerial {
    type Error = ();

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        if self.fail {
            return Err(nb::Error::Other(()));
        }
        match self.rx.pop_front() {
            Some(Some(byte)) => Ok(byte),
            _ => Err(nb::Error::WouldBlock),
        }
    }
}

impl serial::Write<u8> for MockSerial {
    type Error = ();

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        if self.fail {
            return Err(nb::Error::Other(()));
        }
        self.tx.push(word);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}
