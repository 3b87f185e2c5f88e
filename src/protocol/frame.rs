use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::serial;
use packed_struct::prelude::*;

use crate::config::{MAX_PAYLOAD_SIZE, READ_TIMEOUT_MS};
use crate::crc::{ChecksumGen, Crc32};
use super::{HEADER_SIZE, START_OF_FRAME};

/// Upper bound of bytes dropped from the source after a rejected header
const DISCARD_LIMIT: usize = 4 * (HEADER_SIZE + MAX_PAYLOAD_SIZE);

/// Frame header as sent on the wire
#[derive(PackedStruct, Debug, Clone, Copy, PartialEq, Eq)]
#[packed_struct(endian = "lsb")]
pub struct Header {
    /// Must be equal to [`START_OF_FRAME`]
    pub sof: u32,
    /// Number of payload bytes following the header
    pub length: u32,
    /// CRC-32 of the payload
    pub crc32: u32,
    /// Raw command code
    pub command: u32,
}

/// Validated frame, payload borrowed from the decoder buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Raw command code, see [`super::CommandCode`]
    pub command: u32,
    pub payload: &'a [u8],
    /// CRC-32 computed over the received payload
    pub crc: u32,
    /// CRC-32 computed over the payload received before this one, valid or not
    pub previous_crc: u32,
}

/// Reason for abandoning a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// A header byte did not arrive in time
    ReadTimeout,
    /// Header does not start with [`START_OF_FRAME`]
    BadSync { found: u32 },
    /// Declared length does not fit in the payload buffer
    PayloadTooLarge { length: u32 },
    /// Payload stopped arriving before `expected` bytes were received
    LengthMismatch { expected: u32, received: u32 },
    /// Payload checksum differs from the header (only with strict integrity checks)
    IntegrityMismatch { expected: u32, computed: u32 },
    /// Header bytes could not be unpacked
    Malformed,
    /// Byte source reported an error
    Source,
}

/// Error when encoding a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Output buffer cannot hold header and payload
    BufTooShort,
    /// Header could not be packed
    Packing,
}

/// Reads frames from a byte source
///
/// Every call to [`FrameDecoder::read_frame`] starts with a fresh header.
/// There is no resynchronization inside the stream: when a header is rejected
/// all bytes that are already pending in the source are dropped, so the next
/// attempt starts at the next write from the host.
pub struct FrameDecoder {
    crc: Crc32,
    strict: bool,
    last_crc: u32,
    buf: [u8; MAX_PAYLOAD_SIZE],
}

impl FrameDecoder {
    /// Create decoder; with `strict` frames with invalid CRC are rejected
    pub const fn new(strict: bool) -> Self {
        Self {
            crc: Crc32::new(),
            strict,
            last_crc: 0,
            buf: [0; MAX_PAYLOAD_SIZE],
        }
    }

    /// CRC-32 of the most recently received payload, including rejected ones
    pub fn last_crc(&self) -> u32 {
        self.last_crc
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Read a complete frame, blocking for at most [`READ_TIMEOUT_MS`] per byte
    pub fn read_frame<S, D>(&mut self, source: &mut S, delay: &mut D) -> Result<Frame<'_>, DecodeError>
    where
        S: serial::Read<u8>,
        D: DelayMs<u32>,
    {
        let mut raw = [0u8; HEADER_SIZE];
        for byte in raw.iter_mut() {
            *byte = read_byte(source, delay)?;
        }
        let header = Header::unpack(&raw).map_err(|_| DecodeError::Malformed)?;

        trace!("Header: sof={=u32:x} length={=u32} crc={=u32:x} cmd={=u32}",
            header.sof, header.length, header.crc32, header.command);

        if header.sof != START_OF_FRAME {
            let dropped = discard_pending(source);
            warn!("No start-of-frame (found {=u32:x}), dropped {=usize} bytes", header.sof, dropped);
            return Err(DecodeError::BadSync { found: header.sof });
        }

        let length = header.length as usize;
        if length > self.buf.len() {
            let dropped = discard_pending(source);
            warn!("Payload of {=u32} bytes exceeds buffer, dropped {=usize} bytes", header.length, dropped);
            return Err(DecodeError::PayloadTooLarge { length: header.length });
        }

        for (received, byte) in self.buf[..length].iter_mut().enumerate() {
            *byte = read_byte(source, delay).map_err(|e| match e {
                DecodeError::ReadTimeout => DecodeError::LengthMismatch {
                    expected: header.length,
                    received: received as u32,
                },
                e => e,
            })?;
        }

        let payload = &self.buf[..length];
        let crc = self.crc.checksum(payload);
        let previous_crc = core::mem::replace(&mut self.last_crc, crc);
        if crc != header.crc32 {
            if self.strict {
                warn!("CRC-32 check failed: expected {=u32:x}, computed {=u32:x}", header.crc32, crc);
                return Err(DecodeError::IntegrityMismatch { expected: header.crc32, computed: crc });
            }
            warn!("CRC-32 check failed: expected {=u32:x}, computed {=u32:x} (accepted)", header.crc32, crc);
        }

        Ok(Frame { command: header.command, payload, crc, previous_crc })
    }
}

/// Get the next byte, retrying every millisecond up to [`READ_TIMEOUT_MS`] times
fn read_byte<S, D>(source: &mut S, delay: &mut D) -> Result<u8, DecodeError>
where
    S: serial::Read<u8>,
    D: DelayMs<u32>,
{
    for _ in 0..READ_TIMEOUT_MS {
        match source.read() {
            Ok(byte) => return Ok(byte),
            Err(nb::Error::WouldBlock) => delay.delay_ms(1),
            Err(nb::Error::Other(_)) => return Err(DecodeError::Source),
        }
    }
    Err(DecodeError::ReadTimeout)
}

/// Drop whatever is immediately available in the source
fn discard_pending<S: serial::Read<u8>>(source: &mut S) -> usize {
    let mut dropped = 0;
    while dropped < DISCARD_LIMIT && source.read().is_ok() {
        dropped += 1;
    }
    dropped
}

/// Serialize a frame with the given command and payload into `buf`
pub fn encode_frame<'a, C>(
    checksum: &mut C,
    command: u32,
    payload: &[u8],
    buf: &'a mut [u8],
) -> Result<&'a [u8], EncodeError>
where
    C: ChecksumGen<Output = u32>,
{
    let total = HEADER_SIZE + payload.len();
    if buf.len() < total {
        return Err(EncodeError::BufTooShort);
    }
    let header = Header {
        sof: START_OF_FRAME,
        length: payload.len() as u32,
        crc32: checksum.checksum(payload),
        command,
    };
    let raw = header.pack().map_err(|_| EncodeError::Packing)?;
    buf[..HEADER_SIZE].copy_from_slice(&raw);
    buf[HEADER_SIZE..total].copy_from_slice(payload);
    Ok(&buf[..total])
}
