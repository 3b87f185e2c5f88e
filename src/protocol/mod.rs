//! Framed serial command protocol
//!
//! Each message is a fixed 16-byte [`Header`] followed by `length` bytes of
//! payload. All header fields are little-endian `u32`s:
//!
//! | field          | meaning                              |
//! |----------------|--------------------------------------|
//! | start-of-frame | [`START_OF_FRAME`], all bits set     |
//! | length         | payload byte count                   |
//! | crc32          | CRC-32 of the payload only           |
//! | command        | [`CommandCode`]                      |
//!
//! [`FrameDecoder`] reads one frame at a time from a byte source with a
//! per-byte timeout and hands out a [`Frame`] that [`Command::parse`] turns
//! into a typed command. Nothing survives between two decode attempts.

/// Command codes and typed payloads
pub mod command;
/// Frame header, decoder and encoder
pub mod frame;

pub use command::{Command, CommandCode, CommandError};
pub use frame::{encode_frame, DecodeError, EncodeError, Frame, FrameDecoder, Header};

/// Marker value of the first header field
pub const START_OF_FRAME: u32 = 0xffff_ffff;

/// Size of the frame header in bytes
pub const HEADER_SIZE: usize = 16;
