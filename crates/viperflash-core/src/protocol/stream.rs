//! Serial bridge link framing
//!
//! Every request on the serial link starts with one command byte whose top
//! two bits select the operation:
//!
//! ```text
//! 00dddddd            drive the output lines with d
//! 01xxxxxx            reply with one status byte
//! 10nnnnnn nnnnnnnn nnnnnnnn   stream-read n bytes
//! 11nnnnnn nnnnnnnn nnnnnnnn   stream-write n bytes, in 60-byte chunks
//! ```
//!
//! A write stream is sent as chunks of [`CHUNK_SIZE`] bytes. The final chunk
//! is zero padded, and the bridge answers every chunk with one byte holding
//! the number of bytes it received.

use crate::programmer::{OutputLines, StatusLines};
use crate::FLASH_SIZE;

/// Write stream chunk size in bytes
pub const CHUNK_SIZE: usize = 60;

/// Longest stream either side accepts
pub const MAX_STREAM_LEN: usize = FLASH_SIZE;

/// Status request command byte
pub const STATUS_REQUEST: u8 = 0x40;

const TAG_MASK: u8 = 0xC0;
const TAG_OUTPUT: u8 = 0x00;
const TAG_STATUS: u8 = 0x40;
const TAG_READ: u8 = 0x80;
const TAG_WRITE: u8 = 0xC0;

/// Decoded command byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Drive the output lines
    Output(OutputLines),
    /// Sample the status lines
    Status,
    /// Stream-read, two more header bytes follow
    ReadStream,
    /// Stream-write, two more header bytes follow
    WriteStream,
}

impl Opcode {
    /// Decode the top two bits of a command byte
    pub fn from_byte(byte: u8) -> Self {
        match byte & TAG_MASK {
            TAG_OUTPUT => Self::Output(OutputLines::from_raw(byte)),
            TAG_STATUS => Self::Status,
            TAG_READ => Self::ReadStream,
            _ => Self::WriteStream,
        }
    }
}

/// Direction of a bulk stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamDirection {
    /// Bridge to host
    Read,
    /// Host to bridge
    Write,
}

impl StreamDirection {
    const fn tag(self) -> u8 {
        match self {
            Self::Read => TAG_READ,
            Self::Write => TAG_WRITE,
        }
    }
}

/// Command byte driving the output lines
pub fn output_command(lines: OutputLines) -> u8 {
    TAG_OUTPUT | (lines.bits() & !TAG_MASK)
}

/// Status byte as sent back by the bridge
pub fn status_byte(status: StatusLines) -> u8 {
    (status & (StatusLines::ACK | StatusLines::DATA)).bits()
}

/// Build the 3-byte stream header for `len` bytes
///
/// Returns `None` for streams longer than [`MAX_STREAM_LEN`].
pub fn encode_header(direction: StreamDirection, len: usize) -> Option<[u8; 3]> {
    if len > MAX_STREAM_LEN {
        return None;
    }
    Some([
        direction.tag() | (len >> 16) as u8,
        (len >> 8) as u8,
        len as u8,
    ])
}

/// Extract the 22-bit length from a stream header
pub fn decode_length(header: &[u8; 3]) -> u32 {
    (((header[0] & !TAG_MASK) as u32) << 16)
        | ((header[1] as u32) << 8)
        | header[2] as u32
}

/// Number of chunk round trips needed to stream `len` bytes
pub fn chunk_count(len: usize) -> usize {
    len.div_ceil(CHUNK_SIZE)
}

/// Copy a chunk payload into a full-size, zero padded chunk
///
/// Payloads longer than [`CHUNK_SIZE`] are truncated.
pub fn pad_chunk(payload: &[u8]) -> [u8; CHUNK_SIZE] {
    let mut chunk = [0u8; CHUNK_SIZE];
    let n = payload.len().min(CHUNK_SIZE);
    chunk[..n].copy_from_slice(&payload[..n]);
    chunk
}
