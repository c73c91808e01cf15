//! Error types for viperflash-core
//!
//! This module provides a no_std compatible error type shared by the host
//! tool, the transports and the bridge firmware.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Transport errors
    /// The selected medium could not be opened or configured
    TransportUnavailable,
    /// Low-level I/O failure on the transport
    IoError,

    // Signalling errors
    /// The acknowledge line never reached the expected level
    SignalFault,
    /// The power-on handshake failed, no chip is answering
    ChipNotPresent,

    // Stream errors
    /// A readiness wait timed out during a transfer
    StreamStall,
    /// A chunk acknowledgment did not carry the expected byte count
    AckMismatch {
        /// Byte count the host expected
        expected: u8,
        /// Byte count the firmware reported
        found: u8,
    },
    /// The link closed before all bytes arrived
    ShortRead,

    // Image errors
    /// Image file is empty
    EmptyImage,
    /// Image file does not fit in the flash array
    ImageTooLarge {
        /// Size of the rejected image in bytes
        size: usize,
    },
    /// Chip contents differ from the expected image
    Mismatch {
        /// Offset of the first differing byte
        addr: u32,
        /// Byte from the image
        expected: u8,
        /// Byte read from the chip
        found: u8,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransportUnavailable => write!(f, "transport unavailable"),
            Self::IoError => write!(f, "I/O error"),
            Self::SignalFault => write!(f, "chip did not acknowledge signal"),
            Self::ChipNotPresent => write!(f, "Viper GC not found"),
            Self::StreamStall => write!(f, "bridge timed out"),
            Self::AckMismatch { expected, found } => write!(
                f,
                "chunk acknowledgment mismatch: expected {}, got {}",
                expected, found
            ),
            Self::ShortRead => write!(f, "link closed before transfer completed"),
            Self::EmptyImage => write!(f, "image is empty"),
            Self::ImageTooLarge { size } => write!(
                f,
                "image of {} bytes won't fit on the chip ({} bytes)",
                size,
                crate::FLASH_SIZE
            ),
            Self::Mismatch {
                addr,
                expected,
                found,
            } => write!(
                f,
                "first difference at address 0x{:05X}: expected 0x{:02X}, found 0x{:02X}",
                addr, expected, found
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
