//! Error types for serial bridge operations

use thiserror::Error;
use viperflash_core::Error as CoreError;

/// Bridge-specific errors
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Failed to open the serial device
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The bridge never answered the status ping
    #[error("Bridge did not answer, check the cable and the firmware")]
    NoResponse,

    /// A bounded wait ran out during a stream
    #[error("Bridge timed out")]
    Timeout,

    /// A status request outside a stream went unanswered
    #[error("Bridge did not answer a status request")]
    StatusTimeout,

    /// The stream would run past the end of the flash array
    #[error("Stream of {len} bytes is longer than the flash array")]
    StreamTooLong { len: usize },

    /// A chunk acknowledgment carried an unexpected byte count
    #[error("Chunk acknowledgment mismatch: expected {expected}, got {found}")]
    AckMismatch { expected: u8, found: u8 },

    /// The other end of the link went away
    #[error("Link disconnected")]
    Disconnected,

    /// I/O error during communication
    #[error("I/O error: {0}")]
    IoError(String),

    /// Serial port error
    #[error("Serial port error: {0}")]
    SerialError(#[from] serialport::Error),
}

/// Result type for bridge operations
pub type Result<T> = core::result::Result<T, BridgeError>;

impl From<std::io::Error> for BridgeError {
    fn from(e: std::io::Error) -> Self {
        BridgeError::IoError(e.to_string())
    }
}

impl From<BridgeError> for CoreError {
    fn from(e: BridgeError) -> Self {
        match e {
            BridgeError::Timeout => CoreError::StreamStall,
            BridgeError::StatusTimeout => CoreError::SignalFault,
            BridgeError::StreamTooLong { len } => CoreError::ImageTooLarge { size: len },
            BridgeError::AckMismatch { expected, found } => {
                CoreError::AckMismatch { expected, found }
            }
            BridgeError::Disconnected => CoreError::ShortRead,
            BridgeError::IoError(_) => CoreError::IoError,
            BridgeError::ConnectionFailed(_)
            | BridgeError::NoResponse
            | BridgeError::SerialError(_) => CoreError::TransportUnavailable,
        }
    }
}
