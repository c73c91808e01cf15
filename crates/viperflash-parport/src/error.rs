//! Error types for parallel port access

use thiserror::Error;
use viperflash_core::Error as CoreError;

/// Parallel port errors
#[derive(Debug, Error)]
pub enum ParportError {
    /// Base address is not a usable I/O port
    #[error("Invalid port address '{0}': expected a non-zero hexadecimal value up to 0xFFFF")]
    InvalidBase(String),

    /// Port access was refused
    #[error(
        "Unable to acquire permissions for port 0x{base:X}, give yourself permission or try running as root: {source}"
    )]
    PermissionDenied {
        base: u16,
        #[source]
        source: std::io::Error,
    },

    /// Port I/O is not available on this platform
    #[error("Direct port I/O is not supported on this platform")]
    Unsupported,

    /// I/O error while accessing a register
    #[error("Port I/O error at 0x{port:X}: {source}")]
    Io {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for parallel port operations
pub type Result<T> = core::result::Result<T, ParportError>;

impl From<ParportError> for CoreError {
    fn from(e: ParportError) -> Self {
        match e {
            ParportError::Io { .. } => CoreError::IoError,
            ParportError::InvalidBase(_)
            | ParportError::PermissionDenied { .. }
            | ParportError::Unsupported => CoreError::TransportUnavailable,
        }
    }
}
