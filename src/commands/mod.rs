//! CLI command implementations
//!
//! Each image command opens the selected transport into a session, runs one
//! pass and lets the session reset the chip afterwards. Image files are
//! loaded and checked before the transport is touched.

mod image;
mod list;
mod progress;

pub use image::{run_compare, run_read, run_write};
pub use list::list_transports;
pub use progress::IndicatifProgress;

use std::path::PathBuf;
use thiserror::Error;

/// Failures outside the chip protocol
#[derive(Debug, Error)]
pub enum CommandError {
    /// The image file could not be read
    #[error("Failed to read {path:?}: {source}")]
    LoadImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The dump could not be saved
    #[error("Failed to write {path:?}: {source}")]
    SaveImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The image file does not fit the chip
    #[error("{path:?} is unusable: {source}")]
    BadImage {
        path: PathBuf,
        #[source]
        source: viperflash_core::Error,
    },
}
