//! viperflash-parport - Direct parallel port transport
//!
//! Drives the Viper GC lines straight from a PC parallel port. Every
//! pentad costs two register writes and, in safe mode, at least two status
//! reads, so a full 128 KiB pass takes minutes rather than seconds.
//!
//! # Example
//!
//! ```no_run
//! use viperflash_parport::{open_parport, ParportConfig};
//! use viperflash_core::flash::{NoProgress, Session, SessionConfig};
//!
//! let port = open_parport(ParportConfig { base: 0x378 })?;
//! let mut session = Session::open(port, SessionConfig::default())?;
//! let image = session.read_image(&mut NoProgress)?;
//! println!("read {} bytes", image.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod port;

pub use error::{ParportError, Result};
#[cfg(unix)]
pub use port::DevPort;
pub use port::{parse_base, ParallelPort, ParportConfig, PortIo, DEFAULT_BASE};

/// Acquire the parallel port at the configured base address
#[cfg(unix)]
pub fn open_parport(config: ParportConfig) -> Result<ParallelPort<DevPort>> {
    ParallelPort::open(config)
}

/// Direct port access needs `/dev/port`
#[cfg(not(unix))]
pub fn open_parport(_config: ParportConfig) -> Result<ParallelPort<port::NoPortIo>> {
    Err(ParportError::Unsupported)
}
