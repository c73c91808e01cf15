//! viperflash-bridge - Serial bridge support
//!
//! This crate implements the host side of the serial bridge: a
//! microcontroller that drives the Viper GC parallel lines on behalf of the
//! host and can run whole read and write passes by itself.
//!
//! # Link Overview
//!
//! Each command byte carries its opcode in the top two bits. Plain line
//! accesses cost one round trip per status sample, which is slow, so image
//! passes use the stream commands instead: the firmware reads or programs
//! the whole image and talks to the host only once per 60-byte chunk.
//!
//! # Example
//!
//! ```no_run
//! use viperflash_bridge::{open_serial, BridgeConfig};
//! use viperflash_core::flash::{NoProgress, Session, SessionConfig};
//!
//! let bridge = open_serial("/dev/ttyUSB0", BridgeConfig::default())?;
//! let mut session = Session::open(bridge, SessionConfig::default())?;
//! let image = session.read_image(&mut NoProgress)?;
//! println!("read {} bytes", image.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod device;
pub mod error;
pub mod protocol;
pub mod transport;

// Re-exports
pub use device::SerialBridge;
pub use error::{BridgeError, Result};
pub use protocol::BridgeConfig;
pub use transport::serial::SerialTransport;
pub use transport::Transport;

/// Open and bring up a bridge on a serial device
pub fn open_serial(device: &str, config: BridgeConfig) -> Result<SerialBridge<SerialTransport>> {
    let transport = SerialTransport::open(device, config.baud)?;
    SerialBridge::new(transport, config)
}
