//! viperflash-core - Core protocol library for the Viper GC flash programmer
//!
//! This crate implements the protocol stack used to talk to the flash chip
//! of a Viper GC modchip. It is `no_std` compatible so the exact same chip
//! protocol runs on the host and inside the bridge microcontroller firmware.
//!
//! # Layers
//!
//! - [`programmer`] - the line-level bus traits every transport implements
//! - [`protocol::pentad`] - the pentad signal encoder and its acknowledge handshake
//! - [`protocol::chip`] - reset/init/erase/read/write command sequences
//! - [`protocol::stream`] - framing of the accelerated bridge streams
//! - [`bridge`] - the firmware side of the streaming accelerator
//! - [`flash`] - host sessions and full-image read/write/compare passes
//!   (requires `alloc`)
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable heap-allocated flash images and host operations
//!
//! # Example
//!
//! ```ignore
//! use viperflash_core::flash::{NoProgress, Session, SessionConfig};
//!
//! fn dump<B: viperflash_core::programmer::LineBus>(bus: B) -> viperflash_core::Result<()> {
//!     let mut session = Session::open(bus, SessionConfig::default())?;
//!     let image = session.read_image(&mut NoProgress)?;
//!     println!("first byte: 0x{:02X}", image[0]);
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod bridge;
pub mod error;
#[cfg(feature = "alloc")]
pub mod flash;
pub mod programmer;
pub mod protocol;

pub use error::{Error, Result};

/// Size of the Viper GC flash array in bytes (128 KiB)
pub const FLASH_SIZE: usize = 0x20000;

/// Mask applied to every chip address (17 address bits)
pub const ADDRESS_MASK: u32 = 0x1_FFFF;

/// Value of an erased flash byte
pub const ERASED_VALUE: u8 = 0xFF;
