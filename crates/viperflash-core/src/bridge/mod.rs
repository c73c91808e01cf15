//! Bridge firmware engine
//!
//! The serial bridge is a microcontroller wired to the modchip's parallel
//! lines. It runs the same pentad encoder and chip protocol as the host, and
//! serves the command bytes described in [`crate::protocol::stream`]:
//! single line accesses, plus whole read and write passes executed locally
//! so that only one link round trip happens per chunk.
//!
//! The engine only needs a [`LineBus`](crate::programmer::LineBus) for the
//! GPIO side and a [`LinkPort`] for the serial side. The RP2040 firmware and
//! the in-process emulated bridge both drive this exact code.

mod engine;

pub use engine::BridgeFirmware;

use crate::error::Result;

/// Byte link from the bridge to the host
pub trait LinkPort {
    /// Send bytes to the host
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Wait for the next byte from the host
    ///
    /// An error means the link is gone and ends the firmware loop.
    fn read_byte(&mut self) -> Result<u8>;

    /// Wait at most `timeout_us` for the next byte
    fn read_byte_timeout(&mut self, timeout_us: u32) -> Result<Option<u8>>;
}

impl<T: LinkPort + ?Sized> LinkPort for &mut T {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn read_byte_timeout(&mut self, timeout_us: u32) -> Result<Option<u8>> {
        (**self).read_byte_timeout(timeout_us)
    }
}

/// Firmware tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareConfig {
    /// How long to stay silent after a local fault, in milliseconds
    ///
    /// Must exceed the host's read and acknowledge timeouts so that the host
    /// notices the failure and gives up on the stream.
    pub fault_stall_ms: u32,
    /// Per-byte wait while refilling a write chunk, in microseconds
    pub refill_timeout_us: u32,
}

impl Default for FirmwareConfig {
    fn default() -> Self {
        Self {
            fault_stall_ms: 10_000,
            refill_timeout_us: 100_000,
        }
    }
}
