//! Pentad signal encoder
//!
//! Everything sent to the chip travels as pentads: 5-bit values presented on
//! the output lines and latched by toggling the strobe. In safe mode the
//! chip's acknowledge line is checked after each strobe edge:
//!
//! ```text
//! lines   : value, strobe low  -> wait ACK high
//! lines   : value, strobe high -> wait ACK low
//! ```
//!
//! Bit 4 of the pentad does not sit next to the other four. D4 is the
//! strobe, so bit 4 is carried on D5 (the "marker" line).

use crate::error::{Error, Result};
use crate::programmer::{LineBus, OutputLines};

/// Number of acknowledge samples before a handshake step fails
pub const HANDSHAKE_ATTEMPTS: u32 = 4;

/// Delay after the first failed acknowledge sample, doubled on each retry
pub const HANDSHAKE_BASE_DELAY_US: u32 = 125;

/// One 5-bit unit of the chip signalling alphabet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pentad(u8);

impl Pentad {
    /// Build a pentad, keeping the 5 low bits of `value`
    pub const fn new(value: u8) -> Self {
        Self(value & 0x1F)
    }

    /// The 5-bit payload
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Line levels presenting this pentad with the given strobe level
    pub fn lines(self, strobe: bool) -> OutputLines {
        let mut lines = OutputLines::from_raw(self.0) & OutputLines::NIBBLE;
        if self.0 & 0x10 != 0 {
            lines |= OutputLines::MARKER;
        }
        if strobe {
            lines |= OutputLines::STROBE;
        }
        lines
    }

    /// Recover the pentad presented on `lines`, ignoring the strobe
    pub fn from_lines(lines: OutputLines) -> Self {
        let mut value = (lines & OutputLines::NIBBLE).bits();
        if lines.contains(OutputLines::MARKER) {
            value |= 0x10;
        }
        Self(value)
    }
}

impl From<u8> for Pentad {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

/// Acknowledge handshake policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SafeMode {
    /// Verify the acknowledge line after every strobe edge
    #[default]
    Enabled,
    /// Skip verification: faster, but errors go unnoticed
    Disabled,
}

impl SafeMode {
    /// Whether the handshake is verified
    pub fn is_enabled(self) -> bool {
        self == Self::Enabled
    }
}

/// Send one pentad to the chip
///
/// Presents the pentad with the strobe low, then high. With
/// [`SafeMode::Enabled`] each edge must be acknowledged within
/// [`HANDSHAKE_ATTEMPTS`] samples, otherwise [`Error::SignalFault`] is
/// returned and the strobe is left where it was.
pub fn emit<B: LineBus + ?Sized>(bus: &mut B, pentad: Pentad, mode: SafeMode) -> Result<()> {
    bus.write_lines(pentad.lines(false))?;
    if mode.is_enabled() {
        wait_ack(bus, true)?;
    }

    bus.write_lines(pentad.lines(true))?;
    if mode.is_enabled() {
        wait_ack(bus, false)?;
    }

    Ok(())
}

/// Send a fixed sequence of pentads, stopping at the first failure
pub fn emit_all<B: LineBus + ?Sized>(bus: &mut B, values: &[u8], mode: SafeMode) -> Result<()> {
    for &value in values {
        emit(bus, Pentad::new(value), mode)?;
    }
    Ok(())
}

/// Poll the acknowledge line until it reads `high`
///
/// Backs off 125us, 250us, 500us then 1ms between samples.
fn wait_ack<B: LineBus + ?Sized>(bus: &mut B, high: bool) -> Result<()> {
    for attempt in 0..HANDSHAKE_ATTEMPTS {
        if bus.read_status()?.ack() == high {
            return Ok(());
        }
        bus.delay_us(HANDSHAKE_BASE_DELAY_US << attempt);
    }

    log::trace!(
        "pentad: acknowledge line stuck {} after {} attempts",
        if high { "low" } else { "high" },
        HANDSHAKE_ATTEMPTS
    );
    Err(Error::SignalFault)
}
