//! Bit layout of the Viper GC parallel interface
//!
//! The modchip never uses the data lines bidirectionally. It receives on
//! D0-D5 (DB-25 pins 2 to 7) and answers on two status lines:
//!
//! | Status bit | DB-25 pin | Meaning          |
//! |------------|-----------|------------------|
//! | 4          | 13 (SLCT) | chip data out    |
//! | 3          | 15 (ERR)  | acknowledge      |
//!
//! Of the six output lines only five carry pentad data, D4 is the strobe.

use bitflags::bitflags;

bitflags! {
    /// Output lines driven by the programmer (parallel data register)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OutputLines: u8 {
        /// Pentad bit 0
        const D0 = 1 << 0;
        /// Pentad bit 1
        const D1 = 1 << 1;
        /// Pentad bit 2
        const D2 = 1 << 2;
        /// Pentad bit 3
        const D3 = 1 << 3;
        /// Strobe, latched by the chip on each transition
        const STROBE = 1 << 4;
        /// Pentad bit 4
        const MARKER = 1 << 5;

        /// The four pentad bits carried on D0-D3
        const NIBBLE = Self::D0.bits() | Self::D1.bits() | Self::D2.bits() | Self::D3.bits();
    }
}

bitflags! {
    /// Input lines sampled by the programmer (parallel status register)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusLines: u8 {
        /// Acknowledge line (pin 15)
        const ACK = 1 << 3;
        /// Serial data out of the chip (pin 13)
        const DATA = 1 << 4;
    }
}

impl OutputLines {
    /// Build from a raw register value, keeping only the six wired lines
    pub const fn from_raw(raw: u8) -> Self {
        Self::from_bits_truncate(raw)
    }
}

impl StatusLines {
    /// Build from a raw status register value, ignoring unwired bits
    pub const fn from_raw(raw: u8) -> Self {
        Self::from_bits_truncate(raw)
    }

    /// Level of the acknowledge line
    pub fn ack(self) -> bool {
        self.contains(Self::ACK)
    }

    /// Level of the chip data line
    pub fn data(self) -> bool {
        self.contains(Self::DATA)
    }
}
