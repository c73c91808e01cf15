//! Parallel port register access
//!
//! Only two registers of the standard parallel port are used:
//!
//! | Register | Address  | Use                               |
//! |----------|----------|-----------------------------------|
//! | Data     | base     | D0-D5 drive the chip              |
//! | Status   | base + 1 | bit 4 (pin 13) data, bit 3 (pin 15) ack |
//!
//! On Linux the registers are reached through `/dev/port`, where the file
//! offset is the I/O port number.

use std::time::Duration;

use crate::error::{ParportError, Result};
use viperflash_core::error::{Error as CoreError, Result as CoreResult};
use viperflash_core::programmer::{LineBus, OutputLines, StatusLines};

/// Legacy LPT1 base address
pub const DEFAULT_BASE: u16 = 0x378;

/// Offset of the status register from the base address
pub const STATUS_OFFSET: u16 = 1;

/// Byte-wide access to I/O ports
pub trait PortIo {
    /// Write one byte to `port`
    fn outb(&mut self, port: u16, value: u8) -> std::io::Result<()>;

    /// Read one byte from `port`
    fn inb(&mut self, port: u16) -> std::io::Result<u8>;
}

/// Port I/O through the `/dev/port` character device
#[cfg(unix)]
pub struct DevPort {
    file: std::fs::File,
}

#[cfg(unix)]
impl DevPort {
    /// Path of the port device
    pub const PATH: &'static str = "/dev/port";

    /// Open the port device
    ///
    /// Needs root, or `CAP_SYS_RAWIO` and write access to the device.
    pub fn open() -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(Self::PATH)?;
        Ok(Self { file })
    }
}

#[cfg(unix)]
impl PortIo for DevPort {
    fn outb(&mut self, port: u16, value: u8) -> std::io::Result<()> {
        use std::os::unix::fs::FileExt;
        self.file.write_all_at(&[value], port as u64)
    }

    fn inb(&mut self, port: u16) -> std::io::Result<u8> {
        use std::os::unix::fs::FileExt;
        let mut value = [0u8];
        self.file.read_exact_at(&mut value, port as u64)?;
        Ok(value[0])
    }
}

/// Parallel port settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParportConfig {
    /// I/O base address of the port
    pub base: u16,
}

impl Default for ParportConfig {
    fn default() -> Self {
        Self { base: DEFAULT_BASE }
    }
}

/// Parse a base address given in hexadecimal, with or without `0x`
///
/// Zero and values above 0xFFFF are rejected.
pub fn parse_base(s: &str) -> Result<u16> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    match u32::from_str_radix(digits, 16) {
        Ok(value) if value != 0 && value <= 0xFFFF => Ok(value as u16),
        _ => Err(ParportError::InvalidBase(s.to_string())),
    }
}

/// Direct parallel port transport
pub struct ParallelPort<P: PortIo> {
    io: P,
    base: u16,
}

#[cfg(unix)]
impl ParallelPort<DevPort> {
    /// Acquire the port registers
    pub fn open(config: ParportConfig) -> Result<Self> {
        if config.base == 0 {
            return Err(ParportError::InvalidBase(format!("0x{:X}", config.base)));
        }
        let io = DevPort::open().map_err(|source| ParportError::PermissionDenied {
            base: config.base,
            source,
        })?;
        log::info!("Using parallel port at 0x{:X}", config.base);
        Ok(Self::with_io(io, config.base))
    }
}

/// Placeholder accessor on platforms without `/dev/port`
#[cfg(not(unix))]
pub struct NoPortIo;

#[cfg(not(unix))]
impl PortIo for NoPortIo {
    fn outb(&mut self, _port: u16, _value: u8) -> std::io::Result<()> {
        Err(std::io::ErrorKind::Unsupported.into())
    }

    fn inb(&mut self, _port: u16) -> std::io::Result<u8> {
        Err(std::io::ErrorKind::Unsupported.into())
    }
}

impl<P: PortIo> ParallelPort<P> {
    /// Use an existing port accessor
    pub fn with_io(io: P, base: u16) -> Self {
        Self { io, base }
    }

    /// Base I/O address
    pub fn base(&self) -> u16 {
        self.base
    }

    /// Give back the port accessor
    pub fn into_io(self) -> P {
        self.io
    }

    fn status_port(&self) -> u16 {
        self.base.wrapping_add(STATUS_OFFSET)
    }
}

impl<P: PortIo> LineBus for ParallelPort<P> {
    fn write_lines(&mut self, lines: OutputLines) -> CoreResult<()> {
        let port = self.base;
        self.io
            .outb(port, lines.bits())
            .map_err(|source| CoreError::from(ParportError::Io { port, source }))
    }

    fn read_status(&mut self) -> CoreResult<StatusLines> {
        let port = self.status_port();
        let raw = self
            .io
            .inb(port)
            .map_err(|source| CoreError::from(ParportError::Io { port, source }))?;
        Ok(StatusLines::from_raw(raw))
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(us as u64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viperflash_core::protocol::chip;
    use viperflash_core::protocol::SafeMode;

    /// Loops the strobe back onto the acknowledge line
    #[derive(Default)]
    struct LoopbackIo {
        writes: Vec<(u16, u8)>,
        reads: Vec<u16>,
        data: u8,
    }

    impl PortIo for LoopbackIo {
        fn outb(&mut self, port: u16, value: u8) -> std::io::Result<()> {
            self.writes.push((port, value));
            self.data = value;
            Ok(())
        }

        fn inb(&mut self, port: u16) -> std::io::Result<u8> {
            self.reads.push(port);
            // ACK high while the strobe is low; unused bits set
            Ok(if self.data & 0x10 == 0 { 0xCF } else { 0xC7 })
        }
    }

    #[test]
    fn test_parse_base() {
        assert_eq!(parse_base("378").unwrap(), 0x378);
        assert_eq!(parse_base("0x278").unwrap(), 0x278);
        assert_eq!(parse_base("0XBC").unwrap(), 0xBC);
        assert_eq!(parse_base("ffff").unwrap(), 0xFFFF);
        assert!(parse_base("0").is_err());
        assert!(parse_base("10000").is_err());
        assert!(parse_base("lpt1").is_err());
        assert!(parse_base("").is_err());
    }

    #[test]
    fn test_register_layout() {
        let mut port = ParallelPort::with_io(LoopbackIo::default(), 0x278);
        chip::reset(&mut port, SafeMode::Enabled).unwrap();

        let io = port.into_io();
        assert_eq!(io.writes, [(0x278, 0x00), (0x278, 0x10)]);
        assert_eq!(io.reads, [0x279, 0x279]);
    }

    #[test]
    fn test_marker_bit_on_d5() {
        let mut port = ParallelPort::with_io(LoopbackIo::default(), DEFAULT_BASE);
        chip::init(&mut port, SafeMode::Enabled).unwrap();

        let io = port.into_io();
        let values: Vec<u8> = io.writes.iter().map(|&(_, v)| v).collect();
        // 0x1F, 0x0C, 0x12 with bit 4 moved to D5 and the strobe on D4
        assert_eq!(values, [0x2F, 0x3F, 0x0C, 0x1C, 0x22, 0x32]);
    }
}
