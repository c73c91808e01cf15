//! Programmer trait definitions

use super::{OutputLines, StatusLines};
use crate::error::Result;

/// Line-level access to the Viper GC interface
///
/// This is the minimal set of operations a transport must provide. The
/// pentad encoder and the chip protocol are built entirely on top of it, so
/// any medium that can drive six lines and sample two can program the chip.
///
/// ## Example: memory-mapped GPIO
///
/// ```ignore
/// impl LineBus for MyGpio {
///     fn write_lines(&mut self, lines: OutputLines) -> Result<()> {
///         self.port.write(lines.bits());
///         Ok(())
///     }
///
///     fn read_status(&mut self) -> Result<StatusLines> {
///         Ok(StatusLines::from_raw(self.port.read()))
///     }
///
///     fn delay_us(&mut self, us: u32) {
///         self.timer.delay_us(us);
///     }
/// }
/// ```
pub trait LineBus {
    /// Drive the six output lines
    fn write_lines(&mut self, lines: OutputLines) -> Result<()>;

    /// Sample the two status lines
    fn read_status(&mut self) -> Result<StatusLines>;

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);

    /// Accelerated bulk access, if the transport offers it
    ///
    /// Only the serial bridge implements this; the direct port returns `None`
    /// and image passes fall back to driving every pentad from the host.
    fn stream_master(&mut self) -> Option<&mut dyn StreamMaster> {
        None
    }
}

/// Bulk read/write passes executed remotely by the bridge firmware
///
/// Both calls assume the chip was prepared by the host beforehand: read mode
/// initialized for `read_stream`, array erased for `write_stream`. Writes
/// always start at address 0.
pub trait StreamMaster {
    /// Read `buf.len()` consecutive bytes from the chip
    ///
    /// `progress` is called with the number of bytes received so far.
    fn read_stream(&mut self, buf: &mut [u8], progress: &mut dyn FnMut(usize)) -> Result<()>;

    /// Program `data` starting at address 0
    ///
    /// `progress` is called with the number of bytes acknowledged so far.
    fn write_stream(&mut self, data: &[u8], progress: &mut dyn FnMut(usize)) -> Result<()>;
}

impl<T: LineBus + ?Sized> LineBus for &mut T {
    fn write_lines(&mut self, lines: OutputLines) -> Result<()> {
        (**self).write_lines(lines)
    }

    fn read_status(&mut self) -> Result<StatusLines> {
        (**self).read_status()
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }

    fn stream_master(&mut self) -> Option<&mut dyn StreamMaster> {
        (**self).stream_master()
    }
}

// Blanket impl for boxed buses to allow trait objects
#[cfg(feature = "alloc")]
impl<T: LineBus + ?Sized> LineBus for alloc::boxed::Box<T> {
    fn write_lines(&mut self, lines: OutputLines) -> Result<()> {
        (**self).write_lines(lines)
    }

    fn read_status(&mut self) -> Result<StatusLines> {
        (**self).read_status()
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }

    fn stream_master(&mut self) -> Option<&mut dyn StreamMaster> {
        (**self).stream_master()
    }
}

/// Information about a transport
#[derive(Debug, Clone)]
pub struct ProgrammerInfo {
    /// Name of the transport
    pub name: &'static str,
    /// Description
    pub description: &'static str,
    /// Whether this transport requires elevated privileges
    pub requires_root: bool,
    /// Whether this transport offers accelerated streams
    pub streaming: bool,
}
