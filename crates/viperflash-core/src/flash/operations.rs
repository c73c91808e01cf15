//! Full-image passes
//!
//! These functions drive a whole read, write or compare pass over any
//! [`LineBus`]. When the bus offers a [`StreamMaster`](crate::programmer::StreamMaster)
//! the bulk of the pass is delegated to it, otherwise every pentad is driven
//! from here.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::{Error, Result};
use crate::programmer::LineBus;
use crate::protocol::chip;
use crate::protocol::pentad::SafeMode;
use crate::{ERASED_VALUE, FLASH_SIZE};

/// Number of bytes between two progress reports on byte-by-byte passes
pub const PROGRESS_STEP: usize = 0x400;

/// Callback for progress reporting during image passes
pub trait Progress {
    /// Called when starting to read from the chip
    fn reading(&mut self, total_bytes: usize);

    /// Called to update read progress
    fn read_progress(&mut self, bytes_read: usize);

    /// Called when the erase pulses are about to be sent
    fn erasing(&mut self);

    /// Called once the erase settled
    fn erased(&mut self, settle_reads: usize);

    /// Called when starting to program the chip
    fn writing(&mut self, total_bytes: usize);

    /// Called to update write progress
    fn write_progress(&mut self, bytes_written: usize);

    /// Called when a write pass completed
    fn complete(&mut self, stats: &WriteStats);
}

/// A no-op progress reporter
pub struct NoProgress;

impl Progress for NoProgress {
    fn reading(&mut self, _total_bytes: usize) {}
    fn read_progress(&mut self, _bytes_read: usize) {}
    fn erasing(&mut self) {}
    fn erased(&mut self, _settle_reads: usize) {}
    fn writing(&mut self, _total_bytes: usize) {}
    fn write_progress(&mut self, _bytes_written: usize) {}
    fn complete(&mut self, _stats: &WriteStats) {}
}

/// Statistics from a write pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Size of the image
    pub bytes_total: usize,
    /// Bytes actually programmed
    pub bytes_programmed: usize,
    /// Bytes left alone because they already hold the erased value
    pub bytes_skipped: usize,
    /// Number of byte writes that needed their second attempt
    pub retries: usize,
    /// Reads needed for the erase to settle
    pub erase_reads: usize,
    /// Whether the bridge stream was used
    pub streamed: bool,
}

/// Check that an image can be written to the chip
pub fn validate_image(image: &[u8]) -> Result<()> {
    if image.is_empty() {
        return Err(Error::EmptyImage);
    }
    if image.len() > FLASH_SIZE {
        return Err(Error::ImageTooLarge { size: image.len() });
    }
    Ok(())
}

fn report_due(done: usize, total: usize) -> bool {
    done % PROGRESS_STEP == 0 || done == total
}

/// Read the first `len` bytes of the chip
pub fn read_image<B, P>(
    bus: &mut B,
    mode: SafeMode,
    len: usize,
    progress: &mut P,
) -> Result<Vec<u8>>
where
    B: LineBus + ?Sized,
    P: Progress + ?Sized,
{
    let mut image = vec![0u8; len];
    progress.reading(len);
    chip::read_init(bus, mode)?;

    if let Some(stream) = bus.stream_master() {
        log::debug!("reading {} bytes through the bridge stream", len);
        stream.read_stream(&mut image, &mut |n| progress.read_progress(n))?;
        return Ok(image);
    }

    for (address, slot) in image.iter_mut().enumerate() {
        *slot = chip::read_byte(bus, mode).inspect_err(|_| {
            log::error!("read failed at address 0x{:05X}", address);
        })?;
        if report_due(address + 1, len) {
            progress.read_progress(address + 1);
        }
    }

    Ok(image)
}

/// Erase the chip and program `image` from address 0
///
/// `settle_delay_us` is waited between the erase and the first write. On the
/// byte-by-byte path a failed byte write is retried once before giving up.
pub fn write_image<B, P>(
    bus: &mut B,
    mode: SafeMode,
    image: &[u8],
    settle_delay_us: u32,
    progress: &mut P,
) -> Result<WriteStats>
where
    B: LineBus + ?Sized,
    P: Progress + ?Sized,
{
    validate_image(image)?;

    let mut stats = WriteStats {
        bytes_total: image.len(),
        bytes_skipped: image.iter().filter(|&&b| b == ERASED_VALUE).count(),
        ..Default::default()
    };

    progress.erasing();
    stats.erase_reads = chip::erase(bus, mode)?;
    progress.erased(stats.erase_reads);
    bus.delay_us(settle_delay_us);

    progress.writing(image.len());
    if let Some(stream) = bus.stream_master() {
        log::debug!("writing {} bytes through the bridge stream", image.len());
        stream.write_stream(image, &mut |n| progress.write_progress(n))?;
        stats.streamed = true;
        stats.bytes_programmed = stats.bytes_total - stats.bytes_skipped;
    } else {
        for (address, &byte) in image.iter().enumerate() {
            if byte != ERASED_VALUE {
                program_byte(bus, mode, address as u32, byte, &mut stats)?;
            }
            if report_due(address + 1, image.len()) {
                progress.write_progress(address + 1);
            }
        }
    }

    progress.complete(&stats);
    Ok(stats)
}

fn program_byte<B: LineBus + ?Sized>(
    bus: &mut B,
    mode: SafeMode,
    address: u32,
    byte: u8,
    stats: &mut WriteStats,
) -> Result<()> {
    if let Err(e) = chip::write_byte(bus, address, byte, mode) {
        log::warn!(
            "write failed at 0x{:05X} <- 0x{:02X} ({}), retrying",
            address,
            byte,
            e
        );
        stats.retries += 1;
        chip::write_byte(bus, address, byte, mode)?;
    }
    stats.bytes_programmed += 1;
    Ok(())
}

/// Compare the chip contents with `image`
///
/// Only `image.len()` bytes are read. Fails with [`Error::Mismatch`] at the
/// first differing byte.
pub fn compare_image<B, P>(
    bus: &mut B,
    mode: SafeMode,
    image: &[u8],
    progress: &mut P,
) -> Result<()>
where
    B: LineBus + ?Sized,
    P: Progress + ?Sized,
{
    validate_image(image)?;
    progress.reading(image.len());
    chip::read_init(bus, mode)?;

    if let Some(stream) = bus.stream_master() {
        let mut actual = vec![0u8; image.len()];
        stream.read_stream(&mut actual, &mut |n| progress.read_progress(n))?;
        return match image.iter().zip(&actual).position(|(a, b)| a != b) {
            Some(addr) => Err(Error::Mismatch {
                addr: addr as u32,
                expected: image[addr],
                found: actual[addr],
            }),
            None => Ok(()),
        };
    }

    for (addr, &expected) in image.iter().enumerate() {
        let found = chip::read_byte(bus, mode)?;
        if found != expected {
            return Err(Error::Mismatch {
                addr: addr as u32,
                expected,
                found,
            });
        }
        if report_due(addr + 1, image.len()) {
            progress.read_progress(addr + 1);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programmer::{OutputLines, StatusLines, StreamMaster};
    use crate::protocol::chip::cmd;
    use crate::protocol::mock::MockBus;

    #[test]
    fn test_validate_image() {
        assert_eq!(validate_image(&[]), Err(Error::EmptyImage));
        assert!(validate_image(&[0u8; FLASH_SIZE]).is_ok());
        assert_eq!(
            validate_image(&[0u8; FLASH_SIZE + 1]),
            Err(Error::ImageTooLarge {
                size: FLASH_SIZE + 1
            })
        );
    }

    #[test]
    fn test_read_image_byte_by_byte() {
        let mut bus = MockBus::new();
        bus.memory.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);

        let image = read_image(&mut bus, SafeMode::Enabled, 6, &mut NoProgress).unwrap();
        assert_eq!(image, [0xDE, 0xAD, 0xBE, 0xEF, 0xFF, 0xFF]);
        assert_eq!(&bus.pentads()[..5], &cmd::READ_INIT);
    }

    #[test]
    fn test_erased_image_programs_nothing() {
        let mut bus = MockBus::new();
        bus.memory.extend_from_slice(&[0xFF, 0xFF]);
        let image = [0xFFu8; 0x1000];

        let stats = write_image(&mut bus, SafeMode::Enabled, &image, 0, &mut NoProgress).unwrap();
        assert_eq!(stats.bytes_programmed, 0);
        assert_eq!(stats.bytes_skipped, 0x1000);
        assert_eq!(stats.erase_reads, 2);
        // 13 erase pulses and two read-init + read sequences, nothing else
        assert_eq!(bus.pentads().len(), 13 + 2 * (5 + 9));
    }

    #[test]
    fn test_compare_stops_at_first_difference() {
        let mut bus = MockBus::new();
        bus.memory.extend_from_slice(&[1, 2, 9, 4, 9]);

        let result = compare_image(&mut bus, SafeMode::Enabled, &[1, 2, 3, 4, 5], &mut NoProgress);
        assert_eq!(
            result,
            Err(Error::Mismatch {
                addr: 2,
                expected: 3,
                found: 9
            })
        );
        // READ_INIT then three reads
        assert_eq!(bus.pentads().len(), 5 + 3 * 9);
    }

    struct StreamBus {
        inner: MockBus,
        streamed: std::vec::Vec<u8>,
    }

    impl LineBus for StreamBus {
        fn write_lines(&mut self, lines: OutputLines) -> Result<()> {
            self.inner.write_lines(lines)
        }

        fn read_status(&mut self) -> Result<StatusLines> {
            self.inner.read_status()
        }

        fn delay_us(&mut self, us: u32) {
            self.inner.delay_us(us)
        }

        fn stream_master(&mut self) -> Option<&mut dyn StreamMaster> {
            Some(self)
        }
    }

    impl StreamMaster for StreamBus {
        fn read_stream(&mut self, buf: &mut [u8], progress: &mut dyn FnMut(usize)) -> Result<()> {
            for (i, b) in buf.iter_mut().enumerate() {
                *b = i as u8;
            }
            progress(buf.len());
            Ok(())
        }

        fn write_stream(&mut self, data: &[u8], progress: &mut dyn FnMut(usize)) -> Result<()> {
            self.streamed.extend_from_slice(data);
            progress(data.len());
            Ok(())
        }
    }

    #[test]
    fn test_stream_path_is_preferred() {
        let mut bus = StreamBus {
            inner: MockBus::new(),
            streamed: std::vec::Vec::new(),
        };
        bus.inner.memory.extend_from_slice(&[0xFF, 0xFF]);

        let image = [1, 0xFF, 3];
        let stats =
            write_image(&mut bus, SafeMode::Enabled, &image, 1000, &mut NoProgress).unwrap();
        assert!(stats.streamed);
        assert_eq!(stats.bytes_programmed, 2);
        assert_eq!(bus.streamed, [1, 0xFF, 3]);
        assert_eq!(bus.inner.delays, [1000]);

        let image = read_image(&mut bus, SafeMode::Enabled, 4, &mut NoProgress).unwrap();
        assert_eq!(image, [0, 1, 2, 3]);

        let result = compare_image(&mut bus, SafeMode::Enabled, &[0, 1, 7], &mut NoProgress);
        assert_eq!(
            result,
            Err(Error::Mismatch {
                addr: 2,
                expected: 7,
                found: 2
            })
        );
    }
}
