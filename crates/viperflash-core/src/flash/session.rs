//! Per-invocation programming session

use alloc::vec::Vec;

use super::operations::{self, Progress, WriteStats};
use crate::error::Result;
use crate::programmer::LineBus;
use crate::protocol::chip;
use crate::protocol::pentad::SafeMode;
use crate::FLASH_SIZE;

/// Session settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Acknowledge handshake policy for host-driven pentads
    pub safe_mode: SafeMode,
    /// Wait between the erase and the first write, in microseconds
    pub settle_delay_us: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            safe_mode: SafeMode::Enabled,
            settle_delay_us: 1_000_000,
        }
    }
}

/// An initialized chip behind an exclusively owned transport
///
/// Every pass ends with a chip reset, whether it succeeded or not. Dropping
/// the session closes the transport.
pub struct Session<B: LineBus> {
    bus: B,
    config: SessionConfig,
}

impl<B: LineBus> Session<B> {
    /// Reset and initialize the chip
    ///
    /// Fails with [`Error::ChipNotPresent`](crate::Error::ChipNotPresent) if
    /// the chip does not answer the power-on handshake.
    pub fn open(mut bus: B, config: SessionConfig) -> Result<Self> {
        if let Err(e) = chip::reset(&mut bus, config.safe_mode) {
            log::debug!("initial reset failed: {}", e);
        }
        chip::init(&mut bus, config.safe_mode)?;
        log::info!("Viper GC found");

        Ok(Self { bus, config })
    }

    /// Session settings
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether the bulk passes will go through the bridge stream
    pub fn streaming(&mut self) -> bool {
        self.bus.stream_master().is_some()
    }

    /// Dump the whole flash array
    pub fn read_image<P: Progress + ?Sized>(&mut self, progress: &mut P) -> Result<Vec<u8>> {
        let mode = self.config.safe_mode;
        let result = operations::read_image(&mut self.bus, mode, FLASH_SIZE, progress);
        self.finish(result)
    }

    /// Erase the chip and program `image`
    pub fn write_image<P: Progress + ?Sized>(
        &mut self,
        image: &[u8],
        progress: &mut P,
    ) -> Result<WriteStats> {
        let result = operations::write_image(
            &mut self.bus,
            self.config.safe_mode,
            image,
            self.config.settle_delay_us,
            progress,
        );
        self.finish(result)
    }

    /// Check that the chip starts with `image`
    pub fn compare_image<P: Progress + ?Sized>(
        &mut self,
        image: &[u8],
        progress: &mut P,
    ) -> Result<()> {
        let mode = self.config.safe_mode;
        let result = operations::compare_image(&mut self.bus, mode, image, progress);
        self.finish(result)
    }

    /// Return the chip to idle
    pub fn reset(&mut self) -> Result<()> {
        chip::reset(&mut self.bus, self.config.safe_mode)
    }

    /// Close the session, giving back the transport
    pub fn into_bus(self) -> B {
        self.bus
    }

    fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = self.reset() {
            log::warn!("failed to reset chip: {}", e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::flash::NoProgress;
    use crate::protocol::chip::cmd;
    use crate::protocol::mock::MockBus;

    #[test]
    fn test_open_resets_then_initializes() {
        let session = Session::open(MockBus::new(), SessionConfig::default()).unwrap();
        let bus = session.into_bus();
        assert_eq!(bus.pentads(), [cmd::RESET, 0x1F, 0x0C, 0x12]);
    }

    #[test]
    fn test_open_without_chip() {
        let mut bus = MockBus::new();
        bus.ack_stuck = Some(false);
        let result = Session::open(bus, SessionConfig::default());
        assert!(matches!(result, Err(Error::ChipNotPresent)));
    }

    #[test]
    fn test_compare_failure_resets_chip() {
        let mut bus = MockBus::new();
        bus.memory.extend_from_slice(&[0x10, 0x20]);
        let mut session = Session::open(bus, SessionConfig::default()).unwrap();

        let result = session.compare_image(&[0x10, 0x21], &mut NoProgress);
        assert_eq!(
            result,
            Err(Error::Mismatch {
                addr: 1,
                expected: 0x21,
                found: 0x20
            })
        );
        let pentads = session.into_bus().pentads();
        assert_eq!(pentads.last(), Some(&cmd::RESET));
    }

    #[test]
    fn test_read_image_is_full_size() {
        let mut bus = MockBus::new();
        bus.memory.extend_from_slice(&[0x42]);
        let mut session = Session::open(bus, SessionConfig::default()).unwrap();

        let image = session.read_image(&mut NoProgress).unwrap();
        assert_eq!(image.len(), FLASH_SIZE);
        assert_eq!(image[0], 0x42);
        assert!(image[1..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_unsafe_mode_never_samples_ack() {
        let mut bus = MockBus::new();
        bus.ack_stuck = Some(false);
        let config = SessionConfig {
            safe_mode: SafeMode::Disabled,
            settle_delay_us: 0,
        };
        let mut session = Session::open(bus, config).unwrap();
        let stats = session.write_image(&[0x00, 0x01], &mut NoProgress).unwrap();
        assert_eq!(stats.bytes_programmed, 2);

        let bus = session.into_bus();
        // Only the erase settle reads sample the status lines
        assert_eq!(bus.status_reads, 2 * 8);
    }
}
