use heapless::Vec;

use super::{FirmwareConfig, LinkPort};
use crate::error::{Error, Result};
use crate::programmer::LineBus;
use crate::protocol::chip;
use crate::protocol::pentad::SafeMode;
use crate::protocol::stream::{self, Opcode, CHUNK_SIZE, MAX_STREAM_LEN};

/// Command loop of the serial bridge
///
/// Processes one command to completion before reading the next one. The
/// acknowledge handshake is always verified on the bridge side, whatever the
/// host uses for its own line accesses.
pub struct BridgeFirmware<B, L> {
    bus: B,
    link: L,
    config: FirmwareConfig,
    chunk: Vec<u8, CHUNK_SIZE>,
}

impl<B: LineBus, L: LinkPort> BridgeFirmware<B, L> {
    /// Create the engine over a line bus and a host link
    pub fn new(bus: B, link: L, config: FirmwareConfig) -> Self {
        Self {
            bus,
            link,
            config,
            chunk: Vec::new(),
        }
    }

    /// Serve commands until the link fails
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.poll()?;
        }
    }

    /// Read and execute a single command
    ///
    /// Chip faults during a stream are handled locally and do not surface
    /// here; only link and bus errors do.
    pub fn poll(&mut self) -> Result<()> {
        let command = self.link.read_byte()?;
        let opcode = Opcode::from_byte(command);
        match opcode {
            Opcode::Output(lines) => self.bus.write_lines(lines),
            Opcode::Status => {
                let status = self.bus.read_status()?;
                self.link.write(&[stream::status_byte(status)])
            }
            Opcode::ReadStream | Opcode::WriteStream => {
                let header = [command, self.link.read_byte()?, self.link.read_byte()?];
                let len = stream::decode_length(&header);
                if len as usize > MAX_STREAM_LEN {
                    return self.abort(Error::ImageTooLarge { size: len as usize });
                }
                if opcode == Opcode::ReadStream {
                    self.stream_read(len)
                } else {
                    self.stream_write(len)
                }
            }
        }
    }

    /// Give back the line bus and link
    pub fn into_parts(self) -> (B, L) {
        (self.bus, self.link)
    }

    fn stream_read(&mut self, len: u32) -> Result<()> {
        log::debug!("bridge: stream read of {} bytes", len);
        for _ in 0..len {
            match chip::read_byte(&mut self.bus, SafeMode::Enabled) {
                Ok(byte) => self.link.write(&[byte])?,
                Err(e) => return self.abort(e),
            }
        }
        Ok(())
    }

    fn stream_write(&mut self, len: u32) -> Result<()> {
        log::debug!("bridge: stream write of {} bytes", len);
        let mut address = 0u32;
        let mut remaining = len as usize;

        while remaining > 0 {
            let received = self.refill()?;
            self.link.write(&[received as u8])?;
            if received < CHUNK_SIZE {
                return self.abort(Error::ShortRead);
            }

            let payload = remaining.min(CHUNK_SIZE);
            if let Err(e) = self.program_chunk(address, payload) {
                return self.abort(e);
            }
            address += payload as u32;
            remaining -= payload;
        }
        Ok(())
    }

    /// Fill the chunk buffer from the link, returning the byte count
    fn refill(&mut self) -> Result<usize> {
        self.chunk.clear();
        while !self.chunk.is_full() {
            match self.link.read_byte_timeout(self.config.refill_timeout_us)? {
                Some(byte) => {
                    if self.chunk.push(byte).is_err() {
                        break;
                    }
                }
                None => break,
            }
        }
        Ok(self.chunk.len())
    }

    fn program_chunk(&mut self, address: u32, payload: usize) -> Result<()> {
        for (offset, &byte) in self.chunk[..payload].iter().enumerate() {
            let address = address + offset as u32;
            chip::write_byte(&mut self.bus, address, byte, SafeMode::Enabled)?;
        }
        Ok(())
    }

    /// Abandon the current stream
    ///
    /// Going silent makes the host time out; the chip is then reset and
    /// whatever the host queued meanwhile is discarded.
    fn abort(&mut self, cause: Error) -> Result<()> {
        log::warn!(
            "bridge: stream aborted ({}), stalling for {} ms",
            cause,
            self.config.fault_stall_ms
        );
        for _ in 0..self.config.fault_stall_ms {
            self.bus.delay_us(1000);
        }

        if let Err(e) = chip::reset(&mut self.bus, SafeMode::Enabled) {
            log::warn!("bridge: reset after abort failed: {}", e);
        }

        let mut dropped = 0usize;
        while self
            .link
            .read_byte_timeout(self.config.refill_timeout_us)?
            .is_some()
        {
            dropped += 1;
        }
        if dropped > 0 {
            log::debug!("bridge: dropped {} stale bytes", dropped);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programmer::OutputLines;
    use crate::protocol::chip::cmd;
    use crate::protocol::mock::MockBus;
    use std::collections::VecDeque;
    use std::vec::Vec as StdVec;

    struct MockLink {
        input: VecDeque<u8>,
        output: StdVec<u8>,
    }

    impl MockLink {
        fn new(input: &[u8]) -> Self {
            Self {
                input: input.iter().copied().collect(),
                output: StdVec::new(),
            }
        }
    }

    impl LinkPort for MockLink {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            self.output.extend_from_slice(data);
            Ok(())
        }

        fn read_byte(&mut self) -> Result<u8> {
            self.input.pop_front().ok_or(Error::IoError)
        }

        fn read_byte_timeout(&mut self, _timeout_us: u32) -> Result<Option<u8>> {
            Ok(self.input.pop_front())
        }
    }

    fn firmware(bus: MockBus, input: &[u8]) -> BridgeFirmware<MockBus, MockLink> {
        let config = FirmwareConfig {
            fault_stall_ms: 3,
            refill_timeout_us: 0,
        };
        BridgeFirmware::new(bus, MockLink::new(input), config)
    }

    fn header(direction: stream::StreamDirection, len: usize) -> [u8; 3] {
        stream::encode_header(direction, len).unwrap()
    }

    #[test]
    fn test_output_and_status() {
        let mut fw = firmware(MockBus::new(), &[0x05, stream::STATUS_REQUEST]);
        fw.poll().unwrap();
        fw.poll().unwrap();

        let (bus, link) = fw.into_parts();
        assert_eq!(bus.writes, [OutputLines::from_raw(0x05)]);
        // Strobe low, the mock acknowledges
        assert_eq!(link.output, [0x08]);
    }

    #[test]
    fn test_link_closed_ends_loop() {
        let mut fw = firmware(MockBus::new(), &[]);
        assert_eq!(fw.run(), Err(Error::IoError));
    }

    #[test]
    fn test_stream_read() {
        let mut bus = MockBus::new();
        bus.memory.extend_from_slice(&[0x12, 0x34, 0xAB]);
        let header = stream::encode_header(stream::StreamDirection::Read, 3).unwrap();

        let mut fw = firmware(bus, &header);
        fw.poll().unwrap();

        let (_, link) = fw.into_parts();
        assert_eq!(link.output, [0x12, 0x34, 0xAB]);
    }

    #[test]
    fn test_stream_write_two_chunks() {
        let data: StdVec<u8> = (0..61u8).collect();
        let mut input = StdVec::new();
        input.extend_from_slice(&header(stream::StreamDirection::Write, 61));
        for chunk in data.chunks(CHUNK_SIZE) {
            input.extend_from_slice(&stream::pad_chunk(chunk));
        }

        let mut fw = firmware(MockBus::new(), &input);
        fw.poll().unwrap();

        let (bus, link) = fw.into_parts();
        assert_eq!(link.output, [60, 60]);
        // Every byte programmed, padding ignored
        assert_eq!(bus.pentads().len(), 61 * 9);
        assert!(bus.delays.is_empty());
    }

    #[test]
    fn test_short_refill_aborts() {
        let mut input = StdVec::new();
        input.extend_from_slice(&header(stream::StreamDirection::Write, 10));
        input.extend_from_slice(&[1, 2, 3]);

        let mut fw = firmware(MockBus::new(), &input);
        fw.poll().unwrap();

        let (bus, link) = fw.into_parts();
        assert_eq!(link.output, [3]);
        assert_eq!(bus.delays, [1000, 1000, 1000]);
        assert_eq!(bus.pentads(), [cmd::RESET]);
    }

    #[test]
    fn test_read_fault_goes_silent() {
        let mut bus = MockBus::new();
        bus.ack_stuck = Some(false);
        let mut input = StdVec::new();
        input.extend_from_slice(&header(stream::StreamDirection::Read, 2));
        input.push(stream::STATUS_REQUEST);

        let mut fw = firmware(bus, &input);
        fw.poll().unwrap();

        let (bus, link) = fw.into_parts();
        assert!(link.output.is_empty());
        // Handshake backoff, the stall, then the failed reset
        assert_eq!(
            bus.delays,
            [125, 250, 500, 1000, 1000, 1000, 1000, 125, 250, 500, 1000]
        );
    }

    #[test]
    fn test_oversized_read_is_refused() {
        let mut bus = MockBus::new();
        bus.memory.extend_from_slice(&[0x12, 0x34]);
        // 0x20001 bytes, one past the end of the array
        let mut fw = firmware(bus, &[0x82, 0x00, 0x01]);
        fw.poll().unwrap();

        let (bus, link) = fw.into_parts();
        assert!(link.output.is_empty());
        assert_eq!(bus.delays, [1000, 1000, 1000]);
        assert_eq!(bus.pentads(), [cmd::RESET]);
    }

    #[test]
    fn test_oversized_write_payload_is_drained() {
        let mut input = StdVec::from([0xFF, 0xFF, 0xFF]);
        // Payload bytes that would otherwise decode as output commands
        input.extend_from_slice(&[0x05; CHUNK_SIZE]);
        input.push(stream::STATUS_REQUEST);

        let mut fw = firmware(MockBus::new(), &input);
        fw.poll().unwrap();
        assert_eq!(fw.poll(), Err(Error::IoError));

        let (bus, link) = fw.into_parts();
        assert!(link.output.is_empty());
        assert_eq!(bus.pentads(), [cmd::RESET]);
    }
}
