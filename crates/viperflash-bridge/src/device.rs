//! Serial bridge device implementation
//!
//! This module provides the `SerialBridge` struct, the host side of the
//! bridge link. Single line accesses are forwarded one command byte at a
//! time, and whole read/write passes are handed to the firmware through the
//! stream commands.

use std::time::Duration;

use crate::error::{BridgeError, Result};
use crate::protocol::BridgeConfig;
use crate::transport::Transport;

use viperflash_core::error::{Error as CoreError, Result as CoreResult};
use viperflash_core::programmer::{LineBus, OutputLines, StatusLines, StreamMaster};
use viperflash_core::protocol::stream::{self, StreamDirection, CHUNK_SIZE, STATUS_REQUEST};

/// Serial bridge programmer
pub struct SerialBridge<T: Transport> {
    /// Byte link to the firmware
    transport: T,
    /// Link settings
    config: BridgeConfig,
}

impl<T: Transport> SerialBridge<T> {
    /// Bring up the bridge on an open transport
    ///
    /// Sends a status ping and waits for the reply. The first miss is
    /// expected on boards that reboot when the port opens, so the ping is
    /// retried once after [`BridgeConfig::retry_delay_ms`]. Any input
    /// received during bring-up is discarded.
    pub fn new(transport: T, config: BridgeConfig) -> Result<Self> {
        let mut bridge = Self { transport, config };

        if !bridge.ping(true)? {
            log::debug!(
                "bridge: no answer to first ping, retrying in {} ms",
                config.retry_delay_ms
            );
            std::thread::sleep(Duration::from_millis(config.retry_delay_ms as u64));
            if !bridge.ping(false)? {
                return Err(BridgeError::NoResponse);
            }
        }

        bridge.transport.clear_input()?;
        log::info!("bridge: ready");
        Ok(bridge)
    }

    /// Link settings
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Give back the transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Drive the output lines
    pub fn output(&mut self, lines: OutputLines) -> Result<()> {
        self.transport.write(&[stream::output_command(lines)])
    }

    /// Sample the status lines
    pub fn status(&mut self) -> Result<StatusLines> {
        self.transport.write(&[STATUS_REQUEST])?;
        match self.read_reply(self.config.timeout_ms) {
            Ok(byte) => Ok(StatusLines::from_raw(byte)),
            Err(BridgeError::Timeout) => Err(BridgeError::StatusTimeout),
            Err(e) => Err(e),
        }
    }

    /// Stream-read `buf.len()` bytes from the chip's read cursor
    pub fn read_stream(&mut self, buf: &mut [u8], progress: &mut dyn FnMut(usize)) -> Result<()> {
        let header = Self::header(StreamDirection::Read, buf.len())?;
        self.transport.write(&header)?;

        let mut received = 0;
        while received < buf.len() {
            let n = self
                .transport
                .read_nonblock(&mut buf[received..], self.config.timeout_ms)?;
            if n == 0 {
                log::error!(
                    "bridge: timed out after {}/{} bytes",
                    received,
                    buf.len()
                );
                return Err(BridgeError::Timeout);
            }
            received += n;
            progress(received);
        }

        Ok(())
    }

    /// Stream-write `data` from address 0
    ///
    /// Every chunk must be acknowledged with the full chunk size, including
    /// the zero padded final one. The firmware acknowledges a chunk before
    /// programming it, so the stream only counts as done once a status
    /// request sent after the last chunk is answered within the chunk
    /// acknowledgment timeout.
    pub fn write_stream(&mut self, data: &[u8], progress: &mut dyn FnMut(usize)) -> Result<()> {
        let header = Self::header(StreamDirection::Write, data.len())?;
        log::debug!(
            "bridge: writing {} bytes in {} chunks",
            data.len(),
            stream::chunk_count(data.len())
        );
        self.transport.write(&header)?;

        let mut written = 0;
        for payload in data.chunks(CHUNK_SIZE) {
            self.transport.write(&stream::pad_chunk(payload))?;
            self.transport.flush()?;

            let ack = self.read_reply(self.config.ack_timeout_ms)?;
            if ack as usize != CHUNK_SIZE {
                log::error!("bridge: chunk at 0x{:05X} acknowledged with {}", written, ack);
                return Err(BridgeError::AckMismatch {
                    expected: CHUNK_SIZE as u8,
                    found: ack,
                });
            }
            written += payload.len();
            progress(written);
        }

        self.transport.write(&[STATUS_REQUEST])?;
        self.transport.flush()?;
        if let Err(e) = self.read_reply(self.config.ack_timeout_ms) {
            log::error!("bridge: no answer after the final chunk, programming stalled");
            return Err(e);
        }
        Ok(())
    }

    fn header(direction: StreamDirection, len: usize) -> Result<[u8; 3]> {
        stream::encode_header(direction, len).ok_or(BridgeError::StreamTooLong { len })
    }

    fn ping(&mut self, silent: bool) -> Result<bool> {
        self.transport.write(&[STATUS_REQUEST])?;
        let mut reply = [0u8];
        let n = self
            .transport
            .read_nonblock(&mut reply, self.config.timeout_ms)?;
        if n == 0 && !silent {
            log::error!("bridge: timed out waiting for the status ping");
        }
        Ok(n != 0)
    }

    fn read_reply(&mut self, timeout_ms: u32) -> Result<u8> {
        let mut reply = [0u8];
        match self.transport.read_nonblock(&mut reply, timeout_ms)? {
            0 => Err(BridgeError::Timeout),
            _ => Ok(reply[0]),
        }
    }
}

impl<T: Transport> LineBus for SerialBridge<T> {
    fn write_lines(&mut self, lines: OutputLines) -> CoreResult<()> {
        self.output(lines).map_err(CoreError::from)
    }

    fn read_status(&mut self) -> CoreResult<StatusLines> {
        self.status().map_err(CoreError::from)
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(us as u64));
    }

    fn stream_master(&mut self) -> Option<&mut dyn StreamMaster> {
        Some(self)
    }
}

impl<T: Transport> StreamMaster for SerialBridge<T> {
    fn read_stream(&mut self, buf: &mut [u8], progress: &mut dyn FnMut(usize)) -> CoreResult<()> {
        SerialBridge::read_stream(self, buf, progress).map_err(CoreError::from)
    }

    fn write_stream(&mut self, data: &[u8], progress: &mut dyn FnMut(usize)) -> CoreResult<()> {
        SerialBridge::write_stream(self, data, progress).map_err(CoreError::from)
    }
}
