//! In-process serial bridge
//!
//! Runs the bridge firmware engine on a thread, over an [`EmulatedChip`],
//! and hands the host a [`Transport`] connected to it through channels.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use viperflash_bridge::{BridgeError, Transport};
use viperflash_core::bridge::{BridgeFirmware, FirmwareConfig, LinkPort};
use viperflash_core::error::{Error, Result};

use crate::chip::EmulatedChip;

/// Firmware end of the channel link
pub struct ChannelLink {
    rx: Receiver<u8>,
    tx: Sender<u8>,
}

impl LinkPort for ChannelLink {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        for &byte in data {
            self.tx.send(byte).map_err(|_| Error::IoError)?;
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8> {
        self.rx.recv().map_err(|_| Error::IoError)
    }

    fn read_byte_timeout(&mut self, timeout_us: u32) -> Result<Option<u8>> {
        match self.rx.recv_timeout(Duration::from_micros(timeout_us as u64)) {
            Ok(byte) => Ok(Some(byte)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(Error::IoError),
        }
    }
}

/// Host end of the channel link
pub struct ChannelTransport {
    rx: Receiver<u8>,
    tx: Sender<u8>,
}

impl Transport for ChannelTransport {
    fn write(&mut self, data: &[u8]) -> viperflash_bridge::Result<()> {
        for &byte in data {
            self.tx.send(byte).map_err(|_| BridgeError::Disconnected)?;
        }
        Ok(())
    }

    fn read_nonblock(
        &mut self,
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> viperflash_bridge::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        match self.rx.recv_timeout(Duration::from_millis(timeout_ms as u64)) {
            Ok(byte) => buf[0] = byte,
            Err(RecvTimeoutError::Timeout) => return Ok(0),
            Err(RecvTimeoutError::Disconnected) => return Err(BridgeError::Disconnected),
        }

        let mut n = 1;
        while n < buf.len() {
            match self.rx.try_recv() {
                Ok(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                Err(_) => break,
            }
        }
        Ok(n)
    }

    fn flush(&mut self) -> viperflash_bridge::Result<()> {
        Ok(())
    }

    fn clear_input(&mut self) -> viperflash_bridge::Result<()> {
        while self.rx.try_recv().is_ok() {}
        Ok(())
    }
}

/// Bridge firmware running on a background thread
///
/// The firmware stops once the host drops its [`ChannelTransport`];
/// [`EmulatedBridge::join`] then gives back the chip for inspection.
pub struct EmulatedBridge {
    handle: JoinHandle<EmulatedChip>,
}

impl EmulatedBridge {
    /// Start the firmware over `chip`
    pub fn spawn(chip: EmulatedChip, config: FirmwareConfig) -> (Self, ChannelTransport) {
        let (host_tx, firmware_rx) = mpsc::channel();
        let (firmware_tx, host_rx) = mpsc::channel();

        let link = ChannelLink {
            rx: firmware_rx,
            tx: firmware_tx,
        };
        let handle = thread::spawn(move || {
            let mut firmware = BridgeFirmware::new(chip, link, config);
            if let Err(e) = firmware.run() {
                log::debug!("dummy: bridge firmware stopped: {}", e);
            }
            firmware.into_parts().0
        });

        let transport = ChannelTransport {
            rx: host_rx,
            tx: host_tx,
        };
        (Self { handle }, transport)
    }

    /// Wait for the firmware to stop and take the chip back
    pub fn join(self) -> thread::Result<EmulatedChip> {
        self.handle.join()
    }
}
