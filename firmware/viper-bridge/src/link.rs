//! Serial side of the bridge

use embassy_time::{Duration, Instant};
use embedded_io::{Read, ReadReady, Write};
use viperflash_core::bridge::LinkPort;
use viperflash_core::{Error, Result};

/// Host link over a buffered UART
pub struct UartLink<U> {
    uart: U,
}

impl<U: Read + ReadReady + Write> UartLink<U> {
    pub fn new(uart: U) -> Self {
        Self { uart }
    }
}

impl<U: Read + ReadReady + Write> LinkPort for UartLink<U> {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.uart.write_all(data).map_err(|_| Error::IoError)?;
        self.uart.flush().map_err(|_| Error::IoError)
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8];
        self.uart.read_exact(&mut byte).map_err(|_| Error::IoError)?;
        Ok(byte[0])
    }

    fn read_byte_timeout(&mut self, timeout_us: u32) -> Result<Option<u8>> {
        let deadline = Instant::now() + Duration::from_micros(timeout_us as u64);
        loop {
            if self.uart.read_ready().map_err(|_| Error::IoError)? {
                return self.read_byte().map(Some);
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
        }
    }
}
