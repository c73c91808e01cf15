//! Viper GC chip command sequences
//!
//! Each chip operation is a fixed sequence of pentads. The chip keeps an
//! internal read cursor: after [`read_init`] every [`read_byte`] returns the
//! next byte, from address 0x00000 up to 0x1FFFF. Writes carry their own
//! 17-bit address.
//!
//! A write packs the byte and its address into 8 pentads:
//!
//! ```text
//! WRITE
//! data[7:5] << 2 | addr[16:15]
//! addr[14:10]
//! addr[9:5]
//! addr[4:0]
//! data[4:0] x4
//! ```

use crate::error::{Error, Result};
use crate::programmer::LineBus;
use crate::protocol::pentad::{emit, emit_all, Pentad, SafeMode};
use crate::{ADDRESS_MASK, ERASED_VALUE};

/// Pentad command codes
pub mod cmd {
    /// Return to idle
    pub const RESET: u8 = 0x00;
    /// One erase pulse, see [`ERASE_PULSES`]
    pub const ERASE: u8 = 0x03;
    /// Program one byte
    pub const WRITE_BYTE: u8 = 0x05;
    /// Shift out the byte under the read cursor
    pub const READ: u8 = 0x0D;
    /// Enter read mode with the cursor at address 0
    pub const READ_INIT: [u8; 5] = [0x11, 0x00, 0x00, 0x00, 0x00];
    /// Power-on handshake
    pub const CHIP_INIT: [u8; 3] = [0x1F, 0x0C, 0x12];
    /// Number of erase pulses that trigger a full chip erase
    pub const ERASE_PULSES: usize = 13;
    /// Number of times the low data bits are repeated in a write
    pub const WRITE_DATA_REPEAT: usize = 4;
}

/// Return the chip to its idle state
pub fn reset<B: LineBus + ?Sized>(bus: &mut B, mode: SafeMode) -> Result<()> {
    emit(bus, Pentad::new(cmd::RESET), mode)
}

/// Power-on handshake
///
/// Any failure means nobody is answering on the other end of the cable and
/// is reported as [`Error::ChipNotPresent`].
pub fn init<B: LineBus + ?Sized>(bus: &mut B, mode: SafeMode) -> Result<()> {
    emit_all(bus, &cmd::CHIP_INIT, mode).map_err(|e| match e {
        Error::SignalFault => Error::ChipNotPresent,
        other => other,
    })
}

/// Enter read mode and rewind the read cursor to address 0
pub fn read_init<B: LineBus + ?Sized>(bus: &mut B, mode: SafeMode) -> Result<()> {
    emit_all(bus, &cmd::READ_INIT, mode)
}

/// Read the byte under the read cursor and advance it
///
/// The chip shifts the byte out least significant bit first on the data
/// line; each bit is acknowledged with a pentad carrying its index.
pub fn read_byte<B: LineBus + ?Sized>(bus: &mut B, mode: SafeMode) -> Result<u8> {
    emit(bus, Pentad::new(cmd::READ), mode)?;

    let mut data = 0u8;
    for bit in 0..8u8 {
        let status = bus.read_status()?;
        data = (data >> 1) | if status.data() { 0x80 } else { 0 };
        emit(bus, Pentad::new(bit), mode)?;
    }

    Ok(data)
}

/// Program one byte at `address`
///
/// Bytes equal to the erased value are skipped without touching the bus.
/// The address is masked to 17 bits.
pub fn write_byte<B: LineBus + ?Sized>(
    bus: &mut B,
    address: u32,
    data: u8,
    mode: SafeMode,
) -> Result<()> {
    if data == ERASED_VALUE {
        return Ok(());
    }

    let mut pentads = [0u8; 5 + cmd::WRITE_DATA_REPEAT];
    encode_write(address, data, &mut pentads);
    emit_all(bus, &pentads, mode)
}

/// Erase the whole chip
///
/// After the erase pulses the chip keeps working on its own; completion is
/// detected when two consecutive reads of address 0 agree. There is no
/// timeout, the caller bounds the overall time if it needs to.
///
/// Returns the number of reads needed to observe a stable value.
pub fn erase<B: LineBus + ?Sized>(bus: &mut B, mode: SafeMode) -> Result<usize> {
    for _ in 0..cmd::ERASE_PULSES {
        emit(bus, Pentad::new(cmd::ERASE), mode)?;
    }

    read_init(bus, mode)?;
    let mut current = read_byte(bus, mode)?;
    let mut reads = 1;
    loop {
        let previous = current;
        read_init(bus, mode)?;
        current = read_byte(bus, mode)?;
        reads += 1;
        if current == previous {
            break;
        }
    }

    log::debug!("chip: erase settled after {} reads (0x{:02X})", reads, current);
    Ok(reads)
}

/// Encode the write-byte pentad sequence for `data` at `address`
pub fn encode_write(address: u32, data: u8, out: &mut [u8; 5 + cmd::WRITE_DATA_REPEAT]) {
    let address = address & ADDRESS_MASK;

    out[0] = cmd::WRITE_BYTE;
    out[1] = ((data >> 3) & 0x1C) | (address >> 15) as u8;
    out[2] = Pentad::new((address >> 10) as u8).value();
    out[3] = Pentad::new((address >> 5) as u8).value();
    out[4] = Pentad::new(address as u8).value();
    for slot in &mut out[5..] {
        *slot = Pentad::new(data).value();
    }
}

/// Recover `(address, data)` from the 8 pentads following a `WRITE_BYTE`
///
/// Returns `None` if the repeated data pentads disagree.
pub fn decode_write(pentads: &[u8; 4 + cmd::WRITE_DATA_REPEAT]) -> Option<(u32, u8)> {
    let low = pentads[4] & 0x1F;
    if pentads[4..].iter().any(|&p| p & 0x1F != low) {
        return None;
    }

    let data = ((pentads[0] & 0x1C) << 3) | low;
    let address = (((pentads[0] & 0x03) as u32) << 15)
        | (((pentads[1] & 0x1F) as u32) << 10)
        | (((pentads[2] & 0x1F) as u32) << 5)
        | (pentads[3] & 0x1F) as u32;

    Some((address, data))
}
