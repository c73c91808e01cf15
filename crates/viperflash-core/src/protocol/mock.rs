//! Recording line bus for unit tests

use std::vec::Vec;

use crate::error::Result;
use crate::programmer::{LineBus, OutputLines, StatusLines};
use crate::protocol::chip::cmd;
use crate::protocol::pentad::Pentad;

/// Acknowledges every strobe edge and shifts out bytes from `memory`, one
/// per READ pentad.
pub(crate) struct MockBus {
    pub writes: Vec<OutputLines>,
    pub status_reads: usize,
    pub delays: Vec<u32>,
    /// Force the acknowledge line to a fixed level
    pub ack_stuck: Option<bool>,
    /// Stop acknowledging once this many pentads were latched
    pub fail_after: Option<usize>,
    /// Bytes returned by successive reads, 0xFF once exhausted
    pub memory: Vec<u8>,
    next_read: usize,
    shift: u8,
    latched: usize,
    ack: bool,
}

impl MockBus {
    pub fn new() -> Self {
        Self {
            writes: Vec::new(),
            status_reads: 0,
            delays: Vec::new(),
            ack_stuck: None,
            fail_after: None,
            memory: Vec::new(),
            next_read: 0,
            shift: 0,
            latched: 0,
            ack: false,
        }
    }

    /// Pentads presented with the strobe low, in order
    pub fn pentads(&self) -> Vec<u8> {
        self.writes
            .iter()
            .filter(|l| !l.contains(OutputLines::STROBE))
            .map(|&l| Pentad::from_lines(l).value())
            .collect()
    }

    fn latch(&mut self, pentad: Pentad) {
        if pentad.value() == cmd::READ {
            self.shift = self.memory.get(self.next_read).copied().unwrap_or(0xFF);
            self.next_read += 1;
        } else {
            self.shift >>= 1;
        }
    }
}

impl LineBus for MockBus {
    fn write_lines(&mut self, lines: OutputLines) -> Result<()> {
        self.writes.push(lines);
        let strobe = lines.contains(OutputLines::STROBE);
        if !strobe {
            self.latched += 1;
            self.latch(Pentad::from_lines(lines));
        }
        if self.fail_after.map_or(true, |n| self.latched <= n) {
            self.ack = !strobe;
        }
        Ok(())
    }

    fn read_status(&mut self) -> Result<StatusLines> {
        self.status_reads += 1;
        let mut status = StatusLines::empty();
        if self.ack_stuck.unwrap_or(self.ack) {
            status |= StatusLines::ACK;
        }
        if self.shift & 1 != 0 {
            status |= StatusLines::DATA;
        }
        Ok(status)
    }

    fn delay_us(&mut self, us: u32) {
        self.delays.push(us);
    }
}
