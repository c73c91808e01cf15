//! Pentad-level Viper GC chip emulator

use viperflash_core::error::Result;
use viperflash_core::programmer::{LineBus, OutputLines, StatusLines};
use viperflash_core::protocol::chip::{cmd, decode_write};
use viperflash_core::protocol::Pentad;
use viperflash_core::{ADDRESS_MASK, ERASED_VALUE, FLASH_SIZE};

/// Values presented by reads while an erase is still in progress
const SETTLE_PATTERN: [u8; 2] = [0x00, 0x55];

/// Configuration for the emulated chip
#[derive(Debug, Clone)]
pub struct ChipConfig {
    /// Whether the chip answers at all
    pub present: bool,
    /// Reads returning unstable values after an erase
    pub settle_reads: usize,
    /// Pentad numbers (1-based) the chip misses
    ///
    /// A missed pentad is not acknowledged and aborts whatever command was
    /// in progress; the next strobe edge is seen normally.
    pub glitches: Vec<usize>,
    /// Stop answering for good after this many pentads
    pub fail_after: Option<usize>,
}

impl Default for ChipConfig {
    fn default() -> Self {
        Self {
            present: true,
            settle_reads: 2,
            glitches: Vec::new(),
            fail_after: None,
        }
    }
}

/// Transaction counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChipStats {
    /// Pentads latched
    pub pentads: usize,
    /// Status samples taken by the programmer
    pub status_samples: usize,
    /// Bytes shifted out by READ commands
    pub reads: usize,
    /// Completed write-byte commands
    pub writes: usize,
    /// Write-byte commands with inconsistent data pentads
    pub rejected_writes: usize,
    /// Full chip erases
    pub erases: usize,
    /// Pentads missed on purpose
    pub glitches: usize,
    /// Total requested delay
    pub delayed_us: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    ReadInit { remaining: u8 },
    Reading { byte: u8, bit: u8 },
    Writing { args: [u8; 8], len: u8 },
}

/// Emulated Viper GC chip
///
/// Latches a pentad on every falling strobe edge and acknowledges by
/// mirroring the strobe on the acknowledge line. Programming only clears
/// bits, like real flash.
pub struct EmulatedChip {
    config: ChipConfig,
    data: Vec<u8>,
    stats: ChipStats,
    state: State,
    /// Strobe went high since the last latched pentad
    armed: bool,
    ack: bool,
    edges: usize,
    cursor: u32,
    read_mode: bool,
    erase_pulses: usize,
    settling: usize,
    init_step: usize,
    initialized: bool,
}

impl EmulatedChip {
    /// Create a blank chip
    pub fn new(config: ChipConfig) -> Self {
        Self {
            config,
            data: vec![ERASED_VALUE; FLASH_SIZE],
            stats: ChipStats::default(),
            state: State::Idle,
            armed: true,
            ack: false,
            edges: 0,
            cursor: 0,
            read_mode: false,
            erase_pulses: 0,
            settling: 0,
            init_step: 0,
            initialized: false,
        }
    }

    /// Create a blank chip with default configuration
    pub fn new_default() -> Self {
        Self::new(ChipConfig::default())
    }

    /// Create a chip pre-filled with `initial_data` from address 0
    pub fn with_data(config: ChipConfig, initial_data: &[u8]) -> Self {
        let mut chip = Self::new(config);
        let len = core::cmp::min(initial_data.len(), chip.data.len());
        chip.data[..len].copy_from_slice(&initial_data[..len]);
        chip
    }

    /// Get a reference to the flash contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash contents
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Transaction counters
    pub fn stats(&self) -> &ChipStats {
        &self.stats
    }

    /// Whether the power-on handshake was seen
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Get the configuration
    pub fn config(&self) -> &ChipConfig {
        &self.config
    }

    fn dead(&self) -> bool {
        !self.config.present
            || self
                .config
                .fail_after
                .is_some_and(|n| self.stats.pentads >= n)
    }

    fn latch(&mut self, pentad: u8) {
        self.stats.pentads += 1;
        self.state = match self.state {
            State::Idle => self.command(pentad),
            State::ReadInit { remaining } => {
                if pentad != 0 {
                    log::trace!("dummy: unexpected read-init argument 0x{:02X}", pentad);
                    State::Idle
                } else if remaining > 1 {
                    State::ReadInit {
                        remaining: remaining - 1,
                    }
                } else {
                    self.cursor = 0;
                    self.read_mode = true;
                    State::Idle
                }
            }
            State::Reading { byte, bit } => {
                if pentad != bit {
                    log::trace!("dummy: expected ack for bit {}, got 0x{:02X}", bit, pentad);
                    State::Idle
                } else if bit < 7 {
                    State::Reading { byte, bit: bit + 1 }
                } else {
                    State::Idle
                }
            }
            State::Writing { mut args, len } => {
                args[len as usize] = pentad;
                if len < 7 {
                    State::Writing { args, len: len + 1 }
                } else {
                    self.program(&args);
                    State::Idle
                }
            }
        };
    }

    fn command(&mut self, pentad: u8) -> State {
        if pentad != cmd::ERASE {
            self.erase_pulses = 0;
        }
        self.track_init(pentad);

        match pentad {
            cmd::RESET => {
                self.read_mode = false;
                State::Idle
            }
            cmd::ERASE => {
                self.erase_pulses += 1;
                if self.erase_pulses == cmd::ERASE_PULSES {
                    self.erase();
                }
                State::Idle
            }
            cmd::WRITE_BYTE => State::Writing {
                args: [0; 8],
                len: 0,
            },
            cmd::READ => State::Reading {
                byte: self.next_byte(),
                bit: 0,
            },
            p if p == cmd::READ_INIT[0] => State::ReadInit {
                remaining: (cmd::READ_INIT.len() - 1) as u8,
            },
            _ => State::Idle,
        }
    }

    fn track_init(&mut self, pentad: u8) {
        let expected = Pentad::new(cmd::CHIP_INIT[self.init_step]).value();
        if pentad == expected {
            self.init_step += 1;
            if self.init_step == cmd::CHIP_INIT.len() {
                self.initialized = true;
                self.init_step = 0;
            }
        } else {
            self.init_step = usize::from(pentad == Pentad::new(cmd::CHIP_INIT[0]).value());
        }
    }

    fn next_byte(&mut self) -> u8 {
        self.stats.reads += 1;
        if !self.read_mode {
            return ERASED_VALUE;
        }
        if self.settling > 0 {
            self.settling -= 1;
            return SETTLE_PATTERN[self.settling % SETTLE_PATTERN.len()];
        }
        let byte = self.data[(self.cursor & ADDRESS_MASK) as usize];
        self.cursor = (self.cursor + 1) & ADDRESS_MASK;
        byte
    }

    fn erase(&mut self) {
        self.data.fill(ERASED_VALUE);
        self.settling = self.config.settle_reads;
        self.stats.erases += 1;
        log::debug!("dummy: chip erased");
    }

    fn program(&mut self, args: &[u8; 8]) {
        match decode_write(args) {
            Some((address, byte)) => {
                // Flash programming: can only change 1 -> 0
                self.data[address as usize] &= byte;
                self.stats.writes += 1;
            }
            None => self.stats.rejected_writes += 1,
        }
    }
}

impl LineBus for EmulatedChip {
    fn write_lines(&mut self, lines: OutputLines) -> Result<()> {
        if self.dead() {
            return Ok(());
        }

        if lines.contains(OutputLines::STROBE) {
            self.armed = true;
            self.ack = false;
            return Ok(());
        }

        if !self.armed {
            return Ok(());
        }

        self.edges += 1;
        if self.config.glitches.contains(&self.edges) {
            self.stats.glitches += 1;
            self.state = State::Idle;
            return Ok(());
        }

        self.armed = false;
        self.ack = true;
        self.latch(Pentad::from_lines(lines).value());
        Ok(())
    }

    fn read_status(&mut self) -> Result<StatusLines> {
        self.stats.status_samples += 1;
        let mut status = StatusLines::empty();
        if self.ack {
            status |= StatusLines::ACK;
        }
        if let State::Reading { byte, bit } = self.state {
            if byte >> bit & 1 != 0 {
                status |= StatusLines::DATA;
            }
        }
        Ok(status)
    }

    fn delay_us(&mut self, us: u32) {
        // No delay needed for an in-memory chip
        self.stats.delayed_us += us as u64;
    }
}
