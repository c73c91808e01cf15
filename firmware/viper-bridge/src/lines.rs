//! GPIO side of the bridge
//!
//! ## Pin Assignments
//!
//! | Pin  | Function            | DB-25 pin |
//! |------|---------------------|-----------|
//! | GP2  | D0                  | 2         |
//! | GP3  | D1                  | 3         |
//! | GP4  | D2                  | 4         |
//! | GP5  | D3                  | 5         |
//! | GP6  | D4 (strobe)         | 6         |
//! | GP7  | D5 (marker)         | 7         |
//! | GP8  | acknowledge (input) | 15        |
//! | GP9  | chip data (input)   | 13        |

use embassy_rp::gpio::{Input, Level, Output, Pin, Pull};
use embassy_rp::Peri;
use embassy_time::{block_for, Duration};
use viperflash_core::programmer::{LineBus, OutputLines, StatusLines};
use viperflash_core::Result;

/// The six output lines and two status lines wired to the modchip
pub struct GpioLines {
    data: [Output<'static>; 6],
    ack: Input<'static>,
    chip_data: Input<'static>,
}

impl GpioLines {
    /// Configure the pins, all outputs low
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        d0: Peri<'static, impl Pin>,
        d1: Peri<'static, impl Pin>,
        d2: Peri<'static, impl Pin>,
        d3: Peri<'static, impl Pin>,
        d4: Peri<'static, impl Pin>,
        d5: Peri<'static, impl Pin>,
        ack: Peri<'static, impl Pin>,
        chip_data: Peri<'static, impl Pin>,
    ) -> Self {
        Self {
            data: [
                Output::new(d0, Level::Low),
                Output::new(d1, Level::Low),
                Output::new(d2, Level::Low),
                Output::new(d3, Level::Low),
                Output::new(d4, Level::Low),
                Output::new(d5, Level::Low),
            ],
            ack: Input::new(ack, Pull::Up),
            chip_data: Input::new(chip_data, Pull::Up),
        }
    }
}

impl LineBus for GpioLines {
    fn write_lines(&mut self, lines: OutputLines) -> Result<()> {
        let bits = lines.bits();
        for (i, pin) in self.data.iter_mut().enumerate() {
            pin.set_level(if bits & (1 << i) != 0 {
                Level::High
            } else {
                Level::Low
            });
        }
        Ok(())
    }

    fn read_status(&mut self) -> Result<StatusLines> {
        let mut status = StatusLines::empty();
        status.set(StatusLines::ACK, self.ack.is_high());
        status.set(StatusLines::DATA, self.chip_data.is_high());
        Ok(status)
    }

    fn delay_us(&mut self, us: u32) {
        block_for(Duration::from_micros(us as u64));
    }
}
