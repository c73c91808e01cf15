//! Viper GC serial bridge firmware for Raspberry Pi Pico
//!
//! Drives the modchip's parallel lines from GPIO and serves the host over
//! UART0 (GP0 TX, GP1 RX, 1 Mbaud 8N1). Line accesses are forwarded one by
//! one; stream commands run whole read and write passes locally.
//!
//! See [`lines`] for the modchip wiring.

#![no_std]
#![no_main]

mod lines;
mod link;

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{self, BufferedInterruptHandler, BufferedUart};
use static_cell::StaticCell;
use viperflash_core::bridge::{BridgeFirmware, FirmwareConfig};
use {defmt_rtt as _, panic_probe as _};

use crate::lines::GpioLines;
use crate::link::UartLink;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

/// Host link speed
pub const BAUD: u32 = 1_000_000;

/// Large enough for a full write chunk plus its header
const RX_BUF_SIZE: usize = 256;
const TX_BUF_SIZE: usize = 256;

static RX_BUF: StaticCell<[u8; RX_BUF_SIZE]> = StaticCell::new();
static TX_BUF: StaticCell<[u8; TX_BUF_SIZE]> = StaticCell::new();

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("viper-bridge starting...");

    let p = embassy_rp::init(Default::default());

    let lines = GpioLines::new(
        p.PIN_2, p.PIN_3, p.PIN_4, p.PIN_5, p.PIN_6, p.PIN_7, // D0-D5
        p.PIN_8, // acknowledge
        p.PIN_9, // chip data
    );

    let mut config = uart::Config::default();
    config.baudrate = BAUD;
    let uart = BufferedUart::new(
        p.UART0,
        p.PIN_0,
        p.PIN_1,
        Irqs,
        TX_BUF.init([0; TX_BUF_SIZE]),
        RX_BUF.init([0; RX_BUF_SIZE]),
        config,
    );

    info!("UART0 at {} baud, waiting for host", BAUD);

    let mut firmware = BridgeFirmware::new(lines, UartLink::new(uart), FirmwareConfig::default());
    loop {
        // Only link failures end the command loop; keep serving
        if firmware.run().is_err() {
            warn!("host link error, restarting command loop");
        }
    }
}
