//! rtxlink - Radio Link Firmware
//!
//! Firmware binary that exposes the rtxlink host link on UART0 of an
//! RP2040 board. The host talks CAT and FMP over SLIP frames; console
//! output goes back on the Stdio protocol.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{self, BufferedInterruptHandler, Uart};
use embassy_time::Timer;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use rtxlink_core::LinkConfig;
use rtxlink_hal::{DataBits, Parity, SplitPort, StopBits, UartConfig};

use crate::channels::REBOOT_REQUEST;

mod channels;
mod radio;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

/// Host link line settings
const HOST_UART: UartConfig = UartConfig::with_baudrate(115200);

/// Drop a partial frame after 2 s without new bytes, and never write more
/// per cycle than the line sends in one cycle so the TX ring cannot fill
const LINK_CONFIG: LinkConfig = LinkConfig::new()
    .with_idle_eviction((2000 / tasks::link::CYCLE_INTERVAL_MS) as u32)
    .with_drain_chunk(HOST_UART.bytes_per_interval(tasks::link::CYCLE_INTERVAL_MS));

/// Time given to the last reply before a requested reboot
const REBOOT_DELAY_MS: u64 = 100;

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 512]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 512]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("rtxlink firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    if !HOST_UART.is_eight_bit_clean() {
        warn!("Host UART is not 8-bit clean, SLIP frames will be corrupted");
    }

    let tx_buf = TX_BUF.init([0u8; 512]);
    let rx_buf = RX_BUF.init([0u8; 512]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, to_rp_config(&HOST_UART));
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();
    let port = SplitPort::new(rx, tx);

    info!("UART initialized at {} baud", HOST_UART.baudrate);

    spawner.spawn(tasks::link_task(port, LINK_CONFIG)).unwrap();

    channels::print(b"rtxlink ready\n");
    info!("All tasks spawned, firmware running");

    // Main task only waits for a reboot request from the host
    REBOOT_REQUEST.wait().await;
    info!("Rebooting in {} ms", REBOOT_DELAY_MS);
    Timer::after_millis(REBOOT_DELAY_MS).await;
    cortex_m::peripheral::SCB::sys_reset();
}

/// Translate the board-agnostic line settings to the RP2040 UART config
fn to_rp_config(cfg: &UartConfig) -> uart::Config {
    let mut config = uart::Config::default();
    config.baudrate = cfg.baudrate;
    config.data_bits = match cfg.data_bits {
        DataBits::Seven => uart::DataBits::DataBits7,
        DataBits::Eight => uart::DataBits::DataBits8,
    };
    config.parity = match cfg.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    config.stop_bits = match cfg.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    config
}
