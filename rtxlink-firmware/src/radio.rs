//! Radio and memory state exposed to the host over CAT and FMP

use defmt::*;

use rtxlink_handlers::{MemoryDevices, MemoryInfo, RadioState};

use crate::channels::REBOOT_REQUEST;

/// Model name reported to the host
const RADIO_NAME: &str = "rtxlink RP2040";

/// Power-on channel frequency in Hz
const DEFAULT_FREQUENCY_HZ: u32 = 430_000_000;

/// On-board QSPI flash size
const FLASH_SIZE: u32 = 2 * 1024 * 1024;

/// Live channel state
pub struct Radio {
    rx_frequency: u32,
    tx_frequency: u32,
    file_transfer: bool,
}

impl Radio {
    pub const fn new() -> Self {
        Self {
            rx_frequency: DEFAULT_FREQUENCY_HZ,
            tx_frequency: DEFAULT_FREQUENCY_HZ,
            file_transfer: false,
        }
    }
}

impl RadioState for Radio {
    fn name(&self) -> &str {
        RADIO_NAME
    }

    fn rx_frequency(&self) -> u32 {
        self.rx_frequency
    }

    fn tx_frequency(&self) -> u32 {
        self.tx_frequency
    }

    fn set_frequency(&mut self, freq_hz: u32) {
        info!("CAT: frequency set to {} Hz", freq_hz);
        self.rx_frequency = freq_hz;
        self.tx_frequency = freq_hz;
    }

    fn request_reboot(&mut self) {
        info!("CAT: reboot requested");
        REBOOT_REQUEST.signal(());
    }

    fn enter_file_transfer(&mut self) {
        if !self.file_transfer {
            info!("CAT: entering file transfer mode");
        }
        self.file_transfer = true;
    }
}

/// Memory devices on the board
pub struct Memories;

impl MemoryDevices for Memories {
    fn count(&self) -> usize {
        1
    }

    fn info(&self, index: usize) -> Option<MemoryInfo<'_>> {
        match index {
            0 => Some(MemoryInfo {
                size: FLASH_SIZE,
                name: "Internal flash",
                index: 0,
            }),
            _ => None,
        }
    }
}
