//! Protocol handlers for the rtxlink radio link
//!
//! - CAT: radio control (query and set radio parameters)
//! - FMP: flash memory management (memory device discovery)
//!
//! Each handler talks to the rest of the firmware through a small trait
//! ([`cat::RadioState`], [`fmp::MemoryDevices`]) and registers itself on an
//! [`rtxlink_core::Engine`] with `init`/`terminate`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod cat;
pub mod fmp;

#[cfg(test)]
mod testutil;

pub use cat::{CatHandler, RadioState};
pub use fmp::{FmpHandler, MemoryDevices, MemoryInfo};

/// Status codes carried in handler replies (errno values)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Status {
    /// Success
    Ok = 0,
    /// Argument list too long (`E2BIG`)
    TooBig = 7,
    /// Invalid request descriptor (`EBADR`)
    BadRequest = 53,
    /// Invalid request code (`EBADRQC`)
    BadRequestCode = 56,
}

impl From<Status> for u8 {
    fn from(status: Status) -> u8 {
        status as u8
    }
}
