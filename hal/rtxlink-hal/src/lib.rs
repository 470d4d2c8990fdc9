//! rtxlink Hardware Abstraction Layer
//!
//! This crate defines the serial transport seam between the rtxlink protocol
//! engine and whatever actually moves bytes: a UART peripheral, a USB CDC
//! endpoint, or a pseudo-terminal on a host build.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  rtxlink-core (Engine::run_cycle)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  rtxlink-hal (this crate - ComPort)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ embedded-io   │       │  test / host  │
//! │ devices       │       │  transports   │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`com::ComPort`] - Non-blocking byte transport
//! - [`com::IoPort`], [`com::SplitPort`] - Adapters for `embedded-io` devices

#![no_std]
#![deny(unsafe_code)]

pub mod com;
pub mod uart;

// Re-export key types at crate root for convenience
pub use com::{ComError, ComPort, IoPort, SplitPort};
pub use uart::{DataBits, Parity, StopBits, UartConfig};
