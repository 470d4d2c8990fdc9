//! rtxlink core engine
//!
//! Board-agnostic link layer. Everything here runs on the host for testing
//! and on the radio in the firmware crate.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │                  Engine                    │
//! │  ┌────────────┐  ┌─────────┐  ┌──────────┐ │
//! │  │ Reassembler│─>│ Registry│─>│ handlers │ │
//! │  └────────────┘  └─────────┘  └────┬─────┘ │
//! │        ▲                           ▼       │
//! │        │                    ┌─────────────┐│
//! │        │                    │ Transmitter ││
//! │        │                    └──────┬──────┘│
//! └────────┼───────────────────────────┼───────┘
//!          │          ComPort          ▼
//! ```
//!
//! No allocation, no blocking. State lives in one [`Engine`] per transport.
//!
//! # Features
//!
//! - `defmt`: `defmt::Format` for the public types
//! - `serde`: postcard storage for [`LinkConfig`]. Opt-in and not enabled
//!   by any crate in this workspace; its tests run with
//!   `cargo test -p rtxlink-core --features serde`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod engine;
pub mod registry;
pub mod rx;
pub mod stats;
pub mod tx;

#[cfg(test)]
mod mock;

pub use config::LinkConfig;
pub use engine::{CycleReport, Engine};
pub use registry::{ProtocolHandler, Registry, RegistryError};
pub use rx::{Reassembler, RxEvent};
pub use stats::{DropReason, LinkStats};
pub use tx::{SendError, Transmitter};
