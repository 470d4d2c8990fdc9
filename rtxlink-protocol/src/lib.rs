//! rtxlink wire protocol
//!
//! This crate defines the framing used between a radio and a host computer
//! over a single serial channel. Several protocols (console, radio control,
//! flash management, file transfer) share the channel; each frame names the
//! protocol it belongs to.
//!
//! # Protocol Overview
//!
//! A decoded frame is:
//! ```text
//! ┌──────────┬─────────────┬──────┐
//! │ PROTOCOL │ PAYLOAD     │ CRC  │
//! │ 1B       │ 0–126B      │ 1B   │
//! └──────────┴─────────────┴──────┘
//! ```
//!
//! On the wire it is SLIP byte-stuffed and delimited by END (`0xC0`) on both
//! sides, so frame boundaries can be found again after line noise without
//! any length field.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod frame;
pub mod protocol;
pub mod slip;

pub use frame::{
    crc8, Frame, FrameError, MAX_ENCODED_FRAME_SIZE, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE,
};
pub use protocol::{ProtocolId, PROTOCOL_COUNT};
pub use slip::SlipError;
