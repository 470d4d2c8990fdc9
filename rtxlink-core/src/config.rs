//! Link configuration
//!
//! Tunables for the engine. Every field has a default matching the
//! reference link behaviour, so `LinkConfig::default()` is always valid.
//! With the opt-in `serde` feature the struct can be stored alongside
//! other settings as postcard binary data.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest single transport write issued by the drain step
pub const DRAIN_CHUNK_SIZE: usize = 64;

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkConfig {
    /// Discard a partially received frame after this many consecutive
    /// cycles without new bytes. `None` keeps it indefinitely.
    pub idle_eviction_cycles: Option<u32>,
    /// Bytes offered to the transport per drain step (1..=64)
    pub drain_chunk: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkConfig {
    /// Default configuration: no eviction, full-size drain writes
    pub const fn new() -> Self {
        Self {
            idle_eviction_cycles: None,
            drain_chunk: DRAIN_CHUNK_SIZE,
        }
    }

    /// Enable idle eviction of stalled partial frames
    pub const fn with_idle_eviction(mut self, cycles: u32) -> Self {
        self.idle_eviction_cycles = Some(cycles);
        self
    }

    /// Set the per-cycle drain size
    pub const fn with_drain_chunk(mut self, bytes: usize) -> Self {
        self.drain_chunk = bytes;
        self
    }

    /// Drain size clamped to what the engine supports
    pub fn effective_drain_chunk(&self) -> usize {
        self.drain_chunk.clamp(1, DRAIN_CHUNK_SIZE)
    }

    /// Serialize to postcard binary format
    #[cfg(feature = "serde")]
    pub fn to_bytes<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], postcard::Error> {
        postcard::to_slice(self, buf)
    }

    /// Deserialize from postcard binary format
    #[cfg(feature = "serde")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}
