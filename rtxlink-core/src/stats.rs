//! Link statistics
//!
//! Dropped frames are never reported to handlers. These counters are the
//! only trace they leave, for diagnostics on the firmware side.

/// Why a frame never reached a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DropReason {
    /// Invalid SLIP escape sequence
    Malformed,
    /// Decoded frame exceeded the receive buffer
    Oversize,
    /// Partial frame evicted after the idle timeout
    Stale,
    /// Frame too short to carry an identifier and a CRC
    Truncated,
    /// CRC mismatch
    Checksum,
    /// Protocol identifier out of range or without a handler
    Unroutable,
}

/// Running counters for one link
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    pub frames_dispatched: u32,
    pub malformed: u32,
    pub oversize: u32,
    pub stale: u32,
    pub truncated: u32,
    pub checksum_errors: u32,
    pub unroutable: u32,
    pub bytes_sent: u32,
}

impl LinkStats {
    /// Create zeroed statistics
    pub const fn new() -> Self {
        Self {
            frames_dispatched: 0,
            malformed: 0,
            oversize: 0,
            stale: 0,
            truncated: 0,
            checksum_errors: 0,
            unroutable: 0,
            bytes_sent: 0,
        }
    }

    /// Count a dropped frame
    pub fn record_drop(&mut self, reason: DropReason) {
        let counter = match reason {
            DropReason::Malformed => &mut self.malformed,
            DropReason::Oversize => &mut self.oversize,
            DropReason::Stale => &mut self.stale,
            DropReason::Truncated => &mut self.truncated,
            DropReason::Checksum => &mut self.checksum_errors,
            DropReason::Unroutable => &mut self.unroutable,
        };
        *counter = counter.wrapping_add(1);
    }

    /// Total frames dropped for any reason
    pub fn frames_dropped(&self) -> u32 {
        self.malformed
            .wrapping_add(self.oversize)
            .wrapping_add(self.stale)
            .wrapping_add(self.truncated)
            .wrapping_add(self.checksum_errors)
            .wrapping_add(self.unroutable)
    }
}
