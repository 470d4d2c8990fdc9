//! Receive-side frame reassembly
//!
//! The transport delivers bytes in chunks of at most [`CHUNK_SIZE`] whose
//! boundaries have nothing to do with frame boundaries. The reassembler
//! decodes each chunk into a bounded frame buffer, one span per poll:
//!
//! ```text
//!   chunk:  C0 C0 41 42 43 52 C0 41 ...
//!           └─┬─┘ └──────┬─────┘ └─┬──
//!       separators    frame A    kept for the next poll
//! ```
//!
//! A frame may span many chunks, and one chunk may hold several frames;
//! the bytes after a frame end stay buffered until the next poll.

use heapless::Vec;
use rtxlink_hal::ComPort;
use rtxlink_protocol::slip::{self, END};
use rtxlink_protocol::MAX_FRAME_SIZE;

use crate::config::LinkConfig;
use crate::stats::DropReason;

/// Size of one transport read
pub const CHUNK_SIZE: usize = 64;

/// Outcome of one reassembly step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxEvent {
    /// No frame in progress and no new data
    Idle,
    /// Part of a frame is buffered, more bytes are needed
    Partial,
    /// A complete frame is available through [`Reassembler::frame`]
    FrameReady,
    /// The frame being assembled was thrown away
    Dropped(DropReason),
}

/// Frame reassembler
#[derive(Debug)]
pub struct Reassembler {
    /// Last chunk read from the transport
    chunk: [u8; CHUNK_SIZE],
    /// Next unconsumed byte in `chunk`
    chunk_pos: usize,
    /// Valid bytes in `chunk`
    chunk_len: usize,
    /// Decoded bytes of the current frame
    frame: Vec<u8, MAX_FRAME_SIZE>,
    /// Previous chunk ended on an ESC whose partner has not arrived yet
    escape_pending: bool,
    /// Dropping bytes until the next END after a bad frame
    discarding: bool,
    /// Consecutive polls without data while a frame is in progress
    idle_cycles: u32,
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reassembler {
    /// Create an empty reassembler
    pub const fn new() -> Self {
        Self {
            chunk: [0; CHUNK_SIZE],
            chunk_pos: 0,
            chunk_len: 0,
            frame: Vec::new(),
            escape_pending: false,
            discarding: false,
            idle_cycles: 0,
        }
    }

    /// Decoded bytes of the current frame
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    /// Bytes read from the transport but not yet processed
    pub fn buffered(&self) -> usize {
        self.chunk_len - self.chunk_pos
    }

    /// Forget the current frame so the next poll starts a new one
    ///
    /// Bytes already read past the frame end are kept.
    pub fn reset_frame(&mut self) {
        self.frame.clear();
        self.escape_pending = false;
        self.discarding = false;
        self.idle_cycles = 0;
    }

    /// Run one reassembly step
    ///
    /// Reads from `port` only when the previous chunk is used up. Never
    /// blocks and processes at most one frame's worth of bytes.
    pub fn poll<P: ComPort>(&mut self, port: &mut P, config: &LinkConfig) -> RxEvent {
        if self.buffered() == 0 {
            self.chunk_pos = 0;
            self.chunk_len = 0;

            // Transport errors are treated as silence
            let received = port.read(&mut self.chunk).unwrap_or(0).min(CHUNK_SIZE);
            if received == 0 {
                return self.on_idle(config);
            }
            self.chunk_len = received;
        }

        self.idle_cycles = 0;
        self.step()
    }

    fn at_frame_start(&self) -> bool {
        self.frame.is_empty() && !self.escape_pending && !self.discarding
    }

    fn no_frame(&self) -> RxEvent {
        if self.at_frame_start() {
            RxEvent::Idle
        } else {
            RxEvent::Partial
        }
    }

    fn on_idle(&mut self, config: &LinkConfig) -> RxEvent {
        if self.at_frame_start() {
            return RxEvent::Idle;
        }

        self.idle_cycles = self.idle_cycles.saturating_add(1);
        let evict = matches!(config.idle_eviction_cycles, Some(limit) if self.idle_cycles >= limit);
        if !evict {
            return RxEvent::Partial;
        }

        let had_data = !self.frame.is_empty() || self.escape_pending;
        self.reset_frame();
        if had_data {
            RxEvent::Dropped(DropReason::Stale)
        } else {
            RxEvent::Idle
        }
    }

    /// Drop the current frame; unless its END was already seen, keep
    /// dropping bytes until one arrives
    fn abandon(&mut self, reason: DropReason, end_seen: bool) -> RxEvent {
        self.frame.clear();
        self.escape_pending = false;
        self.discarding = !end_seen;
        RxEvent::Dropped(reason)
    }

    /// Complete an escape sequence split across two chunks
    fn finish_escape(&mut self) -> Option<RxEvent> {
        if self.buffered() == 0 {
            return Some(RxEvent::Partial);
        }

        let next = self.chunk[self.chunk_pos];
        self.chunk_pos += 1;
        self.escape_pending = false;

        match slip::unescape(next) {
            Some(byte) => {
                if self.frame.push(byte).is_err() {
                    return Some(self.abandon(DropReason::Oversize, false));
                }
                None
            }
            None => Some(self.abandon(DropReason::Malformed, next == END)),
        }
    }

    fn step(&mut self) -> RxEvent {
        // Leading ENDs are separators between frames, not payload
        if self.at_frame_start() {
            while self.buffered() > 0 && self.chunk[self.chunk_pos] == END {
                self.chunk_pos += 1;
            }
            if self.buffered() == 0 {
                return RxEvent::Idle;
            }
        }

        if self.escape_pending {
            if let Some(event) = self.finish_escape() {
                return event;
            }
        }

        let mut scratch = [0u8; CHUNK_SIZE];
        let (end_seen, trailing_escape, decoded) = {
            let rest = &self.chunk[self.chunk_pos..self.chunk_len];
            let end = slip::search_frame_end(rest);
            let span = &rest[..end.map_or(rest.len(), |e| e + 1)];

            // Hold back a lone ESC at the chunk edge until its partner arrives
            let trailing_escape = end.is_none() && slip::ends_with_escape(span);
            let body = if trailing_escape {
                &span[..span.len() - 1]
            } else {
                span
            };

            let decoded = if self.discarding {
                Ok(0)
            } else {
                slip::decode_block(body, &mut scratch)
            };

            self.chunk_pos += span.len();
            (end.is_some(), trailing_escape, decoded)
        };

        if self.discarding {
            if end_seen {
                self.discarding = false;
            }
            return self.no_frame();
        }

        let len = match decoded {
            Ok(len) => len,
            Err(_) => return self.abandon(DropReason::Malformed, end_seen),
        };

        if self.frame.extend_from_slice(&scratch[..len]).is_err() {
            return self.abandon(DropReason::Oversize, end_seen);
        }
        self.escape_pending = trailing_escape;

        match (end_seen, self.frame.is_empty()) {
            (true, false) => RxEvent::FrameReady,
            (true, true) => RxEvent::Idle,
            (false, _) => RxEvent::Partial,
        }
    }
}
