//! Link engine and task loop
//!
//! The [`Engine`] owns every piece of link state for one transport: the
//! reassembler, the transmit buffer, the handler registry and the
//! statistics. The owning task calls [`Engine::run_cycle`] at its own
//! cadence; each call does a bounded amount of work and never waits.
//!
//! ```text
//!   run_cycle:
//!     poll rx ──> frame ready? ──> verify CRC ──> dispatch to handler
//!                                                        │
//!     drain tx <─────────────────────────────────────────┘
//! ```

use rtxlink_hal::ComPort;
use rtxlink_protocol::{Frame, FrameError, PROTOCOL_COUNT};

use crate::config::LinkConfig;
use crate::registry::{ProtocolHandler, Registry, RegistryError};
use crate::rx::{Reassembler, RxEvent};
use crate::stats::{DropReason, LinkStats};
use crate::tx::{SendError, Transmitter};

/// What one cycle did on the receive side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleReport {
    /// Nothing received
    Idle,
    /// A frame is partly received
    Pending,
    /// A frame was handed to the handler for this protocol identifier
    Dispatched(u8),
    /// A frame was discarded
    Dropped(DropReason),
}

/// Protocol engine bound to one transport
///
/// `N` is the number of handler slots; identifiers `>= N` are never routed.
pub struct Engine<'h, P: ComPort, const N: usize = PROTOCOL_COUNT> {
    port: P,
    config: LinkConfig,
    rx: Reassembler,
    tx: Transmitter,
    registry: Registry<'h, N>,
    stats: LinkStats,
}

impl<'h, P: ComPort, const N: usize> Engine<'h, P, N> {
    /// Create an engine with no handlers registered
    pub fn new(port: P, config: LinkConfig) -> Self {
        Self {
            port,
            config,
            rx: Reassembler::new(),
            tx: Transmitter::new(),
            registry: Registry::new(),
            stats: LinkStats::new(),
        }
    }

    /// Install the handler for protocol `id`
    pub fn register(
        &mut self,
        id: u8,
        handler: &'h mut dyn ProtocolHandler,
    ) -> Result<(), RegistryError> {
        self.registry.register(id, handler)
    }

    /// Remove the handler for protocol `id`, if any
    pub fn unregister(&mut self, id: u8) -> Option<&'h mut dyn ProtocolHandler> {
        self.registry.unregister(id)
    }

    /// Check if protocol `id` has a handler
    pub fn is_registered(&self, id: u8) -> bool {
        self.registry.is_registered(id)
    }

    /// Queue a frame for transmission
    ///
    /// See [`Transmitter::send`].
    pub fn send(&mut self, protocol_id: u8, payload: &[u8]) -> Result<(), SendError> {
        self.tx.send(protocol_id, payload)
    }

    /// Queue a frame from a lower-priority source once the transmitter is free
    ///
    /// `next` is only called when the previous frame has been fully written,
    /// so a queued item stays in its source while the link is busy. Call
    /// this after [`Engine::run_cycle`] so that handler replies claim the
    /// transmitter first.
    ///
    /// Returns `None` if the transmitter was busy or `next` had nothing.
    pub fn send_when_idle<T, F>(
        &mut self,
        protocol_id: u8,
        next: F,
    ) -> Option<Result<(), SendError>>
    where
        T: AsRef<[u8]>,
        F: FnOnce() -> Option<T>,
    {
        if !self.tx.is_idle() {
            return None;
        }
        let payload = next()?;
        Some(self.tx.send(protocol_id, payload.as_ref()))
    }

    /// True when the previous outgoing frame has been fully written
    pub fn is_tx_idle(&self) -> bool {
        self.tx.is_idle()
    }

    /// Advance the link by one cycle
    ///
    /// Dispatches at most one frame, then runs one drain step. Frames
    /// already buffered beyond the first wait for later cycles.
    pub fn run_cycle(&mut self) -> CycleReport {
        let report = match self.rx.poll(&mut self.port, &self.config) {
            RxEvent::Idle => CycleReport::Idle,
            RxEvent::Partial => CycleReport::Pending,
            RxEvent::Dropped(reason) => CycleReport::Dropped(reason),
            RxEvent::FrameReady => {
                let report = self.dispatch_frame();
                self.rx.reset_frame();
                report
            }
        };

        match report {
            CycleReport::Dispatched(_) => {
                self.stats.frames_dispatched = self.stats.frames_dispatched.wrapping_add(1);
            }
            CycleReport::Dropped(reason) => self.stats.record_drop(reason),
            CycleReport::Idle | CycleReport::Pending => {}
        }

        let written = self
            .tx
            .drain(&mut self.port, self.config.effective_drain_chunk());
        self.stats.bytes_sent = self.stats.bytes_sent.wrapping_add(written as u32);

        report
    }

    fn dispatch_frame(&mut self) -> CycleReport {
        let frame = match Frame::verify(self.rx.frame()) {
            Ok(frame) => frame,
            Err(FrameError::InvalidChecksum) => {
                return CycleReport::Dropped(DropReason::Checksum)
            }
            Err(_) => return CycleReport::Dropped(DropReason::Truncated),
        };

        match self
            .registry
            .dispatch(frame.protocol_id, frame.payload, &mut self.tx)
        {
            Ok(()) => CycleReport::Dispatched(frame.protocol_id),
            Err(_) => CycleReport::Dropped(DropReason::Unroutable),
        }
    }

    /// Link counters since creation
    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    /// Active configuration
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Borrow the transport
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Mutably borrow the transport
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }
}
