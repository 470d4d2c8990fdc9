//! Transmit path
//!
//! Holds exactly one outgoing frame, already SLIP-encoded, and drains it
//! to the transport a bounded chunk at a time. A new frame is refused
//! until the previous one has been written out completely.

use heapless::Vec;
use rtxlink_hal::ComPort;
use rtxlink_protocol::frame::{self, MAX_ENCODED_FRAME_SIZE, MAX_PAYLOAD_SIZE};

use crate::config::DRAIN_CHUNK_SIZE;

/// Capacity of the transmit buffer
pub const TX_BUFFER_SIZE: usize = MAX_ENCODED_FRAME_SIZE;

/// Reasons a frame was not accepted for sending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError {
    /// A previous frame is still being drained; try again next cycle
    Busy,
    /// Payload exceeds [`MAX_PAYLOAD_SIZE`]
    PayloadTooLarge,
}

/// Single-frame transmit buffer with a drain cursor
#[derive(Debug)]
pub struct Transmitter {
    buf: Vec<u8, TX_BUFFER_SIZE>,
    cursor: usize,
}

impl Default for Transmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Transmitter {
    /// Create an idle transmitter
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            cursor: 0,
        }
    }

    /// True when no frame is waiting to be written
    pub fn is_idle(&self) -> bool {
        self.cursor >= self.buf.len()
    }

    /// Encoded bytes still to be written
    pub fn pending(&self) -> usize {
        self.buf.len().saturating_sub(self.cursor)
    }

    /// Queue a frame for `protocol_id` carrying `payload`
    ///
    /// Returns immediately; the bytes go out during later drain steps.
    /// Callers must not spin on [`SendError::Busy`].
    pub fn send(&mut self, protocol_id: u8, payload: &[u8]) -> Result<(), SendError> {
        if !self.is_idle() {
            return Err(SendError::Busy);
        }
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(SendError::PayloadTooLarge);
        }

        let mut encoded = [0u8; TX_BUFFER_SIZE];
        let len = frame::encode(protocol_id, payload, &mut encoded)
            .map_err(|_| SendError::PayloadTooLarge)?;

        self.buf.clear();
        self.buf
            .extend_from_slice(&encoded[..len])
            .map_err(|_| SendError::PayloadTooLarge)?;
        self.cursor = 0;
        Ok(())
    }

    /// Offer up to `max_chunk` bytes to the transport, starting at the cursor
    ///
    /// Advances by however many bytes the transport took. Short writes and
    /// write errors are retried on the next call. Returns the number of
    /// bytes written.
    pub fn drain<P: ComPort>(&mut self, port: &mut P, max_chunk: usize) -> usize {
        if self.is_idle() {
            return 0;
        }

        let chunk = max_chunk.clamp(1, DRAIN_CHUNK_SIZE);
        let end = (self.cursor + chunk).min(self.buf.len());
        let offered = end - self.cursor;

        let written = match port.write(&self.buf[self.cursor..end]) {
            Ok(n) => n.min(offered),
            Err(_) => 0,
        };
        self.cursor += written;

        if self.is_idle() {
            self.buf.clear();
            self.cursor = 0;
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPort;

    #[test]
    fn test_send_encodes_frame() {
        let mut tx = Transmitter::new();
        tx.send(0x41, &[0x42, 0x43]).unwrap();
        assert_eq!(tx.pending(), 6);

        let mut port = MockPort::new();
        assert_eq!(tx.drain(&mut port, 64), 6);
        assert_eq!(port.sent, [0xC0, 0x41, 0x42, 0x43, 0x52, 0xC0]);
        assert!(tx.is_idle());
    }

    #[test]
    fn test_second_send_rejected_until_drained() {
        let mut tx = Transmitter::new();
        let mut port = MockPort::new();
        port.write_budget = Some(3);

        assert_eq!(tx.send(0x01, &[1, 2]), Ok(()));
        assert_eq!(tx.send(0x01, &[4]), Err(SendError::Busy));

        assert_eq!(tx.drain(&mut port, 64), 3);
        assert_eq!(tx.send(0x01, &[4]), Err(SendError::Busy));

        assert_eq!(tx.drain(&mut port, 64), 3);
        assert!(tx.is_idle());
        assert_eq!(tx.send(0x01, &[4]), Ok(()));
    }

    #[test]
    fn test_payload_too_large() {
        let mut tx = Transmitter::new();
        let payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        assert_eq!(tx.send(0x01, &payload), Err(SendError::PayloadTooLarge));
        assert!(tx.is_idle());
    }

    #[test]
    fn test_busy_checked_before_size() {
        let mut tx = Transmitter::new();
        tx.send(0x01, &[]).unwrap();
        let payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        assert_eq!(tx.send(0x01, &payload), Err(SendError::Busy));
    }

    #[test]
    fn test_drain_respects_chunk_size() {
        let mut tx = Transmitter::new();
        let mut port = MockPort::new();
        tx.send(0x02, &[0xAA; 100]).unwrap();
        let total = tx.pending();

        assert_eq!(tx.drain(&mut port, 64), 64);
        assert_eq!(tx.drain(&mut port, 1000), total - 64);
        assert!(tx.is_idle());
        assert_eq!(port.sent.len(), total);
    }

    #[test]
    fn test_zero_byte_write_keeps_cursor() {
        let mut tx = Transmitter::new();
        let mut port = MockPort::new();
        port.write_budget = Some(0);
        tx.send(0x01, &[7]).unwrap();

        assert_eq!(tx.drain(&mut port, 64), 0);
        assert_eq!(tx.pending(), 5);

        port.write_budget = None;
        assert_eq!(tx.drain(&mut port, 64), 5);
        assert_eq!(port.sent, [0xC0, 0x01, 0x07, frame::crc8(&[0x01, 0x07]), 0xC0]);
    }

    #[test]
    fn test_write_error_retried() {
        let mut tx = Transmitter::new();
        let mut port = MockPort::new();
        port.fail_writes = true;
        tx.send(0x01, &[]).unwrap();

        assert_eq!(tx.drain(&mut port, 64), 0);
        assert!(!tx.is_idle());

        port.fail_writes = false;
        assert_eq!(tx.drain(&mut port, 64), 4);
        assert!(tx.is_idle());
    }

    #[test]
    fn test_drain_when_idle_does_not_write() {
        let mut tx = Transmitter::new();
        let mut port = MockPort::new();
        port.fail_writes = true;
        assert_eq!(tx.drain(&mut port, 64), 0);
        assert!(port.sent.is_empty());
    }
}
