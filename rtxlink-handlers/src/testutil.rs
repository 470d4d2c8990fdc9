//! Helpers for exercising handlers directly and through an engine

use std::collections::VecDeque;

use rtxlink_core::Transmitter;
use rtxlink_hal::ComPort;
use rtxlink_protocol::frame;
use rtxlink_protocol::slip::decode_block;
use rtxlink_protocol::{Frame, MAX_ENCODED_FRAME_SIZE, MAX_FRAME_SIZE};

/// Transport with a scripted input stream that accepts every write
#[derive(Default)]
pub struct TestPort {
    input: VecDeque<u8>,
    pub sent: Vec<u8>,
}

impl TestPort {
    /// Queue an encoded request frame for the engine to read
    pub fn feed_frame(&mut self, id: u8, payload: &[u8]) {
        let mut buf = [0u8; MAX_ENCODED_FRAME_SIZE];
        let len = frame::encode(id, payload, &mut buf).unwrap();
        self.input.extend(&buf[..len]);
    }
}

impl ComPort for TestPort {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        let n = buf.len().min(self.input.len());
        for (slot, byte) in buf.iter_mut().zip(self.input.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        self.sent.extend_from_slice(data);
        Ok(data.len())
    }
}

/// Decode one wire frame into `(id, payload)`
pub fn parse_frame(wire: &[u8]) -> (u8, Vec<u8>) {
    // Skip the opening END
    let mut decoded = [0u8; MAX_FRAME_SIZE];
    let len = decode_block(&wire[1..], &mut decoded).unwrap();
    let frame = Frame::verify(&decoded[..len]).unwrap();
    (frame.protocol_id, frame.payload.to_vec())
}

/// Drain `tx` completely and decode the queued frame
///
/// Returns `None` if nothing was queued.
pub fn take_reply(tx: &mut Transmitter) -> Option<(u8, Vec<u8>)> {
    let mut port = TestPort::default();
    while !tx.is_idle() {
        tx.drain(&mut port, 64);
    }
    if port.sent.is_empty() {
        None
    } else {
        Some(parse_frame(&port.sent))
    }
}
