//! Frame layout and integrity checking.
//!
//! Decoded frame format:
//! - PROTOCOL (1 byte): identifier of the protocol the payload belongs to
//! - PAYLOAD (0-126 bytes): protocol-specific data
//! - CRC (1 byte): CRC-8 of PROTOCOL and all PAYLOAD bytes
//!
//! On the wire the whole decoded frame is SLIP-encoded and wrapped in END
//! markers (see [`crate::slip`]).

use crate::slip;

/// Maximum decoded frame size (PROTOCOL + PAYLOAD + CRC)
pub const MAX_FRAME_SIZE: usize = 128;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = MAX_FRAME_SIZE - 2;

/// Maximum size of one frame on the wire, including both END markers
pub const MAX_ENCODED_FRAME_SIZE: usize = slip::max_encoded_len(MAX_FRAME_SIZE);

/// CRC-8 generator polynomial (x^8 + x^2 + x + 1)
const CRC8_POLY: u8 = 0x07;

const CRC8_TABLE: [u8; 256] = crc8_table();

const fn crc8_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC8_POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// CRC-8 (SMBus variant: poly 0x07, init 0x00, no reflection, no xor-out)
pub fn crc8(data: &[u8]) -> u8 {
    data.iter()
        .fold(0u8, |crc, &byte| CRC8_TABLE[(crc ^ byte) as usize])
}

/// Errors that can occur during frame checking or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Frame too short to hold a protocol identifier and a CRC
    TooShort,
    /// Checksum mismatch
    InvalidChecksum,
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A verified frame, borrowed from the receive buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame<'a> {
    /// Protocol identifier
    pub protocol_id: u8,
    /// Payload data
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Check a decoded frame and split it into identifier and payload
    ///
    /// The last byte must equal the CRC-8 of everything before it.
    pub fn verify(decoded: &'a [u8]) -> Result<Self, FrameError> {
        let (&checksum, body) = decoded.split_last().ok_or(FrameError::TooShort)?;
        let (&protocol_id, payload) = body.split_first().ok_or(FrameError::TooShort)?;

        if crc8(body) != checksum {
            return Err(FrameError::InvalidChecksum);
        }

        Ok(Self {
            protocol_id,
            payload,
        })
    }

    /// Encode this frame for the wire, both END markers included
    ///
    /// Returns the number of bytes written.
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        encode(self.protocol_id, self.payload, buffer)
    }
}

/// Assemble `[protocol_id][payload][crc]` and SLIP-encode it into `buffer`
///
/// Returns the number of bytes written. A buffer of
/// [`MAX_ENCODED_FRAME_SIZE`] always suffices.
pub fn encode(protocol_id: u8, payload: &[u8], buffer: &mut [u8]) -> Result<usize, FrameError> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(FrameError::PayloadTooLarge);
    }

    let frame_len = payload.len() + 2;
    let mut raw = [0u8; MAX_FRAME_SIZE];
    raw[0] = protocol_id;
    raw[1..frame_len - 1].copy_from_slice(payload);
    raw[frame_len - 1] = crc8(&raw[..frame_len - 1]);

    slip::encode(&raw[..frame_len], buffer, true, true).map_err(|_| FrameError::BufferTooSmall)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slip::{decode_block, END, ESC, ESC_END};
    use proptest::prelude::*;

    #[test]
    fn test_crc8_check_value() {
        assert_eq!(crc8(b"123456789"), 0xF4);
        assert_eq!(crc8(&[]), 0x00);
    }

    #[test]
    fn test_crc8_known_frame() {
        assert_eq!(crc8(&[0x41, 0x42, 0x43]), 0x52);
    }

    #[test]
    fn test_verify_valid() {
        let frame = Frame::verify(&[0x41, 0x42, 0x43, 0x52]).unwrap();
        assert_eq!(frame.protocol_id, 0x41);
        assert_eq!(frame.payload, &[0x42, 0x43]);
    }

    #[test]
    fn test_verify_empty_payload() {
        let data = [0x01, crc8(&[0x01])];
        let frame = Frame::verify(&data).unwrap();
        assert_eq!(frame.protocol_id, 0x01);
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn test_verify_invalid_checksum() {
        assert_eq!(
            Frame::verify(&[0x41, 0x42, 0x43, 0x53]),
            Err(FrameError::InvalidChecksum)
        );
    }

    #[test]
    fn test_verify_too_short() {
        assert_eq!(Frame::verify(&[]), Err(FrameError::TooShort));
        assert_eq!(Frame::verify(&[0x41]), Err(FrameError::TooShort));
    }

    #[test]
    fn test_encode_wire_bytes() {
        let mut buffer = [0u8; MAX_ENCODED_FRAME_SIZE];
        let len = encode(0x41, &[0x42, 0x43], &mut buffer).unwrap();
        assert_eq!(&buffer[..len], &[END, 0x41, 0x42, 0x43, 0x52, END]);
    }

    #[test]
    fn test_encode_escapes_payload() {
        let mut buffer = [0u8; MAX_ENCODED_FRAME_SIZE];
        let len = encode(0x01, &[END], &mut buffer).unwrap();
        assert_eq!(&buffer[..4], &[END, 0x01, ESC, ESC_END]);
        assert_eq!(buffer[len - 1], END);
    }

    #[test]
    fn test_encode_max_payload_fits() {
        let payload = [ESC; MAX_PAYLOAD_SIZE];
        let mut buffer = [0u8; MAX_ENCODED_FRAME_SIZE];
        assert!(encode(0x02, &payload, &mut buffer).is_ok());
    }

    #[test]
    fn test_payload_too_large() {
        let payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        let mut buffer = [0u8; 512];
        assert_eq!(
            encode(0x02, &payload, &mut buffer),
            Err(FrameError::PayloadTooLarge)
        );
    }

    #[test]
    fn test_frame_encode_then_verify() {
        let original = Frame {
            protocol_id: 0x02,
            payload: &[0x01, 0xC0, 0xDB],
        };
        let mut wire = [0u8; MAX_ENCODED_FRAME_SIZE];
        let len = original.encode(&mut wire).unwrap();

        let mut decoded = [0u8; MAX_FRAME_SIZE];
        let n = decode_block(&wire[1..len], &mut decoded).unwrap();
        assert_eq!(Frame::verify(&decoded[..n]), Ok(original));
    }

    proptest! {
        #[test]
        fn prop_single_bit_flip_detected(
            payload in proptest::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD_SIZE),
            id in any::<u8>(),
            bit in any::<proptest::sample::Index>(),
        ) {
            let mut raw = [0u8; MAX_FRAME_SIZE];
            let len = payload.len() + 2;
            raw[0] = id;
            raw[1..len - 1].copy_from_slice(&payload);
            raw[len - 1] = crc8(&raw[..len - 1]);

            let bit = bit.index(len * 8);
            raw[bit / 8] ^= 1 << (bit % 8);

            prop_assert_eq!(Frame::verify(&raw[..len]), Err(FrameError::InvalidChecksum));
        }
    }
}
