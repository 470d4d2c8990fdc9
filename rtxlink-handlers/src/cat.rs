//! CAT (Computer Aided Transceiver) handler
//!
//! Lets the host query and change radio parameters.
//!
//! Request: `[opcode][param_hi][param_lo][value...]`
//!
//! | Opcode | Meaning | Reply |
//! |--------|---------|-------|
//! | `0x47` GET | read a parameter | `[0x44 DATA][value...]` |
//! | `0x53` SET | write a parameter | `[0x41 ACK][status]` |
//! | `0x50` PEEK | raw memory read | `[0x41 ACK][EBADRQC]` |
//!
//! Parameter identifiers are two ASCII characters, sent big-endian.
//! Frequencies are `u32` hertz, little-endian. Every request gets exactly
//! one reply; any failure is reported as an ACK carrying the error status.

use heapless::Vec;
use rtxlink_core::{Engine, ProtocolHandler, RegistryError, Transmitter};
use rtxlink_hal::ComPort;
use rtxlink_protocol::{ProtocolId, MAX_PAYLOAD_SIZE};

use crate::Status;

// Opcodes
const OP_GET: u8 = 0x47;
const OP_SET: u8 = 0x53;
const OP_PEEK: u8 = 0x50;
const OP_ACK: u8 = 0x41;
const OP_DATA: u8 = 0x44;

// GET parameters
const PARAM_NAME: u16 = 0x494E; // "IN"
const PARAM_RX_FREQ: u16 = 0x5246; // "RF"
const PARAM_TX_FREQ: u16 = 0x5446; // "TF"

// SET parameters
const PARAM_REBOOT: u16 = 0x5043; // "PC"
const PARAM_FILE_TRANSFER: u16 = 0x4654; // "FT"
const PARAM_FREQUENCY: u16 = 0x5346; // "SF"

/// Longest radio name returned by GET
pub const NAME_MAX_LEN: usize = 16;

/// Radio state the CAT handler reads and controls
pub trait RadioState {
    /// Radio model name
    fn name(&self) -> &str;

    /// Receive frequency of the current channel in Hz
    fn rx_frequency(&self) -> u32;

    /// Transmit frequency of the current channel in Hz
    fn tx_frequency(&self) -> u32;

    /// Tune the current channel
    fn set_frequency(&mut self, freq_hz: u32);

    /// Ask the radio to reboot once the reply has gone out
    fn request_reboot(&mut self);

    /// Switch the radio into file transfer mode
    fn enter_file_transfer(&mut self);
}

/// CAT protocol handler
pub struct CatHandler<R> {
    radio: R,
    replies_dropped: u32,
}

impl<R: RadioState> CatHandler<R> {
    /// Create a handler backed by `radio`
    pub const fn new(radio: R) -> Self {
        Self {
            radio,
            replies_dropped: 0,
        }
    }

    /// Borrow the radio state
    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// Mutably borrow the radio state
    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Replies refused by a busy transmit path
    pub fn replies_dropped(&self) -> u32 {
        self.replies_dropped
    }

    fn get(&self, args: &[u8], value: &mut Vec<u8, MAX_PAYLOAD_SIZE>) -> Result<(), Status> {
        let (param, rest) = split_param(args)?;
        if !rest.is_empty() {
            return Err(Status::TooBig);
        }

        let bytes = match param {
            PARAM_NAME => {
                let name = self.radio.name().as_bytes();
                value
                    .extend_from_slice(&name[..name.len().min(NAME_MAX_LEN)])
                    .map_err(|_| Status::TooBig)?;
                return Ok(());
            }
            PARAM_RX_FREQ => self.radio.rx_frequency().to_le_bytes(),
            PARAM_TX_FREQ => self.radio.tx_frequency().to_le_bytes(),
            _ => return Err(Status::BadRequest),
        };
        value.extend_from_slice(&bytes).map_err(|_| Status::TooBig)
    }

    fn set(&mut self, args: &[u8]) -> Status {
        let (param, value) = match split_param(args) {
            Ok(split) => split,
            Err(status) => return status,
        };

        match (param, value) {
            (PARAM_REBOOT, []) => {
                self.radio.request_reboot();
                Status::Ok
            }
            (PARAM_FILE_TRANSFER, []) => {
                self.radio.enter_file_transfer();
                Status::Ok
            }
            (PARAM_FREQUENCY, &[b0, b1, b2, b3]) => {
                self.radio.set_frequency(u32::from_le_bytes([b0, b1, b2, b3]));
                Status::Ok
            }
            (PARAM_REBOOT | PARAM_FILE_TRANSFER, _) => Status::TooBig,
            (PARAM_FREQUENCY, v) if v.len() > 4 => Status::TooBig,
            _ => Status::BadRequest,
        }
    }

    fn ack(&mut self, tx: &mut Transmitter, status: Status) {
        self.reply(tx, &[OP_ACK, status.into()]);
    }

    fn reply(&mut self, tx: &mut Transmitter, payload: &[u8]) {
        if tx.send(ProtocolId::Cat.into(), payload).is_err() {
            self.replies_dropped = self.replies_dropped.wrapping_add(1);
        }
    }
}

impl<R: RadioState> ProtocolHandler for CatHandler<R> {
    fn handle(&mut self, payload: &[u8], tx: &mut Transmitter) {
        let Some((&opcode, args)) = payload.split_first() else {
            self.ack(tx, Status::BadRequestCode);
            return;
        };

        match opcode {
            OP_GET => {
                let mut reply: Vec<u8, MAX_PAYLOAD_SIZE> = Vec::new();
                let _ = reply.push(OP_DATA);
                match self.get(args, &mut reply) {
                    Ok(()) => self.reply(tx, &reply),
                    Err(status) => self.ack(tx, status),
                }
            }
            OP_SET => {
                let status = self.set(args);
                self.ack(tx, status);
            }
            // No raw memory access over the link
            OP_PEEK => self.ack(tx, Status::BadRequestCode),
            _ => self.ack(tx, Status::BadRequestCode),
        }
    }
}

/// Register `handler` for the CAT protocol on `engine`
pub fn init<'h, R, P, const N: usize>(
    handler: &'h mut CatHandler<R>,
    engine: &mut Engine<'h, P, N>,
) -> Result<(), RegistryError>
where
    R: RadioState,
    P: ComPort,
{
    engine.register(ProtocolId::Cat.into(), handler)
}

/// Remove the CAT handler from `engine`
pub fn terminate<P: ComPort, const N: usize>(engine: &mut Engine<'_, P, N>) {
    let _ = engine.unregister(ProtocolId::Cat.into());
}

fn split_param(args: &[u8]) -> Result<(u16, &[u8]), Status> {
    match args {
        [hi, lo, rest @ ..] => Ok((u16::from_be_bytes([*hi, *lo]), rest)),
        _ => Err(Status::BadRequest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{parse_frame, take_reply, TestPort};
    use rtxlink_core::{CycleReport, LinkConfig};

    const CAT: u8 = 0x01;

    struct TestRadio {
        name: &'static str,
        rx_freq: u32,
        tx_freq: u32,
        reboot_requested: bool,
        file_transfer: bool,
    }

    impl Default for TestRadio {
        fn default() -> Self {
            Self {
                name: "MD-380",
                rx_freq: 430_100_000,
                tx_freq: 438_700_000,
                reboot_requested: false,
                file_transfer: false,
            }
        }
    }

    impl RadioState for TestRadio {
        fn name(&self) -> &str {
            self.name
        }

        fn rx_frequency(&self) -> u32 {
            self.rx_freq
        }

        fn tx_frequency(&self) -> u32 {
            self.tx_freq
        }

        fn set_frequency(&mut self, freq_hz: u32) {
            self.rx_freq = freq_hz;
            self.tx_freq = freq_hz;
        }

        fn request_reboot(&mut self) {
            self.reboot_requested = true;
        }

        fn enter_file_transfer(&mut self) {
            self.file_transfer = true;
        }
    }

    fn request(cat: &mut CatHandler<TestRadio>, payload: &[u8]) -> Vec<u8, 128> {
        let mut tx = Transmitter::new();
        cat.handle(payload, &mut tx);
        let (id, reply) = take_reply(&mut tx).unwrap();
        assert_eq!(id, CAT);
        Vec::from_slice(&reply).unwrap()
    }

    #[test]
    fn test_get_name() {
        let mut cat = CatHandler::new(TestRadio::default());
        assert_eq!(&request(&mut cat, b"GIN")[..], b"DMD-380");
    }

    #[test]
    fn test_get_name_truncated() {
        let mut cat = CatHandler::new(TestRadio {
            name: "A very long radio model name",
            ..TestRadio::default()
        });
        let reply = request(&mut cat, b"GIN");
        assert_eq!(reply.len(), 1 + NAME_MAX_LEN);
        assert_eq!(&reply[1..], b"A very long radi");
    }

    #[test]
    fn test_get_frequencies() {
        let mut cat = CatHandler::new(TestRadio::default());

        let reply = request(&mut cat, b"GRF");
        assert_eq!(reply[0], OP_DATA);
        assert_eq!(&reply[1..], &430_100_000u32.to_le_bytes());

        let reply = request(&mut cat, b"GTF");
        assert_eq!(&reply[1..], &438_700_000u32.to_le_bytes());
    }

    #[test]
    fn test_get_errors() {
        let mut cat = CatHandler::new(TestRadio::default());
        assert_eq!(&request(&mut cat, b"GXX")[..], &[OP_ACK, 53]);
        assert_eq!(&request(&mut cat, b"GI")[..], &[OP_ACK, 53]);
        assert_eq!(&request(&mut cat, b"G")[..], &[OP_ACK, 53]);
        assert_eq!(&request(&mut cat, b"GRFX")[..], &[OP_ACK, 7]);
    }

    #[test]
    fn test_set_frequency() {
        let mut cat = CatHandler::new(TestRadio::default());
        let mut payload = [0u8; 7];
        payload[..3].copy_from_slice(b"SSF");
        payload[3..].copy_from_slice(&145_500_000u32.to_le_bytes());

        assert_eq!(&request(&mut cat, &payload)[..], &[OP_ACK, 0]);
        assert_eq!(cat.radio().rx_frequency(), 145_500_000);
        assert_eq!(cat.radio().tx_frequency(), 145_500_000);
    }

    #[test]
    fn test_set_frequency_bad_length() {
        let mut cat = CatHandler::new(TestRadio::default());
        assert_eq!(&request(&mut cat, b"SSF\x01\x02")[..], &[OP_ACK, 53]);
        assert_eq!(&request(&mut cat, b"SSF\x01\x02\x03\x04\x05")[..], &[OP_ACK, 7]);
        assert_eq!(cat.radio().rx_frequency(), 430_100_000);
    }

    #[test]
    fn test_set_modes() {
        let mut cat = CatHandler::new(TestRadio::default());
        assert_eq!(&request(&mut cat, b"SPC")[..], &[OP_ACK, 0]);
        assert!(cat.radio().reboot_requested);

        assert_eq!(&request(&mut cat, b"SFT")[..], &[OP_ACK, 0]);
        assert!(cat.radio().file_transfer);

        assert_eq!(&request(&mut cat, b"SZZ")[..], &[OP_ACK, 53]);
    }

    #[test]
    fn test_unsupported_opcodes() {
        let mut cat = CatHandler::new(TestRadio::default());
        assert_eq!(&request(&mut cat, b"P\x04\x00\x00\x00\x20")[..], &[OP_ACK, 56]);
        assert_eq!(&request(&mut cat, b"Q")[..], &[OP_ACK, 56]);
        assert_eq!(&request(&mut cat, b"")[..], &[OP_ACK, 56]);
    }

    #[test]
    fn test_busy_reply_counted() {
        let mut cat = CatHandler::new(TestRadio::default());
        let mut tx = Transmitter::new();
        tx.send(0x00, b"log line").unwrap();

        cat.handle(b"GIN", &mut tx);
        assert_eq!(cat.replies_dropped(), 1);

        // Only the frame queued earlier goes out
        let (id, payload) = take_reply(&mut tx).unwrap();
        assert_eq!(id, 0x00);
        assert_eq!(&payload[..], b"log line");
    }

    #[test]
    fn test_lifecycle_on_engine() {
        let mut cat = CatHandler::new(TestRadio::default());
        let mut engine: Engine<'_, TestPort> =
            Engine::new(TestPort::default(), LinkConfig::default());

        init(&mut cat, &mut engine).unwrap();
        assert!(engine.is_registered(CAT));

        engine.port_mut().feed_frame(CAT, b"GRF");
        assert_eq!(engine.run_cycle(), CycleReport::Dispatched(CAT));

        let (id, reply) = parse_frame(&engine.port().sent);
        assert_eq!(id, CAT);
        assert_eq!(reply[0], OP_DATA);
        assert_eq!(&reply[1..], &430_100_000u32.to_le_bytes());

        terminate(&mut engine);
        assert!(!engine.is_registered(CAT));
    }

    #[test]
    fn test_reply_not_lost_to_console_output() {
        let mut cat = CatHandler::new(TestRadio::default());
        let sent = {
            let mut engine: Engine<'_, TestPort> =
                Engine::new(TestPort::default(), LinkConfig::default());
            init(&mut cat, &mut engine).unwrap();

            engine.port_mut().feed_frame(CAT, b"GRF");
            assert_eq!(engine.run_cycle(), CycleReport::Dispatched(CAT));
            assert_eq!(engine.send_when_idle(0x00, || Some(b"log")), Some(Ok(())));
            engine.run_cycle();
            engine.port().sent.clone()
        };
        assert_eq!(cat.replies_dropped(), 0);

        // The reply is everything up to its closing END
        let split = sent[1..].iter().position(|&b| b == 0xC0).unwrap() + 2;
        let (id, reply) = parse_frame(&sent[..split]);
        assert_eq!(id, CAT);
        assert_eq!(reply[0], OP_DATA);
        assert_eq!(&reply[1..], &430_100_000u32.to_le_bytes());

        let (id, line) = parse_frame(&sent[split..]);
        assert_eq!(id, 0x00);
        assert_eq!(&line[..], b"log");
    }
}
