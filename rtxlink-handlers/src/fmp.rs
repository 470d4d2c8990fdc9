//! FMP (Flash Memory management Protocol) handler
//!
//! Request: `[opcode][params...]`
//! Reply:   `[opcode][status][nparams][param...]`
//!
//! Each reply parameter is length-prefixed: `[len][bytes...]`. Only memory
//! discovery is served; any other opcode gets an ACK with `EBADRQC`.

use heapless::Vec;
use rtxlink_core::{Engine, ProtocolHandler, RegistryError, Transmitter};
use rtxlink_hal::ComPort;
use rtxlink_protocol::{ProtocolId, MAX_PAYLOAD_SIZE};

use crate::Status;

// Opcodes
const OP_ACK: u8 = 0x00;
const OP_MEMINFO: u8 = 0x01;

/// Bytes reserved for a device name, NUL padded
pub const MEMINFO_NAME_LEN: usize = 22;

/// One MEMINFO parameter: `u32` size (LE), name, index
const MEMINFO_ENTRY_LEN: usize = 4 + MEMINFO_NAME_LEN + 1;

/// Devices that fit in a single MEMINFO reply
pub const MAX_MEMINFO_ENTRIES: usize = (MAX_PAYLOAD_SIZE - 3) / (MEMINFO_ENTRY_LEN + 1);

/// Description of one memory device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryInfo<'a> {
    /// Capacity in bytes
    pub size: u32,
    /// Human-readable name, truncated to [`MEMINFO_NAME_LEN`]
    pub name: &'a str,
    /// Device index used by later FMP requests
    pub index: u8,
}

/// Memory devices exposed to the host
pub trait MemoryDevices {
    /// Number of devices
    fn count(&self) -> usize;

    /// Device at position `index`, if any
    fn info(&self, index: usize) -> Option<MemoryInfo<'_>>;
}

/// FMP protocol handler
pub struct FmpHandler<M> {
    devices: M,
    replies_dropped: u32,
}

impl<M: MemoryDevices> FmpHandler<M> {
    /// Create a handler listing `devices`
    pub const fn new(devices: M) -> Self {
        Self {
            devices,
            replies_dropped: 0,
        }
    }

    /// Replies refused by a busy transmit path
    pub fn replies_dropped(&self) -> u32 {
        self.replies_dropped
    }

    fn meminfo(&mut self, tx: &mut Transmitter) {
        let mut reply: Vec<u8, MAX_PAYLOAD_SIZE> = Vec::new();
        let _ = reply.extend_from_slice(&[OP_MEMINFO, Status::Ok.into(), 0]);

        let mut nparams = 0u8;
        for index in 0..self.devices.count().min(MAX_MEMINFO_ENTRIES) {
            let Some(info) = self.devices.info(index) else {
                continue;
            };
            if !push_entry(&mut reply, &info) {
                break;
            }
            nparams += 1;
        }
        reply[2] = nparams;

        self.reply(tx, &reply);
    }

    fn ack(&mut self, tx: &mut Transmitter, status: Status) {
        self.reply(tx, &[OP_ACK, status.into(), 0]);
    }

    fn reply(&mut self, tx: &mut Transmitter, payload: &[u8]) {
        if tx.send(ProtocolId::Fmp.into(), payload).is_err() {
            self.replies_dropped = self.replies_dropped.wrapping_add(1);
        }
    }
}

impl<M: MemoryDevices> ProtocolHandler for FmpHandler<M> {
    fn handle(&mut self, payload: &[u8], tx: &mut Transmitter) {
        match payload.first() {
            Some(&OP_MEMINFO) => self.meminfo(tx),
            _ => self.ack(tx, Status::BadRequestCode),
        }
    }
}

/// Register `handler` for the FMP protocol on `engine`
pub fn init<'h, M, P, const N: usize>(
    handler: &'h mut FmpHandler<M>,
    engine: &mut Engine<'h, P, N>,
) -> Result<(), RegistryError>
where
    M: MemoryDevices,
    P: ComPort,
{
    engine.register(ProtocolId::Fmp.into(), handler)
}

/// Remove the FMP handler from `engine`
pub fn terminate<P: ComPort, const N: usize>(engine: &mut Engine<'_, P, N>) {
    let _ = engine.unregister(ProtocolId::Fmp.into());
}

/// Append one length-prefixed MEMINFO parameter; false if it does not fit
fn push_entry(reply: &mut Vec<u8, MAX_PAYLOAD_SIZE>, info: &MemoryInfo<'_>) -> bool {
    if reply.capacity() - reply.len() < MEMINFO_ENTRY_LEN + 1 {
        return false;
    }

    let mut entry = [0u8; MEMINFO_ENTRY_LEN];
    entry[..4].copy_from_slice(&info.size.to_le_bytes());
    let name = info.name.as_bytes();
    let name_len = name.len().min(MEMINFO_NAME_LEN);
    entry[4..4 + name_len].copy_from_slice(&name[..name_len]);
    entry[MEMINFO_ENTRY_LEN - 1] = info.index;

    reply.push(MEMINFO_ENTRY_LEN as u8).is_ok() && reply.extend_from_slice(&entry).is_ok()
}
