//! Well-known protocol identifiers carried in the first frame byte

/// Protocols multiplexed over the link
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolId {
    /// Redirected standard I/O (log text, console)
    Stdio,
    /// Computer Aided Transceiver: radio control commands
    Cat,
    /// Flash Memory management Protocol
    Fmp,
    /// XMODEM file transfer
    Xmodem,
}

/// Number of well-known protocols (one past the highest identifier)
pub const PROTOCOL_COUNT: usize = 4;

// Wire format values
const PROTO_STDIO: u8 = 0x00;
const PROTO_CAT: u8 = 0x01;
const PROTO_FMP: u8 = 0x02;
const PROTO_XMODEM: u8 = 0x03;

impl ProtocolId {
    /// Parse an identifier from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            PROTO_STDIO => Some(ProtocolId::Stdio),
            PROTO_CAT => Some(ProtocolId::Cat),
            PROTO_FMP => Some(ProtocolId::Fmp),
            PROTO_XMODEM => Some(ProtocolId::Xmodem),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            ProtocolId::Stdio => PROTO_STDIO,
            ProtocolId::Cat => PROTO_CAT,
            ProtocolId::Fmp => PROTO_FMP,
            ProtocolId::Xmodem => PROTO_XMODEM,
        }
    }
}

impl From<ProtocolId> for u8 {
    fn from(id: ProtocolId) -> u8 {
        id.to_byte()
    }
}
