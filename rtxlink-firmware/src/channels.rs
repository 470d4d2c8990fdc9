//! Inter-task communication channels
//!
//! Other tasks never touch the link engine directly. Outgoing console text
//! is queued here and handed to the engine by the link task, which
//! serialises every `send` onto the single transmit buffer.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use heapless::Vec;

use rtxlink_protocol::MAX_PAYLOAD_SIZE;

/// Channel capacity for outgoing console lines
const STDIO_CHANNEL_SIZE: usize = 4;

/// One console message, sent as a single Stdio frame
pub type StdioLine = Vec<u8, MAX_PAYLOAD_SIZE>;

/// Console text waiting to go out on the Stdio protocol
pub static STDIO_CHANNEL: Channel<CriticalSectionRawMutex, StdioLine, STDIO_CHANNEL_SIZE> =
    Channel::new();

/// Signal that the host asked for a reboot (set by the CAT handler)
pub static REBOOT_REQUEST: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Queue console text for the host
///
/// Text longer than one frame is truncated. Returns false if the channel
/// is full and the text was dropped.
pub fn print(text: &[u8]) -> bool {
    let len = text.len().min(MAX_PAYLOAD_SIZE);
    let Ok(line) = StdioLine::from_slice(&text[..len]) else {
        return false;
    };
    STDIO_CHANNEL.try_send(line).is_ok()
}
