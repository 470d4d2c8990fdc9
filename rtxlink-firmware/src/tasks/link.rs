//! Host link task
//!
//! Owns the rtxlink engine and drives it at a fixed cadence. Each tick it
//! runs one engine cycle, then forwards at most one queued console line if
//! no reply is still being written.

use defmt::*;
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embassy_time::{Duration, Ticker};

use rtxlink_core::{CycleReport, Engine, LinkConfig};
use rtxlink_hal::SplitPort;
use rtxlink_handlers::{cat, fmp, CatHandler, FmpHandler};
use rtxlink_protocol::ProtocolId;

use crate::channels::STDIO_CHANNEL;
use crate::radio::{Memories, Radio};

/// Engine cycle period in milliseconds
pub const CYCLE_INTERVAL_MS: u64 = 1;

/// Cycles between statistics reports
const STATS_INTERVAL_CYCLES: u32 = 10_000;

/// Transport the engine runs on
pub type LinkPort = SplitPort<BufferedUartRx, BufferedUartTx>;

/// Link task - runs the protocol engine forever
#[embassy_executor::task]
pub async fn link_task(port: LinkPort, config: LinkConfig) {
    info!("Link task started");

    let mut cat_handler = CatHandler::new(Radio::new());
    let mut fmp_handler = FmpHandler::new(Memories);

    let mut engine: Engine<'_, LinkPort> = Engine::new(port, config);
    if let Err(e) = cat::init(&mut cat_handler, &mut engine) {
        error!("CAT handler registration failed: {:?}", e);
    }
    if let Err(e) = fmp::init(&mut fmp_handler, &mut engine) {
        error!("FMP handler registration failed: {:?}", e);
    }

    let mut ticker = Ticker::every(Duration::from_millis(CYCLE_INTERVAL_MS));
    let mut cycles: u32 = 0;

    loop {
        ticker.next().await;

        match engine.run_cycle() {
            CycleReport::Dispatched(id) => {
                debug!("Frame dispatched to protocol {}", id);
            }
            CycleReport::Dropped(reason) => {
                trace!("Frame dropped: {:?}", reason);
            }
            CycleReport::Idle | CycleReport::Pending => {}
        }

        // Console output only takes a transmitter left free by the replies
        if let Some(Err(e)) =
            engine.send_when_idle(ProtocolId::Stdio.into(), || STDIO_CHANNEL.try_receive().ok())
        {
            warn!("Stdio line dropped: {:?}", e);
        }

        cycles = cycles.wrapping_add(1);
        if cycles % STATS_INTERVAL_CYCLES == 0 {
            let stats = engine.stats();
            debug!(
                "Link: {} dispatched, {} dropped, {} bytes sent",
                stats.frames_dispatched,
                stats.frames_dropped(),
                stats.bytes_sent
            );
        }
    }
}
