//! Scripted transport for engine tests

use std::collections::VecDeque;

use rtxlink_hal::ComPort;

/// Transport that replays queued RX chunks and records TX bytes
#[derive(Default)]
pub struct MockPort {
    chunks: VecDeque<Vec<u8>>,
    pub sent: Vec<u8>,
    /// Bytes accepted per write call; `None` accepts everything
    pub write_budget: Option<usize>,
    pub reads: usize,
    pub fail_writes: bool,
}

impl MockPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one chunk, delivered by a single read
    pub fn push_chunk(&mut self, chunk: &[u8]) {
        self.chunks.push_back(chunk.to_vec());
    }
}

impl ComPort for MockPort {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        self.reads += 1;
        let Some(mut chunk) = self.chunks.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            chunk.drain(..n);
            self.chunks.push_front(chunk);
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        if self.fail_writes {
            return Err(());
        }
        let n = self.write_budget.map_or(data.len(), |b| b.min(data.len()));
        self.sent.extend_from_slice(&data[..n]);
        Ok(n)
    }
}
