use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Result, TransportError};
use crate::link::SerialLink;

type Queue = Arc<Mutex<VecDeque<u8>>>;

/// One end of an in-memory serial line.
///
/// Bytes written to one end of a [`MemoryLink::pair`] become readable on the
/// other, in order, with nothing lost or duplicated. Once the peer end is
/// dropped and the inbound bytes are drained, reads fail with
/// [`TransportError::Closed`].
pub struct MemoryLink {
    inbound: Queue,
    outbound: Queue,
    read_limit: Option<usize>,
}

impl MemoryLink {
    /// Create two connected link ends.
    pub fn pair() -> (Self, Self) {
        let left_to_right: Queue = Arc::default();
        let right_to_left: Queue = Arc::default();
        let left = Self {
            inbound: Arc::clone(&right_to_left),
            outbound: Arc::clone(&left_to_right),
            read_limit: None,
        };
        let right = Self {
            inbound: left_to_right,
            outbound: right_to_left,
            read_limit: None,
        };
        (left, right)
    }

    /// Cap how many bytes a single `read` hands out, to mimic a slow UART.
    pub fn with_read_limit(mut self, limit: usize) -> Self {
        self.read_limit = Some(limit.max(1));
        self
    }

    fn peer_dropped(&self) -> bool {
        // Each queue is shared by exactly two ends while both are alive.
        Arc::strong_count(&self.inbound) == 1
    }
}

fn lock(queue: &Queue) -> MutexGuard<'_, VecDeque<u8>> {
    queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SerialLink for MemoryLink {
    fn name(&self) -> &str {
        "memory"
    }

    fn bytes_available(&mut self) -> Result<usize> {
        let available = lock(&self.inbound).len();
        if available == 0 && self.peer_dropped() {
            return Err(TransportError::Closed);
        }
        Ok(available)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut inbound = lock(&self.inbound);
        if inbound.is_empty() && self.peer_dropped() {
            return Err(TransportError::Closed);
        }

        let mut n = buf.len().min(inbound.len());
        if let Some(limit) = self.read_limit {
            n = n.min(limit);
        }
        for (slot, byte) in buf.iter_mut().zip(inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if Arc::strong_count(&self.outbound) == 1 {
            return Err(TransportError::Closed);
        }
        lock(&self.outbound).extend(data.iter().copied());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for MemoryLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryLink")
            .field("buffered", &lock(&self.inbound).len())
            .field("read_limit", &self.read_limit)
            .finish()
    }
}
