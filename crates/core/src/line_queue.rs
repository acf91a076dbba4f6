//! Outbound line queue between the host's logging hook and the IPC writer
//!
//! Producers push from any thread; the single writer drains everything that
//! is queued in one go so bursts end up in one flush. Once closed, the queue
//! discards its contents and rejects further lines.

use parking_lot::Mutex;
use std::collections::VecDeque;

/// Thread-safe FIFO of wire lines
#[derive(Debug, Default)]
pub struct LineQueue {
    inner: Mutex<QueueInner>,
}

#[derive(Debug, Default)]
struct QueueInner {
    lines: VecDeque<String>,
    closed: bool,
}

impl LineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a line. Returns false if the queue was already closed.
    pub fn push(&self, line: String) -> bool {
        let mut inner = self.inner.lock();
        if inner.closed {
            return false;
        }
        inner.lines.push_back(line);
        true
    }

    /// Take every queued line, oldest first
    pub fn drain(&self) -> Vec<String> {
        self.inner.lock().lines.drain(..).collect()
    }

    /// Close the queue and discard what is left in it.
    /// Returns the number of discarded lines. Closing twice is harmless.
    pub fn close(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.closed = true;
        let discarded = inner.lines.len();
        inner.lines.clear();
        inner.lines.shrink_to_fit();
        discarded
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
