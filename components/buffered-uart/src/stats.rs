//! Port counters
//!
//! Counters are observability only: the data path behaves the same whether
//! anyone reads them or not.

use core::cell::Cell;

use critical_section::{CriticalSection, Mutex};

/// Point-in-time copy of the port counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Bytes handed to the transmit data register
    pub transmitted: u32,
    /// Bytes accepted into the inbound queue
    pub received: u32,
    /// Received frames discarded because of error flags
    pub dropped_frames: u32,
    /// Unread inbound bytes lost to overwrite-on-full
    pub overwritten: u32,
    /// Times the transmit interrupt found the queue empty
    pub stalls: u32,
    /// Times foreground code restarted a stalled transmitter
    pub resumes: u32,
}

// Plain load/modify/store under a critical section; no CAS needed.
pub(crate) struct SerialStats {
    inner: Mutex<Cell<StatsSnapshot>>,
}

impl SerialStats {
    pub(crate) const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(StatsSnapshot {
                transmitted: 0,
                received: 0,
                dropped_frames: 0,
                overwritten: 0,
                stalls: 0,
                resumes: 0,
            })),
        }
    }

    /// Update counters inside an already-held critical section
    pub(crate) fn record(&self, cs: CriticalSection<'_>, update: impl FnOnce(&mut StatsSnapshot)) {
        let cell = self.inner.borrow(cs);
        let mut stats = cell.get();
        update(&mut stats);
        cell.set(stats);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        critical_section::with(|cs| self.inner.borrow(cs).get())
    }

    pub(crate) fn reset(&self) {
        critical_section::with(|cs| self.inner.borrow(cs).set(StatsSnapshot::default()));
    }
}
