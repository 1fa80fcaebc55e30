use std::collections::VecDeque;

use serde::Serialize;
use tokio::sync::broadcast;

use buildlight_core::TickOutcome;
use buildlight_core::time::timestamp_now;

/// Default maximum number of outcomes stored before oldest are evicted.
const DEFAULT_MAX_STORED_SIGNALS: usize = 100;

/// Default broadcast channel capacity for outcome fan-out.
const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// A tick outcome as kept by the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalRecord {
    pub id: String,
    pub received_at: String,
    pub outcome: TickOutcome,
}

/// Aggregate statistics about the signal store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalStoreStats {
    pub total_stored: usize,
    pub signals: usize,
    pub errors: usize,
    /// Ticks that had nothing to show. These are counted, not stored.
    pub idle_ticks: u64,
}

/// In-memory, bounded store of tick outcomes with broadcast fan-out.
pub struct SignalStore {
    records: VecDeque<SignalRecord>,
    broadcast_tx: broadcast::Sender<SignalRecord>,
    max_stored_signals: usize,
    idle_ticks: u64,
}

impl Default for SignalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_STORED_SIGNALS, DEFAULT_BROADCAST_CAPACITY)
    }

    pub fn with_capacity(max_stored_signals: usize, broadcast_capacity: usize) -> Self {
        let (broadcast_tx, _) = broadcast::channel(broadcast_capacity);
        Self {
            records: VecDeque::new(),
            broadcast_tx,
            max_stored_signals,
            idle_ticks: 0,
        }
    }

    /// Record a tick outcome. Idle ticks only bump a counter so the last
    /// visible signal stays current. Returns the stored record otherwise.
    pub fn record(&mut self, outcome: TickOutcome) -> Option<SignalRecord> {
        if outcome.is_idle() {
            self.idle_ticks += 1;
            return None;
        }

        let record = SignalRecord {
            id: uuid::Uuid::new_v4().to_string(),
            received_at: timestamp_now(),
            outcome,
        };
        let _ = self.broadcast_tx.send(record.clone());
        self.records.push_back(record.clone());
        while self.records.len() > self.max_stored_signals {
            self.records.pop_front();
        }
        Some(record)
    }

    /// Most recent stored record.
    pub fn latest(&self) -> Option<&SignalRecord> {
        self.records.back()
    }

    /// Get the most recent N records, newest first.
    pub fn recent(&self, count: usize) -> Vec<&SignalRecord> {
        self.records.iter().rev().take(count).collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SignalRecord> {
        self.broadcast_tx.subscribe()
    }

    pub fn stats(&self) -> SignalStoreStats {
        let signals = self
            .records
            .iter()
            .filter(|r| r.outcome.as_signal().is_some())
            .count();
        SignalStoreStats {
            total_stored: self.records.len(),
            signals,
            errors: self.records.len() - signals,
            idle_ticks: self.idle_ticks,
        }
    }
}
