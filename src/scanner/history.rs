use std::collections::VecDeque;

use super::reconcile::ScanOutcome;

/// Rolling record of recent scans, newest first. Insertion evicts the oldest
/// entry once the capacity is reached; nothing else shrinks it except an
/// explicit reset.
#[derive(Debug)]
pub struct ScanHistory {
    entries: VecDeque<ScanOutcome>,
    capacity: usize,
}

impl ScanHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, outcome: ScanOutcome) {
        self.entries.push_front(outcome);
        self.entries.truncate(self.capacity);
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest-first snapshot.
    pub fn entries(&self) -> Vec<ScanOutcome> {
        self.entries.iter().cloned().collect()
    }
}
