//! The waiting room: patients admitted but not yet treated.
//!
//! Entries are small copyable keys pointing into the engine's patient
//! registry, so the head can be inspected without borrowing the patient
//! mutably. It leaves the heap only when both resources are secured.

use crate::{
    patient::Patient,
    types::{Minute, PatientId, Severity},
};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Queue ordering key. The greatest key is served first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueKey {
    pub severity:     Severity,
    pub arrival_time: Minute,
    pub id:           PatientId,
}

impl From<&Patient> for QueueKey {
    fn from(p: &Patient) -> Self {
        Self {
            severity:     p.severity,
            arrival_time: p.arrival_time,
            id:           p.id,
        }
    }
}

impl Ord for QueueKey {
    /// Severity descending, then arrival ascending, then id ascending.
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity
            .cmp(&other.severity)
            .then_with(|| other.arrival_time.cmp(&self.arrival_time))
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for QueueKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Default)]
pub struct WaitingQueue {
    heap: BinaryHeap<QueueKey>,
}

impl WaitingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, patient: &Patient) {
        self.heap.push(QueueKey::from(patient));
    }

    /// Highest-priority waiting patient, if any.
    pub fn peek(&self) -> Option<QueueKey> {
        self.heap.peek().copied()
    }

    pub fn pop(&mut self) -> Option<QueueKey> {
        self.heap.pop()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// All waiting keys in service order. Allocates; for reporting and tests.
    pub fn iter_ordered(&self) -> impl Iterator<Item = QueueKey> {
        let mut keys = self.heap.clone().into_sorted_vec();
        keys.reverse();
        keys.into_iter()
    }
}
