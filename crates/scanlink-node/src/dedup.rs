use std::collections::{HashSet, VecDeque};

use scanlink_frame::Identifier;

/// Identifiers the sender has already put on the wire.
///
/// Unbounded by default: an identifier, once inserted, is never sent again
/// for the life of the process. With a capacity the oldest identifier is
/// forgotten first.
#[derive(Debug, Clone, Default)]
pub struct DedupSet {
    seen: HashSet<Identifier>,
    order: VecDeque<Identifier>,
    capacity: Option<usize>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set that remembers at most `capacity` identifiers.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::default()
        }
    }

    pub fn contains(&self, identifier: &Identifier) -> bool {
        self.seen.contains(identifier)
    }

    /// Record an identifier. Returns `false` if it was already present.
    pub fn insert(&mut self, identifier: Identifier) -> bool {
        if !self.seen.insert(identifier) {
            return false;
        }
        self.order.push_back(identifier);
        if let Some(capacity) = self.capacity {
            while self.order.len() > capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.seen.remove(&oldest);
                }
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}
