//! Pending request table.
//!
//! Holds incoming discovery queries whose digest already matched ours, so
//! there was nothing to tell the requester yet. Entries are answered when
//! the local digest changes, or dropped once their lifetime runs out.

use confsync_core::{Digest, Millis};
use confsync_face::IncomingQuery;

/// One parked discovery query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    /// The query as it arrived.
    pub query: IncomingQuery,
    /// Digest the requester declared.
    pub digest: Digest,
    /// Arrival time plus declared lifetime.
    pub expires_at: Millis,
}

impl PendingEntry {
    pub fn new(query: IncomingQuery, digest: Digest) -> Self {
        let expires_at = query.expires_at();
        Self {
            query,
            digest,
            expires_at,
        }
    }

    /// An expired entry can no longer reach its requester.
    pub fn is_expired(&self, now: Millis) -> bool {
        now >= self.expires_at
    }
}

/// Bounded set of parked discovery queries.
#[derive(Debug, Clone)]
pub struct PendingTable {
    entries: Vec<PendingEntry>,
    capacity: usize,
}

impl PendingTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every expired entry. Returns how many were dropped.
    pub fn purge_expired(&mut self, now: Millis) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    /// Park an entry.
    ///
    /// When the table is full the entry closest to expiry is evicted and
    /// returned. Callers purge first so only live entries compete.
    pub fn insert(&mut self, entry: PendingEntry) -> Option<PendingEntry> {
        if self.capacity == 0 {
            return Some(entry);
        }
        let evicted = if self.entries.len() >= self.capacity {
            self.entries
                .iter()
                .enumerate()
                .min_by_key(|(_, e)| e.expires_at)
                .map(|(index, _)| index)
                .map(|index| self.entries.swap_remove(index))
        } else {
            None
        };
        self.entries.push(entry);
        evicted
    }

    /// Remove and return the live entries whose digest differs from
    /// `current`. Expired entries are purged first and never returned.
    pub fn take_stale(&mut self, now: Millis, current: &Digest) -> Vec<PendingEntry> {
        self.purge_expired(now);
        let (stale, keep): (Vec<_>, Vec<_>) = self
            .entries
            .drain(..)
            .partition(|entry| entry.digest != *current);
        self.entries = keep;
        stale
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingEntry> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
