//! Bounded TTL cache for upstream responses.
//!
//! Eviction is by insertion order, not access order: once the cache grows
//! past capacity the oldest-inserted entries are dropped, even if they were
//! read recently. Treat it as an approximate LRU.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use super::UpstreamResponse;

#[derive(Debug, Clone)]
struct CacheEntry {
    response: UpstreamResponse,
    expires_at: Instant,
    /// Insertion sequence number, matched against `order` on trim.
    seq: u64,
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Hit(UpstreamResponse),
    Miss,
    /// An entry existed but had expired; it has been removed.
    Expired,
}

/// Response cache keyed by the exact target URL.
#[derive(Debug)]
pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
    /// Keys in insertion order. Stale positions (from re-inserts or expiry)
    /// are skipped lazily.
    order: VecDeque<(String, u64)>,
    ttl: Duration,
    max_entries: usize,
    next_seq: u64,
}

impl ResponseCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            ttl,
            max_entries,
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up `key` as of `now`, removing it if expired.
    pub fn get(&mut self, key: &str, now: Instant) -> Lookup {
        match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => Lookup::Hit(entry.response.clone()),
            Some(_) => {
                self.entries.remove(key);
                Lookup::Expired
            }
            None => Lookup::Miss,
        }
    }

    /// Store `response` under `key` as of `now`, then trim to capacity.
    pub fn insert(&mut self, key: String, response: UpstreamResponse, now: Instant) {
        let seq = self.next_seq;
        self.next_seq += 1;

        self.entries.insert(
            key.clone(),
            CacheEntry {
                response,
                expires_at: now + self.ttl,
                seq,
            },
        );
        self.order.push_back((key, seq));
        self.trim();
    }

    fn trim(&mut self) {
        while self.entries.len() > self.max_entries {
            let Some((key, seq)) = self.order.pop_front() else {
                break;
            };
            if self.entries.get(&key).is_some_and(|e| e.seq == seq) {
                self.entries.remove(&key);
            }
        }

        // Keep the order queue from growing unboundedly with stale positions.
        if self.order.len() > self.max_entries.saturating_mul(2) {
            let entries = &self.entries;
            self.order
                .retain(|(key, seq)| entries.get(key).is_some_and(|e| e.seq == *seq));
        }
    }
}
