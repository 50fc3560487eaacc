//! Revision history
//!
//! Keeps the immediately previous target/state of recently edited units.
//! The map is bounded: once `capacity` units have revisions, the least
//! recently edited one is forgotten.

use crate::dom::unit::{Revision, UnitKey};
use lru::LruCache;
use std::fmt;
use std::num::NonZeroUsize;

pub struct History {
    revisions: LruCache<UnitKey, Revision>,
}

impl History {
    pub fn new(capacity: NonZeroUsize) -> Self {
        History {
            revisions: LruCache::new(capacity),
        }
    }

    /// Remember `revision` as the value before the latest edit of `key`,
    /// replacing any older one.
    pub fn record(&mut self, key: UnitKey, revision: Revision) {
        self.revisions.put(key, revision);
    }

    /// The previous value, without touching recency
    pub fn peek(&self, key: &UnitKey) -> Option<&Revision> {
        self.revisions.peek(key)
    }

    pub fn take(&mut self, key: &UnitKey) -> Option<Revision> {
        self.revisions.pop(key)
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.revisions.cap().get()
    }
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("len", &self.revisions.len())
            .field("capacity", &self.revisions.cap())
            .finish()
    }
}
