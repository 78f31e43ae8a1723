//! The local hotspot set and its merge rules.
//!
//! Every trigger (insert feed, optimistic report, rename, sweep timer) becomes a
//! `HotspotEvent` and goes through `HotspotSet::apply`, so each one can be
//! exercised without the others.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Hotspot, HotspotId};

/// Key of an entry in the local set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotspotKey {
    /// Row acknowledged by the store
    Remote(HotspotId),
    /// Row seen without an id; never merged with anything else
    Local(Uuid),
}

/// A change to feed into the local set.
#[derive(Debug, Clone, PartialEq)]
pub enum HotspotEvent {
    /// A row arrived (query, insert feed, or our own acknowledged insert)
    Inserted(Hotspot),
    /// Drop everything at least `ttl` old at `now`, plus unparsable rows
    Swept {
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    },
    /// The owner renamed a hotspot
    Relabeled { id: HotspotId, label: String },
}

/// Hotspots currently visible in this session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotspotSet {
    entries: HashMap<HotspotKey, Hotspot>,
}

impl HotspotSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from query results (duplicate ids collapse to the first).
    #[must_use]
    pub fn from_rows(rows: impl IntoIterator<Item = Hotspot>) -> Self {
        let mut set = Self::new();
        for row in rows {
            set.merge(row);
        }
        set
    }

    /// Apply one event; returns how many entries it touched.
    pub fn apply(&mut self, event: HotspotEvent) -> usize {
        match event {
            HotspotEvent::Inserted(hotspot) => usize::from(self.merge(hotspot)),
            HotspotEvent::Swept { now, ttl } => self.sweep(now, ttl),
            HotspotEvent::Relabeled { id, label } => usize::from(self.relabel(id, &label)),
        }
    }

    /// Add a row unless its id is already present. An existing id is left
    /// untouched, never overwritten.
    pub fn merge(&mut self, hotspot: Hotspot) -> bool {
        let key = hotspot
            .id
            .map_or_else(|| HotspotKey::Local(Uuid::now_v7()), HotspotKey::Remote);
        if self.entries.contains_key(&key) {
            tracing::debug!("Ignoring duplicate hotspot {:?}", key);
            return false;
        }
        self.entries.insert(key, hotspot);
        true
    }

    /// Remove expired and unparsable entries; returns how many were removed.
    pub fn sweep(&mut self, now: DateTime<Utc>, ttl: chrono::Duration) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, hotspot| !hotspot.is_expired(now, ttl));
        before - self.entries.len()
    }

    /// Set the label of an existing entry; `false` if absent or unchanged.
    pub fn relabel(&mut self, id: HotspotId, label: &str) -> bool {
        match self.entries.get_mut(&HotspotKey::Remote(id)) {
            Some(hotspot) if hotspot.label.as_deref() != Some(label) => {
                hotspot.label = Some(label.to_string());
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn get(&self, id: HotspotId) -> Option<&Hotspot> {
        self.entries.get(&HotspotKey::Remote(id))
    }

    #[must_use]
    pub fn contains(&self, id: HotspotId) -> bool {
        self.entries.contains_key(&HotspotKey::Remote(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Owned copy of the entries, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Hotspot> {
        let mut hotspots: Vec<Hotspot> = self.entries.values().cloned().collect();
        hotspots.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        hotspots
    }
}
