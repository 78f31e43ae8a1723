//! Remote hotspot store seam and its adapters.

mod memory;
mod supabase;

use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::models::{Hotspot, HotspotId, HotspotPatch, NewHotspot};

pub use memory::{MemoryHotspotStore, StoreOperation};
pub use supabase::{normalize_rest_url, SupabaseHotspotStore, DEFAULT_FEED_POLL_INTERVAL};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Hotspot store is not configured")]
    NotConfigured,
    #[error("Invalid store configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Store HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Store API error: {0}")]
    Api(String),
    #[error("Invalid store payload: {0}")]
    InvalidPayload(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Optional pre-filter for `query_all`.
///
/// Stores may ignore it; callers must still apply their own TTL rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryFilter {
    /// Only rows stamped at or after this instant
    pub since: Option<DateTime<Utc>>,
}

impl QueryFilter {
    #[must_use]
    pub const fn all() -> Self {
        Self { since: None }
    }

    #[must_use]
    pub const fn since(instant: DateTime<Utc>) -> Self {
        Self {
            since: Some(instant),
        }
    }

    /// Rows younger than `ttl` at `now`; unfiltered if the cutoff is out of range.
    #[must_use]
    pub fn within(now: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        now.checked_sub_signed(ttl)
            .map_or_else(Self::all, Self::since)
    }
}

/// Durable table of hotspot rows shared by every device.
pub trait HotspotStore: Send + Sync + 'static {
    /// Current rows, optionally pre-filtered by minimum timestamp.
    fn query_all(
        &self,
        filter: &QueryFilter,
    ) -> impl Future<Output = StoreResult<Vec<Hotspot>>> + Send;

    /// Insert one row; resolves to the stored row including its new id.
    fn insert(&self, hotspot: &NewHotspot) -> impl Future<Output = StoreResult<Hotspot>> + Send;

    /// Update the label of one row.
    fn update_by_id(
        &self,
        id: HotspotId,
        patch: &HotspotPatch,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Open a feed of newly inserted rows, delivered once each in commit order.
    fn subscribe_on_insert(&self) -> impl Future<Output = StoreResult<InsertSubscription>> + Send;
}

/// Create a connected insert feed pair.
pub fn insert_channel() -> (InsertSender, InsertSubscription) {
    let (tx, receiver) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    (
        InsertSender {
            tx,
            cancel: cancel.clone(),
        },
        InsertSubscription { receiver, cancel },
    )
}

/// Store-side end of an insert feed.
#[derive(Debug, Clone)]
pub struct InsertSender {
    tx: mpsc::UnboundedSender<Hotspot>,
    cancel: CancellationToken,
}

impl InsertSender {
    /// Deliver a row; `false` once the subscriber has gone away.
    pub fn send(&self, row: Hotspot) -> bool {
        !self.cancel.is_cancelled() && self.tx.send(row).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }

    /// Resolves when the subscriber unsubscribes or is dropped.
    pub async fn closed(&self) {
        tokio::select! {
            () = self.cancel.cancelled() => {}
            () = self.tx.closed() => {}
        }
    }
}

/// Client-side handle of an insert feed. Dropping it unsubscribes.
#[derive(Debug)]
pub struct InsertSubscription {
    receiver: mpsc::UnboundedReceiver<Hotspot>,
    cancel: CancellationToken,
}

impl InsertSubscription {
    /// Next inserted row, or `None` once the feed is closed from either side.
    pub async fn next(&mut self) -> Option<Hotspot> {
        tokio::select! {
            () = self.cancel.cancelled() => None,
            row = self.receiver.recv() => row,
        }
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for InsertSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
