//! In-process hotspot store.

use std::collections::HashSet;

use tokio::sync::Mutex;

use super::{
    insert_channel, HotspotStore, InsertSender, InsertSubscription, QueryFilter, StoreError,
    StoreResult,
};
use crate::models::{Hotspot, HotspotId, HotspotPatch, NewHotspot};

/// Store operations that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Query,
    Insert,
    Update,
    Subscribe,
}

/// Hotspot table kept in memory, with insert fan-out to live subscribers.
#[derive(Debug, Default)]
pub struct MemoryHotspotStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    rows: Vec<Hotspot>,
    last_id: i64,
    subscribers: Vec<InsertSender>,
    failing: HashSet<StoreOperation>,
    insert_calls: usize,
    update_calls: usize,
}

impl MemoryHotspotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `rows`; later inserts get ids above theirs.
    #[must_use]
    pub fn with_rows(rows: Vec<Hotspot>) -> Self {
        let last_id = rows
            .iter()
            .filter_map(|row| row.id)
            .map(HotspotId::get)
            .max()
            .unwrap_or(0);
        Self {
            inner: Mutex::new(MemoryInner {
                rows,
                last_id,
                ..MemoryInner::default()
            }),
        }
    }

    /// Make `operation` fail (or succeed again) until changed.
    pub async fn set_failing(&self, operation: StoreOperation, failing: bool) {
        let mut inner = self.inner.lock().await;
        if failing {
            inner.failing.insert(operation);
        } else {
            inner.failing.remove(&operation);
        }
    }

    /// Close every live insert feed, as a dropped real-time connection would.
    pub async fn disconnect_subscribers(&self) {
        let mut inner = self.inner.lock().await;
        inner.subscribers.clear();
    }

    pub async fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.lock().await;
        inner.subscribers.retain(|sender| !sender.is_closed());
        inner.subscribers.len()
    }

    pub async fn rows(&self) -> Vec<Hotspot> {
        self.inner.lock().await.rows.clone()
    }

    pub async fn insert_calls(&self) -> usize {
        self.inner.lock().await.insert_calls
    }

    pub async fn update_calls(&self) -> usize {
        self.inner.lock().await.update_calls
    }
}

impl MemoryInner {
    fn check(&self, operation: StoreOperation) -> StoreResult<()> {
        if self.failing.contains(&operation) {
            Err(StoreError::Unavailable(format!(
                "{operation:?} rejected by in-memory store"
            )))
        } else {
            Ok(())
        }
    }
}

impl HotspotStore for MemoryHotspotStore {
    async fn query_all(&self, filter: &QueryFilter) -> StoreResult<Vec<Hotspot>> {
        let inner = self.inner.lock().await;
        inner.check(StoreOperation::Query)?;

        let rows = inner
            .rows
            .iter()
            .filter(|row| match filter.since {
                Some(since) => row.created_at().is_some_and(|created_at| created_at >= since),
                None => true,
            })
            .cloned()
            .collect();
        Ok(rows)
    }

    async fn insert(&self, hotspot: &NewHotspot) -> StoreResult<Hotspot> {
        let mut inner = self.inner.lock().await;
        inner.insert_calls += 1;
        inner.check(StoreOperation::Insert)?;

        inner.last_id += 1;
        let row = hotspot.clone().into_hotspot(HotspotId::new(inner.last_id));
        inner.rows.push(row.clone());
        inner
            .subscribers
            .retain(|subscriber| subscriber.send(row.clone()));
        Ok(row)
    }

    async fn update_by_id(&self, id: HotspotId, patch: &HotspotPatch) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.update_calls += 1;
        inner.check(StoreOperation::Update)?;

        let row = inner
            .rows
            .iter_mut()
            .find(|row| row.id == Some(id))
            .ok_or_else(|| StoreError::Api(format!("no hotspot with id {id}")))?;
        row.label = Some(patch.label.clone());
        Ok(())
    }

    async fn subscribe_on_insert(&self) -> StoreResult<InsertSubscription> {
        let mut inner = self.inner.lock().await;
        inner.check(StoreOperation::Subscribe)?;

        let (sender, subscription) = insert_channel();
        inner.subscribers.push(sender);
        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    fn candidate() -> NewHotspot {
        NewHotspot::at(Coordinate::new(36.107, -115.140), Utc::now())
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let store = MemoryHotspotStore::new();
        let first = store.insert(&candidate()).await.unwrap();
        let second = store.insert(&candidate()).await.unwrap();
        assert_eq!(first.id, Some(HotspotId::new(1)));
        assert_eq!(second.id, Some(HotspotId::new(2)));
        assert_eq!(store.query_all(&QueryFilter::all()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn seeded_store_continues_after_highest_id() {
        let mut seeded = candidate().into_hotspot(HotspotId::new(41));
        seeded.label = Some("Food truck".to_string());
        let store = MemoryHotspotStore::with_rows(vec![seeded]);
        let row = store.insert(&candidate()).await.unwrap();
        assert_eq!(row.id, Some(HotspotId::new(42)));
    }

    #[tokio::test]
    async fn query_honors_since_filter() {
        let now = Utc::now();
        let mut old = candidate();
        old.timestamp = crate::models::format_timestamp(now - Duration::minutes(30));
        let store = MemoryHotspotStore::new();
        store.insert(&old).await.unwrap();
        store.insert(&candidate()).await.unwrap();

        let recent = store
            .query_all(&QueryFilter::since(now - Duration::minutes(20)))
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, Some(HotspotId::new(2)));
    }

    #[tokio::test]
    async fn update_changes_only_label() {
        let store = MemoryHotspotStore::new();
        let row = store.insert(&candidate()).await.unwrap();
        let id = row.id.unwrap();

        store
            .update_by_id(id, &HotspotPatch::label("Crowd at Rec"))
            .await
            .unwrap();

        let rows = store.rows().await;
        assert_eq!(rows[0].label.as_deref(), Some("Crowd at Rec"));
        assert_eq!(rows[0].timestamp, row.timestamp);
        assert_eq!(store.update_calls().await, 1);

        let missing = store
            .update_by_id(HotspotId::new(99), &HotspotPatch::label("x"))
            .await;
        assert!(matches!(missing, Err(StoreError::Api(_))));
    }

    #[tokio::test]
    async fn subscribers_receive_inserts_until_disconnected() {
        let store = MemoryHotspotStore::new();
        let mut subscription = store.subscribe_on_insert().await.unwrap();
        assert_eq!(store.subscriber_count().await, 1);

        let row = store.insert(&candidate()).await.unwrap();
        assert_eq!(subscription.next().await, Some(row));

        store.disconnect_subscribers().await;
        assert!(subscription.next().await.is_none());
        assert_eq!(store.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn dropped_subscription_is_pruned() {
        let store = MemoryHotspotStore::new();
        let subscription = store.subscribe_on_insert().await.unwrap();
        subscription.unsubscribe();
        assert_eq!(store.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn failing_operations_report_unavailable() {
        let store = MemoryHotspotStore::new();
        store.set_failing(StoreOperation::Insert, true).await;
        assert!(matches!(
            store.insert(&candidate()).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.rows().await.is_empty());

        store.set_failing(StoreOperation::Insert, false).await;
        assert!(store.insert(&candidate()).await.is_ok());
    }
}
