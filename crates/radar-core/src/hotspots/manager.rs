//! Hotspot lifecycle manager.
//!
//! Owns the visible hotspot set for one session, keeps it live from the store's
//! insert feed and a periodic sweep, and writes reports and renames through to
//! the store. Ownership is the id returned by this session's latest insert and
//! is never persisted.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{HotspotError, HotspotEvent, HotspotSet, HotspotSettings};
use crate::geo::GeolocationProvider;
use crate::models::{Hotspot, HotspotId, HotspotPatch, NewHotspot};
use crate::state::FeedState;
use crate::store::{HotspotStore, InsertSubscription, QueryFilter};

/// Summary of one `initialize` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationReport {
    /// Hotspots visible right after the initial query
    pub loaded: usize,
    pub permission_granted: bool,
    pub feed: FeedState,
}

pub struct HotspotManager<S, G> {
    store: Arc<S>,
    geolocation: Arc<G>,
    settings: HotspotSettings,
    shared: Arc<Shared>,
    activation: Mutex<Option<Activation>>,
}

struct Activation {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

/// State reachable from the background tasks.
struct Shared {
    state: Mutex<SessionState>,
    snapshot: watch::Sender<Vec<Hotspot>>,
    feed: watch::Sender<FeedState>,
}

#[derive(Default)]
struct SessionState {
    hotspots: HotspotSet,
    owned_id: Option<HotspotId>,
    permission_granted: Option<bool>,
    /// Bumped on every teardown; tasks from older activations must not write.
    generation: u64,
}

impl Shared {
    /// Apply `event`, dropping it if it comes from a torn-down activation.
    async fn apply(&self, generation: Option<u64>, event: HotspotEvent) -> usize {
        let mut state = self.state.lock().await;
        if generation.is_some_and(|generation| generation != state.generation) {
            tracing::debug!("Dropping hotspot event from a stale activation");
            return 0;
        }
        let touched = state.hotspots.apply(event);
        if touched > 0 {
            self.snapshot.send_replace(state.hotspots.snapshot());
        }
        touched
    }

    async fn is_current(&self, generation: u64) -> bool {
        self.state.lock().await.generation == generation
    }
}

impl<S: HotspotStore, G: GeolocationProvider> HotspotManager<S, G> {
    pub fn new(store: Arc<S>, geolocation: Arc<G>, settings: HotspotSettings) -> Self {
        let (snapshot, _) = watch::channel(Vec::new());
        let (feed, _) = watch::channel(FeedState::Inactive);
        Self {
            store,
            geolocation,
            settings,
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::default()),
                snapshot,
                feed,
            }),
            activation: Mutex::new(None),
        }
    }

    /// Activate: ask for location permission, load current hotspots, subscribe
    /// to inserts, and start the sweep timer.
    ///
    /// Never fails. A failed query leaves an empty set and a failed subscription
    /// leaves the feed `Disconnected`; the sweep runs either way. Calling it
    /// again tears the previous activation down first.
    pub async fn initialize(&self) -> ActivationReport {
        let mut activation = self.activation.lock().await;
        if let Some(previous) = activation.take() {
            self.teardown(previous).await;
        }

        // A granted permission is not asked for again.
        let cached = self.shared.state.lock().await.permission_granted;
        let permission_granted = match cached {
            Some(true) => true,
            _ => self.geolocation.request_permission().await,
        };

        // Subscribe before querying so rows committed in between are not lost;
        // the merge rule absorbs any overlap.
        let subscription = match self.store.subscribe_on_insert().await {
            Ok(subscription) => Some(subscription),
            Err(error) => {
                tracing::warn!("Hotspot insert feed unavailable: {}", error);
                None
            }
        };

        let now = Utc::now();
        let rows = match self
            .store
            .query_all(&QueryFilter::within(now, self.settings.ttl))
            .await
        {
            Ok(rows) => rows,
            Err(error) => {
                tracing::warn!("Failed to load hotspots, starting empty: {}", error);
                Vec::new()
            }
        };

        let (generation, loaded) = {
            let mut state = self.shared.state.lock().await;
            state.permission_granted = Some(permission_granted);
            let mut hotspots = HotspotSet::from_rows(rows);
            hotspots.sweep(now, self.settings.ttl);
            state.hotspots = hotspots;
            self.shared.snapshot.send_replace(state.hotspots.snapshot());
            (state.generation, state.hotspots.len())
        };

        let cancel = CancellationToken::new();
        let mut tasks = vec![tokio::spawn(run_sweeper(
            Arc::clone(&self.shared),
            generation,
            self.settings,
            cancel.clone(),
        ))];

        let feed = match subscription {
            Some(subscription) => {
                self.shared.feed.send_replace(FeedState::Live);
                tasks.push(tokio::spawn(run_insert_feed(
                    Arc::clone(&self.shared),
                    generation,
                    subscription,
                    cancel.clone(),
                )));
                FeedState::Live
            }
            None => {
                self.shared.feed.send_replace(FeedState::Disconnected);
                FeedState::Disconnected
            }
        };

        *activation = Some(Activation { cancel, tasks });
        tracing::info!(
            "Hotspot layer active: {} visible, permission {}, feed {:?}",
            loaded,
            if permission_granted { "granted" } else { "denied" },
            feed
        );

        ActivationReport {
            loaded,
            permission_granted,
            feed,
        }
    }

    /// Stop the sweep timer and drop the insert subscription.
    ///
    /// Safe to call when inactive. The hotspot set and ownership are kept.
    pub async fn deactivate(&self) {
        let previous = self.activation.lock().await.take();
        if let Some(previous) = previous {
            self.teardown(previous).await;
            tracing::info!("Hotspot layer deactivated");
        }
    }

    pub async fn is_active(&self) -> bool {
        self.activation.lock().await.is_some()
    }

    async fn teardown(&self, activation: Activation) {
        self.shared.state.lock().await.generation += 1;
        activation.cancel.cancel();
        for task in activation.tasks {
            if let Err(error) = task.await {
                if !error.is_cancelled() {
                    tracing::warn!("Hotspot background task ended abnormally: {}", error);
                }
            }
        }
        self.shared.feed.send_replace(FeedState::Inactive);
    }

    /// Remove every hotspot past the TTL (or with an unusable timestamp).
    /// Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        sweep_now(&self.shared, None, self.settings.ttl).await
    }

    /// Report a hotspot at the device's current position.
    ///
    /// On success the new row becomes this session's owned hotspot and is added
    /// to the local set right away.
    pub async fn report_hotspot(&self) -> Result<Hotspot, HotspotError> {
        let permission_granted = self.shared.state.lock().await.permission_granted;
        if permission_granted != Some(true) {
            return Err(HotspotError::PermissionDenied);
        }

        let coordinate = self
            .geolocation
            .current_coordinate(self.settings.accuracy)
            .await?;
        if !coordinate.is_valid() {
            return Err(HotspotError::LocationUnavailable(format!(
                "invalid coordinate ({}, {})",
                coordinate.latitude, coordinate.longitude
            )));
        }

        let candidate = NewHotspot::at(coordinate, Utc::now());
        let row = self.store.insert(&candidate).await.map_err(|error| {
            tracing::warn!("Failed to report hotspot: {}", error);
            HotspotError::from(error)
        })?;
        let id = row.id.ok_or_else(|| {
            HotspotError::StoreUnavailable("insert acknowledged without an id".to_string())
        })?;

        let mut state = self.shared.state.lock().await;
        state.owned_id = Some(id);
        if state.hotspots.apply(HotspotEvent::Inserted(row.clone())) > 0 {
            self.shared.snapshot.send_replace(state.hotspots.snapshot());
        }
        drop(state);

        tracing::info!(
            "Reported hotspot {} at ({}, {})",
            id,
            row.latitude,
            row.longitude
        );
        Ok(row)
    }

    /// Rename this session's owned hotspot. Returns the label as stored.
    pub async fn rename_owned_hotspot(&self, new_label: &str) -> Result<String, HotspotError> {
        let Some(owned_id) = self.owned_id().await else {
            tracing::warn!("Rename requested but this session owns no hotspot");
            return Err(HotspotError::NoOwnedHotspot);
        };
        self.rename_hotspot(owned_id, new_label).await
    }

    /// Rename `target`, which must be this session's owned hotspot.
    pub async fn rename_hotspot(
        &self,
        target: HotspotId,
        new_label: &str,
    ) -> Result<String, HotspotError> {
        let owned_id = self.owned_id().await;
        if owned_id != Some(target) {
            tracing::warn!(
                "Rejected rename of hotspot {} (owned: {:?})",
                target,
                owned_id
            );
            return Err(HotspotError::NoOwnedHotspot);
        }

        let patch = HotspotPatch::label(new_label);
        self.store
            .update_by_id(target, &patch)
            .await
            .map_err(|error| {
                tracing::warn!("Failed to rename hotspot {}: {}", target, error);
                HotspotError::from(error)
            })?;

        self.shared
            .apply(
                None,
                HotspotEvent::Relabeled {
                    id: target,
                    label: patch.label.clone(),
                },
            )
            .await;
        tracing::debug!("Renamed hotspot {} to {:?}", target, patch.label);
        Ok(patch.label)
    }

    pub async fn owned_id(&self) -> Option<HotspotId> {
        self.shared.state.lock().await.owned_id
    }

    /// Whether `hotspot` is the one this session may rename.
    pub async fn is_owned(&self, hotspot: &Hotspot) -> bool {
        hotspot.id.is_some() && hotspot.id == self.owned_id().await
    }

    pub async fn permission_granted(&self) -> Option<bool> {
        self.shared.state.lock().await.permission_granted
    }

    /// Current visible hotspots, oldest first.
    pub fn snapshot(&self) -> Vec<Hotspot> {
        self.shared.snapshot.borrow().clone()
    }

    /// Receiver notified after every change to the visible set.
    pub fn watch_hotspots(&self) -> watch::Receiver<Vec<Hotspot>> {
        self.shared.snapshot.subscribe()
    }

    pub fn feed_state(&self) -> FeedState {
        *self.shared.feed.borrow()
    }

    pub fn watch_feed(&self) -> watch::Receiver<FeedState> {
        self.shared.feed.subscribe()
    }
}

async fn sweep_now(shared: &Shared, generation: Option<u64>, ttl: chrono::Duration) -> usize {
    let removed = shared
        .apply(
            generation,
            HotspotEvent::Swept {
                now: Utc::now(),
                ttl,
            },
        )
        .await;
    if removed > 0 {
        tracing::debug!("Swept {} expired hotspot(s)", removed);
    }
    removed
}

async fn run_sweeper(
    shared: Arc<Shared>,
    generation: u64,
    settings: HotspotSettings,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(
        Instant::now() + settings.sweep_interval,
        settings.sweep_interval,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        sweep_now(&shared, Some(generation), settings.ttl).await;
    }
}

async fn run_insert_feed(
    shared: Arc<Shared>,
    generation: u64,
    mut subscription: InsertSubscription,
    cancel: CancellationToken,
) {
    loop {
        let row = tokio::select! {
            () = cancel.cancelled() => break,
            row = subscription.next() => row,
        };
        let Some(row) = row else {
            tracing::warn!("Hotspot insert feed disconnected; live updates paused until reactivated");
            if shared.is_current(generation).await {
                shared.feed.send_replace(FeedState::Disconnected);
            }
            break;
        };
        shared
            .apply(Some(generation), HotspotEvent::Inserted(row))
            .await;
    }
    subscription.unsubscribe();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{Coordinate, FixedGeolocation};
    use crate::models::format_timestamp;
    use crate::store::{MemoryHotspotStore, StoreOperation};
    use chrono::Duration as ChronoDuration;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    type TestManager = HotspotManager<MemoryHotspotStore, FixedGeolocation>;

    const UNLV: Coordinate = Coordinate::new(36.107, -115.140);

    fn manager_with(store: &Arc<MemoryHotspotStore>, geolocation: FixedGeolocation) -> TestManager {
        HotspotManager::new(
            Arc::clone(store),
            Arc::new(geolocation),
            HotspotSettings::default(),
        )
    }

    fn aged(age: ChronoDuration) -> NewHotspot {
        let mut candidate = NewHotspot::at(Coordinate::new(36.108, -115.141), Utc::now());
        candidate.timestamp = format_timestamp(Utc::now() - age);
        candidate
    }

    async fn wait_for_hotspots(manager: &TestManager, predicate: impl Fn(&[Hotspot]) -> bool) {
        let mut receiver = manager.watch_hotspots();
        tokio::time::timeout(
            Duration::from_secs(5),
            receiver.wait_for(|hotspots| predicate(hotspots.as_slice())),
        )
        .await
        .expect("timed out waiting for hotspot snapshot")
        .map(|_| ())
        .expect("snapshot channel closed");
    }

    #[tokio::test]
    async fn initialize_empty_store_yields_empty_set_and_live_feed() {
        let store = Arc::new(MemoryHotspotStore::new());
        let manager = manager_with(&store, FixedGeolocation::granted(UNLV));

        let report = manager.initialize().await;

        assert_eq!(
            report,
            ActivationReport {
                loaded: 0,
                permission_granted: true,
                feed: FeedState::Live,
            }
        );
        assert!(manager.snapshot().is_empty());
        assert_eq!(manager.feed_state(), FeedState::Live);
        assert_eq!(store.subscriber_count().await, 1);
        assert_eq!(manager.permission_granted().await, Some(true));
        manager.deactivate().await;
    }

    #[tokio::test]
    async fn initialize_drops_expired_and_malformed_rows() {
        let now = Utc::now();
        let fresh = aged(ChronoDuration::minutes(3)).into_hotspot(HotspotId::new(1));
        let stale = aged(ChronoDuration::minutes(25)).into_hotspot(HotspotId::new(2));
        let mut broken = aged(ChronoDuration::minutes(1)).into_hotspot(HotspotId::new(3));
        broken.timestamp = "last tuesday".to_string();
        let store = Arc::new(MemoryHotspotStore::with_rows(vec![fresh, stale, broken]));
        let manager = manager_with(&store, FixedGeolocation::granted(UNLV));

        let report = manager.initialize().await;

        assert_eq!(report.loaded, 1);
        let visible = manager.snapshot();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, Some(HotspotId::new(1)));
        assert!(now - visible[0].created_at().unwrap() < ChronoDuration::minutes(20));
        manager.deactivate().await;
    }

    #[tokio::test]
    async fn initialize_degrades_when_query_fails() {
        let seeded = aged(ChronoDuration::minutes(1)).into_hotspot(HotspotId::new(1));
        let store = Arc::new(MemoryHotspotStore::with_rows(vec![seeded]));
        store.set_failing(StoreOperation::Query, true).await;
        let manager = manager_with(&store, FixedGeolocation::granted(UNLV));

        let report = manager.initialize().await;

        assert_eq!(report.loaded, 0);
        assert_eq!(report.feed, FeedState::Live);
        assert!(manager.snapshot().is_empty());

        store.insert(&aged(ChronoDuration::minutes(1))).await.unwrap();
        wait_for_hotspots(&manager, |hotspots| hotspots.len() == 1).await;
        manager.deactivate().await;
    }

    #[tokio::test]
    async fn initialize_degrades_when_subscribe_fails() {
        let store = Arc::new(MemoryHotspotStore::new());
        store.set_failing(StoreOperation::Subscribe, true).await;
        let manager = manager_with(&store, FixedGeolocation::granted(UNLV));

        let report = manager.initialize().await;

        assert_eq!(report.feed, FeedState::Disconnected);
        assert!(manager.is_active().await);
        assert!(manager.report_hotspot().await.is_ok());
        assert_eq!(manager.snapshot().len(), 1);
        manager.deactivate().await;
    }

    #[tokio::test]
    async fn report_inserts_owned_row_at_device_coordinate() {
        let store = Arc::new(MemoryHotspotStore::new());
        let manager = manager_with(&store, FixedGeolocation::granted(UNLV));
        manager.initialize().await;
        let before = manager.snapshot().len();

        let row = manager.report_hotspot().await.unwrap();

        assert_eq!(manager.snapshot().len(), before + 1);
        assert_eq!(manager.owned_id().await, row.id);
        assert!(manager.is_owned(&row).await);

        let stored = store.query_all(&QueryFilter::all()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].coordinate(), UNLV);
        assert_eq!(stored[0].label, None);
        assert_eq!(stored[0].display_label(), "Hot Spot");
        manager.deactivate().await;
    }

    #[tokio::test]
    async fn report_and_feed_delivery_do_not_duplicate() {
        let store = Arc::new(MemoryHotspotStore::new());
        let manager = manager_with(&store, FixedGeolocation::granted(UNLV));
        manager.initialize().await;

        let own = manager.report_hotspot().await.unwrap();
        // The feed is ordered, so once this second row shows up the echo of
        // our own insert has been processed too.
        store.insert(&aged(ChronoDuration::minutes(1))).await.unwrap();
        wait_for_hotspots(&manager, |hotspots| hotspots.len() == 2).await;

        let visible = manager.snapshot();
        assert_eq!(visible.iter().filter(|hotspot| hotspot.id == own.id).count(), 1);
        manager.deactivate().await;
    }

    #[tokio::test]
    async fn two_reports_get_distinct_ids_and_last_is_owned() {
        let store = Arc::new(MemoryHotspotStore::new());
        let manager = manager_with(&store, FixedGeolocation::granted(UNLV));
        manager.initialize().await;

        let first = manager.report_hotspot().await.unwrap();
        let second = manager.report_hotspot().await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(manager.owned_id().await, second.id);
        assert!(!manager.is_owned(&first).await);
        assert_eq!(
            manager.rename_hotspot(first.id.unwrap(), "Old one").await,
            Err(HotspotError::NoOwnedHotspot)
        );
        manager.deactivate().await;
    }

    #[tokio::test]
    async fn report_without_permission_never_writes() {
        let store = Arc::new(MemoryHotspotStore::new());
        let manager = manager_with(&store, FixedGeolocation::denied());
        let report = manager.initialize().await;
        assert!(!report.permission_granted);

        assert_eq!(
            manager.report_hotspot().await,
            Err(HotspotError::PermissionDenied)
        );
        assert_eq!(store.insert_calls().await, 0);
        assert_eq!(manager.owned_id().await, None);
        manager.deactivate().await;
    }

    #[tokio::test]
    async fn report_before_initialize_is_permission_denied() {
        let store = Arc::new(MemoryHotspotStore::new());
        let manager = manager_with(&store, FixedGeolocation::granted(UNLV));

        assert_eq!(
            manager.report_hotspot().await,
            Err(HotspotError::PermissionDenied)
        );
        assert_eq!(store.insert_calls().await, 0);
    }

    #[tokio::test]
    async fn report_without_fix_changes_nothing() {
        let store = Arc::new(MemoryHotspotStore::new());
        let manager = manager_with(&store, FixedGeolocation::without_fix());
        manager.initialize().await;

        let result = manager.report_hotspot().await;

        assert!(matches!(result, Err(HotspotError::LocationUnavailable(_))));
        assert_eq!(store.insert_calls().await, 0);
        assert!(manager.snapshot().is_empty());
        assert_eq!(manager.owned_id().await, None);
        manager.deactivate().await;
    }

    #[tokio::test]
    async fn report_store_failure_leaves_no_orphan() {
        let store = Arc::new(MemoryHotspotStore::new());
        let manager = manager_with(&store, FixedGeolocation::granted(UNLV));
        manager.initialize().await;
        store.set_failing(StoreOperation::Insert, true).await;

        let result = manager.report_hotspot().await;

        assert!(matches!(result, Err(HotspotError::StoreUnavailable(_))));
        assert!(manager.snapshot().is_empty());
        assert_eq!(manager.owned_id().await, None);
        manager.deactivate().await;
    }

    #[tokio::test]
    async fn rename_without_owned_hotspot_is_rejected_before_store() {
        let store = Arc::new(MemoryHotspotStore::new());
        let manager = manager_with(&store, FixedGeolocation::granted(UNLV));
        manager.initialize().await;

        assert_eq!(
            manager.rename_owned_hotspot("Crowd at Rec").await,
            Err(HotspotError::NoOwnedHotspot)
        );
        assert_eq!(store.update_calls().await, 0);
        manager.deactivate().await;
    }

    #[tokio::test]
    async fn rename_of_foreign_hotspot_leaves_labels_unchanged() {
        let store = Arc::new(MemoryHotspotStore::new());
        let manager = manager_with(&store, FixedGeolocation::granted(UNLV));
        manager.initialize().await;
        let own = manager.report_hotspot().await.unwrap();
        let foreign = store.insert(&aged(ChronoDuration::minutes(1))).await.unwrap();
        wait_for_hotspots(&manager, |hotspots| hotspots.len() == 2).await;

        let result = manager
            .rename_hotspot(foreign.id.unwrap(), "Mine now")
            .await;

        assert_eq!(result, Err(HotspotError::NoOwnedHotspot));
        assert_eq!(store.update_calls().await, 0);
        assert!(manager
            .snapshot()
            .iter()
            .all(|hotspot| hotspot.label.is_none()));
        assert_eq!(manager.owned_id().await, own.id);
        manager.deactivate().await;
    }

    #[tokio::test]
    async fn rename_owned_hotspot_writes_through() {
        let store = Arc::new(MemoryHotspotStore::new());
        let manager = manager_with(&store, FixedGeolocation::granted(UNLV));
        manager.initialize().await;
        let own = manager.report_hotspot().await.unwrap();

        let label = manager
            .rename_owned_hotspot("  Crowd at Rec  ")
            .await
            .unwrap();

        assert_eq!(label, "Crowd at Rec");
        let local = manager.snapshot();
        assert_eq!(local[0].label.as_deref(), Some("Crowd at Rec"));
        assert_eq!(local[0].timestamp, own.timestamp);
        assert_eq!(store.rows().await[0].label.as_deref(), Some("Crowd at Rec"));

        let blank = manager.rename_owned_hotspot("   ").await.unwrap();
        assert_eq!(blank, "Hot Spot");
        manager.deactivate().await;
    }

    #[tokio::test]
    async fn rename_store_failure_keeps_local_label() {
        let store = Arc::new(MemoryHotspotStore::new());
        let manager = manager_with(&store, FixedGeolocation::granted(UNLV));
        manager.initialize().await;
        manager.report_hotspot().await.unwrap();
        store.set_failing(StoreOperation::Update, true).await;

        let result = manager.rename_owned_hotspot("Crowd at Rec").await;

        assert!(matches!(result, Err(HotspotError::StoreUnavailable(_))));
        assert_eq!(manager.snapshot()[0].label, None);
        manager.deactivate().await;
    }

    #[tokio::test]
    async fn stale_feed_row_is_removed_by_sweep() {
        let store = Arc::new(MemoryHotspotStore::new());
        let manager = manager_with(&store, FixedGeolocation::granted(UNLV));
        manager.initialize().await;

        let stale = store
            .insert(&aged(ChronoDuration::minutes(21)))
            .await
            .unwrap();
        wait_for_hotspots(&manager, |hotspots| hotspots.len() == 1).await;
        assert_eq!(manager.snapshot()[0].id, stale.id);

        assert_eq!(manager.sweep().await, 1);
        assert!(manager.snapshot().is_empty());
        assert_eq!(manager.sweep().await, 0);
        manager.deactivate().await;
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_timer_runs_after_feed_disconnects() {
        let store = Arc::new(MemoryHotspotStore::new());
        let manager = manager_with(&store, FixedGeolocation::granted(UNLV));
        manager.initialize().await;

        store
            .insert(&aged(ChronoDuration::minutes(21)))
            .await
            .unwrap();
        wait_for_hotspots(&manager, |hotspots| hotspots.len() == 1).await;

        store.disconnect_subscribers().await;
        let mut feed = manager.watch_feed();
        feed.wait_for(|state| *state == FeedState::Disconnected)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(11)).await;
        wait_for_hotspots(&manager, <[Hotspot]>::is_empty).await;
        manager.deactivate().await;
    }

    #[tokio::test]
    async fn deactivate_releases_subscription() {
        let store = Arc::new(MemoryHotspotStore::new());
        let manager = manager_with(&store, FixedGeolocation::granted(UNLV));
        manager.initialize().await;
        assert_eq!(store.subscriber_count().await, 1);

        manager.deactivate().await;

        assert!(!manager.is_active().await);
        assert_eq!(manager.feed_state(), FeedState::Inactive);
        assert_eq!(store.subscriber_count().await, 0);

        store.insert(&aged(ChronoDuration::minutes(1))).await.unwrap();
        assert!(manager.snapshot().is_empty());
        manager.deactivate().await;
    }

    #[tokio::test]
    async fn reinitialize_does_not_leak_handlers() {
        let store = Arc::new(MemoryHotspotStore::new());
        let manager = manager_with(&store, FixedGeolocation::granted(UNLV));
        manager.initialize().await;
        manager.deactivate().await;
        manager.initialize().await;
        manager.initialize().await;

        assert_eq!(store.subscriber_count().await, 1);

        let row = store.insert(&aged(ChronoDuration::minutes(1))).await.unwrap();
        wait_for_hotspots(&manager, |hotspots| hotspots.len() == 1).await;
        assert_eq!(manager.snapshot()[0].id, row.id);
        manager.deactivate().await;
    }

    #[tokio::test]
    async fn ownership_survives_reactivation() {
        let store = Arc::new(MemoryHotspotStore::new());
        let manager = manager_with(&store, FixedGeolocation::granted(UNLV));
        manager.initialize().await;
        let own = manager.report_hotspot().await.unwrap();
        manager.deactivate().await;

        manager.initialize().await;

        assert_eq!(manager.owned_id().await, own.id);
        assert_eq!(manager.snapshot().len(), 1);
        assert!(manager.rename_owned_hotspot("Still mine").await.is_ok());
        manager.deactivate().await;
    }
}
