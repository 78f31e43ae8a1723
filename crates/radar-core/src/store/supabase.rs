//! Supabase (PostgREST) hotspot table client.

use std::collections::BTreeSet;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::time::MissedTickBehavior;

use super::{
    insert_channel, HotspotStore, InsertSender, InsertSubscription, QueryFilter, StoreError,
    StoreResult,
};
use crate::config::RadarConfig;
use crate::models::{format_timestamp, Hotspot, HotspotId, HotspotPatch, NewHotspot};
use crate::util::{compact_text, is_http_url, normalize_text_option};

/// How often the insert feed polls for new rows unless configured otherwise.
pub const DEFAULT_FEED_POLL_INTERVAL: Duration = Duration::from_secs(5);

const SELECT_COLUMNS: &str = "id,latitude,longitude,timestamp,label";

/// How many ids below the high-water mark each feed poll re-reads. Identity ids
/// are assigned at insert time, so a lower id can commit after a higher one.
const FEED_LOOKBACK_IDS: i64 = 50;

#[derive(Clone)]
pub struct SupabaseHotspotStore {
    table_url: String,
    anon_key: String,
    client: Client,
    poll_interval: Duration,
}

impl std::fmt::Debug for SupabaseHotspotStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SupabaseHotspotStore")
            .field("table_url", &self.table_url)
            .field("anon_key", &"[REDACTED]")
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl SupabaseHotspotStore {
    pub fn new(url: &str, anon_key: impl Into<String>, table: &str) -> StoreResult<Self> {
        let table_url = normalize_rest_url(url, table)?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(StoreError::InvalidConfiguration(
                "Supabase anon key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            table_url,
            anon_key,
            client: Client::builder().build()?,
            poll_interval: DEFAULT_FEED_POLL_INTERVAL,
        })
    }

    /// Build from resolved configuration; `NotConfigured` when URL or key is missing.
    pub fn from_config(config: &RadarConfig) -> StoreResult<Self> {
        let url = normalize_text_option(config.supabase_url.clone());
        let anon_key = normalize_text_option(config.supabase_anon_key.clone());
        let (Some(url), Some(anon_key)) = (url, anon_key) else {
            return Err(StoreError::NotConfigured);
        };
        Ok(Self::new(&url, anon_key, config.table_name())?
            .with_poll_interval(config.feed_poll_interval()))
    }

    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn table_url(&self) -> &str {
        &self.table_url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .header("Accept", "application/json")
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> StoreResult<T> {
        let response = self.authorized(request).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api(parse_api_error(status, &body)));
        }
        Ok(response.json::<T>().await?)
    }

    /// Ids of the newest `limit` rows, newest first.
    async fn recent_ids(&self, limit: i64) -> StoreResult<Vec<HotspotId>> {
        let rows: Vec<IdOnly> = self
            .send_json(self.client.get(&self.table_url).query(&[
                ("select", "id".to_string()),
                ("order", "id.desc".to_string()),
                ("limit", limit.to_string()),
            ]))
            .await?;
        Ok(rows.into_iter().map(|row| row.id).collect())
    }

    async fn fetch_after(&self, after: Option<HotspotId>) -> StoreResult<Vec<Hotspot>> {
        let mut request = self
            .client
            .get(&self.table_url)
            .query(&[("select", SELECT_COLUMNS), ("order", "id.asc")]);
        if let Some(after) = after {
            request = request.query(&[("id", format!("gt.{after}"))]);
        }
        self.send_json(request).await
    }
}

impl HotspotStore for SupabaseHotspotStore {
    async fn query_all(&self, filter: &QueryFilter) -> StoreResult<Vec<Hotspot>> {
        let mut request = self
            .client
            .get(&self.table_url)
            .query(&[("select", SELECT_COLUMNS), ("order", "id.asc")]);
        if let Some(since) = filter.since {
            request = request.query(&[("timestamp", format!("gte.{}", format_timestamp(since)))]);
        }
        self.send_json(request).await
    }

    async fn insert(&self, hotspot: &NewHotspot) -> StoreResult<Hotspot> {
        let rows: Vec<Hotspot> = self
            .send_json(
                self.client
                    .post(&self.table_url)
                    .header("Prefer", "return=representation")
                    .json(hotspot),
            )
            .await?;

        let row = rows.into_iter().next().ok_or_else(|| {
            StoreError::InvalidPayload("insert response did not include the new row".to_string())
        })?;
        if row.id.is_none() {
            return Err(StoreError::InvalidPayload(
                "insert response did not include an id".to_string(),
            ));
        }
        Ok(row)
    }

    async fn update_by_id(&self, id: HotspotId, patch: &HotspotPatch) -> StoreResult<()> {
        let rows: Vec<IdOnly> = self
            .send_json(
                self.client
                    .patch(&self.table_url)
                    .query(&[("id", format!("eq.{id}")), ("select", "id".to_string())])
                    .header("Prefer", "return=representation")
                    .json(patch),
            )
            .await?;

        if rows.is_empty() {
            return Err(StoreError::Api(format!("no hotspot with id {id}")));
        }
        Ok(())
    }

    async fn subscribe_on_insert(&self) -> StoreResult<InsertSubscription> {
        let cursor = FeedCursor::seeded(self.recent_ids(FEED_LOOKBACK_IDS).await?);
        let (sender, subscription) = insert_channel();
        tokio::spawn(poll_inserts(self.clone(), cursor, sender));
        tracing::debug!(
            "Polling {} for inserts every {:?}",
            self.table_url,
            self.poll_interval
        );
        Ok(subscription)
    }
}

/// Position of a polling insert feed.
///
/// Tracks the highest id seen plus every id already delivered inside the
/// lookback window, so re-read rows are filtered out and late commits are not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct FeedCursor {
    high_water: Option<HotspotId>,
    delivered: BTreeSet<HotspotId>,
}

impl FeedCursor {
    /// Cursor that treats `existing` rows as already delivered.
    fn seeded(existing: impl IntoIterator<Item = HotspotId>) -> Self {
        let mut cursor = Self::default();
        for id in existing {
            cursor.mark(id);
        }
        cursor.prune();
        cursor
    }

    /// Exclusive lower bound for the next poll.
    fn poll_after(&self) -> Option<HotspotId> {
        self.high_water
            .map(|high| HotspotId::new(high.get().saturating_sub(FEED_LOOKBACK_IDS)))
    }

    /// Rows from one poll that were not delivered before, in the order given.
    fn accept(&mut self, rows: Vec<Hotspot>) -> Vec<Hotspot> {
        let fresh = rows
            .into_iter()
            .filter(|row| row.id.is_none_or(|id| self.mark(id)))
            .collect();
        self.prune();
        fresh
    }

    fn mark(&mut self, id: HotspotId) -> bool {
        self.high_water = Some(self.high_water.map_or(id, |high| high.max(id)));
        self.delivered.insert(id)
    }

    fn prune(&mut self) {
        if let Some(floor) = self.poll_after() {
            self.delivered = self.delivered.split_off(&floor);
        }
    }
}

async fn poll_inserts(
    store: SupabaseHotspotStore,
    mut cursor: FeedCursor,
    sender: InsertSender,
) {
    let mut ticker = tokio::time::interval(store.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = sender.closed() => break,
            _ = ticker.tick() => {}
        }

        match store.fetch_after(cursor.poll_after()).await {
            Ok(rows) => {
                for row in cursor.accept(rows) {
                    if !sender.send(row) {
                        return;
                    }
                }
            }
            Err(error) => tracing::warn!("Hotspot insert poll failed: {}", error),
        }
    }
    tracing::debug!("Hotspot insert poller stopped");
}

/// Build the PostgREST endpoint for `table` under a Supabase project URL.
pub fn normalize_rest_url(url: &str, table: &str) -> StoreResult<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(StoreError::InvalidConfiguration(
            "Supabase URL must not be empty".to_string(),
        ));
    }
    if !is_http_url(trimmed) {
        return Err(StoreError::InvalidConfiguration(
            "Supabase URL must include http:// or https://".to_string(),
        ));
    }

    let table = table.trim();
    if table.is_empty()
        || !table
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    {
        return Err(StoreError::InvalidConfiguration(format!(
            "invalid hotspot table name '{table}'"
        )));
    }

    let base = trimmed.strip_suffix("/rest/v1").unwrap_or(trimmed);
    Ok(format!("{base}/rest/v1/{table}"))
}

#[derive(Debug, Deserialize)]
struct IdOnly {
    id: HotspotId,
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    message: Option<String>,
    error: Option<String>,
    hint: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<PostgrestErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return match normalize_text_option(payload.hint) {
                Some(hint) => format!("{} ({}; hint: {hint})", message.trim(), status.as_u16()),
                None => format!("{} ({})", message.trim(), status.as_u16()),
            };
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
