/// Activity Repository
///
/// Data-layer seam for the scoring engine: content items, engagement
/// samples and the interaction log, fetched for a tenant and time range.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use engagement_core::{
    ContentItem, EngagementSample, InteractionKind, InteractionRecord, TimeRange,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::Result;

/// Read-only access to materialized activity data.
///
/// Implementations return plain rows; all scoring happens in the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn get_content(&self, content_id: Uuid) -> Result<Option<ContentItem>>;

    async fn list_tenant_content(&self, tenant_id: Uuid) -> Result<Vec<ContentItem>>;

    /// Items created at or after `since`, newest first, optionally scoped to one tenant.
    async fn list_created_since(
        &self,
        tenant_id: Option<Uuid>,
        since: DateTime<Utc>,
    ) -> Result<Vec<ContentItem>>;

    async fn fetch_samples(
        &self,
        content_ids: &[Uuid],
        range: TimeRange,
    ) -> Result<Vec<EngagementSample>>;

    async fn fetch_interactions(
        &self,
        content_ids: &[Uuid],
        range: TimeRange,
    ) -> Result<Vec<InteractionRecord>>;
}

/// Serialized form of a full activity export
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivitySnapshot {
    #[serde(default)]
    pub items: Vec<ContentItem>,
    #[serde(default)]
    pub samples: Vec<EngagementSample>,
    #[serde(default)]
    pub interactions: Vec<InteractionRecord>,
}

/// In-memory repository keyed by content id
#[derive(Default)]
pub struct InMemoryActivityRepo {
    items: DashMap<Uuid, ContentItem>,
    samples: DashMap<Uuid, Vec<EngagementSample>>,
    interactions: DashMap<Uuid, Vec<InteractionRecord>>,
}

impl InMemoryActivityRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: ActivitySnapshot) -> Self {
        let repo = Self::new();
        for item in snapshot.items {
            repo.insert_content(item);
        }
        for sample in snapshot.samples {
            repo.record_sample(sample);
        }
        for record in snapshot.interactions {
            repo.record_interaction(record);
        }
        repo
    }

    /// Load a JSON snapshot from disk
    pub async fn from_snapshot_file(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        let snapshot: ActivitySnapshot = serde_json::from_str(&raw)?;

        info!(
            path = %path.display(),
            items = snapshot.items.len(),
            samples = snapshot.samples.len(),
            interactions = snapshot.interactions.len(),
            "Loaded activity snapshot"
        );

        Ok(Self::from_snapshot(snapshot))
    }

    pub fn insert_content(&self, item: ContentItem) {
        self.items.insert(item.id, item);
    }

    pub fn record_sample(&self, sample: EngagementSample) {
        self.samples
            .entry(sample.content_id)
            .or_default()
            .push(sample);
    }

    pub fn record_interaction(&self, record: InteractionRecord) {
        self.interactions
            .entry(record.content_id)
            .or_default()
            .push(record);
    }

    /// Undo a reader action (unlike, unfavorite...).
    ///
    /// Removes the most recent matching record and returns whether one existed.
    pub fn retract_interaction(
        &self,
        content_id: Uuid,
        kind: InteractionKind,
        user_id: Uuid,
    ) -> bool {
        let Some(mut records) = self.interactions.get_mut(&content_id) else {
            return false;
        };

        let position = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.kind == kind && r.user_id == Some(user_id))
            .max_by_key(|(_, r)| r.created_at)
            .map(|(idx, _)| idx);

        match position {
            Some(idx) => {
                records.remove(idx);
                debug!(%content_id, %kind, %user_id, "Retracted interaction");
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl ActivityRepository for InMemoryActivityRepo {
    async fn get_content(&self, content_id: Uuid) -> Result<Option<ContentItem>> {
        Ok(self.items.get(&content_id).map(|entry| entry.value().clone()))
    }

    async fn list_tenant_content(&self, tenant_id: Uuid) -> Result<Vec<ContentItem>> {
        let mut items: Vec<ContentItem> = self
            .items
            .iter()
            .filter(|entry| entry.tenant_id == tenant_id)
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn list_created_since(
        &self,
        tenant_id: Option<Uuid>,
        since: DateTime<Utc>,
    ) -> Result<Vec<ContentItem>> {
        let mut items: Vec<ContentItem> = self
            .items
            .iter()
            .filter(|entry| tenant_id.map_or(true, |t| entry.tenant_id == t))
            .filter(|entry| entry.created_at >= since)
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn fetch_samples(
        &self,
        content_ids: &[Uuid],
        range: TimeRange,
    ) -> Result<Vec<EngagementSample>> {
        let mut rows = Vec::new();
        for id in content_ids {
            if let Some(samples) = self.samples.get(id) {
                rows.extend(
                    samples
                        .iter()
                        .filter(|s| range.contains(s.recorded_at))
                        .cloned(),
                );
            }
        }
        Ok(rows)
    }

    async fn fetch_interactions(
        &self,
        content_ids: &[Uuid],
        range: TimeRange,
    ) -> Result<Vec<InteractionRecord>> {
        let mut rows = Vec::new();
        for id in content_ids {
            if let Some(records) = self.interactions.get(id) {
                rows.extend(
                    records
                        .iter()
                        .filter(|r| range.contains(r.created_at))
                        .cloned(),
                );
            }
        }
        Ok(rows)
    }
}
