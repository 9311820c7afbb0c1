//! Immutable snapshot cache using moka
//!
//! Snapshots never change once created, so entries are keyed by version id
//! and never need invalidation for correctness.

use crate::error::ServiceResult;
use crate::service::TraceService;
use moka::future::Cache;
use std::sync::Arc;
use trace_model::RelationshipSnapshot;

/// Version-id keyed snapshot cache
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    inner: Cache<String, Arc<RelationshipSnapshot>>,
}

impl SnapshotCache {
    /// Create cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    pub async fn insert(&self, snapshot: RelationshipSnapshot) -> Arc<RelationshipSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.inner
            .insert(snapshot.version_id.clone(), Arc::clone(&snapshot))
            .await;
        snapshot
    }

    #[inline]
    pub async fn get(&self, version_id: &str) -> Option<Arc<RelationshipSnapshot>> {
        self.inner.get(version_id).await
    }

    /// Cached snapshot, or fetch it through `service` and remember it
    ///
    /// Failed fetches are not cached.
    ///
    /// # Errors
    ///
    /// Propagates the service error of a cache miss.
    pub async fn get_or_fetch(
        &self,
        service: &dyn TraceService,
        version_id: &str,
    ) -> ServiceResult<Arc<RelationshipSnapshot>> {
        if let Some(cached) = self.get(version_id).await {
            tracing::debug!(version_id, "Snapshot cache hit");
            return Ok(cached);
        }
        let snapshot = service.version_snapshot(version_id).await?;
        Ok(self.insert(snapshot).await)
    }

    #[inline]
    pub async fn invalidate(&self, version_id: &str) {
        self.inner.invalidate(version_id).await;
    }
}

impl Default for SnapshotCache {
    /// Cache with default capacity (1,024 entries)
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_then_get_by_version() {
        let cache = SnapshotCache::new(16);
        cache.insert(RelationshipSnapshot::new("B1", "B1_v1")).await;

        let hit = cache.get("B1_v1").await.unwrap();
        assert_eq!(hit.artifact_id.as_str(), "B1");
        assert!(cache.get("B1_v2").await.is_none());
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache = SnapshotCache::default();
        cache.insert(RelationshipSnapshot::new("B1", "B1_v1")).await;
        cache.invalidate("B1_v1").await;
        assert!(cache.get("B1_v1").await.is_none());
    }
}
