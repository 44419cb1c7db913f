use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use vigil_db_entities::IpBlock;

/// Snapshot of one active block, enough to answer the fast path
#[derive(Clone, Debug)]
pub struct CachedBlock {
    pub ip_address: String,
    pub reason: String,
    pub permanent: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedBlock {
    pub fn from_model(model: &IpBlock::Model) -> Self {
        Self {
            ip_address: model.ip_address.clone(),
            reason: model.reason.clone(),
            permanent: model.permanent,
            expires_at: model.expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.permanent && self.expires_at.map(|e| e <= now).unwrap_or(false)
    }
}

/// In-process set of blocked addresses, refreshed wholesale from the
/// database once the TTL elapses. Reads tolerate staleness up to the TTL.
pub struct BlockCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedBlock>>,
    refreshed_at: RwLock<Option<Instant>>,
}

impl BlockCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            refreshed_at: RwLock::new(None),
        }
    }

    pub async fn needs_refresh(&self) -> bool {
        match *self.refreshed_at.read().await {
            Some(at) => at.elapsed() >= self.ttl,
            None => true,
        }
    }

    /// Swap in a fresh snapshot and restart the TTL clock.
    pub async fn replace(&self, blocks: Vec<CachedBlock>) {
        let mut entries = self.entries.write().await;
        entries.clear();
        for block in blocks {
            entries.insert(block.ip_address.clone(), block);
        }
        drop(entries);
        *self.refreshed_at.write().await = Some(Instant::now());
    }

    /// Fast-path lookup. Expired entries are treated as absent.
    pub async fn get(&self, ip: &str) -> Option<CachedBlock> {
        let entries = self.entries.read().await;
        if let Some(block) = entries.get(ip) {
            if !block.is_expired(Utc::now()) {
                return Some(block.clone());
            }
        }
        None
    }

    pub async fn insert(&self, block: CachedBlock) {
        let mut entries = self.entries.write().await;
        entries.insert(block.ip_address.clone(), block);
    }

    pub async fn remove(&self, ip: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(ip);
    }

    pub async fn clear_expired(&self) {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, block| !block.is_expired(now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(ip: &str, expires_at: Option<DateTime<Utc>>, permanent: bool) -> CachedBlock {
        CachedBlock {
            ip_address: ip.to_string(),
            reason: "test".to_string(),
            permanent,
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_get_returns_none_for_expired() {
        let cache = BlockCache::new(Duration::from_secs(60));
        cache
            .insert(block(
                "192.168.1.1",
                Some(Utc::now() - chrono::Duration::hours(1)),
                false,
            ))
            .await;
        assert!(cache.get("192.168.1.1").await.is_none());
    }

    #[tokio::test]
    async fn test_get_returns_some_for_active() {
        let cache = BlockCache::new(Duration::from_secs(60));
        cache
            .insert(block(
                "192.168.1.1",
                Some(Utc::now() + chrono::Duration::hours(1)),
                false,
            ))
            .await;
        assert!(cache.get("192.168.1.1").await.is_some());
    }

    #[tokio::test]
    async fn test_permanent_block_never_expires() {
        let cache = BlockCache::new(Duration::from_secs(60));
        cache.insert(block("192.168.1.1", None, true)).await;
        assert!(cache.get("192.168.1.1").await.is_some());
    }

    #[tokio::test]
    async fn test_needs_refresh_until_first_replace() {
        let cache = BlockCache::new(Duration::from_secs(60));
        assert!(cache.needs_refresh().await);
        cache.replace(vec![]).await;
        assert!(!cache.needs_refresh().await);
    }

    #[tokio::test]
    async fn test_replace_is_wholesale() {
        let cache = BlockCache::new(Duration::from_secs(60));
        cache
            .insert(block(
                "10.0.0.1",
                Some(Utc::now() + chrono::Duration::hours(1)),
                false,
            ))
            .await;
        cache
            .replace(vec![block(
                "10.0.0.2",
                Some(Utc::now() + chrono::Duration::hours(1)),
                false,
            )])
            .await;
        assert!(cache.get("10.0.0.1").await.is_none());
        assert!(cache.get("10.0.0.2").await.is_some());
    }

    #[tokio::test]
    async fn test_clear_expired_retains_active() {
        let cache = BlockCache::new(Duration::from_secs(60));
        cache
            .insert(block(
                "10.0.0.1",
                Some(Utc::now() - chrono::Duration::minutes(1)),
                false,
            ))
            .await;
        cache
            .insert(block(
                "10.0.0.2",
                Some(Utc::now() + chrono::Duration::minutes(5)),
                false,
            ))
            .await;
        cache.clear_expired().await;
        assert!(cache.get("10.0.0.2").await.is_some());
        // the expired entry is physically gone, not just filtered
        let entries = cache.entries.read().await;
        assert!(!entries.contains_key("10.0.0.1"));
    }
}
