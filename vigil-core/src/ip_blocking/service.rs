use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vigil_common::VigilError;
use vigil_db_entities::IpBlock::{self, BlockOrigin};
use vigil_db_entities::SecurityEvent::{EventKind, Severity};

use super::cache::{BlockCache, CachedBlock};
use crate::event_log::{EventLog, NewSecurityEvent};
use crate::params::{keys, ParameterStore};

#[derive(Clone, Debug)]
pub struct BlockStats {
    pub active_total: u64,
    pub permanent_total: u64,
    pub attempts_since_block: u64,
}

/// Authority on whether an origin address is currently denied.
///
/// Decisions go through an in-process snapshot first; a snapshot hit is
/// revalidated against the database so an expired block is never enforced
/// past its expiry. The snapshot refresh and the per-address revalidation
/// are separate queries, so two concurrent checks during a refresh can
/// briefly disagree with the database; the disagreement is bounded by the
/// snapshot TTL.
pub struct IpBlockService {
    db: Arc<Mutex<DatabaseConnection>>,
    params: Arc<ParameterStore>,
    events: Arc<EventLog>,
    cache: BlockCache,
}

impl IpBlockService {
    /// Create the service and prime the snapshot from the database.
    pub async fn new(
        db: Arc<Mutex<DatabaseConnection>>,
        params: Arc<ParameterStore>,
        events: Arc<EventLog>,
        cache_ttl: Duration,
    ) -> Result<Self, VigilError> {
        let service = Self {
            db,
            params,
            events,
            cache: BlockCache::new(cache_ttl),
        };
        let snapshot = service.load_snapshot().await?;
        service.cache.replace(snapshot).await;
        Ok(service)
    }

    async fn load_snapshot(&self) -> Result<Vec<CachedBlock>, VigilError> {
        let db = self.db.lock().await;
        let blocks = IpBlock::Entity::find()
            .filter(IpBlock::Column::Active.eq(true))
            .all(&*db)
            .await?;
        Ok(blocks.iter().map(CachedBlock::from_model).collect())
    }

    /// Refresh the snapshot if its TTL has elapsed. A failed refresh keeps
    /// the previous snapshot: availability is preferred over freshness.
    pub async fn refresh_if_due(&self) {
        if !self.cache.needs_refresh().await {
            return;
        }
        match self.load_snapshot().await {
            Ok(snapshot) => {
                debug!(blocks = snapshot.len(), "Refreshed blocklist snapshot");
                self.cache.replace(snapshot).await;
            }
            Err(error) => {
                warn!(%error, "Blocklist refresh failed, keeping previous snapshot");
            }
        }
    }

    /// Fast-path check used on every inbound request.
    pub async fn is_blocked(&self, ip: &IpAddr) -> Result<bool, VigilError> {
        self.refresh_if_due().await;

        let ip_str = ip.to_string();
        if self.cache.get(&ip_str).await.is_none() {
            return Ok(false);
        }

        // Snapshot hit: confirm against the database before denying
        let db = self.db.lock().await;
        let block = IpBlock::Entity::find()
            .filter(IpBlock::Column::IpAddress.eq(&ip_str))
            .one(&*db)
            .await?;

        let Some(block) = block.filter(|b| b.active) else {
            drop(db);
            self.cache.remove(&ip_str).await;
            return Ok(false);
        };

        let now = Utc::now();
        if block.is_expired(now) {
            let mut active = block.into_active_model();
            active.active = Set(false);
            active.updated_at = Set(now);
            active.update(&*db).await?;
            drop(db);
            self.cache.remove(&ip_str).await;
            debug!(ip = %ip, "Block expired, lazily deactivated");
            return Ok(false);
        }

        let attempt_count = block.attempt_count;
        let mut active = block.into_active_model();
        active.attempt_count = Set(attempt_count + 1);
        active.update(&*db).await?;
        Ok(true)
    }

    /// Place a block by administrator action. A non-permanent block with no
    /// explicit duration uses the configured auto-block duration.
    pub async fn block_manually(
        &self,
        ip: &IpAddr,
        reason: &str,
        admin_id: Uuid,
        permanent: bool,
        duration_minutes: Option<i64>,
    ) -> Result<IpBlock::Model, VigilError> {
        let duration = match duration_minutes {
            Some(minutes) => minutes,
            None => {
                self.params
                    .get_i64(keys::BLOCK_AUTO_DURATION_MINUTES, 30)
                    .await
            }
        };
        self.place_block(
            ip,
            reason,
            BlockOrigin::Admin,
            Some(admin_id),
            permanent,
            duration,
        )
        .await
    }

    /// Place a block from policy logic. Always time-bounded.
    pub async fn auto_block(
        &self,
        ip: &IpAddr,
        reason: &str,
        duration_minutes: i64,
    ) -> Result<IpBlock::Model, VigilError> {
        self.place_block(ip, reason, BlockOrigin::System, None, false, duration_minutes)
            .await
    }

    async fn place_block(
        &self,
        ip: &IpAddr,
        reason: &str,
        origin: BlockOrigin,
        admin_id: Option<Uuid>,
        permanent: bool,
        duration_minutes: i64,
    ) -> Result<IpBlock::Model, VigilError> {
        let ip_str = ip.to_string();
        let now = Utc::now();
        let expires_at = if permanent {
            None
        } else {
            Some(now + chrono::Duration::minutes(duration_minutes))
        };

        let db = self.db.lock().await;
        let existing = IpBlock::Entity::find()
            .filter(IpBlock::Column::IpAddress.eq(&ip_str))
            .one(&*db)
            .await?;

        let block = match existing {
            // One row per address: an in-force block is updated, never duplicated
            Some(row) if row.active && !row.is_expired(now) => {
                let promoted = row.permanent || permanent;
                let keep_admin = row.permanent;
                let mut active = row.into_active_model();
                active.reason = Set(reason.to_owned());
                active.permanent = Set(promoted);
                active.expires_at = Set(if promoted { None } else { expires_at });
                if !keep_admin {
                    active.origin = Set(origin);
                    active.admin_id = Set(admin_id);
                }
                active.updated_at = Set(now);
                active.update(&*db).await?
            }
            // Re-triggered after expiry or unblock: reactivate the row
            Some(row) => {
                let mut active = row.into_active_model();
                active.reason = Set(reason.to_owned());
                active.origin = Set(origin);
                active.admin_id = Set(admin_id);
                active.permanent = Set(permanent);
                active.expires_at = Set(expires_at);
                active.attempt_count = Set(0);
                active.active = Set(true);
                active.blocked_at = Set(now);
                active.updated_at = Set(now);
                active.update(&*db).await?
            }
            None => {
                IpBlock::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    ip_address: Set(ip_str.clone()),
                    reason: Set(reason.to_owned()),
                    origin: Set(origin),
                    admin_id: Set(admin_id),
                    permanent: Set(permanent),
                    expires_at: Set(expires_at),
                    attempt_count: Set(0),
                    active: Set(true),
                    blocked_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&*db)
                .await?
            }
        };
        drop(db);

        self.cache.insert(CachedBlock::from_model(&block)).await;

        self.events
            .record(NewSecurityEvent {
                metadata: serde_json::json!({
                    "origin": block.origin,
                    "permanent": block.permanent,
                    "expires_at": block.expires_at,
                }),
                ..NewSecurityEvent::new(
                    EventKind::IpBlocked,
                    Severity::High,
                    ip_str,
                    format!("IP {ip} blocked: {reason}"),
                )
            })
            .await?;

        info!(
            ip = %ip,
            origin = ?block.origin,
            permanent = block.permanent,
            expires_at = ?block.expires_at,
            "IP blocked"
        );

        Ok(block)
    }

    /// Lift a block. Returns false when no block was in force.
    pub async fn unblock(&self, ip: &IpAddr, admin_id: Option<Uuid>) -> Result<bool, VigilError> {
        let ip_str = ip.to_string();

        let db = self.db.lock().await;
        let block = IpBlock::Entity::find()
            .filter(IpBlock::Column::IpAddress.eq(&ip_str))
            .filter(IpBlock::Column::Active.eq(true))
            .one(&*db)
            .await?;

        let Some(block) = block else {
            drop(db);
            self.cache.remove(&ip_str).await;
            return Ok(false);
        };

        let mut active = block.into_active_model();
        active.active = Set(false);
        active.updated_at = Set(Utc::now());
        active.update(&*db).await?;
        drop(db);

        self.cache.remove(&ip_str).await;

        self.events
            .record(NewSecurityEvent {
                user_id: admin_id,
                ..NewSecurityEvent::new(
                    EventKind::IpUnblocked,
                    Severity::Medium,
                    ip_str,
                    format!("IP {ip} unblocked"),
                )
            })
            .await?;

        info!(ip = %ip, admin = ?admin_id, "IP unblocked");
        Ok(true)
    }

    /// Deactivate all blocks past their expiry. Re-running immediately is a
    /// no-op.
    pub async fn sweep_expired(&self) -> Result<u64, VigilError> {
        let now = Utc::now();

        let db = self.db.lock().await;
        let result = IpBlock::Entity::update_many()
            .set(IpBlock::ActiveModel {
                active: Set(false),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(IpBlock::Column::Active.eq(true))
            .filter(IpBlock::Column::Permanent.eq(false))
            .filter(IpBlock::Column::ExpiresAt.lte(now))
            .exec(&*db)
            .await?;
        drop(db);

        self.cache.clear_expired().await;

        if result.rows_affected > 0 {
            info!(expired = result.rows_affected, "Expired IP blocks deactivated");
        }
        Ok(result.rows_affected)
    }

    pub async fn stats(&self) -> Result<BlockStats, VigilError> {
        let db = self.db.lock().await;

        let active_total = IpBlock::Entity::find()
            .filter(IpBlock::Column::Active.eq(true))
            .count(&*db)
            .await?;
        let permanent_total = IpBlock::Entity::find()
            .filter(IpBlock::Column::Active.eq(true))
            .filter(IpBlock::Column::Permanent.eq(true))
            .count(&*db)
            .await?;
        let active_blocks = IpBlock::Entity::find()
            .filter(IpBlock::Column::Active.eq(true))
            .all(&*db)
            .await?;

        Ok(BlockStats {
            active_total,
            permanent_total,
            attempts_since_block: active_blocks
                .iter()
                .map(|b| b.attempt_count as u64)
                .sum(),
        })
    }
}
