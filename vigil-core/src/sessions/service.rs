use std::net::IpAddr;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;
use vigil_common::helpers::hash::hash_token;
use vigil_common::{Secret, VigilError};
use vigil_db_entities::SecurityEvent::{EventKind, Severity};
use vigil_db_entities::Session;

use super::user_agent::parse_user_agent;
use crate::event_log::{EventLog, NewSecurityEvent};
use crate::params::{keys, ParameterStore};

/// Owns the set of live login sessions per user.
///
/// Raw credentials never touch storage: only their SHA-256 is persisted and
/// compared. The per-user cap is a hard ceiling inclusive of the session
/// being created; the least-recently-active sessions are deactivated to
/// make room. Expiry is absolute from creation, independent of activity.
pub struct SessionService {
    db: Arc<Mutex<DatabaseConnection>>,
    params: Arc<ParameterStore>,
    events: Arc<EventLog>,
}

impl SessionService {
    pub fn new(
        db: Arc<Mutex<DatabaseConnection>>,
        params: Arc<ParameterStore>,
        events: Arc<EventLog>,
    ) -> Self {
        Self { db, params, events }
    }

    pub async fn create_session(
        &self,
        user_id: Uuid,
        token: &Secret<String>,
        ip: &IpAddr,
        user_agent: &str,
    ) -> Result<Session::Model, VigilError> {
        let cap = self
            .params
            .get_i64(keys::SESSION_MAX_ACTIVE_PER_USER, 5)
            .await
            .max(1) as usize;
        let lifetime_days = self
            .params
            .get_i64(keys::SESSION_LIFETIME_DAYS, 30)
            .await
            .max(1);

        let now = Utc::now();
        let device = parse_user_agent(user_agent);

        let (session, evicted) = {
            let db = self.db.lock().await;

            let active = Session::Entity::find()
                .filter(Session::Column::UserId.eq(user_id))
                .filter(Session::Column::Active.eq(true))
                .filter(Session::Column::ExpiresAt.gt(now))
                .order_by_asc(Session::Column::LastActivity)
                .all(&*db)
                .await?;

            // Make room so the new session fits under the cap
            let evict = (active.len() + 1).saturating_sub(cap);
            let evicted: Vec<Uuid> = active.iter().take(evict).map(|s| s.id).collect();
            if !evicted.is_empty() {
                Session::Entity::update_many()
                    .set(Session::ActiveModel {
                        active: Set(false),
                        ..Default::default()
                    })
                    .filter(Session::Column::Id.is_in(evicted.clone()))
                    .exec(&*db)
                    .await?;
            }

            let session = Session::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                token_hash: Set(hash_token(token.expose_secret())),
                remote_ip: Set(ip.to_string()),
                user_agent: Set(user_agent.to_owned()),
                device: Set(device.device),
                browser: Set(device.browser),
                os: Set(device.os),
                active: Set(true),
                last_activity: Set(now),
                created: Set(now),
                expires_at: Set(now + chrono::Duration::days(lifetime_days)),
            }
            .insert(&*db)
            .await?;

            (session, evicted)
        };

        if !evicted.is_empty() {
            info!(
                user_id = %user_id,
                evicted = evicted.len(),
                cap,
                "Evicted least-recently-active sessions over cap"
            );
            self.events
                .record(NewSecurityEvent {
                    user_id: Some(user_id),
                    metadata: serde_json::json!({
                        "evicted_session_ids": evicted,
                        "cap": cap,
                    }),
                    ..NewSecurityEvent::new(
                        EventKind::SessionRevoked,
                        Severity::Low,
                        ip.to_string(),
                        format!("Evicted {} sessions over per-user cap", evicted.len()),
                    )
                })
                .await?;
        }

        self.events
            .record(NewSecurityEvent {
                user_id: Some(user_id),
                metadata: serde_json::json!({
                    "session_id": session.id,
                    "device": session.device,
                    "browser": session.browser,
                    "os": session.os,
                }),
                ..NewSecurityEvent::new(
                    EventKind::SessionCreated,
                    Severity::Low,
                    ip.to_string(),
                    "Session created".to_owned(),
                )
            })
            .await?;

        Ok(session)
    }

    /// Look a session up by its raw credential. Sessions past their
    /// absolute expiry are deactivated on sight and reported as absent.
    pub async fn find_by_token(
        &self,
        token: &Secret<String>,
    ) -> Result<Option<Session::Model>, VigilError> {
        let hash = hash_token(token.expose_secret());

        let db = self.db.lock().await;
        let session = Session::Entity::find()
            .filter(Session::Column::TokenHash.eq(hash))
            .filter(Session::Column::Active.eq(true))
            .one(&*db)
            .await?;

        let Some(session) = session else {
            return Ok(None);
        };

        let now = Utc::now();
        if session.expires_at <= now {
            let id = session.id;
            let mut active = session.into_active_model();
            active.active = Set(false);
            active.update(&*db).await?;
            debug!(session_id = %id, "Session expired, lazily deactivated");
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Stamp the session's last-activity time. Expiry is unaffected.
    pub async fn update_activity(&self, token: &Secret<String>) -> Result<bool, VigilError> {
        let hash = hash_token(token.expose_secret());
        let now = Utc::now();

        let db = self.db.lock().await;
        let session = Session::Entity::find()
            .filter(Session::Column::TokenHash.eq(hash))
            .filter(Session::Column::Active.eq(true))
            .filter(Session::Column::ExpiresAt.gt(now))
            .one(&*db)
            .await?;

        let Some(session) = session else {
            return Ok(false);
        };

        let mut active = session.into_active_model();
        active.last_activity = Set(now);
        active.update(&*db).await?;
        Ok(true)
    }

    /// Deactivate the session holding this credential (logout, rotation).
    pub async fn revoke(&self, token: &Secret<String>) -> Result<bool, VigilError> {
        let hash = hash_token(token.expose_secret());

        let session = {
            let db = self.db.lock().await;
            let session = Session::Entity::find()
                .filter(Session::Column::TokenHash.eq(hash))
                .filter(Session::Column::Active.eq(true))
                .one(&*db)
                .await?;

            let Some(session) = session else {
                return Ok(false);
            };

            let model = session.clone();
            let mut active = session.into_active_model();
            active.active = Set(false);
            active.update(&*db).await?;
            model
        };

        self.events
            .record(NewSecurityEvent {
                user_id: Some(session.user_id),
                metadata: serde_json::json!({ "session_id": session.id }),
                ..NewSecurityEvent::new(
                    EventKind::SessionRevoked,
                    Severity::Low,
                    session.remote_ip.clone(),
                    "Session revoked".to_owned(),
                )
            })
            .await?;

        Ok(true)
    }

    /// Admin revocation by session id. Unknown ids are a distinct error;
    /// an already-inactive session reports false.
    pub async fn revoke_by_id(&self, id: Uuid, admin_id: Uuid) -> Result<bool, VigilError> {
        let session = {
            let db = self.db.lock().await;
            let session = Session::Entity::find_by_id(id)
                .one(&*db)
                .await?
                .ok_or(VigilError::SessionNotFound(id))?;

            if !session.active {
                return Ok(false);
            }

            let model = session.clone();
            let mut active = session.into_active_model();
            active.active = Set(false);
            active.update(&*db).await?;
            model
        };

        self.events
            .record(NewSecurityEvent {
                user_id: Some(session.user_id),
                metadata: serde_json::json!({
                    "session_id": session.id,
                    "admin_id": admin_id,
                }),
                ..NewSecurityEvent::new(
                    EventKind::AdminAction,
                    Severity::Medium,
                    session.remote_ip.clone(),
                    "Session revoked by administrator".to_owned(),
                )
            })
            .await?;

        info!(session_id = %id, admin = %admin_id, "Session revoked by admin");
        Ok(true)
    }

    /// Deactivate every active session a user holds. Returns the count.
    pub async fn revoke_all(&self, user_id: Uuid) -> Result<u64, VigilError> {
        let revoked = {
            let db = self.db.lock().await;
            Session::Entity::update_many()
                .set(Session::ActiveModel {
                    active: Set(false),
                    ..Default::default()
                })
                .filter(Session::Column::UserId.eq(user_id))
                .filter(Session::Column::Active.eq(true))
                .exec(&*db)
                .await?
                .rows_affected
        };

        if revoked > 0 {
            self.events
                .record(NewSecurityEvent {
                    user_id: Some(user_id),
                    metadata: serde_json::json!({ "revoked": revoked }),
                    ..NewSecurityEvent::new(
                        EventKind::SessionRevoked,
                        Severity::Low,
                        String::new(),
                        format!("All {revoked} sessions revoked"),
                    )
                })
                .await?;
        }

        Ok(revoked)
    }

    /// A user's live sessions, most recently active first.
    pub async fn list_active(&self, user_id: Uuid) -> Result<Vec<Session::Model>, VigilError> {
        let db = self.db.lock().await;
        Ok(Session::Entity::find()
            .filter(Session::Column::UserId.eq(user_id))
            .filter(Session::Column::Active.eq(true))
            .filter(Session::Column::ExpiresAt.gt(Utc::now()))
            .order_by_desc(Session::Column::LastActivity)
            .all(&*db)
            .await?)
    }

    /// Deactivate sessions past their absolute expiry.
    pub async fn sweep_expired(&self) -> Result<u64, VigilError> {
        let db = self.db.lock().await;
        let result = Session::Entity::update_many()
            .set(Session::ActiveModel {
                active: Set(false),
                ..Default::default()
            })
            .filter(Session::Column::Active.eq(true))
            .filter(Session::Column::ExpiresAt.lte(Utc::now()))
            .exec(&*db)
            .await?;
        drop(db);

        if result.rows_affected > 0 {
            info!(expired = result.rows_affected, "Expired sessions deactivated");
        }
        Ok(result.rows_affected)
    }
}
