use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Iterable,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use vigil_common::VigilError;
use vigil_db_entities::SecurityEvent::{self, EventKind, Severity};

/// A security occurrence to be appended to the log
#[derive(Clone, Debug)]
pub struct NewSecurityEvent {
    pub kind: EventKind,
    pub severity: Severity,
    pub remote_ip: String,
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub endpoint: Option<String>,
    pub method: Option<String>,
    pub description: String,
    pub metadata: serde_json::Value,
}

impl NewSecurityEvent {
    pub fn new(kind: EventKind, severity: Severity, remote_ip: String, description: String) -> Self {
        Self {
            kind,
            severity,
            remote_ip,
            user_id: None,
            email: None,
            endpoint: None,
            method: None,
            description,
            metadata: serde_json::Value::Null,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    pub kind: Option<EventKind>,
    pub severity: Option<Severity>,
    pub remote_ip: Option<String>,
    pub reviewed: Option<bool>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug)]
pub struct EventPage {
    pub events: Vec<SecurityEvent::Model>,
    pub total: u64,
}

#[derive(Clone, Debug)]
pub struct EventStats {
    pub total: u64,
    pub by_kind: Vec<(EventKind, u64)>,
    pub by_severity: Vec<(Severity, u64)>,
    pub unreviewed: u64,
    pub top_offending_ips: Vec<(String, u64)>,
}

/// Append-only log of security occurrences. Holds no decision logic; the
/// only mutation it permits is the operator review marker.
pub struct EventLog {
    db: Arc<Mutex<DatabaseConnection>>,
}

impl EventLog {
    pub fn new(db: Arc<Mutex<DatabaseConnection>>) -> Self {
        Self { db }
    }

    pub async fn record(
        &self,
        event: NewSecurityEvent,
    ) -> Result<SecurityEvent::Model, VigilError> {
        let db = self.db.lock().await;
        let model = SecurityEvent::ActiveModel {
            id: Set(Uuid::new_v4()),
            kind: Set(event.kind),
            severity: Set(event.severity),
            remote_ip: Set(event.remote_ip),
            user_id: Set(event.user_id),
            email: Set(event.email),
            endpoint: Set(event.endpoint),
            method: Set(event.method),
            description: Set(event.description),
            metadata: Set(event.metadata),
            reviewed: Set(false),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            review_notes: Set(None),
            timestamp: Set(Utc::now()),
        }
        .insert(&*db)
        .await?;
        drop(db);

        match model.severity {
            Severity::Low => debug!(
                kind = ?model.kind, ip = %model.remote_ip, "{}", model.description
            ),
            Severity::Medium => info!(
                kind = ?model.kind, ip = %model.remote_ip, "{}", model.description
            ),
            Severity::High => warn!(
                kind = ?model.kind, ip = %model.remote_ip, "{}", model.description
            ),
            Severity::Critical => error!(
                kind = ?model.kind, ip = %model.remote_ip, "{}", model.description
            ),
        }

        Ok(model)
    }

    pub async fn query(
        &self,
        filter: &EventFilter,
        offset: u64,
        limit: u64,
    ) -> Result<EventPage, VigilError> {
        let db = self.db.lock().await;

        let mut query = SecurityEvent::Entity::find();
        if let Some(kind) = filter.kind {
            query = query.filter(SecurityEvent::Column::Kind.eq(kind));
        }
        if let Some(severity) = filter.severity {
            query = query.filter(SecurityEvent::Column::Severity.eq(severity));
        }
        if let Some(ip) = &filter.remote_ip {
            query = query.filter(SecurityEvent::Column::RemoteIp.eq(ip.clone()));
        }
        if let Some(reviewed) = filter.reviewed {
            query = query.filter(SecurityEvent::Column::Reviewed.eq(reviewed));
        }
        if let Some(from) = filter.from {
            query = query.filter(SecurityEvent::Column::Timestamp.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(SecurityEvent::Column::Timestamp.lt(to));
        }

        let total = query.clone().count(&*db).await?;
        let events = query
            .order_by_desc(SecurityEvent::Column::Timestamp)
            .offset(offset)
            .limit(limit)
            .all(&*db)
            .await?;

        Ok(EventPage { events, total })
    }

    /// Set the operator review marker. Reviewing twice is rejected and
    /// leaves the event untouched.
    pub async fn mark_reviewed(
        &self,
        id: Uuid,
        reviewer: Uuid,
        notes: Option<String>,
    ) -> Result<SecurityEvent::Model, VigilError> {
        let db = self.db.lock().await;
        let event = SecurityEvent::Entity::find_by_id(id)
            .one(&*db)
            .await?
            .ok_or(VigilError::EventNotFound(id))?;

        if event.reviewed {
            return Err(VigilError::EventAlreadyReviewed(id));
        }

        let mut active = event.into_active_model();
        active.reviewed = Set(true);
        active.reviewed_by = Set(Some(reviewer));
        active.reviewed_at = Set(Some(Utc::now()));
        active.review_notes = Set(notes);
        let event = active.update(&*db).await?;
        drop(db);

        info!(event_id = %id, reviewer = %reviewer, "Security event reviewed");
        Ok(event)
    }

    pub async fn stats(&self, window_days: i64) -> Result<EventStats, VigilError> {
        let db = self.db.lock().await;
        let since = Utc::now() - chrono::Duration::days(window_days);
        let in_window = SecurityEvent::Entity::find()
            .filter(SecurityEvent::Column::Timestamp.gte(since));

        let total = in_window.clone().count(&*db).await?;
        let unreviewed = in_window
            .clone()
            .filter(SecurityEvent::Column::Reviewed.eq(false))
            .count(&*db)
            .await?;

        let mut by_kind = Vec::new();
        for kind in EventKind::iter() {
            let count = in_window
                .clone()
                .filter(SecurityEvent::Column::Kind.eq(kind))
                .count(&*db)
                .await?;
            by_kind.push((kind, count));
        }

        let mut by_severity = Vec::new();
        for severity in Severity::iter() {
            let count = in_window
                .clone()
                .filter(SecurityEvent::Column::Severity.eq(severity))
                .count(&*db)
                .await?;
            by_severity.push((severity, count));
        }

        let ips: Vec<String> = in_window
            .select_only()
            .column(SecurityEvent::Column::RemoteIp)
            .into_tuple()
            .all(&*db)
            .await?;
        drop(db);

        let mut counts: HashMap<String, u64> = HashMap::new();
        for ip in ips {
            *counts.entry(ip).or_default() += 1;
        }
        let mut top_offending_ips: Vec<(String, u64)> = counts.into_iter().collect();
        top_offending_ips.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_offending_ips.truncate(10);

        Ok(EventStats {
            total,
            by_kind,
            by_severity,
            unreviewed,
            top_offending_ips,
        })
    }
}
