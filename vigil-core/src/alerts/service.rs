use std::net::IpAddr;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Iterable,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;
use vigil_common::VigilError;
use vigil_db_entities::SecurityAlert::{self, AlertKind, AlertStatus};
use vigil_db_entities::SecurityEvent::Severity;

use super::sink::AlertSink;
use crate::params::{keys, ParameterStore};

/// An escalated pattern to be raised for operator review
#[derive(Clone, Debug)]
pub struct NewAlert {
    pub kind: AlertKind,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub user_id: Option<Uuid>,
    pub remote_ip: Option<String>,
    pub event_ids: Vec<Uuid>,
}

/// Which status changes the alert lifecycle admits. Resolved and dismissed
/// are terminal; a closed alert is never reopened, a new one is raised
/// instead.
pub fn transition_allowed(from: AlertStatus, to: AlertStatus) -> bool {
    use AlertStatus::*;
    match (from, to) {
        (Active, Investigating) | (Active, Resolved) | (Active, Dismissed) => true,
        (Investigating, Resolved) | (Investigating, Dismissed) => true,
        (Active, Active) => false,
        (Investigating, Active) | (Investigating, Investigating) => false,
        (Resolved, _) | (Dismissed, _) => false,
    }
}

/// Correlates raw attempt statistics into operator-reviewable alerts and
/// owns their lifecycle.
pub struct AlertService {
    db: Arc<Mutex<DatabaseConnection>>,
    params: Arc<ParameterStore>,
    sink: Arc<dyn AlertSink>,
}

impl AlertService {
    pub fn new(
        db: Arc<Mutex<DatabaseConnection>>,
        params: Arc<ParameterStore>,
        sink: Arc<dyn AlertSink>,
    ) -> Self {
        Self { db, params, sink }
    }

    pub async fn raise(&self, alert: NewAlert) -> Result<SecurityAlert::Model, VigilError> {
        let now = Utc::now();
        let model = {
            let db = self.db.lock().await;
            SecurityAlert::ActiveModel {
                id: Set(Uuid::new_v4()),
                kind: Set(alert.kind),
                severity: Set(alert.severity),
                title: Set(alert.title),
                description: Set(alert.description),
                user_id: Set(alert.user_id),
                remote_ip: Set(alert.remote_ip),
                event_ids: Set(serde_json::json!(alert.event_ids)),
                status: Set(AlertStatus::Active),
                assigned_to: Set(None),
                resolution: Set(None),
                resolved_by: Set(None),
                resolved_at: Set(None),
                created: Set(now),
                updated: Set(now),
            }
            .insert(&*db)
            .await?
        };

        self.sink.deliver(&model).await;
        Ok(model)
    }

    /// Alerts still awaiting an operator outcome, newest first.
    pub async fn find_active(&self) -> Result<Vec<SecurityAlert::Model>, VigilError> {
        let db = self.db.lock().await;
        Ok(SecurityAlert::Entity::find()
            .filter(
                SecurityAlert::Column::Status
                    .is_in([AlertStatus::Active, AlertStatus::Investigating]),
            )
            .order_by_desc(SecurityAlert::Column::Created)
            .all(&*db)
            .await?)
    }

    /// Admin-driven status change. Invalid transitions are rejected and the
    /// alert is left untouched; closing stamps the resolver and time.
    pub async fn update_status(
        &self,
        id: Uuid,
        status: AlertStatus,
        actor: Uuid,
        resolution: Option<String>,
    ) -> Result<SecurityAlert::Model, VigilError> {
        let db = self.db.lock().await;
        let alert = SecurityAlert::Entity::find_by_id(id)
            .one(&*db)
            .await?
            .ok_or(VigilError::AlertNotFound(id))?;

        if !transition_allowed(alert.status, status) {
            return Err(VigilError::InvalidAlertTransition {
                id,
                from: format!("{:?}", alert.status),
                to: format!("{status:?}"),
            });
        }

        let now = Utc::now();
        let mut active = alert.into_active_model();
        active.status = Set(status);
        active.updated = Set(now);
        if matches!(status, AlertStatus::Resolved | AlertStatus::Dismissed) {
            active.resolved_by = Set(Some(actor));
            active.resolved_at = Set(Some(now));
            active.resolution = Set(resolution);
        }
        let alert = active.update(&*db).await?;
        drop(db);

        info!(alert_id = %id, status = ?alert.status, actor = %actor, "Alert status updated");
        Ok(alert)
    }

    /// Hand the alert to an operator; assignment implies investigation.
    pub async fn assign(
        &self,
        id: Uuid,
        assignee: Uuid,
    ) -> Result<SecurityAlert::Model, VigilError> {
        let db = self.db.lock().await;
        let alert = SecurityAlert::Entity::find_by_id(id)
            .one(&*db)
            .await?
            .ok_or(VigilError::AlertNotFound(id))?;

        if matches!(alert.status, AlertStatus::Resolved | AlertStatus::Dismissed) {
            return Err(VigilError::InvalidAlertTransition {
                id,
                from: format!("{:?}", alert.status),
                to: format!("{:?}", AlertStatus::Investigating),
            });
        }

        let mut active = alert.into_active_model();
        active.assigned_to = Set(Some(assignee));
        active.status = Set(AlertStatus::Investigating);
        active.updated = Set(Utc::now());
        let alert = active.update(&*db).await?;
        drop(db);

        info!(alert_id = %id, assignee = %assignee, "Alert assigned");
        Ok(alert)
    }

    pub async fn count_active_by_severity(&self) -> Result<Vec<(Severity, u64)>, VigilError> {
        let db = self.db.lock().await;
        let mut counts = Vec::new();
        for severity in Severity::iter() {
            let count = SecurityAlert::Entity::find()
                .filter(
                    SecurityAlert::Column::Status
                        .is_in([AlertStatus::Active, AlertStatus::Investigating]),
                )
                .filter(SecurityAlert::Column::Severity.eq(severity))
                .count(&*db)
                .await?;
            counts.push((severity, count));
        }
        Ok(counts)
    }

    async fn has_open_alert(&self, kind: AlertKind, ip: &str) -> Result<bool, VigilError> {
        let db = self.db.lock().await;
        let count = SecurityAlert::Entity::find()
            .filter(SecurityAlert::Column::Kind.eq(kind))
            .filter(SecurityAlert::Column::RemoteIp.eq(ip))
            .filter(
                SecurityAlert::Column::Status
                    .is_in([AlertStatus::Active, AlertStatus::Investigating]),
            )
            .count(&*db)
            .await?;
        Ok(count > 0)
    }

    /// Map attempt statistics onto the alert bands. The thresholds are
    /// tunable parameters; an open alert of the same kind for the same
    /// address suppresses a duplicate.
    pub async fn correlate(
        &self,
        ip: &IpAddr,
        failed_logins: u64,
        rate_limit_hits: u64,
    ) -> Result<Vec<SecurityAlert::Model>, VigilError> {
        let failed_threshold = self
            .params
            .get_i64(keys::ALERT_FAILED_LOGIN_THRESHOLD, 5)
            .await
            .max(1) as u64;
        let brute_threshold = self
            .params
            .get_i64(keys::ALERT_BRUTE_FORCE_THRESHOLD, 10)
            .await
            .max(1) as u64;
        let abuse_threshold = self
            .params
            .get_i64(keys::ALERT_RATE_LIMIT_THRESHOLD, 10)
            .await
            .max(1) as u64;

        let ip_str = ip.to_string();
        let mut raised = Vec::new();

        if failed_logins >= brute_threshold {
            if !self.has_open_alert(AlertKind::BruteForceAttack, &ip_str).await? {
                raised.push(
                    self.raise(NewAlert {
                        kind: AlertKind::BruteForceAttack,
                        severity: Severity::High,
                        title: format!("Brute force attack from {ip}"),
                        description: format!(
                            "{failed_logins} failed login attempts from {ip} in the current window"
                        ),
                        user_id: None,
                        remote_ip: Some(ip_str.clone()),
                        event_ids: vec![],
                    })
                    .await?,
                );
            }
        } else if failed_logins >= failed_threshold
            && !self
                .has_open_alert(AlertKind::MultipleFailedLogins, &ip_str)
                .await?
        {
            raised.push(
                self.raise(NewAlert {
                    kind: AlertKind::MultipleFailedLogins,
                    severity: Severity::Medium,
                    title: format!("Multiple failed logins from {ip}"),
                    description: format!(
                        "{failed_logins} failed login attempts from {ip} in the current window"
                    ),
                    user_id: None,
                    remote_ip: Some(ip_str.clone()),
                    event_ids: vec![],
                })
                .await?,
            );
        }

        if rate_limit_hits >= abuse_threshold
            && !self.has_open_alert(AlertKind::ApiAbuse, &ip_str).await?
        {
            raised.push(
                self.raise(NewAlert {
                    kind: AlertKind::ApiAbuse,
                    severity: Severity::Medium,
                    title: format!("API abuse from {ip}"),
                    description: format!(
                        "{rate_limit_hits} rate limit violations from {ip} in the current window"
                    ),
                    user_id: None,
                    remote_ip: Some(ip_str),
                    event_ids: vec![],
                })
                .await?,
            );
        }

        Ok(raised)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AlertStatus::*;

    #[test]
    fn test_active_can_move_anywhere_forward() {
        assert!(transition_allowed(Active, Investigating));
        assert!(transition_allowed(Active, Resolved));
        assert!(transition_allowed(Active, Dismissed));
    }

    #[test]
    fn test_investigating_can_only_close() {
        assert!(transition_allowed(Investigating, Resolved));
        assert!(transition_allowed(Investigating, Dismissed));
        assert!(!transition_allowed(Investigating, Active));
    }

    #[test]
    fn test_closed_alerts_stay_closed() {
        for to in [Active, Investigating, Resolved, Dismissed] {
            assert!(!transition_allowed(Resolved, to));
            assert!(!transition_allowed(Dismissed, to));
        }
    }

    #[test]
    fn test_self_transitions_are_rejected() {
        assert!(!transition_allowed(Active, Active));
        assert!(!transition_allowed(Investigating, Investigating));
    }
}
