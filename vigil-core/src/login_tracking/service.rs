use std::net::IpAddr;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;
use vigil_common::VigilError;
use vigil_db_entities::LoginAttempt::{self, FailureReason};
use vigil_db_entities::SecurityEvent::{EventKind, Severity};

use crate::alerts::AlertService;
use crate::event_log::{EventLog, NewSecurityEvent};
use crate::ip_blocking::IpBlockService;
use crate::params::{keys, ParameterStore};

/// Fixed wait hint returned with a rate-limit denial
pub const RATE_LIMIT_WAIT_SECONDS: u64 = 60;

/// Outcome of the admission gates, checked before credential validation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Admission {
    Allowed { remaining_attempts: u64 },
    Denied { reason: DenialReason, wait_seconds: Option<u64> },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenialReason {
    IpBlocked,
    RateLimited,
}

/// Result of recording a failed attempt
#[derive(Clone, Debug)]
pub struct FailureOutcome {
    pub should_block: bool,
    pub failures_in_window: u64,
}

/// Map a trailing-window failure count to an event severity. The lower
/// bands are fixed; the critical band tracks the auto-block threshold.
pub fn failure_severity(failures: u64, auto_block_threshold: u64) -> Severity {
    if failures >= auto_block_threshold {
        Severity::Critical
    } else if failures >= 5 {
        Severity::High
    } else if failures >= 3 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Records every authentication attempt and decides admission.
///
/// Callers must check `can_attempt` before validating credentials, and must
/// record the outcome through `record_success`/`record_failure` regardless
/// of which gate produced it, so denials stay visible in the audit trail.
///
/// Within one `record_failure` call the attempt row is written before the
/// window is recounted, which happens before any auto-block fires. Across
/// concurrent callers there is no ordering guarantee: the window count may
/// miss attempts still in flight, so auto-blocking is a deterrent, not a
/// security boundary.
pub struct LoginTracker {
    db: Arc<Mutex<DatabaseConnection>>,
    params: Arc<ParameterStore>,
    blocks: Arc<IpBlockService>,
    events: Arc<EventLog>,
    alerts: Arc<AlertService>,
}

impl LoginTracker {
    pub fn new(
        db: Arc<Mutex<DatabaseConnection>>,
        params: Arc<ParameterStore>,
        blocks: Arc<IpBlockService>,
        events: Arc<EventLog>,
        alerts: Arc<AlertService>,
    ) -> Self {
        Self {
            db,
            params,
            blocks,
            events,
            alerts,
        }
    }

    /// The two admission gates, in order: blocked address, then the
    /// per-minute attempt limit.
    pub async fn can_attempt(&self, ip: &IpAddr) -> Result<Admission, VigilError> {
        if self.blocks.is_blocked(ip).await? {
            debug!(ip = %ip, "Login denied, IP is blocked");
            return Ok(Admission::Denied {
                reason: DenialReason::IpBlocked,
                wait_seconds: None,
            });
        }

        let limit = self
            .params
            .get_i64(keys::LOGIN_MAX_ATTEMPTS_PER_MINUTE, 10)
            .await
            .max(1) as u64;

        let minute_ago = Utc::now() - chrono::Duration::minutes(1);
        let recent = {
            let db = self.db.lock().await;
            LoginAttempt::Entity::find()
                .filter(LoginAttempt::Column::RemoteIp.eq(ip.to_string()))
                .filter(LoginAttempt::Column::Timestamp.gte(minute_ago))
                .count(&*db)
                .await?
        };

        if recent >= limit {
            debug!(ip = %ip, recent, limit, "Login denied, rate limit reached");
            return Ok(Admission::Denied {
                reason: DenialReason::RateLimited,
                wait_seconds: Some(RATE_LIMIT_WAIT_SECONDS),
            });
        }

        Ok(Admission::Allowed {
            remaining_attempts: limit - recent,
        })
    }

    pub async fn record_success(
        &self,
        email: &str,
        ip: &IpAddr,
        user_agent: &str,
        user_id: Uuid,
    ) -> Result<LoginAttempt::Model, VigilError> {
        let attempt = {
            let db = self.db.lock().await;
            LoginAttempt::ActiveModel {
                id: Set(Uuid::new_v4()),
                email: Set(email.to_owned()),
                remote_ip: Set(ip.to_string()),
                user_agent: Set(user_agent.to_owned()),
                success: Set(true),
                failure_reason: Set(None),
                user_id: Set(Some(user_id)),
                timestamp: Set(Utc::now()),
            }
            .insert(&*db)
            .await?
        };

        self.events
            .record(NewSecurityEvent {
                user_id: Some(user_id),
                email: Some(email.to_owned()),
                ..NewSecurityEvent::new(
                    EventKind::LoginSuccess,
                    Severity::Low,
                    ip.to_string(),
                    format!("Successful login for {email}"),
                )
            })
            .await?;

        Ok(attempt)
    }

    /// Record a failure, recount the trailing window, escalate.
    pub async fn record_failure(
        &self,
        email: &str,
        ip: &IpAddr,
        user_agent: &str,
        reason: FailureReason,
        user_id: Option<Uuid>,
    ) -> Result<FailureOutcome, VigilError> {
        let now = Utc::now();
        let window_minutes = self
            .params
            .get_i64(keys::LOGIN_FAILURE_WINDOW_MINUTES, 15)
            .await
            .max(1);
        let threshold = self
            .params
            .get_i64(keys::LOGIN_AUTO_BLOCK_THRESHOLD, 10)
            .await
            .max(1) as u64;

        let window_start = now - chrono::Duration::minutes(window_minutes);
        let (failures, rate_limited) = {
            let db = self.db.lock().await;

            LoginAttempt::ActiveModel {
                id: Set(Uuid::new_v4()),
                email: Set(email.to_owned()),
                remote_ip: Set(ip.to_string()),
                user_agent: Set(user_agent.to_owned()),
                success: Set(false),
                failure_reason: Set(Some(reason)),
                user_id: Set(user_id),
                timestamp: Set(now),
            }
            .insert(&*db)
            .await?;

            let failures = LoginAttempt::Entity::find()
                .filter(LoginAttempt::Column::RemoteIp.eq(ip.to_string()))
                .filter(LoginAttempt::Column::Success.eq(false))
                .filter(LoginAttempt::Column::Timestamp.gte(window_start))
                .count(&*db)
                .await?;

            let rate_limited = LoginAttempt::Entity::find()
                .filter(LoginAttempt::Column::RemoteIp.eq(ip.to_string()))
                .filter(LoginAttempt::Column::FailureReason.eq(FailureReason::RateLimited))
                .filter(LoginAttempt::Column::Timestamp.gte(window_start))
                .count(&*db)
                .await?;

            (failures, rate_limited)
        };

        let severity = failure_severity(failures, threshold);
        let kind = match reason {
            FailureReason::RateLimited => EventKind::RateLimitExceeded,
            _ => EventKind::LoginFailure,
        };

        self.events
            .record(NewSecurityEvent {
                user_id,
                email: Some(email.to_owned()),
                metadata: serde_json::json!({
                    "failure_reason": reason,
                    "failures_in_window": failures,
                }),
                ..NewSecurityEvent::new(
                    kind,
                    severity,
                    ip.to_string(),
                    format!("Failed login for {email}"),
                )
            })
            .await?;

        let should_block = failures >= threshold;
        if should_block {
            let duration = self
                .params
                .get_i64(keys::BLOCK_AUTO_DURATION_MINUTES, 30)
                .await;
            self.blocks
                .auto_block(
                    ip,
                    &format!(
                        "{failures} failed login attempts within {window_minutes} minutes"
                    ),
                    duration,
                )
                .await?;
            info!(ip = %ip, failures, threshold, "Auto-block triggered");
        }

        self.alerts.correlate(ip, failures, rate_limited).await?;

        Ok(FailureOutcome {
            should_block,
            failures_in_window: failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_severity_low_band() {
        assert_eq!(failure_severity(0, 10), Severity::Low);
        assert_eq!(failure_severity(2, 10), Severity::Low);
    }

    #[test]
    fn test_failure_severity_medium_band() {
        assert_eq!(failure_severity(3, 10), Severity::Medium);
        assert_eq!(failure_severity(4, 10), Severity::Medium);
    }

    #[test]
    fn test_failure_severity_high_band() {
        assert_eq!(failure_severity(5, 10), Severity::High);
        assert_eq!(failure_severity(9, 10), Severity::High);
    }

    #[test]
    fn test_failure_severity_critical_at_threshold() {
        assert_eq!(failure_severity(10, 10), Severity::Critical);
        assert_eq!(failure_severity(25, 10), Severity::Critical);
    }

    #[test]
    fn test_failure_severity_low_threshold_wins() {
        // A tightened threshold promotes straight to critical
        assert_eq!(failure_severity(4, 4), Severity::Critical);
    }
}
