mod common;

use std::net::IpAddr;

use sea_orm::EntityTrait;
use uuid::Uuid;
use vigil_core::alerts::NewAlert;
use vigil_core::params::keys;
use vigil_db_entities::SecurityAlert;
use vigil_db_entities::SecurityAlert::{AlertKind, AlertStatus};
use vigil_db_entities::SecurityEvent::Severity;

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

fn suspicious(ip: &str) -> NewAlert {
    NewAlert {
        kind: AlertKind::SuspiciousActivity,
        severity: Severity::Medium,
        title: "Suspicious activity".to_owned(),
        description: "test".to_owned(),
        user_id: None,
        remote_ip: Some(ip.to_owned()),
        event_ids: vec![],
    }
}

#[tokio::test]
async fn test_raise_and_find_active() {
    let services = common::test_services().await;

    let alert = services.alerts.raise(suspicious("10.3.0.1")).await.unwrap();
    assert_eq!(alert.status, AlertStatus::Active);

    let active = services.alerts.find_active().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, alert.id);
}

#[tokio::test]
async fn test_assign_forces_investigating() {
    let services = common::test_services().await;
    let operator = Uuid::new_v4();

    let alert = services.alerts.raise(suspicious("10.3.0.2")).await.unwrap();
    let alert = services.alerts.assign(alert.id, operator).await.unwrap();

    assert_eq!(alert.status, AlertStatus::Investigating);
    assert_eq!(alert.assigned_to, Some(operator));

    // Assigned alerts still count as open
    assert_eq!(services.alerts.find_active().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_resolution_stamps_resolver_and_time() {
    let services = common::test_services().await;
    let operator = Uuid::new_v4();

    let alert = services.alerts.raise(suspicious("10.3.0.3")).await.unwrap();
    let alert = services
        .alerts
        .update_status(
            alert.id,
            AlertStatus::Resolved,
            operator,
            Some("False positive".to_owned()),
        )
        .await
        .unwrap();

    assert_eq!(alert.status, AlertStatus::Resolved);
    assert_eq!(alert.resolved_by, Some(operator));
    assert!(alert.resolved_at.is_some());
    assert_eq!(alert.resolution.as_deref(), Some("False positive"));
    assert!(services.alerts.find_active().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_transition_leaves_alert_unchanged() {
    let services = common::test_services().await;
    let operator = Uuid::new_v4();

    let alert = services.alerts.raise(suspicious("10.3.0.4")).await.unwrap();
    services
        .alerts
        .update_status(alert.id, AlertStatus::Dismissed, operator, None)
        .await
        .unwrap();

    // A closed alert cannot be reopened or re-closed
    let result = services
        .alerts
        .update_status(alert.id, AlertStatus::Resolved, operator, None)
        .await;
    assert!(result.is_err());

    let db = services.db.lock().await;
    let row = SecurityAlert::Entity::find_by_id(alert.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, AlertStatus::Dismissed);
}

#[tokio::test]
async fn test_assigning_a_closed_alert_is_rejected() {
    let services = common::test_services().await;
    let operator = Uuid::new_v4();

    let alert = services.alerts.raise(suspicious("10.3.0.5")).await.unwrap();
    services
        .alerts
        .update_status(alert.id, AlertStatus::Resolved, operator, None)
        .await
        .unwrap();

    assert!(services.alerts.assign(alert.id, operator).await.is_err());
}

#[tokio::test]
async fn test_unknown_alert_is_not_found() {
    let services = common::test_services().await;
    let result = services
        .alerts
        .update_status(Uuid::new_v4(), AlertStatus::Resolved, Uuid::new_v4(), None)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_correlation_bands() {
    let services = common::test_services().await;

    // Below every band: nothing raised
    let raised = services.alerts.correlate(&ip("10.4.0.1"), 4, 0).await.unwrap();
    assert!(raised.is_empty());

    // [5, 10): medium multiple-failed-logins
    let raised = services.alerts.correlate(&ip("10.4.0.2"), 5, 0).await.unwrap();
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].kind, AlertKind::MultipleFailedLogins);
    assert_eq!(raised[0].severity, Severity::Medium);

    // >= 10: high brute-force, not a second failed-logins alert
    let raised = services.alerts.correlate(&ip("10.4.0.3"), 10, 0).await.unwrap();
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].kind, AlertKind::BruteForceAttack);
    assert_eq!(raised[0].severity, Severity::High);

    // Rate limit violations escalate independently
    let raised = services.alerts.correlate(&ip("10.4.0.4"), 0, 10).await.unwrap();
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].kind, AlertKind::ApiAbuse);
}

#[tokio::test]
async fn test_correlation_suppresses_duplicate_open_alerts() {
    let services = common::test_services().await;
    let addr = ip("10.4.0.5");

    let first = services.alerts.correlate(&addr, 12, 0).await.unwrap();
    assert_eq!(first.len(), 1);
    let second = services.alerts.correlate(&addr, 13, 0).await.unwrap();
    assert!(second.is_empty());

    // Once the alert is closed, a fresh pattern raises a new one
    services
        .alerts
        .update_status(first[0].id, AlertStatus::Resolved, Uuid::new_v4(), None)
        .await
        .unwrap();
    let third = services.alerts.correlate(&addr, 14, 0).await.unwrap();
    assert_eq!(third.len(), 1);
}

#[tokio::test]
async fn test_correlation_thresholds_come_from_parameters() {
    let services = common::test_services().await;

    services
        .params
        .update(keys::ALERT_FAILED_LOGIN_THRESHOLD, "2", None)
        .await
        .unwrap();

    let raised = services.alerts.correlate(&ip("10.4.0.6"), 2, 0).await.unwrap();
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].kind, AlertKind::MultipleFailedLogins);
}

#[tokio::test]
async fn test_count_active_by_severity() {
    let services = common::test_services().await;

    services.alerts.correlate(&ip("10.4.0.7"), 5, 0).await.unwrap();
    services.alerts.correlate(&ip("10.4.0.8"), 12, 0).await.unwrap();

    let counts = services.alerts.count_active_by_severity().await.unwrap();
    let get = |severity: Severity| {
        counts
            .iter()
            .find(|(s, _)| *s == severity)
            .map(|(_, c)| *c)
            .unwrap()
    };
    assert_eq!(get(Severity::Medium), 1);
    assert_eq!(get(Severity::High), 1);
    assert_eq!(get(Severity::Low), 0);
    assert_eq!(get(Severity::Critical), 0);
}
