mod common;

use uuid::Uuid;
use vigil_core::event_log::{EventFilter, NewSecurityEvent};
use vigil_db_entities::SecurityEvent::{EventKind, Severity};

fn event(kind: EventKind, severity: Severity, ip: &str) -> NewSecurityEvent {
    NewSecurityEvent::new(kind, severity, ip.to_owned(), format!("{kind:?} from {ip}"))
}

#[tokio::test]
async fn test_record_and_query_by_filters() {
    let services = common::test_services().await;

    services
        .events
        .record(event(EventKind::LoginFailure, Severity::Medium, "10.5.0.1"))
        .await
        .unwrap();
    services
        .events
        .record(event(EventKind::LoginFailure, Severity::High, "10.5.0.2"))
        .await
        .unwrap();
    services
        .events
        .record(event(EventKind::IpBlocked, Severity::High, "10.5.0.2"))
        .await
        .unwrap();

    let by_kind = services
        .events
        .query(
            &EventFilter {
                kind: Some(EventKind::LoginFailure),
                ..Default::default()
            },
            0,
            10,
        )
        .await
        .unwrap();
    assert_eq!(by_kind.total, 2);

    let by_ip_and_severity = services
        .events
        .query(
            &EventFilter {
                severity: Some(Severity::High),
                remote_ip: Some("10.5.0.2".to_owned()),
                ..Default::default()
            },
            0,
            10,
        )
        .await
        .unwrap();
    assert_eq!(by_ip_and_severity.total, 2);
}

#[tokio::test]
async fn test_pagination_reports_the_full_total() {
    let services = common::test_services().await;

    for _ in 0..5 {
        services
            .events
            .record(event(EventKind::LoginFailure, Severity::Low, "10.5.0.3"))
            .await
            .unwrap();
    }

    let page = services
        .events
        .query(&EventFilter::default(), 0, 2)
        .await
        .unwrap();
    assert_eq!(page.events.len(), 2);
    assert_eq!(page.total, 5);

    let last_page = services
        .events
        .query(&EventFilter::default(), 4, 2)
        .await
        .unwrap();
    assert_eq!(last_page.events.len(), 1);
    assert_eq!(last_page.total, 5);
}

#[tokio::test]
async fn test_review_marker_is_set_exactly_once() {
    let services = common::test_services().await;
    let reviewer = Uuid::new_v4();

    let recorded = services
        .events
        .record(event(EventKind::SuspiciousActivity, Severity::High, "10.5.0.4"))
        .await
        .unwrap();

    let reviewed = services
        .events
        .mark_reviewed(recorded.id, reviewer, Some("handled".to_owned()))
        .await
        .unwrap();
    assert!(reviewed.reviewed);
    assert_eq!(reviewed.reviewed_by, Some(reviewer));
    assert!(reviewed.reviewed_at.is_some());

    // A second review is rejected, the marker stays as set
    assert!(services
        .events
        .mark_reviewed(recorded.id, Uuid::new_v4(), None)
        .await
        .is_err());
}

#[tokio::test]
async fn test_reviewing_an_unknown_event_is_not_found() {
    let services = common::test_services().await;
    assert!(services
        .events
        .mark_reviewed(Uuid::new_v4(), Uuid::new_v4(), None)
        .await
        .is_err());
}

#[tokio::test]
async fn test_stats_aggregate_the_window() {
    let services = common::test_services().await;

    for _ in 0..3 {
        services
            .events
            .record(event(EventKind::LoginFailure, Severity::Medium, "10.5.0.5"))
            .await
            .unwrap();
    }
    services
        .events
        .record(event(EventKind::IpBlocked, Severity::High, "10.5.0.6"))
        .await
        .unwrap();
    let reviewed = services
        .events
        .record(event(EventKind::LoginSuccess, Severity::Low, "10.5.0.6"))
        .await
        .unwrap();
    services
        .events
        .mark_reviewed(reviewed.id, Uuid::new_v4(), None)
        .await
        .unwrap();

    let stats = services.events.stats(7).await.unwrap();
    assert_eq!(stats.total, 5);
    assert_eq!(stats.unreviewed, 4);

    let kind_count = |kind: EventKind| {
        stats
            .by_kind
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, c)| *c)
            .unwrap()
    };
    assert_eq!(kind_count(EventKind::LoginFailure), 3);
    assert_eq!(kind_count(EventKind::IpBlocked), 1);
    assert_eq!(kind_count(EventKind::SessionCreated), 0);

    let severity_count = |severity: Severity| {
        stats
            .by_severity
            .iter()
            .find(|(s, _)| *s == severity)
            .map(|(_, c)| *c)
            .unwrap()
    };
    assert_eq!(severity_count(Severity::Medium), 3);
    assert_eq!(severity_count(Severity::Critical), 0);

    // The busiest address leads the offender list
    assert_eq!(stats.top_offending_ips[0], ("10.5.0.5".to_owned(), 3));
}
