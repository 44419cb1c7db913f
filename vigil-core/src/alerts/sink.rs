use async_trait::async_trait;
use tracing::warn;
use vigil_db_entities::SecurityAlert;

/// Delivery hook for newly raised alerts. Injected so deployments can fan
/// alerts out to whatever channel they have; the default writes to the log
/// stream only.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, alert: &SecurityAlert::Model);
}

pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn deliver(&self, alert: &SecurityAlert::Model) {
        warn!(
            alert_id = %alert.id,
            kind = ?alert.kind,
            severity = ?alert.severity,
            ip = ?alert.remote_ip,
            "{}",
            alert.title
        );
    }
}
