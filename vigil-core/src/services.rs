use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;
use tracing::warn;
use vigil_common::{VigilConfig, VigilConfigStore};

use crate::alerts::{AlertService, AlertSink, LogAlertSink};
use crate::db::{cleanup_db, connect_to_db};
use crate::event_log::EventLog;
use crate::ip_blocking::IpBlockService;
use crate::login_tracking::LoginTracker;
use crate::params::ParameterStore;
use crate::sessions::SessionService;

#[derive(Clone)]
pub struct Services {
    pub db: Arc<Mutex<DatabaseConnection>>,
    pub params: Arc<ParameterStore>,
    pub events: Arc<EventLog>,
    pub ip_blocks: Arc<IpBlockService>,
    pub logins: Arc<LoginTracker>,
    pub sessions: Arc<SessionService>,
    pub alerts: Arc<AlertService>,
}

impl Services {
    pub async fn new(config: &VigilConfig) -> Result<Self> {
        let db = connect_to_db(config).await?;
        Self::from_connection(db, &config.store).await
    }

    /// Wire the services over an already-connected (and migrated) database.
    pub async fn from_connection(
        db: DatabaseConnection,
        store: &VigilConfigStore,
    ) -> Result<Self> {
        Self::from_connection_with_sink(db, store, Arc::new(LogAlertSink)).await
    }

    pub async fn from_connection_with_sink(
        db: DatabaseConnection,
        store: &VigilConfigStore,
        sink: Arc<dyn AlertSink>,
    ) -> Result<Self> {
        let db = Arc::new(Mutex::new(db));

        let params = Arc::new(ParameterStore::new(db.clone()));
        params.seed_defaults().await?;

        let events = Arc::new(EventLog::new(db.clone()));

        let ip_blocks = Arc::new(
            IpBlockService::new(
                db.clone(),
                params.clone(),
                events.clone(),
                store.block_cache_ttl,
            )
            .await?,
        );

        let alerts = Arc::new(AlertService::new(db.clone(), params.clone(), sink));

        let logins = Arc::new(LoginTracker::new(
            db.clone(),
            params.clone(),
            ip_blocks.clone(),
            events.clone(),
            alerts.clone(),
        ));

        let sessions = Arc::new(SessionService::new(
            db.clone(),
            params.clone(),
            events.clone(),
        ));

        Ok(Self {
            db,
            params,
            events,
            ip_blocks,
            logins,
            sessions,
            alerts,
        })
    }

    /// Spawn the periodic maintenance tasks: expired-block and
    /// expired-session sweeps on the sweep interval, retention cleanup once
    /// an hour. Failures are logged and the timers keep running.
    pub fn spawn_sweeps(&self, store: &VigilConfigStore) {
        let retention = store.retention;

        tokio::spawn({
            let ip_blocks = self.ip_blocks.clone();
            let interval = store.sweep_interval;
            async move {
                let mut timer = tokio::time::interval(interval);
                loop {
                    timer.tick().await;
                    if let Err(error) = ip_blocks.sweep_expired().await {
                        warn!(%error, "Expired IP block sweep failed");
                    }
                }
            }
        });

        tokio::spawn({
            let sessions = self.sessions.clone();
            let interval = store.sweep_interval;
            async move {
                let mut timer = tokio::time::interval(interval);
                loop {
                    timer.tick().await;
                    if let Err(error) = sessions.sweep_expired().await {
                        warn!(%error, "Expired session sweep failed");
                    }
                }
            }
        });

        tokio::spawn({
            let db = self.db.clone();
            async move {
                let mut timer = tokio::time::interval(Duration::from_secs(3600));
                loop {
                    timer.tick().await;
                    let db = db.lock().await;
                    if let Err(error) = cleanup_db(&*db, &retention).await {
                        warn!(%error, "Retention cleanup failed");
                    }
                }
            }
        });
    }
}
