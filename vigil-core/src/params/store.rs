use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;
use vigil_common::VigilError;
use vigil_db_entities::Parameter::{self, ParameterKind};

use super::keys;

/// A parameter inserted at startup when missing
pub struct SeededParameter {
    pub key: &'static str,
    pub value: &'static str,
    pub kind: ParameterKind,
    pub category: &'static str,
}

pub const DEFAULT_PARAMETERS: &[SeededParameter] = &[
    SeededParameter {
        key: keys::LOGIN_MAX_ATTEMPTS_PER_MINUTE,
        value: "10",
        kind: ParameterKind::Number,
        category: "login",
    },
    SeededParameter {
        key: keys::LOGIN_FAILURE_WINDOW_MINUTES,
        value: "15",
        kind: ParameterKind::Number,
        category: "login",
    },
    SeededParameter {
        key: keys::LOGIN_AUTO_BLOCK_THRESHOLD,
        value: "10",
        kind: ParameterKind::Number,
        category: "login",
    },
    SeededParameter {
        key: keys::LOGIN_REQUIRE_VERIFIED_EMAIL,
        value: "true",
        kind: ParameterKind::Boolean,
        category: "login",
    },
    SeededParameter {
        key: keys::BLOCK_AUTO_DURATION_MINUTES,
        value: "30",
        kind: ParameterKind::Number,
        category: "blocking",
    },
    SeededParameter {
        key: keys::SESSION_MAX_ACTIVE_PER_USER,
        value: "5",
        kind: ParameterKind::Number,
        category: "sessions",
    },
    SeededParameter {
        key: keys::SESSION_LIFETIME_DAYS,
        value: "30",
        kind: ParameterKind::Number,
        category: "sessions",
    },
    SeededParameter {
        key: keys::ALERT_FAILED_LOGIN_THRESHOLD,
        value: "5",
        kind: ParameterKind::Number,
        category: "alerts",
    },
    SeededParameter {
        key: keys::ALERT_BRUTE_FORCE_THRESHOLD,
        value: "10",
        kind: ParameterKind::Number,
        category: "alerts",
    },
    SeededParameter {
        key: keys::ALERT_RATE_LIMIT_THRESHOLD,
        value: "10",
        kind: ParameterKind::Number,
        category: "alerts",
    },
];

/// Runtime-tunable settings, read through an in-memory snapshot.
///
/// The snapshot is filled at startup and after every write through this
/// store; a key absent from the snapshot falls back to a direct lookup and
/// is cached on the way out. Typed reads never fail: a missing or malformed
/// value yields the caller's default.
pub struct ParameterStore {
    db: Arc<Mutex<DatabaseConnection>>,
    cache: RwLock<HashMap<String, Parameter::Model>>,
}

impl ParameterStore {
    pub fn new(db: Arc<Mutex<DatabaseConnection>>) -> Self {
        Self {
            db,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Insert any missing default parameters, then load the snapshot.
    /// Safe to call on every boot.
    pub async fn seed_defaults(&self) -> Result<(), VigilError> {
        {
            let db = self.db.lock().await;
            for seed in DEFAULT_PARAMETERS {
                let existing = Parameter::Entity::find()
                    .filter(Parameter::Column::Key.eq(seed.key))
                    .one(&*db)
                    .await?;
                if existing.is_none() {
                    Parameter::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        key: Set(seed.key.to_owned()),
                        value: Set(seed.value.to_owned()),
                        kind: Set(seed.kind.clone()),
                        category: Set(seed.category.to_owned()),
                        updated_by: Set(None),
                        updated_at: Set(Utc::now()),
                    }
                    .insert(&*db)
                    .await?;
                    debug!(key = seed.key, value = seed.value, "Seeded parameter");
                }
            }
        }
        self.refresh().await
    }

    /// Reload the whole snapshot from the database.
    pub async fn refresh(&self) -> Result<(), VigilError> {
        let rows = {
            let db = self.db.lock().await;
            Parameter::Entity::find().all(&*db).await?
        };
        let mut cache = self.cache.write().await;
        cache.clear();
        for row in rows {
            cache.insert(row.key.clone(), row);
        }
        Ok(())
    }

    async fn lookup(&self, key: &str) -> Option<Parameter::Model> {
        if let Some(row) = self.cache.read().await.get(key) {
            return Some(row.clone());
        }

        // Lazy fill on snapshot miss
        let found = {
            let db = self.db.lock().await;
            match Parameter::Entity::find()
                .filter(Parameter::Column::Key.eq(key))
                .one(&*db)
                .await
            {
                Ok(found) => found,
                Err(error) => {
                    warn!(%key, %error, "Parameter lookup failed");
                    return None;
                }
            }
        };

        if let Some(row) = found {
            self.cache
                .write()
                .await
                .insert(row.key.clone(), row.clone());
            return Some(row);
        }
        None
    }

    pub async fn get_str(&self, key: &str, default: &str) -> String {
        match self.lookup(key).await {
            Some(row) => row.value,
            None => default.to_owned(),
        }
    }

    pub async fn get_i64(&self, key: &str, default: i64) -> i64 {
        match self.lookup(key).await {
            Some(row) => row.value.parse().unwrap_or_else(|_| {
                warn!(%key, value = %row.value, "Parameter is not a number, using default");
                default
            }),
            None => default,
        }
    }

    pub async fn get_f64(&self, key: &str, default: f64) -> f64 {
        match self.lookup(key).await {
            Some(row) => row.value.parse().unwrap_or_else(|_| {
                warn!(%key, value = %row.value, "Parameter is not a number, using default");
                default
            }),
            None => default,
        }
    }

    pub async fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.lookup(key).await {
            Some(row) => row.value.parse().unwrap_or_else(|_| {
                warn!(%key, value = %row.value, "Parameter is not a boolean, using default");
                default
            }),
            None => default,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.lookup(key).await {
            Some(row) => serde_json::from_str(&row.value).unwrap_or_else(|error| {
                warn!(%key, %error, "Parameter is not valid JSON, using default");
                default
            }),
            None => default,
        }
    }

    /// Admin update path. Writes the row, then the snapshot.
    pub async fn update(
        &self,
        key: &str,
        value: &str,
        updated_by: Option<Uuid>,
    ) -> Result<Parameter::Model, VigilError> {
        let row = {
            let db = self.db.lock().await;
            let row = Parameter::Entity::find()
                .filter(Parameter::Column::Key.eq(key))
                .one(&*db)
                .await?
                .ok_or_else(|| VigilError::ParameterNotFound(key.to_owned()))?;

            let mut active = row.into_active_model();
            active.value = Set(value.to_owned());
            active.updated_by = Set(updated_by);
            active.updated_at = Set(Utc::now());
            active.update(&*db).await?
        };

        self.cache
            .write()
            .await
            .insert(row.key.clone(), row.clone());
        debug!(%key, %value, "Parameter updated");
        Ok(row)
    }

    pub async fn create(
        &self,
        key: &str,
        value: &str,
        kind: ParameterKind,
        category: &str,
        updated_by: Option<Uuid>,
    ) -> Result<Parameter::Model, VigilError> {
        let row = {
            let db = self.db.lock().await;
            Parameter::ActiveModel {
                id: Set(Uuid::new_v4()),
                key: Set(key.to_owned()),
                value: Set(value.to_owned()),
                kind: Set(kind),
                category: Set(category.to_owned()),
                updated_by: Set(updated_by),
                updated_at: Set(Utc::now()),
            }
            .insert(&*db)
            .await?
        };

        self.cache
            .write()
            .await
            .insert(row.key.clone(), row.clone());
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters_have_unique_keys() {
        let mut keys: Vec<_> = DEFAULT_PARAMETERS.iter().map(|p| p.key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), DEFAULT_PARAMETERS.len());
    }

    #[test]
    fn test_default_parameters_parse_as_their_kind() {
        for seed in DEFAULT_PARAMETERS {
            match seed.kind {
                ParameterKind::Number => {
                    assert!(seed.value.parse::<i64>().is_ok(), "{}", seed.key)
                }
                ParameterKind::Boolean => {
                    assert!(seed.value.parse::<bool>().is_ok(), "{}", seed.key)
                }
                ParameterKind::Json => {
                    assert!(
                        serde_json::from_str::<serde_json::Value>(seed.value).is_ok(),
                        "{}",
                        seed.key
                    )
                }
                ParameterKind::String => {}
            }
        }
    }
}
