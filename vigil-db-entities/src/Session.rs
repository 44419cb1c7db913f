use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;
use uuid::Uuid;

/// A long-lived login session. The raw credential is never stored; rows are
/// deactivated on logout, rotation, cap eviction or expiry, never deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    /// SHA-256 of the session credential
    #[sea_orm(unique)]
    pub token_hash: String,

    pub remote_ip: String,

    #[sea_orm(column_type = "Text")]
    pub user_agent: String,

    /// Derived from the user agent once, at creation
    pub device: String,
    pub browser: String,
    pub os: String,

    pub active: bool,

    pub last_activity: DateTime<Utc>,

    pub created: DateTime<Utc>,

    /// Absolute expiry, independent of activity
    pub expires_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
