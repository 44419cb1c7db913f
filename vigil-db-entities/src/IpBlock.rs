use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, PartialEq, Eq, Serialize, Clone, Copy, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum BlockOrigin {
    #[sea_orm(string_value = "system")]
    System,
    #[sea_orm(string_value = "admin")]
    Admin,
}

/// One row per blocked IP. Re-triggered blocks update the existing row;
/// at most one row per address is active at any time.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "ip_blocks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub ip_address: String,

    #[sea_orm(column_type = "Text")]
    pub reason: String,

    pub origin: BlockOrigin,

    /// Admin who placed the block, for manual blocks
    pub admin_id: Option<Uuid>,

    /// Permanent blocks never expire and carry no expiry timestamp
    pub permanent: bool,

    pub expires_at: Option<DateTime<Utc>>,

    /// Requests seen from this address while the block was in force
    pub attempt_count: i32,

    pub active: bool,

    pub blocked_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.permanent && self.expires_at.map(|e| e <= now).unwrap_or(false)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
