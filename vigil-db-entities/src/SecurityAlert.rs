use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use super::SecurityEvent::Severity;

#[derive(Debug, PartialEq, Eq, Serialize, Clone, Copy, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum AlertKind {
    #[sea_orm(string_value = "brute_force_attack")]
    BruteForceAttack,
    #[sea_orm(string_value = "multiple_failed_logins")]
    MultipleFailedLogins,
    #[sea_orm(string_value = "api_abuse")]
    ApiAbuse,
    #[sea_orm(string_value = "suspicious_activity")]
    SuspiciousActivity,
}

#[derive(Debug, PartialEq, Eq, Serialize, Clone, Copy, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AlertStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "investigating")]
    Investigating,
    #[sea_orm(string_value = "resolved")]
    Resolved,
    #[sea_orm(string_value = "dismissed")]
    Dismissed,
}

/// An escalated pattern awaiting operator review. Created only by
/// correlation logic; all later transitions are admin-driven.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "security_alerts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub kind: AlertKind,

    pub severity: Severity,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub user_id: Option<Uuid>,

    pub remote_ip: Option<String>,

    /// Ids of the events that triggered this alert, as a JSON array
    pub event_ids: serde_json::Value,

    pub status: AlertStatus,

    pub assigned_to: Option<Uuid>,

    #[sea_orm(column_type = "Text", nullable)]
    pub resolution: Option<String>,

    pub resolved_by: Option<Uuid>,

    pub resolved_at: Option<DateTime<Utc>>,

    pub created: DateTime<Utc>,

    pub updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
