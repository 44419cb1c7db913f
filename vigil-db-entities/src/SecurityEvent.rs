use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, PartialEq, Eq, Serialize, Clone, Copy, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Severity {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "critical")]
    Critical,
}

#[derive(Debug, PartialEq, Eq, Serialize, Clone, Copy, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum EventKind {
    #[sea_orm(string_value = "login_success")]
    LoginSuccess,
    #[sea_orm(string_value = "login_failure")]
    LoginFailure,
    #[sea_orm(string_value = "rate_limit_exceeded")]
    RateLimitExceeded,
    #[sea_orm(string_value = "ip_blocked")]
    IpBlocked,
    #[sea_orm(string_value = "ip_unblocked")]
    IpUnblocked,
    #[sea_orm(string_value = "session_created")]
    SessionCreated,
    #[sea_orm(string_value = "session_revoked")]
    SessionRevoked,
    #[sea_orm(string_value = "admin_action")]
    AdminAction,
    #[sea_orm(string_value = "suspicious_activity")]
    SuspiciousActivity,
}

/// Append-only record of a security-relevant occurrence. The review marker
/// is the only part an operator may set later.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "security_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub kind: EventKind,

    pub severity: Severity,

    pub remote_ip: String,

    pub user_id: Option<Uuid>,

    pub email: Option<String>,

    pub endpoint: Option<String>,

    pub method: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub metadata: serde_json::Value,

    pub reviewed: bool,

    pub reviewed_by: Option<Uuid>,

    pub reviewed_at: Option<DateTime<Utc>>,

    #[sea_orm(column_type = "Text", nullable)]
    pub review_notes: Option<String>,

    pub timestamp: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
