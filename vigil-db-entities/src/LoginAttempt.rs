use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, PartialEq, Eq, Serialize, Clone, Copy, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum FailureReason {
    #[sea_orm(string_value = "invalid_email")]
    InvalidEmail,
    #[sea_orm(string_value = "invalid_password")]
    InvalidPassword,
    #[sea_orm(string_value = "account_locked")]
    AccountLocked,
    #[sea_orm(string_value = "account_inactive")]
    AccountInactive,
    #[sea_orm(string_value = "email_not_verified")]
    EmailNotVerified,
    #[sea_orm(string_value = "rate_limited")]
    RateLimited,
    #[sea_orm(string_value = "ip_blocked")]
    IpBlocked,
}

/// One authentication attempt, successful or not. Rows are append-only and
/// only ever removed by retention cleanup.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "login_attempts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Email that was attempted (may not correspond to an account)
    pub email: String,

    /// Remote IP address of the client
    pub remote_ip: String,

    #[sea_orm(column_type = "Text")]
    pub user_agent: String,

    pub success: bool,

    /// Set only when `success` is false
    pub failure_reason: Option<FailureReason>,

    /// Resolved account, when the email matched one
    pub user_id: Option<Uuid>,

    pub timestamp: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
