use std::error::Error;

use uuid::Uuid;

#[derive(thiserror::Error, Debug)]
pub enum VigilError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("parameter {0} not found")]
    ParameterNotFound(String),
    #[error("alert {0} not found")]
    AlertNotFound(Uuid),
    #[error("security event {0} not found")]
    EventNotFound(Uuid),
    #[error("session {0} not found")]
    SessionNotFound(Uuid),
    #[error("alert {id}: cannot transition from {from} to {to}")]
    InvalidAlertTransition {
        id: Uuid,
        from: String,
        to: String,
    },
    #[error("security event {0} has already been reviewed")]
    EventAlreadyReviewed(Uuid),
    #[error("deserialization failed: {0}")]
    DeserializeJson(#[from] serde_json::Error),
    #[error("failed to parse URL: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error(transparent)]
    Other(Box<dyn Error + Send + Sync>),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl VigilError {
    pub fn other<E: Error + Send + Sync + 'static>(err: E) -> Self {
        Self::Other(Box::new(err))
    }
}
