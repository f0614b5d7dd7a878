use axum::http::StatusCode;
use thiserror::Error;

/// Requête GENA refusée ; chaque cas correspond à un statut HTTP sans corps.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("No such subscription: {0}")]
    NoSuchSubscription(String),

    #[error("Missing SID header")]
    MissingSid,

    #[error("Invalid CALLBACK header: {0}")]
    InvalidCallback(String),

    #[error("Unsupported NT header: {0}")]
    InvalidNt(String),

    #[error("SID cannot be combined with NT or CALLBACK")]
    IncompatibleHeaders,

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),
}

impl SubscriptionError {
    pub fn status(&self) -> StatusCode {
        match self {
            SubscriptionError::IncompatibleHeaders => StatusCode::BAD_REQUEST,
            SubscriptionError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::PRECONDITION_FAILED,
        }
    }
}
