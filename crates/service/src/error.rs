//! Error taxonomy shared by the leaderboard service and the prompt relay

use persistence::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// A required credential is missing from the environment
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Caller sent a malformed or missing required field
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The persistence backend call failed
    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: DbError,
    },

    /// The external generation API failed or was unreachable
    #[error("{context}: {detail}")]
    Upstream {
        context: &'static str,
        detail: String,
    },
}

impl ServiceError {
    pub fn storage(context: &'static str, source: DbError) -> Self {
        Self::Storage { context, source }
    }

    /// Message that may be returned to the caller. Backend and upstream
    /// detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Configuration(msg) | Self::InvalidInput(msg) => msg.clone(),
            Self::Storage { context, .. } | Self::Upstream { context, .. } => context.to_string(),
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
