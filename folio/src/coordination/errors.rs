use thiserror::Error;

use crate::backend::BackendError;
use crate::portfolio::{PortfolioError, RecordKind};
use crate::session::SessionError;

/// Fixed notice shown when sign-up is attempted after the admin account exists
pub const REGISTRATION_CLOSED_MESSAGE: &str = "Registration is not allowed. This portfolio is in single-user mode and already has an admin user.";

/// Errors surfaced by the registration, bootstrap and admin flows
#[derive(Error, Debug)]
pub enum CoordinationError {
    /// Sign-up attempted while an admin already exists
    #[error("{}", REGISTRATION_CLOSED_MESSAGE)]
    RegistrationClosed,

    /// Resource not found with context
    #[error("Resource not found: {resource_type} {resource_id}")]
    ResourceNotFound {
        resource_type: String,
        resource_id: String,
    },

    /// Creating or updating a record failed; shown to the admin as a fixed alert
    #[error("Error saving {kind}")]
    SaveFailed { kind: RecordKind, reason: String },

    #[error("Error deleting item")]
    DeleteFailed { reason: String },

    /// Error from the hosted backend; displays the provider's own text
    #[error("{0}")]
    BackendError(BackendError),

    #[error("Session error: {0}")]
    SessionError(SessionError),

    #[error("{0}")]
    PortfolioError(PortfolioError),
}

impl CoordinationError {
    /// Log the error and return self
    pub fn log(self) -> Self {
        match &self {
            Self::RegistrationClosed => {
                tracing::warn!("Sign-up rejected: an admin user already exists")
            }
            Self::ResourceNotFound {
                resource_type,
                resource_id,
            } => tracing::error!("Resource not found: {} {}", resource_type, resource_id),
            Self::SaveFailed { kind, reason } => {
                tracing::error!("Error saving {}: {}", kind, reason)
            }
            Self::DeleteFailed { reason } => tracing::error!("Error deleting item: {}", reason),
            Self::BackendError(err) => tracing::error!("Backend error: {}", err),
            Self::SessionError(err) => tracing::error!("Session error: {}", err),
            Self::PortfolioError(err) => tracing::error!("Portfolio error: {}", err),
        }
        self
    }
}

// Conversions log at the point the error crosses into coordination

impl From<BackendError> for CoordinationError {
    fn from(err: BackendError) -> Self {
        let error = Self::BackendError(err);
        tracing::error!("{}", error);
        error
    }
}

impl From<SessionError> for CoordinationError {
    fn from(err: SessionError) -> Self {
        let error = Self::SessionError(err);
        tracing::error!("{}", error);
        error
    }
}

impl From<PortfolioError> for CoordinationError {
    fn from(err: PortfolioError) -> Self {
        let error = Self::PortfolioError(err);
        tracing::error!("{}", error);
        error
    }
}
