//! Stateless service functions bridging callers and the record store.

use thiserror::Error;

use crate::forms::FieldError;
use crate::repository::errors::RepositoryError;

pub mod client;

/// Error taxonomy surfaced to calling code.
///
/// Everything here is recoverable: validation and conflicts re-render the
/// form, `NotFound` prompts a refetch, store errors surface a message and
/// roll back any optimistic mutation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// One entry per violated schema rule, never only the first.
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// Another active record already holds this tax identifier.
    #[error("an active client already holds tax id {0}")]
    UniquenessConflict(String),

    /// Stale identifier: the record no longer exists (or was soft-deleted
    /// out from under the caller).
    #[error("client not found")]
    NotFound,

    /// Store-level failure (connectivity, permissions, constraint), carrying
    /// the underlying message.
    #[error("store error: {0}")]
    Store(RepositoryError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            other => ServiceError::Store(other),
        }
    }
}

impl From<Vec<FieldError>> for ServiceError {
    fn from(errors: Vec<FieldError>) -> Self {
        ServiceError::Validation(errors)
    }
}
