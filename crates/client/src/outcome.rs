use thiserror::Error;

use orderdesk_core::audit::DataSource;
use orderdesk_core::domain::record::EntityKind;
use orderdesk_core::errors::{ApplicationError, DomainError};
use orderdesk_fallback::FallbackError;

use crate::transport::TransportError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: i64 },
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<FallbackError> for ServiceError {
    fn from(error: FallbackError) -> Self {
        match error {
            FallbackError::NotFound { entity, id } => Self::NotFound { entity, id },
        }
    }
}

impl From<ServiceError> for ApplicationError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Validation(message) => Self::Domain(DomainError::Validation(message)),
            ServiceError::NotFound { entity, id } => {
                Self::Domain(DomainError::NotFound { entity: entity.to_string(), id })
            }
            ServiceError::Transport(error) => Self::Transport(error.to_string()),
        }
    }
}

/// Result of a service call. `Live` and `Fallback` carry identical shapes.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<T> {
    Live(T),
    Fallback(T),
    Failed(ServiceError),
}

impl<T> Outcome<T> {
    pub fn source(&self) -> Option<DataSource> {
        match self {
            Self::Live(_) => Some(DataSource::Live),
            Self::Fallback(_) => Some(DataSource::Fallback),
            Self::Failed(_) => None,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Live(value) | Self::Fallback(value) => Some(value),
            Self::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ServiceError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn into_result(self) -> Result<T, ServiceError> {
        match self {
            Self::Live(value) | Self::Fallback(value) => Ok(value),
            Self::Failed(error) => Err(error),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Live(value) => Outcome::Live(f(value)),
            Self::Fallback(value) => Outcome::Fallback(f(value)),
            Self::Failed(error) => Outcome::Failed(error),
        }
    }
}
