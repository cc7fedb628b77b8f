//! Taxonomía de errores del motor.
//!
//! Tres familias visibles al cliente: `Validation` (4xx, sin
//! estado parcial), `Resolution` (colaborador externo caído, reintentable) y
//! `NotFound`. `Storage` cubre fallos del backend: la transacción ya quedó
//! revertida cuando el error sale a la superficie.

use thiserror::Error;
use uuid::Uuid;

use factory_domain::DomainError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("land parcel resolution unavailable: {0}")]
    Resolution(String),
    #[error("factory not found: {0}")]
    NotFound(Uuid),
    #[error("storage failure: {0}")]
    Storage(String),
}

impl EngineError {
    /// `true` si el cliente puede reenviar la misma petición tal cual.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Resolution(_) | EngineError::Storage(_))
    }
}

impl From<DomainError> for EngineError {
    fn from(err: DomainError) -> Self {
        EngineError::Validation(err.to_string())
    }
}
