use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Un campo de la petición no pasa la validación estructural.
    #[error("field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },
    /// Coordenadas fuera de la región configurada.
    #[error("{0}")]
    OutsideRegion(String),
    /// Radio de búsqueda fuera de los límites permitidos.
    #[error("{0}")]
    RadiusOutOfRange(String),
}

impl DomainError {
    pub fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField { field: field.to_string(),
                             reason: reason.into() }
    }
}
