//! Payload de alta de fábrica y su validación estructural.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DomainError, FactoryType};

/// Alta de fábrica tal como llega del cliente. Los nombres serde son el
/// contrato del wire (`type`, `images`...); la validación semántica vive en
/// `validate_fields`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorySubmission {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Código de categoría; se valida contra el conjunto cerrado.
    #[serde(rename = "type")]
    pub factory_type: Option<String>,
    /// Ids de imágenes pre-subidas y aún sin adjuntar.
    #[serde(default)]
    pub images: Vec<Uuid>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub others: Option<String>,
}

impl FactorySubmission {
    /// Validación estructural campo a campo (paso 1 de la ingesta). No toca
    /// la región: eso es la puerta siguiente y tiene su propio error.
    pub fn validate_fields(&self) -> Result<Option<FactoryType>, DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::invalid_field("name", "must not be empty"));
        }
        if !self.lat.is_finite() {
            return Err(DomainError::invalid_field("lat", "must be a finite number"));
        }
        if !self.lng.is_finite() {
            return Err(DomainError::invalid_field("lng", "must be a finite number"));
        }
        match &self.factory_type {
            Some(code) => FactoryType::from_code(code).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> FactorySubmission {
        FactorySubmission { name: "違章工廠".to_string(),
                            lat: 23.0,
                            lng: 121.0,
                            factory_type: Some("2-1".to_string()),
                            images: vec![],
                            contact: None,
                            others: None }
    }

    #[test]
    fn valid_submission_resolves_type() {
        assert_eq!(base().validate_fields().unwrap(), Some(FactoryType::MetalCutting));
    }

    #[test]
    fn empty_name_rejected_with_field_detail() {
        let mut s = base();
        s.name = "  ".into();
        let err = s.validate_fields().unwrap_err();
        assert!(err.to_string().contains("`name`"));
    }

    #[test]
    fn unknown_type_code_rejected() {
        let mut s = base();
        s.factory_type = Some("banana".into());
        assert!(s.validate_fields().is_err());
    }

    #[test]
    fn missing_type_is_allowed() {
        let mut s = base();
        s.factory_type = None;
        assert_eq!(s.validate_fields().unwrap(), None);
    }

    #[test]
    fn wire_names_match_contract() {
        let json = serde_json::json!({
            "name": "f", "lat": 23.0, "lng": 121.0, "type": "3"
        });
        let s: FactorySubmission = serde_json::from_value(json).unwrap();
        assert_eq!(s.factory_type.as_deref(), Some("3"));
        assert!(s.images.is_empty());
    }
}
