//! Imagen de evidencia subida por un colaborador externo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Imagen de evidencia. Invariante: o ambas referencias son `None` (imagen
/// recién subida, a la espera de binding) o ambas apuntan al mismo par
/// Factory/ReportRecord, fijadas atómicamente y una sola vez.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: Uuid,
    /// URL de origen; el hosting de la imagen queda fuera del sistema.
    pub image_path: String,
    pub factory_id: Option<Uuid>,
    pub report_record_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Image {
    pub fn is_attached(&self) -> bool {
        self.factory_id.is_some() || self.report_record_id.is_some()
    }
}
