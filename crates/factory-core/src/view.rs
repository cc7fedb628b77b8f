//! Vista serializable de una fábrica enriquecida con su estado derivado.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use factory_domain::{Factory, FactoryStatus, FactoryType, Image};

use crate::ledger::DerivedView;

/// Imagen en la respuesta: sólo la URL de origen.
#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    pub url: String,
}

impl From<&Image> for ImageView {
    fn from(img: &Image) -> Self {
        Self { url: img.image_path.clone() }
    }
}

/// Respuesta de fábrica. `status` y `reported_at` salen del pliegue del
/// historial, no de columnas propias.
#[derive(Debug, Clone, Serialize)]
pub struct FactoryView {
    pub id: Uuid,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub landcode: String,
    #[serde(rename = "type")]
    pub factory_type: Option<FactoryType>,
    pub status: FactoryStatus,
    pub reported_at: Option<DateTime<Utc>>,
    pub images: Vec<ImageView>,
    pub created_at: DateTime<Utc>,
}

impl FactoryView {
    pub fn assemble(factory: Factory, derived: DerivedView, images: &[Image]) -> Self {
        Self { id: factory.id,
               name: factory.name,
               lat: factory.lat,
               lng: factory.lng,
               landcode: factory.landcode,
               factory_type: factory.factory_type,
               status: derived.status,
               reported_at: derived.reported_at,
               images: images.iter().map(ImageView::from).collect(),
               created_at: factory.created_at }
    }
}
