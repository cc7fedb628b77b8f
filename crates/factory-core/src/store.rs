//! Contrato de almacenamiento y backend en memoria.
//!
//! El trait `FactoryStore` es la frontera transaccional: `ingest` escribe
//! {Factory, ReportRecord inicial, adjunto de imágenes} como una unidad
//! atómica o no escribe nada. El backend en memoria serializa las escrituras
//! con un mutex sobre su estado, de modo que dos ingestas concurrentes que
//! reclaman la misma imagen se resuelven igual que en Postgres: exactamente
//! una gana y la otra recibe `Validation`.
//!
//! Paridad: el backend Postgres (`factory-persistence`) implementa este
//! mismo trait; los tests de escenario del core valen para ambos.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use factory_domain::{Factory, FactoryType, Image, ReportAction, ReportRecord};

use crate::binder::EvidenceBinder;
use crate::errors::EngineError;
use crate::geo::BoundingBox;

/// Fábrica a crear (el store asigna id y timestamp).
#[derive(Debug, Clone)]
pub struct NewFactory {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub factory_type: Option<FactoryType>,
    pub landcode: String,
}

/// Registro a anexar (el store asigna id monotónico y timestamp).
#[derive(Debug, Clone)]
pub struct ReportDraft {
    pub action: ReportAction,
    pub action_body: serde_json::Value,
    pub contact: Option<String>,
    pub others: Option<String>,
    pub user_ip: Option<String>,
}

/// Resultado de una ingesta confirmada.
#[derive(Debug, Clone)]
pub struct IngestReceipt {
    pub factory: Factory,
    pub record: ReportRecord,
    pub images_attached: usize,
}

/// Almacenamiento durable de fábricas, historial e imágenes.
///
/// Las lecturas son concurrentes entre sí y con ingestas en vuelo, a
/// aislamiento de "última transacción confirmada": jamás se observa una
/// `Factory` sin su `ReportRecord` de creación.
pub trait FactoryStore: Send + Sync {
    /// Escritura atómica de la ingesta completa. Dentro de la transacción se
    /// repite la verificación del binder sobre las imágenes reclamadas; si
    /// cualquier paso falla no queda estado parcial observable.
    fn ingest(&self, factory: NewFactory, record: ReportDraft, image_ids: &[Uuid]) -> Result<IngestReceipt, EngineError>;

    /// Anexa un registro al historial de una fábrica existente.
    fn append_record(&self, factory_id: Uuid, draft: ReportDraft) -> Result<ReportRecord, EngineError>;

    fn factory(&self, id: Uuid) -> Result<Option<Factory>, EngineError>;

    /// Candidatos del prefiltro geoespacial (scan indexado por lat/lng).
    fn factories_in_box(&self, bbox: &BoundingBox) -> Result<Vec<Factory>, EngineError>;

    /// Historial completo ordenado por (created_at, id) ascendente.
    /// `NotFound` si la fábrica no existe.
    fn records_for(&self, factory_id: Uuid) -> Result<Vec<ReportRecord>, EngineError>;

    fn images_for(&self, factory_id: Uuid) -> Result<Vec<Image>, EngineError>;

    /// Carga el conjunto pedido en una sola consulta (pre-chequeo del
    /// binder). Los ids inexistentes simplemente no aparecen en la salida.
    fn fetch_images(&self, ids: &[Uuid]) -> Result<Vec<Image>, EngineError>;

    /// Alta de imagen sin adjuntar (gancho del colaborador de subida, que
    /// queda fuera del core).
    fn add_unattached_image(&self, image_path: &str) -> Result<Image, EngineError>;
}

#[derive(Default)]
struct State {
    factories: HashMap<Uuid, Factory>,
    records: Vec<ReportRecord>,
    images: HashMap<Uuid, Image>,
    next_record_id: i64,
}

/// Backend en memoria (tests, demo). Mismo contrato que Postgres.
#[derive(Default)]
pub struct InMemoryFactoryStore {
    state: Mutex<State>,
}

impl InMemoryFactoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>, EngineError> {
        self.state
            .lock()
            .map_err(|_| EngineError::Storage("in-memory store poisoned".to_string()))
    }
}

impl FactoryStore for InMemoryFactoryStore {
    fn ingest(&self, factory: NewFactory, record: ReportDraft, image_ids: &[Uuid]) -> Result<IngestReceipt, EngineError> {
        // El lock cubre verificación y escritura: equivale al aislamiento de
        // la transacción Postgres para el reclamo de imágenes.
        let mut state = self.lock()?;

        let fetched: Vec<Image> = image_ids.iter().filter_map(|id| state.images.get(id).cloned()).collect();
        EvidenceBinder::verify_claimable(image_ids, &fetched)?;

        let now = Utc::now();
        let stored_factory = Factory { id: Uuid::new_v4(),
                                       name: factory.name,
                                       lat: factory.lat,
                                       lng: factory.lng,
                                       landcode: factory.landcode,
                                       factory_type: factory.factory_type,
                                       created_at: now };
        state.next_record_id += 1;
        let stored_record = ReportRecord { id: state.next_record_id,
                                           factory_id: stored_factory.id,
                                           action: record.action,
                                           action_body: record.action_body,
                                           contact: record.contact,
                                           others: record.others,
                                           user_ip: record.user_ip,
                                           created_at: now };

        for id in image_ids {
            if let Some(img) = state.images.get_mut(id) {
                img.factory_id = Some(stored_factory.id);
                img.report_record_id = Some(stored_record.id);
            }
        }
        state.factories.insert(stored_factory.id, stored_factory.clone());
        state.records.push(stored_record.clone());

        Ok(IngestReceipt { factory: stored_factory,
                           record: stored_record,
                           images_attached: image_ids.len() })
    }

    fn append_record(&self, factory_id: Uuid, draft: ReportDraft) -> Result<ReportRecord, EngineError> {
        let mut state = self.lock()?;
        if !state.factories.contains_key(&factory_id) {
            return Err(EngineError::NotFound(factory_id));
        }
        state.next_record_id += 1;
        let record = ReportRecord { id: state.next_record_id,
                                    factory_id,
                                    action: draft.action,
                                    action_body: draft.action_body,
                                    contact: draft.contact,
                                    others: draft.others,
                                    user_ip: draft.user_ip,
                                    created_at: Utc::now() };
        state.records.push(record.clone());
        Ok(record)
    }

    fn factory(&self, id: Uuid) -> Result<Option<Factory>, EngineError> {
        Ok(self.lock()?.factories.get(&id).cloned())
    }

    fn factories_in_box(&self, bbox: &BoundingBox) -> Result<Vec<Factory>, EngineError> {
        let state = self.lock()?;
        let mut out: Vec<Factory> = state.factories
                                         .values()
                                         .filter(|f| bbox.contains(f.lat, f.lng))
                                         .cloned()
                                         .collect();
        out.sort_by_key(|f| f.id);
        Ok(out)
    }

    fn records_for(&self, factory_id: Uuid) -> Result<Vec<ReportRecord>, EngineError> {
        let state = self.lock()?;
        if !state.factories.contains_key(&factory_id) {
            return Err(EngineError::NotFound(factory_id));
        }
        let mut out: Vec<ReportRecord> = state.records
                                              .iter()
                                              .filter(|r| r.factory_id == factory_id)
                                              .cloned()
                                              .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    fn images_for(&self, factory_id: Uuid) -> Result<Vec<Image>, EngineError> {
        let state = self.lock()?;
        let mut out: Vec<Image> = state.images
                                       .values()
                                       .filter(|i| i.factory_id == Some(factory_id))
                                       .cloned()
                                       .collect();
        out.sort_by_key(|i| i.id);
        Ok(out)
    }

    fn fetch_images(&self, ids: &[Uuid]) -> Result<Vec<Image>, EngineError> {
        let state = self.lock()?;
        Ok(ids.iter().filter_map(|id| state.images.get(id).cloned()).collect())
    }

    fn add_unattached_image(&self, image_path: &str) -> Result<Image, EngineError> {
        let mut state = self.lock()?;
        let image = Image { id: Uuid::new_v4(),
                            image_path: image_path.to_string(),
                            factory_id: None,
                            report_record_id: None,
                            created_at: Utc::now() };
        state.images.insert(image.id, image.clone());
        Ok(image)
    }
}
