//! IngestCoordinator: punto de entrada de "reportar una fábrica nueva".
//!
//! Secuencia de puertas duras (cada una corta sin estado parcial):
//! 1. validación estructural del payload (campo a campo);
//! 2. validación de región;
//! 3. pre-chequeo de imágenes (existencia + sin adjuntar), antes de gastar
//!    una llamada al resolver en una petición condenada;
//! 4. resolución catastral — llamada externa, estrictamente ANTES de abrir
//!    la transacción para no sostener locks sobre latencia de red;
//! 5. transacción atómica {Factory, ReportRecord de creación, adjuntos};
//! 6. respuesta con la vista derivada (status default, reported_at null).

use std::sync::Arc;

use factory_domain::{FactorySubmission, RegionBounds, ReportAction};

use crate::audit::AuditSink;
use crate::binder::EvidenceBinder;
use crate::errors::EngineError;
use crate::ledger::fold_view;
use crate::parcel::ParcelResolver;
use crate::store::{FactoryStore, NewFactory, ReportDraft};
use crate::view::FactoryView;

pub struct IngestCoordinator<S, P, A>
    where S: FactoryStore,
          P: ParcelResolver,
          A: AuditSink
{
    store: Arc<S>,
    resolver: P,
    audit: A,
    region: RegionBounds,
}

impl<S, P, A> IngestCoordinator<S, P, A>
    where S: FactoryStore,
          P: ParcelResolver,
          A: AuditSink
{
    pub fn new(store: Arc<S>, resolver: P, audit: A) -> Self {
        Self { store,
               resolver,
               audit,
               region: RegionBounds::default() }
    }

    pub fn with_region(mut self, region: RegionBounds) -> Self {
        self.region = region;
        self
    }

    /// Alta de fábrica. Una escritura durable y una llamada saliente al
    /// resolver por invocación; sin reintentos internos.
    pub fn submit(&self, submission: FactorySubmission, client_origin: Option<&str>) -> Result<FactoryView, EngineError> {
        let origin = client_origin.unwrap_or("unknown");
        match self.submit_inner(&submission, client_origin) {
            Ok(view) => {
                self.audit.event(origin, &format!("factory created: {} at ({}, {}) landcode {}",
                                                  view.name, view.lat, view.lng, view.landcode));
                Ok(view)
            }
            Err(err) => {
                self.audit.failure(origin, &err.to_string());
                Err(err)
            }
        }
    }

    fn submit_inner(&self, submission: &FactorySubmission, client_origin: Option<&str>) -> Result<FactoryView, EngineError> {
        // Puerta 1: estructura y códigos cerrados.
        let factory_type = submission.validate_fields()?;

        // Puerta 2: región válida.
        self.region.check(submission.lat, submission.lng)?;

        // Puerta 3: pre-chequeo de imágenes en una sola consulta. Falla
        // rápido antes de la llamada externa; la transacción repetirá la
        // verificación bajo su aislamiento.
        if !submission.images.is_empty() {
            let fetched = self.store.fetch_images(&submission.images)?;
            EvidenceBinder::verify_claimable(&submission.images, &fetched)?;
        }

        // Puerta 4: resolución catastral (fuera de la transacción).
        let landcode = self.resolver
                           .resolve(submission.lng, submission.lat)
                           .map_err(|e| EngineError::Resolution(e.to_string()))?;

        // Puerta 5: transacción atómica.
        let action_body = serde_json::to_value(submission).map_err(|e| EngineError::Storage(e.to_string()))?;
        let draft = ReportDraft { action: ReportAction::CreationReport,
                                  action_body,
                                  contact: submission.contact.clone(),
                                  others: submission.others.clone(),
                                  user_ip: client_origin.map(str::to_string) };
        let new_factory = NewFactory { name: submission.name.clone(),
                                       lat: submission.lat,
                                       lng: submission.lng,
                                       factory_type,
                                       landcode };
        let receipt = self.store.ingest(new_factory, draft, &submission.images)?;
        EvidenceBinder::confirm_attached(submission.images.len(), receipt.images_attached)?;

        // Puerta 6: vista derivada del historial recién escrito.
        let records = self.store.records_for(receipt.factory.id)?;
        let images = self.store.images_for(receipt.factory.id)?;
        Ok(FactoryView::assemble(receipt.factory, fold_view(&records), &images))
    }
}
