//! QueryService: consulta de fábricas cercanas.
//!
//! Lectura pura e idempotente: valida región y radio, delega el filtrado al
//! GeoIndex y enriquece cada candidato con el pliegue del historial.

use std::sync::Arc;

use factory_domain::{RadiusLimits, RegionBounds};

use crate::audit::AuditSink;
use crate::errors::EngineError;
use crate::geo::GeoIndex;
use crate::ledger::fold_view;
use crate::store::FactoryStore;
use crate::view::FactoryView;

/// Parámetros ya presentes de una consulta de cercanía.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyRequest {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
}

impl NearbyRequest {
    /// Construye la petición desde parámetros crudos opcionales; si falta
    /// alguno el error los nombra todos de una vez.
    pub fn from_params(lat: Option<f64>, lng: Option<f64>, range: Option<f64>) -> Result<Self, EngineError> {
        let mut missing: Vec<&str> = Vec::new();
        if lat.is_none() {
            missing.push("lat");
        }
        if lng.is_none() {
            missing.push("lng");
        }
        if range.is_none() {
            missing.push("range");
        }
        if !missing.is_empty() {
            return Err(EngineError::Validation(format!("missing query parameter: {}", missing.join(", "))));
        }
        Ok(Self { lat: lat.unwrap(),
                  lng: lng.unwrap(),
                  radius_km: range.unwrap() })
    }
}

pub struct QueryService<S, A>
    where S: FactoryStore,
          A: AuditSink
{
    store: Arc<S>,
    geo: GeoIndex<S>,
    audit: A,
    region: RegionBounds,
    limits: RadiusLimits,
}

impl<S, A> QueryService<S, A>
    where S: FactoryStore,
          A: AuditSink
{
    pub fn new(store: Arc<S>, audit: A) -> Self {
        let geo = GeoIndex::new(Arc::clone(&store));
        Self { store,
               geo,
               audit,
               region: RegionBounds::default(),
               limits: RadiusLimits::default() }
    }

    pub fn with_region(mut self, region: RegionBounds) -> Self {
        self.region = region;
        self
    }

    pub fn with_radius_limits(mut self, limits: RadiusLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Fábricas a `radius_km` o menos de (lat, lng), en orden de distancia
    /// ascendente, cada una con su vista derivada e imágenes adjuntas.
    pub fn nearby(&self, request: &NearbyRequest) -> Result<Vec<FactoryView>, EngineError> {
        match self.nearby_inner(request) {
            Ok(views) => {
                self.audit.event("nearby", &format!("({}, {}) r={} km -> {} factories",
                                                    request.lat, request.lng, request.radius_km, views.len()));
                Ok(views)
            }
            Err(err) => {
                self.audit.failure("nearby", &err.to_string());
                Err(err)
            }
        }
    }

    fn nearby_inner(&self, request: &NearbyRequest) -> Result<Vec<FactoryView>, EngineError> {
        self.region.check(request.lat, request.lng)?;
        self.limits.check(request.radius_km)?;

        let hits = self.geo.query(request.lat, request.lng, request.radius_km)?;
        let mut views = Vec::with_capacity(hits.len());
        for (factory, _distance) in hits {
            let records = self.store.records_for(factory.id)?;
            let images = self.store.images_for(factory.id)?;
            views.push(FactoryView::assemble(factory, fold_view(&records), &images));
        }
        Ok(views)
    }
}
