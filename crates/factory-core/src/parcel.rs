//! Frontera del colaborador externo de catastro.
//!
//! El core sólo conoce este trait: resolver (lng, lat) a un código de
//! parcela o fallar con un error genérico. Cualquier fallo aborta la ingesta
//! ANTES de abrir la transacción, así que nunca deja estado parcial; el
//! reintento es política del llamador, no del core.

use thiserror::Error;

/// Fallo genérico de resolución (red, timeout, servicio caído). El core no
/// distingue más fino que esto.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ResolutionFailure(pub String);

pub trait ParcelResolver: Send + Sync {
    /// Resuelve una coordenada al código catastral de su parcela.
    fn resolve(&self, lng: f64, lat: f64) -> Result<String, ResolutionFailure>;
}

/// Resolver de código fijo, para demos y tests.
pub struct StaticParcelResolver {
    pub landcode: String,
}

impl StaticParcelResolver {
    pub fn new(landcode: &str) -> Self {
        Self { landcode: landcode.to_string() }
    }
}

impl ParcelResolver for StaticParcelResolver {
    fn resolve(&self, _lng: f64, _lat: f64) -> Result<String, ResolutionFailure> {
        Ok(self.landcode.clone())
    }
}

/// Resolver que siempre falla, para probar la ruta de aborto sin estado
/// parcial.
pub struct FailingParcelResolver;

impl ParcelResolver for FailingParcelResolver {
    fn resolve(&self, _lng: f64, _lat: f64) -> Result<String, ResolutionFailure> {
        Err(ResolutionFailure("land parcel service unreachable".to_string()))
    }
}
