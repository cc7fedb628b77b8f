//! GeoIndex: consultas por radio con prefiltro de caja y confirmación por
//! distancia exacta.
//!
//! Algoritmo en dos fases:
//! 1. Caja lat/lng derivada del radio con una aproximación fija de grados
//!    por km (barata: usa el índice sobre lat/lng del store).
//! 2. Haversine exacto sobre los candidatos para descartar el error de las
//!    esquinas de la caja.
//!
//! Asume entrada pre-validada (región y radio los valida `QueryService`);
//! un resultado vacío es válido, no un error.

use std::sync::Arc;

use factory_domain::Factory;

use crate::errors::EngineError;
use crate::store::FactoryStore;

/// Radio medio terrestre (IUGG), en km.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;
/// Km por grado de latitud (constante a efectos prácticos).
const KM_PER_DEG_LAT: f64 = 110.574;
/// Km por grado de longitud en el ecuador; se escala por cos(lat).
const KM_PER_DEG_LNG_EQUATOR: f64 = 111.320;

/// Caja de candidatos alrededor de un centro.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl BoundingBox {
    /// Caja que contiene el círculo de `radius_km` alrededor de (lat, lng).
    pub fn around(lat: f64, lng: f64, radius_km: f64) -> Self {
        let lat_delta = radius_km / KM_PER_DEG_LAT;
        let km_per_deg_lng = KM_PER_DEG_LNG_EQUATOR * lat.to_radians().cos();
        let lng_delta = radius_km / km_per_deg_lng;
        Self { lat_min: lat - lat_delta,
               lat_max: lat + lat_delta,
               lng_min: lng - lng_delta,
               lng_max: lng + lng_delta }
    }

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lng >= self.lng_min && lng <= self.lng_max
    }
}

/// Distancia de círculo máximo (haversine) entre dos puntos, en km.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Índice geoespacial sobre las fábricas del store.
pub struct GeoIndex<S: FactoryStore> {
    store: Arc<S>,
}

impl<S: FactoryStore> GeoIndex<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Fábricas a como mucho `radius_km` del centro, con su distancia,
    /// ordenadas por distancia ascendente (desempate por id para que la
    /// salida sea determinista con entradas idénticas).
    pub fn query(&self, lat: f64, lng: f64, radius_km: f64) -> Result<Vec<(Factory, f64)>, EngineError> {
        let bbox = BoundingBox::around(lat, lng, radius_km);
        let candidates = self.store.factories_in_box(&bbox)?;
        let mut hits: Vec<(Factory, f64)> = candidates.into_iter()
                                                      .map(|f| {
                                                          let d = haversine_km(lat, lng, f.lat, f.lng);
                                                          (f, d)
                                                      })
                                                      .filter(|(_, d)| *d <= radius_km)
                                                      .collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.id.cmp(&b.0.id)));
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = haversine_km(23.0, 121.0, 24.0, 121.0);
        assert!((d - 111.2).abs() < 1.0, "got {d}");
    }

    #[test]
    fn zero_distance_for_identical_points() {
        assert_eq!(haversine_km(23.0, 121.0, 23.0, 121.0), 0.0);
    }

    #[test]
    fn bounding_box_contains_the_circle() {
        let bbox = BoundingBox::around(23.0, 121.0, 5.0);
        // Puntos a ~5 km en las cuatro direcciones cardinales caen dentro.
        assert!(bbox.contains(23.0 + 5.0 / 110.574, 121.0));
        assert!(bbox.contains(23.0 - 5.0 / 110.574, 121.0));
        assert!(bbox.contains(23.0, 121.0));
        // Y un punto claramente fuera no.
        assert!(!bbox.contains(23.2, 121.0));
    }

    #[test]
    fn box_corner_is_rejected_by_exact_distance() {
        // La esquina de la caja queda a radio * sqrt(2): el prefiltro la
        // acepta pero el haversine la descarta.
        let bbox = BoundingBox::around(23.0, 121.0, 1.0);
        assert!(bbox.contains(bbox.lat_max, bbox.lng_max));
        let corner = haversine_km(23.0, 121.0, bbox.lat_max, bbox.lng_max);
        assert!(corner > 1.0, "corner at {corner} km");
    }
}
