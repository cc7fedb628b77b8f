//! Validación de región y de radio de búsqueda.
//!
//! La región válida y los límites de radio son valores de configuración que
//! se inyectan en los servicios (sin estado global); los defaults compilados
//! son los de la región de referencia.

use crate::DomainError;

/// Caja de coordenadas válidas, en grados decimales. Inclusiva en ambos
/// extremos: un punto exactamente en el borde se acepta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl RegionBounds {
    /// Región de referencia: Taiwán, lat [22, 25], lng [120, 122].
    pub const fn taiwan() -> Self {
        Self { lat_min: 22.0,
               lat_max: 25.0,
               lng_min: 120.0,
               lng_max: 122.0 }
    }

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lng >= self.lng_min && lng <= self.lng_max
    }

    /// Valida un punto; el error describe los rangos válidos.
    pub fn check(&self, lat: f64, lng: f64) -> Result<(), DomainError> {
        if self.contains(lat, lng) {
            Ok(())
        } else {
            Err(DomainError::OutsideRegion(format!(
                "position ({lat}, {lng}) is outside the valid region; expected {} <= lat <= {} and {} <= lng <= {}",
                self.lat_min, self.lat_max, self.lng_min, self.lng_max
            )))
        }
    }
}

impl Default for RegionBounds {
    fn default() -> Self {
        Self::taiwan()
    }
}

/// Límites de radio para consultas de cercanía, en km (inclusivos).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusLimits {
    pub min_km: f64,
    pub max_km: f64,
}

impl RadiusLimits {
    pub fn check(&self, radius_km: f64) -> Result<(), DomainError> {
        if radius_km.is_finite() && radius_km >= self.min_km && radius_km <= self.max_km {
            Ok(())
        } else {
            Err(DomainError::RadiusOutOfRange(format!(
                "`range` should be within {} to {} km, but got {radius_km}",
                self.min_km, self.max_km
            )))
        }
    }
}

impl Default for RadiusLimits {
    fn default() -> Self {
        Self { min_km: 0.01,
               max_km: 100.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_accepts_interior_and_edges() {
        let region = RegionBounds::taiwan();
        assert!(region.check(23.0, 121.0).is_ok());
        assert!(region.check(22.0, 120.0).is_ok());
        assert!(region.check(25.0, 122.0).is_ok());
    }

    #[test]
    fn region_rejects_outside_naming_ranges() {
        let err = RegionBounds::taiwan().check(30.0, 121.0).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("22 <= lat <= 25"), "got: {msg}");
        assert!(msg.contains("120 <= lng <= 122"), "got: {msg}");
    }

    #[test]
    fn radius_limits_inclusive() {
        let limits = RadiusLimits::default();
        assert!(limits.check(0.01).is_ok());
        assert!(limits.check(100.0).is_ok());
        assert!(limits.check(0.001).is_err());
        assert!(limits.check(150.0).is_err());
        assert!(limits.check(f64::NAN).is_err());
    }
}
