//! Entidad `Factory` y sus enums cerrados.
//!
//! Los códigos de categoría y de estado son conjuntos cerrados: cualquier
//! código no reconocido se rechaza en la frontera de ingreso y nunca llega a
//! persistirse como texto libre.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::DomainError;

/// Categoría industrial de una fábrica (conjunto cerrado de códigos).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactoryType {
    /// 2-1: 沖床、銑床、車床、鏜孔
    #[serde(rename = "2-1")]
    MetalCutting,
    /// 2-2: 焊接、鑄造、熱處理
    #[serde(rename = "2-2")]
    MetalCasting,
    /// 2-3: 金屬表面處理、噴漆
    #[serde(rename = "2-3")]
    MetalSurface,
    /// 3: 塑膠加工、射出
    #[serde(rename = "3")]
    Plastics,
    /// 4: 橡膠加工
    #[serde(rename = "4")]
    Rubber,
    /// 5: 非金屬礦物（石材）
    #[serde(rename = "5")]
    Stone,
    /// 6: 食品
    #[serde(rename = "6")]
    Food,
    /// 7: 皮革
    #[serde(rename = "7")]
    Leather,
    /// 8: 紡織
    #[serde(rename = "8")]
    Textile,
    /// 9: 其他
    #[serde(rename = "9")]
    Other,
}

impl FactoryType {
    pub const ALL: [FactoryType; 10] = [FactoryType::MetalCutting,
                                        FactoryType::MetalCasting,
                                        FactoryType::MetalSurface,
                                        FactoryType::Plastics,
                                        FactoryType::Rubber,
                                        FactoryType::Stone,
                                        FactoryType::Food,
                                        FactoryType::Leather,
                                        FactoryType::Textile,
                                        FactoryType::Other];

    /// Código textual estable (el que viaja por el wire y se guarda en DB).
    pub fn code(&self) -> &'static str {
        match self {
            FactoryType::MetalCutting => "2-1",
            FactoryType::MetalCasting => "2-2",
            FactoryType::MetalSurface => "2-3",
            FactoryType::Plastics => "3",
            FactoryType::Rubber => "4",
            FactoryType::Stone => "5",
            FactoryType::Food => "6",
            FactoryType::Leather => "7",
            FactoryType::Textile => "8",
            FactoryType::Other => "9",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, DomainError> {
        Self::ALL.iter()
                 .find(|t| t.code() == code)
                 .copied()
                 .ok_or_else(|| DomainError::invalid_field("type", format!("unknown factory type code `{code}`")))
    }
}

/// Estado de revisión de una fábrica. Nunca se guarda como columna mutable:
/// se deriva plegando el historial de `ReportRecord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactoryStatus {
    /// A: 待審核 (estado inicial implícito)
    A,
    /// D: 已舉報
    D,
    /// F: 資料不齊
    F,
}

impl FactoryStatus {
    pub fn code(&self) -> &'static str {
        match self {
            FactoryStatus::A => "A",
            FactoryStatus::D => "D",
            FactoryStatus::F => "F",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, DomainError> {
        match code {
            "A" => Ok(FactoryStatus::A),
            "D" => Ok(FactoryStatus::D),
            "F" => Ok(FactoryStatus::F),
            other => Err(DomainError::invalid_field("status", format!("unknown status code `{other}`"))),
        }
    }
}

impl Default for FactoryStatus {
    fn default() -> Self {
        FactoryStatus::A
    }
}

/// Fábrica reportada: entidad puntual en el espacio, creada exactamente una
/// vez por el coordinador de ingesta y nunca mutada después.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Factory {
    pub id: Uuid,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Código catastral resuelto al crear; jamás se actualiza.
    pub landcode: String,
    pub factory_type: Option<FactoryType>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_type_codes_roundtrip() {
        for t in FactoryType::ALL {
            assert_eq!(FactoryType::from_code(t.code()).unwrap(), t);
        }
    }

    #[test]
    fn unknown_factory_type_rejected() {
        let err = FactoryType::from_code("10").unwrap_err();
        assert!(err.to_string().contains("unknown factory type code `10`"));
    }

    #[test]
    fn status_default_is_pending_review() {
        assert_eq!(FactoryStatus::default(), FactoryStatus::A);
    }

    #[test]
    fn status_codes_parse() {
        assert_eq!(FactoryStatus::from_code("D").unwrap(), FactoryStatus::D);
        assert!(FactoryStatus::from_code("Z").is_err());
    }
}
