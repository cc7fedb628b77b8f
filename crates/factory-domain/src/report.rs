//! Evento inmutable del historial de una fábrica.
//!
//! Un `ReportRecord` nunca se edita ni se borra: un cambio de estado es un
//! registro nuevo, y el estado visible se reconstruye plegando la secuencia
//! completa (ver `factory-core::ledger`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tipo de acción registrada. Conjunto cerrado, validado en la frontera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportAction {
    /// El reporte ciudadano que creó la fábrica (exactamente uno por fábrica).
    CreationReport,
    /// Aporte posterior de evidencia (p. ej. fotos nuevas).
    EvidenceSubmission,
    /// Cambio de estado administrativo; el nuevo estado viaja en `action_body`.
    StatusChange,
    Other,
}

impl ReportAction {
    /// Representación textual estable para la columna `action` en DB.
    pub fn code(&self) -> &'static str {
        match self {
            ReportAction::CreationReport => "creation_report",
            ReportAction::EvidenceSubmission => "evidence_submission",
            ReportAction::StatusChange => "status_change",
            ReportAction::Other => "other",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "creation_report" => Some(ReportAction::CreationReport),
            "evidence_submission" => Some(ReportAction::EvidenceSubmission),
            "status_change" => Some(ReportAction::StatusChange),
            "other" => Some(ReportAction::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Id monotónico asignado por el store (desempate cuando dos registros
    /// comparten timestamp).
    pub id: i64,
    pub factory_id: Uuid,
    pub action: ReportAction,
    /// Payload opaco; el core sólo inspecciona la clave `status` si existe.
    pub action_body: serde_json::Value,
    pub contact: Option<String>,
    pub others: Option<String>,
    /// Origen de red del remitente.
    pub user_ip: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReportRecord {
    /// Valor de `status` embebido en el payload, si el registro trae uno.
    pub fn status_in_body(&self) -> Option<&str> {
        self.action_body.get("status").and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(body: serde_json::Value) -> ReportRecord {
        ReportRecord { id: 1,
                       factory_id: Uuid::new_v4(),
                       action: ReportAction::StatusChange,
                       action_body: body,
                       contact: None,
                       others: None,
                       user_ip: None,
                       created_at: Utc::now() }
    }

    #[test]
    fn status_key_extracted_from_body() {
        assert_eq!(record(json!({"status": "D"})).status_in_body(), Some("D"));
        assert_eq!(record(json!({"note": "x"})).status_in_body(), None);
    }

    #[test]
    fn action_codes_roundtrip() {
        for a in [ReportAction::CreationReport,
                  ReportAction::EvidenceSubmission,
                  ReportAction::StatusChange,
                  ReportAction::Other]
        {
            assert_eq!(ReportAction::from_code(a.code()), Some(a));
        }
        assert_eq!(ReportAction::from_code("PUT"), None);
    }
}
