//! ProvenanceLedger: historial append-only y vista derivada.
//!
//! El estado "mutable" visible de una fábrica (status, último reporte) no
//! existe como columna: se reconstruye con un pliegue puro sobre el
//! historial ordenado. Un cambio de estado es un `ReportRecord` nuevo, con
//! lo que toda transición queda auditable y revertible inspeccionando la
//! secuencia.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use factory_domain::{FactoryStatus, ReportAction, ReportRecord};

use crate::errors::EngineError;
use crate::store::{FactoryStore, ReportDraft};

/// Campos derivados del historial (nunca almacenados).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedView {
    pub status: FactoryStatus,
    pub reported_at: Option<DateTime<Utc>>,
}

/// Pliegue puro sobre el historial, que se asume ordenado ascendente por
/// (created_at, id) — el orden que garantiza `FactoryStore::records_for`.
///
/// - `status`: valor de la clave `status` del registro más reciente que
///   traiga una reconocible; `A` si ninguno la trae.
/// - `reported_at`: timestamp del registro más reciente cuya acción no sea
///   el reporte de creación; `None` si sólo existe la creación.
pub fn fold_view(records: &[ReportRecord]) -> DerivedView {
    let status = records.iter()
                        .rev()
                        .find_map(|r| r.status_in_body().and_then(|code| FactoryStatus::from_code(code).ok()))
                        .unwrap_or_default();
    let reported_at = records.iter()
                             .rev()
                             .find(|r| r.action != ReportAction::CreationReport)
                             .map(|r| r.created_at);
    DerivedView { status, reported_at }
}

/// Fachada del historial sobre un store concreto.
pub struct ProvenanceLedger<S: FactoryStore> {
    store: Arc<S>,
}

impl<S: FactoryStore> ProvenanceLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Anexa un registro; el store asigna id y timestamp.
    ///
    /// Si el cuerpo trae la clave `status`, el código debe pertenecer al
    /// conjunto cerrado: un código inventado se rechaza aquí en lugar de
    /// quedar como registro mudo que el pliegue ignoraría.
    pub fn append(&self, factory_id: Uuid, draft: ReportDraft) -> Result<ReportRecord, EngineError> {
        if let Some(value) = draft.action_body.get("status") {
            let code = value.as_str()
                            .ok_or_else(|| EngineError::Validation("`status` in action_body must be a string".to_string()))?;
            FactoryStatus::from_code(code)?;
        }
        self.store.append_record(factory_id, draft)
    }

    pub fn records_for(&self, factory_id: Uuid) -> Result<Vec<ReportRecord>, EngineError> {
        self.store.records_for(factory_id)
    }

    /// Vista derivada; `NotFound` para una fábrica desconocida.
    pub fn derive_view(&self, factory_id: Uuid) -> Result<DerivedView, EngineError> {
        Ok(fold_view(&self.store.records_for(factory_id)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn record(id: i64, action: ReportAction, body: serde_json::Value, at: DateTime<Utc>) -> ReportRecord {
        ReportRecord { id,
                       factory_id: Uuid::nil(),
                       action,
                       action_body: body,
                       contact: None,
                       others: None,
                       user_ip: None,
                       created_at: at }
    }

    #[test]
    fn creation_only_yields_default_status_and_no_reported_at() {
        let t0 = Utc::now();
        let view = fold_view(&[record(1, ReportAction::CreationReport, json!({"name": "f"}), t0)]);
        assert_eq!(view.status, FactoryStatus::A);
        assert_eq!(view.reported_at, None);
    }

    #[test]
    fn latest_status_key_wins() {
        let t0 = Utc::now();
        let records = vec![record(1, ReportAction::CreationReport, json!({}), t0),
                           record(2, ReportAction::StatusChange, json!({"status": "F"}), t0 + Duration::seconds(1)),
                           record(3, ReportAction::StatusChange, json!({"status": "D"}), t0 + Duration::days(1)),];
        let view = fold_view(&records);
        assert_eq!(view.status, FactoryStatus::D);
        assert_eq!(view.reported_at, Some(t0 + Duration::days(1)));
    }

    #[test]
    fn records_without_status_key_are_skipped_in_the_scan() {
        let t0 = Utc::now();
        let records = vec![record(1, ReportAction::CreationReport, json!({}), t0),
                           record(2, ReportAction::StatusChange, json!({"status": "D"}), t0 + Duration::seconds(1)),
                           record(3, ReportAction::EvidenceSubmission, json!({"note": "photo"}), t0 + Duration::seconds(2)),];
        let view = fold_view(&records);
        // El último registro no trae status: se mantiene el D anterior,
        // pero sí corre el reported_at.
        assert_eq!(view.status, FactoryStatus::D);
        assert_eq!(view.reported_at, Some(t0 + Duration::seconds(2)));
    }

    #[test]
    fn append_rejects_unknown_status_code() {
        let (ledger, factory_id) = ledger_with_factory();
        let err = ledger.append(factory_id,
                                ReportDraft { action: ReportAction::StatusChange,
                                              action_body: json!({"status": "Z"}),
                                              contact: None,
                                              others: None,
                                              user_ip: None })
                        .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)), "got {err:?}");
        assert!(err.to_string().contains("unknown status code `Z`"), "got: {err}");
        // El registro inválido no entró al historial.
        assert_eq!(ledger.records_for(factory_id).unwrap().len(), 1);
    }

    #[test]
    fn append_rejects_non_string_status() {
        let (ledger, factory_id) = ledger_with_factory();
        let err = ledger.append(factory_id,
                                ReportDraft { action: ReportAction::StatusChange,
                                              action_body: json!({"status": 2}),
                                              contact: None,
                                              others: None,
                                              user_ip: None })
                        .unwrap_err();
        assert!(err.to_string().contains("must be a string"), "got: {err}");
    }

    fn ledger_with_factory() -> (ProvenanceLedger<crate::store::InMemoryFactoryStore>, Uuid) {
        use crate::store::{InMemoryFactoryStore, NewFactory};

        let store = Arc::new(InMemoryFactoryStore::new());
        let receipt = store.ingest(NewFactory { name: "ledger".to_string(),
                                                lat: 23.0,
                                                lng: 121.0,
                                                factory_type: None,
                                                landcode: "000000000".to_string() },
                                   ReportDraft { action: ReportAction::CreationReport,
                                                 action_body: json!({}),
                                                 contact: None,
                                                 others: None,
                                                 user_ip: None },
                                   &[])
                           .unwrap();
        (ProvenanceLedger::new(store), receipt.factory.id)
    }

    #[test]
    fn identical_timestamps_break_ties_by_id() {
        let t0 = Utc::now();
        let records = vec![record(1, ReportAction::CreationReport, json!({}), t0),
                           record(2, ReportAction::StatusChange, json!({"status": "D"}), t0 + Duration::seconds(5)),
                           record(3, ReportAction::StatusChange, json!({"status": "F"}), t0 + Duration::seconds(5)),];
        // Mismo created_at: el id mayor (insertado después) manda.
        assert_eq!(fold_view(&records).status, FactoryStatus::F);
    }
}
