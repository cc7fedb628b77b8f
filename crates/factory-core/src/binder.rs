//! EvidenceBinder: adjunta imágenes pre-subidas a un par Factory/ReportRecord.
//!
//! Las precondiciones se comprueban sobre el conjunto completo pedido,
//! cargado con una sola consulta (nunca id a id), y ANTES de cualquier
//! mutación:
//! - el pedido no puede repetir ids (el conteo post-escritura cuenta filas,
//!   no menciones);
//! - todo id pedido debe existir;
//! - toda imagen debe estar sin adjuntar (re-adjuntar es `Validation`, nunca
//!   un overwrite silencioso).
//!
//! La misma verificación corre dos veces: como pre-chequeo rápido antes de
//! la llamada externa al resolver catastral, y de nuevo dentro de la
//! transacción del store, donde el aislamiento garantiza que de dos ingestas
//! que reclaman la misma imagen sólo una gana.

use uuid::Uuid;

use factory_domain::Image;

use crate::errors::EngineError;

pub struct EvidenceBinder;

impl EvidenceBinder {
    /// Verifica que `requested` pueda reclamarse entero dado el conjunto
    /// `fetched` devuelto por el store para esos mismos ids.
    pub fn verify_claimable(requested: &[Uuid], fetched: &[Image]) -> Result<(), EngineError> {
        let mut sorted: Vec<Uuid> = requested.to_vec();
        sorted.sort();
        let mut repeated: Vec<Uuid> = sorted.windows(2)
                                            .filter(|pair| pair[0] == pair[1])
                                            .map(|pair| pair[0])
                                            .collect();
        if !repeated.is_empty() {
            repeated.dedup();
            return Err(EngineError::Validation(format!("duplicate image ids: {}", join_ids(&repeated))));
        }

        let mut missing: Vec<Uuid> = requested.iter()
                                              .filter(|id| !fetched.iter().any(|img| img.id == **id))
                                              .copied()
                                              .collect();
        if !missing.is_empty() {
            missing.sort();
            missing.dedup();
            return Err(EngineError::Validation(format!("unknown image ids: {}", join_ids(&missing))));
        }

        let mut taken: Vec<Uuid> = fetched.iter()
                                          .filter(|img| requested.contains(&img.id) && img.is_attached())
                                          .map(|img| img.id)
                                          .collect();
        if !taken.is_empty() {
            taken.sort();
            taken.dedup();
            return Err(EngineError::Validation(format!("images already attached to a factory: {}", join_ids(&taken))));
        }
        Ok(())
    }

    /// Confirmación post-escritura: el número de filas adjuntadas debe ser
    /// exactamente el pedido, o la transacción entera se revierte.
    pub fn confirm_attached(requested: usize, attached: usize) -> Result<usize, EngineError> {
        if attached == requested {
            Ok(attached)
        } else {
            Err(EngineError::Validation(format!("expected to attach {requested} images but only {attached} were claimable")))
        }
    }
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn unattached(id: Uuid) -> Image {
        Image { id,
                image_path: "https://i.imgur.com/RxArJUc.png".to_string(),
                factory_id: None,
                report_record_id: None,
                created_at: Utc::now() }
    }

    #[test]
    fn empty_request_is_trivially_claimable() {
        assert!(EvidenceBinder::verify_claimable(&[], &[]).is_ok());
    }

    #[test]
    fn repeated_ids_are_rejected_before_any_other_check() {
        let id = Uuid::new_v4();
        let err = EvidenceBinder::verify_claimable(&[id, id], &[unattached(id)]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("duplicate image ids"), "got: {msg}");
        assert!(msg.contains(&id.to_string()), "got: {msg}");
    }

    #[test]
    fn missing_ids_are_named() {
        let present = Uuid::new_v4();
        let absent = Uuid::new_v4();
        let err = EvidenceBinder::verify_claimable(&[present, absent], &[unattached(present)]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("unknown image ids"), "got: {msg}");
        assert!(msg.contains(&absent.to_string()), "got: {msg}");
        assert!(!msg.contains(&present.to_string()), "got: {msg}");
    }

    #[test]
    fn attached_ids_are_named_not_overwritten() {
        let id = Uuid::new_v4();
        let mut img = unattached(id);
        img.factory_id = Some(Uuid::new_v4());
        img.report_record_id = Some(7);
        let err = EvidenceBinder::verify_claimable(&[id], &[img]).unwrap_err();
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn partial_attach_count_fails() {
        assert!(EvidenceBinder::confirm_attached(2, 1).is_err());
        assert_eq!(EvidenceBinder::confirm_attached(2, 2).unwrap(), 2);
    }
}
