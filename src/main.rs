//! Demo del motor con el backend en memoria: alta de fábrica con evidencia,
//! cambio de estado vía historial y consulta de cercanía.
//!
//! Con `--features pg_demo` repite la ingesta sobre Postgres usando
//! `DATABASE_URL` (ver `factory-persistence`).

use std::sync::Arc;

use factory_core::{FactoryStore, IngestCoordinator, InMemoryFactoryStore, LogSink, NearbyRequest, ProvenanceLedger,
                   QueryService, ReportDraft, StaticParcelResolver};
use factory_domain::{FactorySubmission, ReportAction};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(InMemoryFactoryStore::new());

    // Imágenes pre-subidas por el colaborador de uploads (fuera del core).
    let i1 = store.add_unattached_image("https://i.imgur.com/RxArJUc.png")?;
    let i2 = store.add_unattached_image("https://imgur.dcard.tw/BB2L2LT.jpg")?;

    let coordinator = IngestCoordinator::new(Arc::clone(&store), StaticParcelResolver::new("000120324"), LogSink);
    let submission = FactorySubmission { name: "後壁違章工廠".to_string(),
                                         lat: 23.337,
                                         lng: 120.305,
                                         factory_type: Some("2-3".to_string()),
                                         images: vec![i1.id, i2.id],
                                         contact: Some("0800-092000".to_string()),
                                         others: Some("農地上蓋起了鐵皮屋".to_string()) };
    let created = coordinator.submit(submission, Some("203.0.113.7"))?;
    println!("== fábrica creada ==");
    println!("{}", serde_json::to_string_pretty(&created)?);

    // Un cambio de estado es un registro nuevo en el historial.
    let ledger = ProvenanceLedger::new(Arc::clone(&store));
    ledger.append(created.id,
                  ReportDraft { action: ReportAction::StatusChange,
                                action_body: json!({"status": "D"}),
                                contact: None,
                                others: Some("已呈報".to_string()),
                                user_ip: None })?;
    let derived = ledger.derive_view(created.id)?;
    println!("== vista derivada tras el cambio de estado ==");
    println!("status={:?} reported_at={:?}", derived.status, derived.reported_at);

    // Consulta de cercanía alrededor del punto reportado.
    let service = QueryService::new(Arc::clone(&store), LogSink);
    let nearby = service.nearby(&NearbyRequest { lat: 23.337,
                                                 lng: 120.305,
                                                 radius_km: 1.0 })?;
    println!("== fábricas a 1 km ==");
    println!("{}", serde_json::to_string_pretty(&nearby)?);

    #[cfg(feature = "pg_demo")]
    run_pg_demo()?;

    Ok(())
}

/// Misma ingesta sobre Postgres (requiere DATABASE_URL).
#[cfg(feature = "pg_demo")]
fn run_pg_demo() -> Result<(), Box<dyn std::error::Error>> {
    use factory_persistence::pg::{build_dev_pool_from_env, PgFactoryStore};

    let pool = build_dev_pool_from_env()?;
    let store = Arc::new(PgFactoryStore::from_pool(pool));
    let image = store.add_unattached_image("https://imgur.com/qwer")?;
    let coordinator = IngestCoordinator::new(Arc::clone(&store), StaticParcelResolver::new("000120324"), LogSink);
    let created = coordinator.submit(FactorySubmission { name: "pg demo".to_string(),
                                                         lat: 23.5,
                                                         lng: 121.0,
                                                         factory_type: Some("3".to_string()),
                                                         images: vec![image.id],
                                                         contact: None,
                                                         others: None },
                                     Some("203.0.113.7"))?;
    println!("== fábrica creada en Postgres ==");
    println!("{}", serde_json::to_string_pretty(&created)?);
    Ok(())
}
