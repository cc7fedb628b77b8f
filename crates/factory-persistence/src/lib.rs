//! factory-persistence
//!
//! Implementación Postgres (Diesel) del `FactoryStore` del core, con paridad
//! 1:1 respecto al backend en memoria: los mismos tests de escenario deben
//! pasar sobre ambos. Aquí vive la frontera transaccional real: la ingesta
//! {Factory, ReportRecord, adjuntos} es una única transacción read-write y
//! el reclamo de imágenes se serializa con `SELECT ... FOR UPDATE`.
//!
//! Módulos:
//! - `pg`: implementación sobre Postgres del trait del core.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde .env.
//! - `schema`: tablas Diesel declaradas para compilar queries.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::init_dotenv;
pub use error::PersistenceError;
pub use pg::{build_dev_pool_from_env, build_pool, ConnectionProvider, PgFactoryStore, PgPool, PoolProvider};
