//! Pool compartido por los tests de integración. Sin `DATABASE_URL` cada
//! test se omite (con aviso) en lugar de fallar.

use factory_persistence::config::DbConfig;
use factory_persistence::pg::{build_pool, PgPool};
use once_cell::sync::Lazy;

// Pool chico: cada binario de tests corre sus casos en secuencia.
static POOL: Lazy<Option<PgPool>> = Lazy::new(|| {
    std::env::var("DATABASE_URL").ok()?;
    let cfg = DbConfig::from_env();
    build_pool(&cfg.url, 1, 2).map_err(|e| eprintln!("pool de test no disponible: {e}"))
                              .ok()
});

/// Ejecuta `f` sobre el pool compartido, o devuelve `None` si no hay base.
pub fn with_pool<F, R>(f: F) -> Option<R>
    where F: FnOnce(&PgPool) -> R
{
    POOL.as_ref().map(f)
}
