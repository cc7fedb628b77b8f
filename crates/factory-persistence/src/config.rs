//! Parámetros de conexión a Postgres leídos del entorno.
//!
//! `DATABASE_URL` es obligatoria; los tamaños del pool
//! (`DATABASE_MIN_CONNECTIONS` / `DATABASE_MAX_CONNECTIONS`) son opcionales.

use std::env;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

const DEFAULT_MIN_CONNECTIONS: u32 = 2;
const DEFAULT_MAX_CONNECTIONS: u32 = 16;

// Un .env ausente no es un error: en CI las variables vienen del entorno.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv();
});

/// Carga `.env` si todavía no se hizo. Idempotente.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn from_env() -> Self {
        init_dotenv();
        Self { url: env::var("DATABASE_URL").expect("DATABASE_URL no definido"),
               min_connections: env_u32("DATABASE_MIN_CONNECTIONS", DEFAULT_MIN_CONNECTIONS),
               max_connections: env_u32("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS) }
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
