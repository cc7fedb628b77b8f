//! Implementación Postgres (Diesel) del `FactoryStore` del core.
//!
//! Objetivos del módulo:
//! - Paridad 1:1 con el backend en memoria: mismos contratos, mismos tests
//!   de escenario.
//! - Frontera transaccional real: la ingesta {Factory, ReportRecord inicial,
//!   adjuntos} es UNA transacción read-write; si cualquier paso falla no
//!   queda estado parcial.
//! - Reclamo de imágenes serializado con `SELECT ... FOR UPDATE`: de dos
//!   ingestas concurrentes sobre el mismo id, la perdedora observa la imagen
//!   ya adjuntada y recibe `Validation`, nunca un overwrite.
//! - Reintento con backoff SOLO en lecturas; la escritura de ingesta es de
//!   intento único (el reenvío es política del llamador).

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use log::{debug, warn};
use serde_json::Value;
use uuid::Uuid;

use factory_core::{BoundingBox, EngineError, EvidenceBinder, FactoryStore, IngestReceipt, NewFactory, ReportDraft};
use factory_domain::{Factory, FactoryType, Image, ReportAction, ReportRecord};

use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;
use crate::schema::{factories, images, report_records};

/// Alias del pool r2d2 de conexiones Postgres. Al construirlo se corre el
/// set de migraciones pendientes una sola vez.
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones: permite inyectar el pool real o un
/// doble de test sin acoplar el store a r2d2.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError>;
}

/// Implementación de provider a partir de un pool r2d2.
pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

#[derive(Queryable, Debug)]
struct FactoryRow {
    id: Uuid,
    name: String,
    lat: f64,
    lng: f64,
    landcode: String,
    factory_type: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = factories)]
struct NewFactoryRow<'a> {
    id: &'a Uuid,
    name: &'a str,
    lat: f64,
    lng: f64,
    landcode: &'a str,
    factory_type: Option<&'a str>,
}

#[derive(Queryable, Debug)]
struct RecordRow {
    id: i64,
    factory_id: Uuid,
    action: String,
    action_body: Value,
    contact: Option<String>,
    others: Option<String>,
    user_ip: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = report_records)]
struct NewRecordRow<'a> {
    factory_id: &'a Uuid,
    action: &'a str,
    action_body: &'a Value,
    contact: Option<&'a str>,
    others: Option<&'a str>,
    user_ip: Option<&'a str>,
}

#[derive(Queryable, Debug)]
struct ImageRow {
    id: Uuid,
    image_path: String,
    factory_id: Option<Uuid>,
    report_record_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl From<FactoryRow> for Factory {
    fn from(row: FactoryRow) -> Self {
        Factory { id: row.id,
                  name: row.name,
                  lat: row.lat,
                  lng: row.lng,
                  landcode: row.landcode,
                  // El CHECK de la tabla garantiza un código del conjunto cerrado.
                  factory_type: row.factory_type.as_deref().and_then(|c| FactoryType::from_code(c).ok()),
                  created_at: row.created_at }
    }
}

impl From<RecordRow> for ReportRecord {
    fn from(row: RecordRow) -> Self {
        ReportRecord { id: row.id,
                       factory_id: row.factory_id,
                       action: ReportAction::from_code(&row.action).unwrap_or(ReportAction::Other),
                       action_body: row.action_body,
                       contact: row.contact,
                       others: row.others,
                       user_ip: row.user_ip,
                       created_at: row.created_at }
    }
}

impl From<ImageRow> for Image {
    fn from(row: ImageRow) -> Self {
        Image { id: row.id,
                image_path: row.image_path,
                factory_id: row.factory_id,
                report_record_id: row.report_record_id,
                created_at: row.created_at }
    }
}

/// Error interno de la transacción de ingesta: distingue el rechazo de
/// negocio (que debe salir como `EngineError` intacto) del fallo de base.
enum TxError {
    Engine(EngineError),
    Db(PersistenceError),
}

impl From<diesel::result::Error> for TxError {
    fn from(err: diesel::result::Error) -> Self {
        TxError::Db(err.into())
    }
}

impl From<TxError> for EngineError {
    fn from(err: TxError) -> Self {
        match err {
            TxError::Engine(e) => e,
            TxError::Db(p) => p.into(),
        }
    }
}

/// Determina si un error de lectura es transitorio (reintentar con backoff).
fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::SerializationConflict => true,
        PersistenceError::TransientIo(_) => true,
        PersistenceError::Unknown(msg) => {
            let m = msg.to_lowercase();
            m.contains("deadlock detected")
            || m.contains("could not serialize access due to concurrent update")
            || m.contains("connection closed")
            || m.contains("connection refused")
            || m.contains("timeout")
        }
        _ => false,
    }
}

/// Retry con backoff pequeño (hasta 3 intentos), sólo para lecturas.
fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("retryable error (attempt {}): {:?} -> sleeping {}ms", attempts + 1, e, delay_ms);
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

/// `FactoryStore` sobre Postgres.
pub struct PgFactoryStore<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> PgFactoryStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl PgFactoryStore<PoolProvider> {
    pub fn from_pool(pool: PgPool) -> Self {
        Self::new(PoolProvider { pool })
    }
}

impl<P: ConnectionProvider> PgFactoryStore<P> {
    fn conn(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, EngineError> {
        self.provider.connection().map_err(EngineError::from)
    }
}

impl<P: ConnectionProvider> FactoryStore for PgFactoryStore<P> {
    fn ingest(&self, factory: NewFactory, record: ReportDraft, image_ids: &[Uuid]) -> Result<IngestReceipt, EngineError> {
        debug!("ingest:start name={} images={}", factory.name, image_ids.len());
        let factory_id = Uuid::new_v4();
        let mut conn = self.conn()?;
        let receipt = conn.build_transaction()
                          .read_write()
                          .run::<IngestReceipt, TxError, _>(|tx| {
                              // Reclamo de imágenes bajo lock de fila: la verificación y
                              // la escritura ocurren bajo el mismo aislamiento.
                              if !image_ids.is_empty() {
                                  let rows: Vec<ImageRow> = images::table.filter(images::id.eq_any(image_ids))
                                                                         .for_update()
                                                                         .load(tx)?;
                                  let fetched: Vec<Image> = rows.into_iter().map(Image::from).collect();
                                  EvidenceBinder::verify_claimable(image_ids, &fetched).map_err(TxError::Engine)?;
                              }

                              let created_at: DateTime<Utc> =
                                  diesel::insert_into(factories::table)
                                      .values(NewFactoryRow { id: &factory_id,
                                                              name: &factory.name,
                                                              lat: factory.lat,
                                                              lng: factory.lng,
                                                              landcode: &factory.landcode,
                                                              factory_type: factory.factory_type.map(|t| t.code()) })
                                      .returning(factories::created_at)
                                      .get_result(tx)?;

                              let (record_id, record_at): (i64, DateTime<Utc>) =
                                  diesel::insert_into(report_records::table)
                                      .values(NewRecordRow { factory_id: &factory_id,
                                                             action: record.action.code(),
                                                             action_body: &record.action_body,
                                                             contact: record.contact.as_deref(),
                                                             others: record.others.as_deref(),
                                                             user_ip: record.user_ip.as_deref() })
                                      .returning((report_records::id, report_records::created_at))
                                      .get_result(tx)?;

                              let mut attached = 0usize;
                              if !image_ids.is_empty() {
                                  attached = diesel::update(images::table.filter(images::id.eq_any(image_ids))
                                                                         .filter(images::factory_id.is_null()))
                                      .set((images::factory_id.eq(factory_id),
                                            images::report_record_id.eq(record_id)))
                                      .execute(tx)?;
                                  EvidenceBinder::confirm_attached(image_ids.len(), attached).map_err(TxError::Engine)?;
                              }

                              let stored_factory = Factory { id: factory_id,
                                                             name: factory.name.clone(),
                                                             lat: factory.lat,
                                                             lng: factory.lng,
                                                             landcode: factory.landcode.clone(),
                                                             factory_type: factory.factory_type,
                                                             created_at };
                              let stored_record = ReportRecord { id: record_id,
                                                                 factory_id,
                                                                 action: record.action,
                                                                 action_body: record.action_body.clone(),
                                                                 contact: record.contact.clone(),
                                                                 others: record.others.clone(),
                                                                 user_ip: record.user_ip.clone(),
                                                                 created_at: record_at };
                              Ok(IngestReceipt { factory: stored_factory,
                                                 record: stored_record,
                                                 images_attached: attached })
                          })
                          .map_err(EngineError::from)?;
        debug!("ingest:done factory_id={} record_id={}", receipt.factory.id, receipt.record.id);
        Ok(receipt)
    }

    fn append_record(&self, factory_id: Uuid, draft: ReportDraft) -> Result<ReportRecord, EngineError> {
        let mut conn = self.conn()?;
        let row = conn.build_transaction()
                      .read_write()
                      .run::<RecordRow, TxError, _>(|tx| {
                          let exists: Option<Uuid> = factories::table.find(factory_id)
                                                                     .select(factories::id)
                                                                     .first(tx)
                                                                     .optional()?;
                          if exists.is_none() {
                              return Err(TxError::Engine(EngineError::NotFound(factory_id)));
                          }
                          let row: RecordRow = diesel::insert_into(report_records::table)
                              .values(NewRecordRow { factory_id: &factory_id,
                                                     action: draft.action.code(),
                                                     action_body: &draft.action_body,
                                                     contact: draft.contact.as_deref(),
                                                     others: draft.others.as_deref(),
                                                     user_ip: draft.user_ip.as_deref() })
                              .get_result(tx)?;
                          Ok(row)
                      })
                      .map_err(EngineError::from)?;
        Ok(row.into())
    }

    fn factory(&self, id: Uuid) -> Result<Option<Factory>, EngineError> {
        let row: Option<FactoryRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            factories::table.find(id)
                            .first(&mut conn)
                            .optional()
                            .map_err(PersistenceError::from)
        })?;
        Ok(row.map(Factory::from))
    }

    fn factories_in_box(&self, bbox: &BoundingBox) -> Result<Vec<Factory>, EngineError> {
        debug!("factories_in_box:start lat=[{}, {}] lng=[{}, {}]",
               bbox.lat_min, bbox.lat_max, bbox.lng_min, bbox.lng_max);
        let rows: Vec<FactoryRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            factories::table.filter(factories::lat.between(bbox.lat_min, bbox.lat_max))
                            .filter(factories::lng.between(bbox.lng_min, bbox.lng_max))
                            .order(factories::id.asc())
                            .load(&mut conn)
                            .map_err(PersistenceError::from)
        })?;
        debug!("factories_in_box:done count={}", rows.len());
        Ok(rows.into_iter().map(Factory::from).collect())
    }

    fn records_for(&self, factory_id: Uuid) -> Result<Vec<ReportRecord>, EngineError> {
        let exists = self.factory(factory_id)?.is_some();
        if !exists {
            return Err(EngineError::NotFound(factory_id));
        }
        let rows: Vec<RecordRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            report_records::table.filter(report_records::factory_id.eq(factory_id))
                                 .order((report_records::created_at.asc(), report_records::id.asc()))
                                 .load(&mut conn)
                                 .map_err(PersistenceError::from)
        })?;
        Ok(rows.into_iter().map(ReportRecord::from).collect())
    }

    fn images_for(&self, factory_id: Uuid) -> Result<Vec<Image>, EngineError> {
        let rows: Vec<ImageRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            images::table.filter(images::factory_id.eq(factory_id))
                         .order(images::id.asc())
                         .load(&mut conn)
                         .map_err(PersistenceError::from)
        })?;
        Ok(rows.into_iter().map(Image::from).collect())
    }

    fn fetch_images(&self, ids: &[Uuid]) -> Result<Vec<Image>, EngineError> {
        let rows: Vec<ImageRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            images::table.filter(images::id.eq_any(ids))
                         .load(&mut conn)
                         .map_err(PersistenceError::from)
        })?;
        Ok(rows.into_iter().map(Image::from).collect())
    }

    fn add_unattached_image(&self, image_path: &str) -> Result<Image, EngineError> {
        let mut conn = self.conn()?;
        let row: ImageRow = diesel::insert_into(images::table)
            .values(images::image_path.eq(image_path))
            .get_result(&mut conn)
            .map_err(|e| EngineError::from(PersistenceError::from(e)))?;
        Ok(row.into())
    }
}

/// Construye un pool Postgres r2d2 a partir de URL, ejecutando las
/// migraciones pendientes con el primer checkout.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<PgPool, PersistenceError> {
    let validated_min = if min_size == 0 { 1 } else { min_size };
    let validated_max = if max_size == 0 { 1 } else { max_size };
    if validated_min > validated_max {
        warn!("min_size > max_size ({validated_min} > {validated_max}), ajustando min=max");
    }
    let final_min = validated_min.min(validated_max);
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder().min_idle(Some(final_min))
                                    .max_size(validated_max)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    Ok(pool)
}

/// Helper de desarrollo: carga `.env`, lee configuración y construye un pool
/// ya migrado.
pub fn build_dev_pool_from_env() -> Result<PgPool, PersistenceError> {
    crate::config::init_dotenv();
    let cfg = crate::config::DbConfig::from_env();
    build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)
}
