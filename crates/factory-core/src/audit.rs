//! Handle de observabilidad explícito.
//!
//! Sustituye al logger global de módulo: los servicios reciben el sink por
//! inyección y no existe ningún singleton de proceso en el core.

use std::sync::Mutex;

use log::{info, warn};

/// Registro de peticiones aceptadas y rechazadas.
pub trait AuditSink: Send + Sync {
    fn event(&self, origin: &str, message: &str);
    fn failure(&self, origin: &str, message: &str);
}

impl<A: AuditSink + ?Sized> AuditSink for std::sync::Arc<A> {
    fn event(&self, origin: &str, message: &str) {
        (**self).event(origin, message);
    }
    fn failure(&self, origin: &str, message: &str) {
        (**self).failure(origin, message);
    }
}

/// Sink que reenvía a la fachada `log` (la aplicación decide el backend).
pub struct LogSink;

impl AuditSink for LogSink {
    fn event(&self, origin: &str, message: &str) {
        info!("{origin}: {message}");
    }
    fn failure(&self, origin: &str, message: &str) {
        warn!("{origin}: {message}");
    }
}

/// Sink en memoria para tests: captura las entradas en orden.
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemorySink {
    fn event(&self, origin: &str, message: &str) {
        if let Ok(mut e) = self.entries.lock() {
            e.push(format!("ok {origin}: {message}"));
        }
    }
    fn failure(&self, origin: &str, message: &str) {
        if let Ok(mut e) = self.entries.lock() {
            e.push(format!("fail {origin}: {message}"));
        }
    }
}
