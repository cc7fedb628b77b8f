//! factory-core: motor de procedencia y consulta geoespacial de fábricas.
pub mod audit;
pub mod binder;
pub mod errors;
pub mod geo;
pub mod ingest;
pub mod ledger;
pub mod parcel;
pub mod query;
pub mod store;
pub mod view;

pub use audit::{AuditSink, LogSink, MemorySink};
pub use binder::EvidenceBinder;
pub use errors::EngineError;
pub use geo::{haversine_km, BoundingBox, GeoIndex};
pub use ingest::IngestCoordinator;
pub use ledger::{fold_view, DerivedView, ProvenanceLedger};
pub use parcel::{FailingParcelResolver, ParcelResolver, ResolutionFailure, StaticParcelResolver};
pub use query::{NearbyRequest, QueryService};
pub use store::{FactoryStore, InMemoryFactoryStore, IngestReceipt, NewFactory, ReportDraft};
pub use view::{FactoryView, ImageView};
