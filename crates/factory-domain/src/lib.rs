// factory-domain library entry point
pub mod error;
pub mod factory;
pub mod image;
pub mod region;
pub mod report;
pub mod submission;

pub use error::DomainError;
pub use factory::{Factory, FactoryStatus, FactoryType};
pub use image::Image;
pub use region::{RadiusLimits, RegionBounds};
pub use report::{ReportAction, ReportRecord};
pub use submission::FactorySubmission;
