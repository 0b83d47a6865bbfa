pub mod catalog;
pub mod config;
pub mod gateway;
pub mod outcome;
pub mod trace;

pub use catalog::{demo_catalog, CatalogItem, CatalogRecord, ItemMetadata};
pub use gateway::{GatewayError, MessageGateway, ParseMode};
pub use outcome::StageOutcome;
pub use trace::{StepKind, StepRecord, TraceScope};
