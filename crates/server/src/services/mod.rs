//! Business logic: the ingestion pipeline, insights queries and the
//! background sync scheduler.

pub mod ingestion;
pub mod insights;
pub mod scheduler;

pub use ingestion::{IngestionService, IngestionStore, ShopApi, SyncError};
pub use insights::InsightsService;
