pub mod manager;
pub mod ingest;
pub mod persistence;

pub use manager::StorageManager;
pub use ingest::{read_businesses, read_reviews, RawBusinessRecord, RawReviewRecord};
pub use persistence::{CatalogSnapshot, SnapshotPersistence};
