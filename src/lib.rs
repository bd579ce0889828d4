//! # GeoRank
//!
//! An in-memory recommendation engine for local businesses.
//!
//! Given a seed business and a search radius, GeoRank returns up to 20
//! similar businesses ranked by category overlap and a review credibility
//! score.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! georank --businesses business.jsonl --reviews review.jsonl --preprocess
//! curl 'localhost:8080/businesses/<id>/recommendations?max_distance=16000'
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use georank::prelude::*;
//!
//! let catalog = Catalog::new(CatalogConfig::default());
//! // ... upsert businesses and reviews ...
//! georank::pipeline::run_all(&catalog).unwrap();
//!
//! let request = RecommendRequest::new("seed-id", 16_000.0);
//! let results = catalog.recommend(&request, &RecommendConfig::default()).unwrap();
//! ```
//!
//! ## Crate Structure
//!
//! - [`georank-core`](https://docs.rs/georank-core) - Records, scoring, indexes, batch stages, query pipeline
//! - [`georank-storage`](https://docs.rs/georank-storage) - JSON Lines ingestion and snapshots
//! - [`georank-api`](https://docs.rs/georank-api) - REST API
//!
//! ## Scoring
//!
//! - **Adjusted score**: `rating ± ln(helpful_votes)` for non-neutral ratings
//! - **Credibility**: `avg * n / (n + 5)` over a business's adjusted scores
//! - **Recommend score**: `credibility + 0.5 * shared_categories`

// Re-export core types
pub use georank_core::{
    Business, Review, ReviewDisplay,
    Catalog, CatalogConfig, StageStatus,
    Coordinate, GeoGrid, CategoryIndex, CategoryMatch, ProximityHit,
    Recommendation, RecommendConfig, RecommendRequest,
    Stage, StageReport,
    Error, Result,
};

pub use georank_core::pipeline;

// Re-export storage
pub use georank_storage::StorageManager;

// Re-export API
pub use georank_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Business, Review,
        Catalog, CatalogConfig,
        Coordinate,
        Recommendation, RecommendConfig, RecommendRequest,
        Stage,
        Error, Result,
        StorageManager,
        RestApi,
    };
}
