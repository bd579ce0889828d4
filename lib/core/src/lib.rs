//! # GeoRank Core
//!
//! Core library for the GeoRank recommendation engine.
//!
//! This crate provides the data model and every scoring stage:
//!
//! - [`Business`] / [`Review`] - typed records with raw and derived fields
//! - [`Catalog`] - in-memory store with category and spatial indexes
//! - [`pipeline`] - batch stages deriving adjusted scores, credibility and category sets
//! - [`Catalog::recommend`] - category match, radius search and ranking
//! - [`Catalog::reviews_for`] - ordered review listing for one business
//!
//! ## Example
//!
//! ```rust
//! use georank_core::{Business, Catalog, CatalogConfig, Coordinate, RecommendConfig, RecommendRequest};
//!
//! let catalog = Catalog::new(CatalogConfig::default());
//! let here = Coordinate::new(-115.17, 36.11).unwrap();
//! catalog.upsert_business(Business::new("a", "Slice", here).with_categories("Pizza, Italian")).unwrap();
//! catalog.upsert_business(Business::new("b", "Pie", here).with_categories("Pizza")).unwrap();
//!
//! georank_core::pipeline::run_all(&catalog).unwrap();
//!
//! let request = RecommendRequest::new("a", 5_000.0);
//! let results = catalog.recommend(&request, &RecommendConfig::default()).unwrap();
//! assert_eq!(results[0].id, "b");
//! ```

pub mod business;
pub mod catalog;
pub mod category;
pub mod error;
pub mod geo;
pub mod pipeline;
pub mod proximity;
pub mod rank;
pub mod recommend;
pub mod retrieval;
pub mod review;
pub mod scoring;

pub use business::Business;
pub use catalog::{Catalog, CatalogConfig, StageStatus};
pub use category::{CategoryIndex, CategoryMatch};
pub use error::{Error, Result};
pub use geo::{haversine_distance, Coordinate, GeoGrid, EARTH_RADIUS_METERS};
pub use pipeline::{Stage, StageReport};
pub use proximity::ProximityHit;
pub use rank::{Recommendation, RecommendConfig};
pub use recommend::{RecommendRequest, DEFAULT_MAX_DISTANCE};
pub use review::{Review, ReviewDisplay};
