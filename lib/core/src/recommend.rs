//! Query path: category match, radius search, rank.
//!
//! A request carries everything the pipeline needs; nothing is remembered
//! between calls, so distinct requests can run concurrently against the
//! same catalog.

use crate::catalog::{Catalog, FastMap};
use crate::category::{match_by_index, match_by_scan, CategoryMatch};
use crate::geo::Coordinate;
use crate::pipeline::Stage;
use crate::proximity::{search_by_grid, search_by_scan, validate_radius, ProximityHit};
use crate::rank::{rank, Recommendation, RecommendConfig};
use crate::{Business, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default search radius in meters
pub const DEFAULT_MAX_DISTANCE: f64 = 16_000.0;

/// A single recommendation query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub seed_id: String,
    /// Search radius in meters
    pub max_distance: f64,
    /// Search origin; the seed's own location when absent
    #[serde(default)]
    pub origin: Option<Coordinate>,
}

impl RecommendRequest {
    pub fn new(seed_id: impl Into<String>, max_distance: f64) -> Self {
        Self {
            seed_id: seed_id.into(),
            max_distance,
            origin: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_origin(mut self, origin: Coordinate) -> Self {
        self.origin = Some(origin);
        self
    }
}

impl Catalog {
    /// Businesses sharing at least one category with the seed
    pub fn match_categories(&self, seed_id: &str) -> Result<CategoryMatch> {
        self.require_stage(Stage::SplitCategories)?;
        let businesses = self.businesses.read();
        self.match_in(&businesses, seed_id)
    }

    /// Candidates within `max_distance` meters of `origin`, most credible first
    pub fn proximity_search(
        &self,
        candidates: &[String],
        max_distance: f64,
        origin: &Coordinate,
    ) -> Result<Vec<ProximityHit>> {
        let businesses = self.businesses.read();
        self.search_in(&businesses, candidates, max_distance, origin)
    }

    /// Up to `config.limit` businesses similar to the seed, best first
    pub fn recommend(&self, request: &RecommendRequest, config: &RecommendConfig) -> Result<Vec<Recommendation>> {
        validate_radius(request.max_distance)?;
        if let Some(origin) = &request.origin {
            origin.validate()?;
        }
        self.require_stage(Stage::SplitCategories)?;
        self.require_stage(Stage::AggregateCredibility)?;

        // One read guard for the whole query keeps the three stages consistent
        let businesses = self.businesses.read();
        let seed = businesses
            .get(&request.seed_id)
            .ok_or_else(|| Error::BusinessNotFound(request.seed_id.clone()))?;
        let origin = request.origin.unwrap_or(seed.coordinate);

        let matched = self.match_in(&businesses, &request.seed_id)?;
        let hits = self.search_in(&businesses, &matched.candidates, request.max_distance, &origin)?;
        let hit_count = hits.len();
        let ranked = rank(hits, &matched, config)?;

        debug!(
            seed = %request.seed_id,
            candidates = matched.candidates.len(),
            within_radius = hit_count,
            returned = ranked.len(),
            "recommendation computed"
        );
        Ok(ranked)
    }

    fn match_in(&self, businesses: &FastMap<String, Business>, seed_id: &str) -> Result<CategoryMatch> {
        match &self.category_index {
            Some(index) => match_by_index(businesses, &index.read(), seed_id),
            None => match_by_scan(businesses, seed_id),
        }
    }

    fn search_in(
        &self,
        businesses: &FastMap<String, Business>,
        candidates: &[String],
        max_distance: f64,
        origin: &Coordinate,
    ) -> Result<Vec<ProximityHit>> {
        match &self.geo_index {
            Some(grid) => search_by_grid(businesses, &grid.read(), candidates, origin, max_distance),
            None => search_by_scan(businesses, candidates, origin, max_distance),
        }
    }
}
