use crate::category::{CategoryIndex, DEFAULT_CATEGORY_DELIMITER};
use crate::geo::GeoGrid;
use crate::pipeline::Stage;
use crate::scoring::DEFAULT_SHRINKAGE;
use crate::{Business, Error, Result, Review};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub(crate) type FastMap<K, V> = HashMap<K, V, ahash::RandomState>;

/// Configuration for a catalog
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub name: String,
    /// Maintain a category -> business inverted index instead of scanning
    pub use_category_index: bool,
    /// Maintain a lat/lon grid instead of scanning every business per radius query
    pub use_spatial_index: bool,
    pub grid_cell_degrees: f64,
    pub category_delimiter: String,
    /// Shrinkage constant K for credibility
    pub shrinkage: f64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            use_category_index: true,
            use_spatial_index: true,
            grid_cell_degrees: 0.05,
            category_delimiter: DEFAULT_CATEGORY_DELIMITER.to_string(),
            shrinkage: DEFAULT_SHRINKAGE,
        }
    }
}

/// Which batch stages hold for the current raw data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStatus {
    pub reviews_adjusted: bool,
    pub credibility_aggregated: bool,
    pub categories_split: bool,
}

impl StageStatus {
    pub fn is_done(&self, stage: Stage) -> bool {
        match stage {
            Stage::AdjustReviewScores => self.reviews_adjusted,
            Stage::AggregateCredibility => self.credibility_aggregated,
            Stage::SplitCategories => self.categories_split,
        }
    }

    pub(crate) fn mark(&mut self, stage: Stage, done: bool) {
        match stage {
            Stage::AdjustReviewScores => self.reviews_adjusted = done,
            Stage::AggregateCredibility => self.credibility_aggregated = done,
            Stage::SplitCategories => self.categories_split = done,
        }
    }
}

/// Businesses, their reviews, and the indexes over them
pub struct Catalog {
    pub(crate) config: CatalogConfig,
    pub(crate) businesses: Arc<RwLock<FastMap<String, Business>>>,
    pub(crate) reviews: Arc<RwLock<FastMap<String, Review>>>,
    pub(crate) reviews_by_business: Arc<RwLock<FastMap<String, Vec<String>>>>,
    pub(crate) category_index: Option<Arc<RwLock<CategoryIndex>>>,
    pub(crate) geo_index: Option<Arc<RwLock<GeoGrid>>>,
    pub(crate) stages: Arc<RwLock<StageStatus>>,
    // Single writer: batch stages and raw upserts never interleave
    pub(crate) writer: Arc<Mutex<()>>,
}

// Lock order everywhere: businesses, reviews, reviews_by_business,
// category_index, geo_index, stages.
impl Catalog {
    pub fn new(config: CatalogConfig) -> Self {
        let category_index = if config.use_category_index {
            Some(Arc::new(RwLock::new(CategoryIndex::new())))
        } else {
            None
        };

        let geo_index = if config.use_spatial_index {
            Some(Arc::new(RwLock::new(GeoGrid::new(config.grid_cell_degrees))))
        } else {
            None
        };

        Self {
            config,
            businesses: Arc::new(RwLock::new(FastMap::default())),
            reviews: Arc::new(RwLock::new(FastMap::default())),
            reviews_by_business: Arc::new(RwLock::new(FastMap::default())),
            category_index,
            geo_index,
            stages: Arc::new(RwLock::new(StageStatus::default())),
            writer: Arc::new(Mutex::new(())),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn business_count(&self) -> usize {
        self.businesses.read().len()
    }

    pub fn review_count(&self) -> usize {
        self.reviews.read().len()
    }

    pub fn stage_status(&self) -> StageStatus {
        *self.stages.read()
    }

    /// Fail with a computation error unless `stage` has run on current data
    pub fn require_stage(&self, stage: Stage) -> Result<()> {
        if self.stages.read().is_done(stage) {
            Ok(())
        } else {
            Err(Error::Computation(format!(
                "stage {} has not run on the current data",
                stage.name()
            )))
        }
    }

    /// Insert or replace a business's raw record.
    ///
    /// Derived fields on the incoming record are discarded and the
    /// aggregation and category stages must be rerun.
    pub fn upsert_business(&self, business: Business) -> Result<()> {
        let _writer = self.writer.lock();
        self.insert_business(business)?;
        self.invalidate(&[Stage::AggregateCredibility, Stage::SplitCategories]);
        Ok(())
    }

    pub fn batch_upsert_businesses(&self, businesses: Vec<Business>) -> Result<usize> {
        let _writer = self.writer.lock();
        let mut count = 0;
        for business in businesses {
            self.insert_business(business)?;
            count += 1;
        }
        self.invalidate(&[Stage::AggregateCredibility, Stage::SplitCategories]);
        debug!(catalog = %self.config.name, count, "businesses upserted");
        Ok(count)
    }

    fn insert_business(&self, mut business: Business) -> Result<()> {
        business.coordinate.validate()?;
        business.clear_derived();

        let id = business.id.clone();
        let coordinate = business.coordinate;
        self.businesses.write().insert(id.clone(), business);

        if let Some(index) = &self.category_index {
            index.write().remove(&id);
        }
        if let Some(grid) = &self.geo_index {
            grid.write().insert(&id, &coordinate);
        }
        Ok(())
    }

    /// Insert or replace a review's raw record
    pub fn upsert_review(&self, review: Review) -> Result<()> {
        let _writer = self.writer.lock();
        self.insert_review(review)?;
        self.invalidate(&[Stage::AdjustReviewScores, Stage::AggregateCredibility]);
        Ok(())
    }

    pub fn batch_upsert_reviews(&self, reviews: Vec<Review>) -> Result<usize> {
        let _writer = self.writer.lock();
        let mut count = 0;
        for review in reviews {
            self.insert_review(review)?;
            count += 1;
        }
        self.invalidate(&[Stage::AdjustReviewScores, Stage::AggregateCredibility]);
        debug!(catalog = %self.config.name, count, "reviews upserted");
        Ok(count)
    }

    fn insert_review(&self, mut review: Review) -> Result<()> {
        review.validate()?;
        review.adjusted_score = None;

        let id = review.id.clone();
        let business_id = review.business_id.clone();
        let previous = self.reviews.write().insert(id.clone(), review);

        let mut by_business = self.reviews_by_business.write();
        if let Some(previous) = previous {
            if let Some(ids) = by_business.get_mut(&previous.business_id) {
                ids.retain(|existing| existing != &id);
            }
        }
        by_business.entry(business_id).or_default().push(id);
        Ok(())
    }

    /// Replace the whole catalog with previously derived records.
    ///
    /// Used when loading a snapshot: derived fields are trusted as-is and the
    /// stage flags are taken from the snapshot.
    pub fn restore(&self, businesses: Vec<Business>, reviews: Vec<Review>, stages: StageStatus) -> Result<()> {
        for business in &businesses {
            business.coordinate.validate()?;
        }
        for review in &reviews {
            review.validate()?;
        }

        let _writer = self.writer.lock();

        let mut business_map = self.businesses.write();
        let mut review_map = self.reviews.write();
        let mut by_business = self.reviews_by_business.write();
        business_map.clear();
        review_map.clear();
        by_business.clear();

        for business in businesses {
            business_map.insert(business.id.clone(), business);
        }
        for review in reviews {
            by_business
                .entry(review.business_id.clone())
                .or_default()
                .push(review.id.clone());
            review_map.insert(review.id.clone(), review);
        }

        if let Some(index) = &self.category_index {
            let mut index = index.write();
            index.clear();
            for business in business_map.values() {
                if let Some(set) = &business.category_set {
                    index.insert(&business.id, set);
                }
            }
        }
        if let Some(grid) = &self.geo_index {
            let mut grid = grid.write();
            grid.clear();
            for business in business_map.values() {
                grid.insert(&business.id, &business.coordinate);
            }
        }

        *self.stages.write() = stages;
        Ok(())
    }

    fn invalidate(&self, stages: &[Stage]) {
        let mut status = self.stages.write();
        for stage in stages {
            status.mark(*stage, false);
        }
    }

    /// Get a business by ID
    pub fn get_business(&self, id: &str) -> Option<Business> {
        self.businesses.read().get(id).cloned()
    }

    /// Get a review by ID
    pub fn get_review(&self, id: &str) -> Option<Review> {
        self.reviews.read().get(id).cloned()
    }

    /// Get all businesses
    pub fn businesses(&self) -> Vec<Business> {
        self.businesses.read().values().cloned().collect()
    }

    /// Get all reviews
    pub fn reviews(&self) -> Vec<Review> {
        self.reviews.read().values().cloned().collect()
    }

    /// Businesses, reviews and stage flags as of one point between writes
    pub fn snapshot(&self) -> (Vec<Business>, Vec<Review>, StageStatus) {
        let _writer = self.writer.lock();
        let businesses = self.businesses.read();
        let reviews = self.reviews.read();
        let stages = self.stages.read();
        (
            businesses.values().cloned().collect(),
            reviews.values().cloned().collect(),
            *stages,
        )
    }
}
