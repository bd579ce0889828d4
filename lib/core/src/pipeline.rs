//! Batch preprocessing stages
//!
//! ```text
//! adjust_review_scores ──> aggregate_credibility
//! split_categories      (independent)
//! ```
//!
//! Every stage recomputes its derived field from raw fields only, so a
//! failed or repeated run is fixed by running it again. Stages take the
//! catalog's writer lock; concurrent runs are serialized.

use crate::catalog::Catalog;
use crate::category::split_categories;
use crate::scoring::{adjust_score, credibility, mean};
use crate::{Error, Result};
use ahash::AHashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    AdjustReviewScores,
    AggregateCredibility,
    SplitCategories,
}

impl Stage {
    /// Run order used by [`run_all`]
    pub const ALL: [Stage; 3] = [
        Stage::AdjustReviewScores,
        Stage::AggregateCredibility,
        Stage::SplitCategories,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::AdjustReviewScores => "adjust_review_scores",
            Stage::AggregateCredibility => "aggregate_credibility",
            Stage::SplitCategories => "split_categories",
        }
    }

    /// Stages that must have completed before this one may run
    pub fn prerequisites(&self) -> &'static [Stage] {
        match self {
            Stage::AggregateCredibility => &[Stage::AdjustReviewScores],
            Stage::AdjustReviewScores | Stage::SplitCategories => &[],
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.name() == s)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown stage: {}", s)))
    }
}

/// Outcome of one stage run
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    /// Records whose derived field was rewritten
    pub records: usize,
    pub elapsed_ms: u64,
}

/// Run a single stage after checking its prerequisites
pub fn run_stage(catalog: &Catalog, stage: Stage) -> Result<StageReport> {
    let _writer = catalog.writer.lock();
    run_stage_locked(catalog, stage)
}

/// Run every stage in dependency order
pub fn run_all(catalog: &Catalog) -> Result<Vec<StageReport>> {
    let _writer = catalog.writer.lock();
    Stage::ALL
        .into_iter()
        .map(|stage| run_stage_locked(catalog, stage))
        .collect()
}

pub fn adjust_review_scores(catalog: &Catalog) -> Result<StageReport> {
    run_stage(catalog, Stage::AdjustReviewScores)
}

pub fn aggregate_credibility(catalog: &Catalog) -> Result<StageReport> {
    run_stage(catalog, Stage::AggregateCredibility)
}

pub fn split_category_sets(catalog: &Catalog) -> Result<StageReport> {
    run_stage(catalog, Stage::SplitCategories)
}

fn run_stage_locked(catalog: &Catalog, stage: Stage) -> Result<StageReport> {
    for prerequisite in stage.prerequisites() {
        if !catalog.stage_status().is_done(*prerequisite) {
            return Err(Error::Computation(format!(
                "{} requires {} to run first",
                stage, prerequisite
            )));
        }
    }

    let started = Instant::now();
    let records = match stage {
        Stage::AdjustReviewScores => adjust_reviews(catalog),
        Stage::AggregateCredibility => aggregate(catalog)?,
        Stage::SplitCategories => split(catalog),
    };
    catalog.stages.write().mark(stage, true);

    let report = StageReport {
        stage,
        records,
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        catalog = %catalog.name(),
        stage = %stage,
        records = report.records,
        elapsed_ms = report.elapsed_ms,
        "stage complete"
    );
    Ok(report)
}

fn adjust_reviews(catalog: &Catalog) -> usize {
    let mut reviews = catalog.reviews.write();
    reviews.par_iter_mut().for_each(|(_, review)| {
        review.adjusted_score = Some(adjust_score(review.rating, review.helpful_votes));
    });
    reviews.len()
}

fn aggregate(catalog: &Catalog) -> Result<usize> {
    let mut businesses = catalog.businesses.write();
    let reviews = catalog.reviews.read();

    let mut scores: AHashMap<&str, Vec<f64>> = AHashMap::new();
    for review in reviews.values() {
        scores
            .entry(review.business_id.as_str())
            .or_default()
            .push(review.adjusted()?);
    }

    let shrinkage = catalog.config.shrinkage;
    for (id, business) in businesses.iter_mut() {
        let business_scores = scores.get(id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
        let count = business_scores.len() as u32;
        let average = mean(business_scores);

        business.review_count = Some(count);
        business.average_adjusted_score = average;
        business.credibility_score = average.and_then(|avg| credibility(avg, count, shrinkage));
    }
    Ok(businesses.len())
}

fn split(catalog: &Catalog) -> usize {
    let mut businesses = catalog.businesses.write();
    let delimiter = catalog.config.category_delimiter.as_str();

    for business in businesses.values_mut() {
        business.category_set = Some(split_categories(business.categories.as_deref(), delimiter));
    }

    if let Some(index) = &catalog.category_index {
        let mut index = index.write();
        index.clear();
        for business in businesses.values() {
            if let Some(set) = &business.category_set {
                index.insert(&business.id, set);
            }
        }
    }
    businesses.len()
}
