//! JSON Lines ingestion of raw business and review exports.
//!
//! Raw business lines carry `latitude` and `longitude` as separate fields;
//! they are combined into a single [`Coordinate`] here. Anything the core
//! does not model is kept as display passthrough.

use anyhow::{anyhow, Context, Result};
use georank_core::review::timestamp;
use georank_core::{Business, Coordinate, Review};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One line of a business export
#[derive(Debug, Deserialize)]
pub struct RawBusinessRecord {
    pub business_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub categories: Option<String>,
    /// Precomputed count in the export; recomputed from reviews instead
    #[serde(default)]
    pub review_count: Option<Value>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl RawBusinessRecord {
    pub fn into_business(self) -> georank_core::Result<Business> {
        let coordinate = Coordinate::new(self.longitude, self.latitude)?;
        let mut business = Business::new(self.business_id, self.name, coordinate);
        business.categories = self.categories;
        business.passthrough = self.rest;
        Ok(business)
    }
}

/// One line of a review export
#[derive(Debug, Deserialize)]
pub struct RawReviewRecord {
    pub review_id: String,
    pub business_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub stars: f64,
    #[serde(default)]
    pub useful: u32,
    #[serde(default)]
    pub funny: u32,
    #[serde(default)]
    pub cool: u32,
    pub date: String,
    #[serde(default)]
    pub text: String,
}

impl RawReviewRecord {
    pub fn into_review(self) -> Result<Review> {
        if self.stars.fract() != 0.0 || !(1.0..=5.0).contains(&self.stars) {
            return Err(anyhow!("review {} has non-integer or out of range stars {}", self.review_id, self.stars));
        }
        let timestamp = timestamp::parse(&self.date)
            .with_context(|| format!("review {} has bad date {:?}", self.review_id, self.date))?;

        let mut review = Review::new(
            self.review_id,
            self.business_id,
            self.stars as u8,
            self.useful,
            timestamp,
        )
        .with_text(self.text);
        review.user_id = self.user_id;
        review.funny_votes = self.funny;
        review.cool_votes = self.cool;
        Ok(review)
    }
}

fn read_lines<T, F>(path: &Path, mut convert: F) -> Result<Vec<T>>
where
    F: FnMut(&str) -> Result<T>,
{
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut out = Vec::new();
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = convert(&line).with_context(|| format!("{}:{}", path.display(), number + 1))?;
        out.push(record);
    }
    Ok(out)
}

/// Parse a business export, one JSON object per line
pub fn read_businesses(path: &Path) -> Result<Vec<Business>> {
    read_lines(path, |line| {
        let raw: RawBusinessRecord = serde_json::from_str(line)?;
        Ok(raw.into_business()?)
    })
}

/// Parse a review export, one JSON object per line
pub fn read_reviews(path: &Path) -> Result<Vec<Review>> {
    read_lines(path, |line| {
        let raw: RawReviewRecord = serde_json::from_str(line)?;
        raw.into_review()
    })
}
