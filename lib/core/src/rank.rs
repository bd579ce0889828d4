//! Final recommendation scoring
//!
//! `recommend_score = credibility + overlap_weight * shared_categories`.
//! Results are ordered by score descending with ascending business id as
//! the tie-break, then cut to the configured limit.

use crate::category::CategoryMatch;
use crate::proximity::ProximityHit;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_OVERLAP_WEIGHT: f64 = 0.5;
pub const DEFAULT_RESULT_LIMIT: usize = 20;

/// Configuration for the ranking stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendConfig {
    /// Score added per category shared with the seed
    pub overlap_weight: f64,
    /// Maximum number of recommendations returned
    pub limit: usize,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            overlap_weight: DEFAULT_OVERLAP_WEIGHT,
            limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

/// One recommended business, projected for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub name: String,
    /// Meters from the query origin
    pub distance: f64,
    pub credibility_score: Option<f64>,
    pub category_overlap: usize,
    pub recommend_score: f64,
    /// Display passthrough (address, city, stars, ...)
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[inline]
pub fn recommend_score(credibility: Option<f64>, overlap: usize, overlap_weight: f64) -> f64 {
    credibility.unwrap_or(0.0) + overlap_weight * overlap as f64
}

/// Score, order and truncate proximity hits
pub fn rank(
    hits: Vec<ProximityHit>,
    matched: &CategoryMatch,
    config: &RecommendConfig,
) -> Result<Vec<Recommendation>> {
    let mut ranked = hits
        .into_iter()
        .map(|hit| {
            let credibility = hit.business.credibility()?;
            let overlap = matched.overlap_of(&hit.business.id);
            Ok(Recommendation {
                fields: hit.business.display_fields(),
                id: hit.business.id,
                name: hit.business.name,
                distance: hit.distance,
                credibility_score: credibility,
                category_overlap: overlap,
                recommend_score: recommend_score(credibility, overlap, config.overlap_weight),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    ranked.sort_by(|a, b| {
        b.recommend_score
            .total_cmp(&a.recommend_score)
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked.truncate(config.limit);
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use crate::{Business, Error};
    use serde_json::json;
    use std::collections::HashMap;

    fn hit(id: &str, credibility: Option<f64>, distance: f64) -> ProximityHit {
        let mut business = Business::new(id, format!("Business {}", id), Coordinate::new(0.0, 0.0).unwrap())
            .with_field("city", json!("Madison"))
            .with_field("attributes", json!({"WiFi": "free"}));
        business.review_count = Some(if credibility.is_some() { 10 } else { 0 });
        business.credibility_score = credibility;
        ProximityHit { business, distance }
    }

    fn matched(pairs: &[(&str, usize)]) -> CategoryMatch {
        let overlaps: HashMap<String, usize> = pairs.iter().map(|(id, n)| (id.to_string(), *n)).collect();
        let mut candidates: Vec<String> = overlaps.keys().cloned().collect();
        candidates.sort();
        CategoryMatch { overlaps, candidates }
    }

    #[test]
    fn test_overlap_outweighs_small_credibility_gap() {
        let hits = vec![hit("B", Some(2.0), 3000.0), hit("C", Some(1.0), 4000.0)];
        let ranked = rank(hits, &matched(&[("B", 1), ("C", 2)]), &RecommendConfig::default()).unwrap();

        assert_eq!(ranked.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["B", "C"]);
        assert_eq!(ranked[0].recommend_score, 2.5);
        assert_eq!(ranked[1].recommend_score, 2.0);
        assert_eq!(ranked[1].category_overlap, 2);
    }

    #[test]
    fn test_ties_break_on_id() {
        let hits = vec![hit("z", Some(1.0), 1.0), hit("a", Some(1.0), 2.0), hit("m", Some(1.0), 3.0)];
        let ranked = rank(hits, &matched(&[("z", 1), ("a", 1), ("m", 1)]), &RecommendConfig::default()).unwrap();
        assert_eq!(ranked.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["a", "m", "z"]);
    }

    #[test]
    fn test_truncates_to_limit_and_is_non_increasing() {
        let hits: Vec<ProximityHit> = (0..45).map(|i| hit(&format!("b{:02}", i), Some(i as f64 / 10.0), 10.0)).collect();
        let pairs: Vec<(String, usize)> = (0..45).map(|i| (format!("b{:02}", i), i % 3 + 1)).collect();
        let pair_refs: Vec<(&str, usize)> = pairs.iter().map(|(id, n)| (id.as_str(), *n)).collect();

        let ranked = rank(hits, &matched(&pair_refs), &RecommendConfig::default()).unwrap();
        assert_eq!(ranked.len(), 20);
        assert!(ranked.windows(2).all(|w| w[0].recommend_score >= w[1].recommend_score));
    }

    #[test]
    fn test_unreviewed_business_scores_overlap_only() {
        let ranked = rank(vec![hit("n", None, 5.0)], &matched(&[("n", 3)]), &RecommendConfig::default()).unwrap();
        assert_eq!(ranked[0].credibility_score, None);
        assert_eq!(ranked[0].recommend_score, 1.5);
    }

    #[test]
    fn test_unaggregated_business_is_computation_error() {
        let mut stale = hit("s", Some(1.0), 5.0);
        stale.business.review_count = None;
        let err = rank(vec![stale], &matched(&[("s", 1)]), &RecommendConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Computation(_)));
    }

    #[test]
    fn test_projection_drops_internal_fields() {
        let ranked = rank(vec![hit("p", Some(1.0), 5.0)], &matched(&[("p", 1)]), &RecommendConfig::default()).unwrap();
        let encoded = serde_json::to_value(&ranked[0]).unwrap();
        assert_eq!(encoded["city"], json!("Madison"));
        assert_eq!(encoded["distance"], json!(5.0));
        assert!(encoded.get("attributes").is_none());
        assert!(encoded.get("category_set").is_none());
        assert!(encoded.get("coordinate").is_none());
    }
}
