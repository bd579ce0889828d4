//! Review and business scoring formulas
//!
//! A review's adjusted score pushes extreme ratings further from neutral by
//! the log of their helpful votes. A business's credibility is the average
//! adjusted score shrunk toward zero by `count / (count + K)`.

/// Neutral star rating, never amplified by votes
pub const NEUTRAL_RATING: u8 = 3;

/// Shrinkage constant K in `avg * n / (n + K)`
pub const DEFAULT_SHRINKAGE: f64 = 5.0;

/// Confidence-weighted score for one review
#[inline]
pub fn adjust_score(rating: u8, helpful_votes: u32) -> f64 {
    let rating_f = f64::from(rating);
    let boost = if helpful_votes > 0 {
        f64::from(helpful_votes).ln()
    } else {
        0.0
    };

    match rating.cmp(&NEUTRAL_RATING) {
        std::cmp::Ordering::Less => rating_f - boost,
        std::cmp::Ordering::Greater => rating_f + boost,
        std::cmp::Ordering::Equal => rating_f,
    }
}

/// Arithmetic mean, `None` for an empty slice
#[inline]
pub fn mean(scores: &[f64]) -> Option<f64> {
    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

/// Shrinkage-corrected credibility; `None` when there are no reviews
#[inline]
pub fn credibility(average: f64, review_count: u32, shrinkage: f64) -> Option<f64> {
    if review_count == 0 {
        return None;
    }
    let n = f64::from(review_count);
    Some(average * n / (n + shrinkage))
}
