//! Radius search over category candidates

use crate::business::Business;
use crate::geo::{Coordinate, GeoGrid};
use crate::{Error, Result};
use ahash::AHashSet;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::BuildHasher;

/// A candidate business within the search radius
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityHit {
    pub business: Business,
    /// Great-circle distance from the query origin, meters
    pub distance: f64,
}

pub fn validate_radius(max_distance: f64) -> Result<()> {
    if max_distance.is_finite() && max_distance > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "max distance must be a positive number of meters, got {}",
            max_distance
        )))
    }
}

/// Reference search: distance to every candidate.
pub fn search_by_scan<S: BuildHasher>(
    businesses: &HashMap<String, Business, S>,
    candidates: &[String],
    origin: &Coordinate,
    max_distance: f64,
) -> Result<Vec<ProximityHit>> {
    validate_radius(max_distance)?;
    origin.validate()?;

    let mut hits: Vec<ProximityHit> = candidates
        .iter()
        .filter_map(|id| businesses.get(id))
        .filter_map(|business| within(business, origin, max_distance))
        .collect();
    sort_by_credibility(&mut hits);
    hits.dedup_by(|a, b| a.business.id == b.business.id);
    Ok(hits)
}

/// Grid-assisted search: only businesses in nearby cells are measured.
///
/// Falls back to walking the candidate list when it is shorter than the
/// set of nearby ids; both paths return the same hits.
pub fn search_by_grid<S: BuildHasher>(
    businesses: &HashMap<String, Business, S>,
    grid: &GeoGrid,
    candidates: &[String],
    origin: &Coordinate,
    max_distance: f64,
) -> Result<Vec<ProximityHit>> {
    validate_radius(max_distance)?;
    origin.validate()?;

    let nearby = grid.cells_within(origin, max_distance);
    if nearby.len() > candidates.len() {
        return search_by_scan(businesses, candidates, origin, max_distance);
    }

    let wanted: AHashSet<&str> = candidates.iter().map(String::as_str).collect();
    let mut hits: Vec<ProximityHit> = nearby
        .into_iter()
        .filter(|id| wanted.contains(id))
        .filter_map(|id| businesses.get(id))
        .filter_map(|business| within(business, origin, max_distance))
        .collect();
    sort_by_credibility(&mut hits);
    Ok(hits)
}

fn within(business: &Business, origin: &Coordinate, max_distance: f64) -> Option<ProximityHit> {
    let distance = origin.distance_to(&business.coordinate);
    (distance <= max_distance).then(|| ProximityHit {
        business: business.clone(),
        distance,
    })
}

/// Credibility descending, unscored businesses last, id ascending on ties
pub fn sort_by_credibility(hits: &mut [ProximityHit]) {
    hits.sort_by(|a, b| {
        match (a.business.credibility_score, b.business.credibility_score) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| a.business.id.cmp(&b.business.id))
    });
}
