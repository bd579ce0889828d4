//! Category sets, the category inverted index, and overlap matching

use crate::business::Business;
use crate::{Error, Result};
use ahash::{AHashMap, AHashSet};
use std::collections::{BTreeSet, HashMap};

pub const DEFAULT_CATEGORY_DELIMITER: &str = ", ";

/// Split a raw category string into a normalized set.
///
/// Tokens are trimmed and empty tokens dropped; a missing string is an empty set.
pub fn split_categories(raw: Option<&str>, delimiter: &str) -> BTreeSet<String> {
    let Some(raw) = raw else {
        return BTreeSet::new();
    };
    raw.split(delimiter)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Size of the intersection of two category sets
#[inline]
pub fn overlap(a: &BTreeSet<String>, b: &BTreeSet<String>) -> usize {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().filter(|c| large.contains(*c)).count()
}

/// Category -> business ids carrying that category
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    postings: AHashMap<String, AHashSet<String>>,
    // business id -> categories it was indexed under, so removal is exact
    indexed: AHashMap<String, BTreeSet<String>>,
}

impl CategoryIndex {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, business_id: &str, categories: &BTreeSet<String>) {
        self.remove(business_id);
        for category in categories {
            self.postings
                .entry(category.clone())
                .or_default()
                .insert(business_id.to_string());
        }
        self.indexed.insert(business_id.to_string(), categories.clone());
    }

    pub fn remove(&mut self, business_id: &str) {
        if let Some(categories) = self.indexed.remove(business_id) {
            for category in categories {
                if let Some(ids) = self.postings.get_mut(&category) {
                    ids.remove(business_id);
                    if ids.is_empty() {
                        self.postings.remove(&category);
                    }
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.postings.clear();
        self.indexed.clear();
    }

    pub fn businesses_with(&self, category: &str) -> impl Iterator<Item = &str> {
        self.postings
            .get(category)
            .into_iter()
            .flat_map(|ids| ids.iter().map(String::as_str))
    }

    pub fn category_count(&self) -> usize {
        self.postings.len()
    }

    /// Overlap counts for every business sharing a category with `seed`
    pub fn overlap_counts(&self, seed: &BTreeSet<String>) -> AHashMap<String, usize> {
        let mut counts: AHashMap<String, usize> = AHashMap::new();
        for category in seed {
            for id in self.businesses_with(category) {
                *counts.entry(id.to_string()).or_insert(0) += 1;
            }
        }
        counts
    }
}

/// Result of matching a seed business against the catalog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryMatch {
    /// Candidate id -> number of categories shared with the seed
    pub overlaps: HashMap<String, usize>,
    /// Candidates with a nonzero overlap, seed excluded, sorted by id
    pub candidates: Vec<String>,
}

impl CategoryMatch {
    fn from_counts(seed_id: &str, counts: impl IntoIterator<Item = (String, usize)>) -> Self {
        let overlaps: HashMap<String, usize> = counts
            .into_iter()
            .filter(|(id, count)| *count > 0 && id != seed_id)
            .collect();
        let mut candidates: Vec<String> = overlaps.keys().cloned().collect();
        candidates.sort();
        Self { overlaps, candidates }
    }

    #[inline]
    pub fn overlap_of(&self, business_id: &str) -> usize {
        self.overlaps.get(business_id).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

fn seed_categories<'a, S: std::hash::BuildHasher>(
    businesses: &'a HashMap<String, Business, S>,
    seed_id: &str,
) -> Result<&'a BTreeSet<String>> {
    businesses
        .get(seed_id)
        .ok_or_else(|| Error::BusinessNotFound(seed_id.to_string()))?
        .category_set()
}

/// Reference matcher: intersect the seed with every other business
pub fn match_by_scan<S: std::hash::BuildHasher>(
    businesses: &HashMap<String, Business, S>,
    seed_id: &str,
) -> Result<CategoryMatch> {
    let seed = seed_categories(businesses, seed_id)?;
    let mut counts = Vec::new();
    for (id, business) in businesses {
        if id == seed_id {
            continue;
        }
        // Unsplit candidates cannot share anything yet
        if let Some(set) = &business.category_set {
            counts.push((id.clone(), overlap(seed, set)));
        }
    }
    Ok(CategoryMatch::from_counts(seed_id, counts))
}

/// Indexed matcher: only visits businesses sharing at least one category
pub fn match_by_index<S: std::hash::BuildHasher>(
    businesses: &HashMap<String, Business, S>,
    index: &CategoryIndex,
    seed_id: &str,
) -> Result<CategoryMatch> {
    let seed = seed_categories(businesses, seed_id)?;
    Ok(CategoryMatch::from_counts(seed_id, index.overlap_counts(seed)))
}
