use crate::catalog::Catalog;
use crate::pipeline::Stage;
use crate::review::ReviewDisplay;
use crate::{Error, Result};

impl Catalog {
    /// All reviews of a business, highest adjusted score first, newest first on ties
    pub fn reviews_for(&self, business_id: &str) -> Result<Vec<ReviewDisplay>> {
        self.require_stage(Stage::AdjustReviewScores)?;
        if !self.businesses.read().contains_key(business_id) {
            return Err(Error::BusinessNotFound(business_id.to_string()));
        }

        let reviews = self.reviews.read();
        let by_business = self.reviews_by_business.read();
        let mut listed = by_business
            .get(business_id)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(|id| reviews.get(id))
            .map(ReviewDisplay::from_review)
            .collect::<Result<Vec<_>>>()?;

        listed.sort_by(|a, b| {
            b.adjusted_score
                .total_cmp(&a.adjusted_score)
                .then_with(|| b.timestamp.cmp(&a.timestamp))
                .then_with(|| a.review_id.cmp(&b.review_id))
        });
        Ok(listed)
    }
}
