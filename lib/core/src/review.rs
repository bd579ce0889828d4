use crate::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single piece of peer feedback about a business
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub business_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Star rating, 1 through 5
    pub rating: u8,
    /// Votes marking the review as helpful
    #[serde(default)]
    pub helpful_votes: u32,
    #[serde(default)]
    pub funny_votes: u32,
    #[serde(default)]
    pub cool_votes: u32,
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub adjusted_score: Option<f64>,
}

impl Review {
    pub fn new(
        id: impl Into<String>,
        business_id: impl Into<String>,
        rating: u8,
        helpful_votes: u32,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            business_id: business_id.into(),
            user_id: None,
            rating,
            helpful_votes,
            funny_votes: 0,
            cool_votes: 0,
            timestamp,
            text: String::new(),
            adjusted_score: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=5).contains(&self.rating) {
            return Err(Error::InvalidArgument(format!(
                "review {} has rating {}, expected 1-5",
                self.id, self.rating
            )));
        }
        Ok(())
    }

    pub fn adjusted(&self) -> Result<f64> {
        self.adjusted_score
            .ok_or_else(|| Error::missing_field(&self.id, "adjusted_score"))
    }
}

/// What a caller sees when listing reviews: no foreign keys, no vote breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewDisplay {
    pub review_id: String,
    pub rating: u8,
    pub helpful_votes: u32,
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
    pub text: String,
    pub adjusted_score: f64,
}

impl ReviewDisplay {
    pub fn from_review(review: &Review) -> Result<Self> {
        Ok(Self {
            review_id: review.id.clone(),
            rating: review.rating,
            helpful_votes: review.helpful_votes,
            timestamp: review.timestamp,
            text: review.text.clone(),
            adjusted_score: review.adjusted()?,
        })
    }
}

/// Review timestamps in `YYYY-MM-DD HH:MM:SS`; ISO `T`-separated input is accepted too.
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn parse(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(raw, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
    }

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timestamp_formats() {
        let spaced = timestamp::parse("2018-07-07 22:09:11").unwrap();
        let iso = timestamp::parse("2018-07-07T22:09:11").unwrap();
        assert_eq!(spaced, iso);
        assert!(timestamp::parse("yesterday").is_err());
    }

    #[test]
    fn test_review_from_json() {
        let review: Review = serde_json::from_value(json!({
            "id": "r1",
            "business_id": "b1",
            "rating": 4,
            "helpful_votes": 2,
            "timestamp": "2020-01-01 10:00:00",
            "text": "Great slice"
        }))
        .unwrap();
        assert_eq!(review.helpful_votes, 2);
        assert_eq!(review.funny_votes, 0);
        assert!(review.adjusted_score.is_none());
        assert!(review.validate().is_ok());
    }

    #[test]
    fn test_rating_out_of_range() {
        let ts = timestamp::parse("2020-01-01 10:00:00").unwrap();
        assert!(Review::new("r", "b", 0, 0, ts).validate().is_err());
        assert!(Review::new("r", "b", 6, 0, ts).validate().is_err());
    }

    #[test]
    fn test_display_requires_adjusted_score() {
        let ts = timestamp::parse("2020-01-01 10:00:00").unwrap();
        let mut review = Review::new("r1", "b1", 5, 3, ts);
        assert!(ReviewDisplay::from_review(&review).is_err());

        review.adjusted_score = Some(6.0);
        let display = ReviewDisplay::from_review(&review).unwrap();
        let encoded = serde_json::to_value(&display).unwrap();
        assert!(encoded.get("business_id").is_none());
        assert!(encoded.get("funny_votes").is_none());
        assert_eq!(encoded["timestamp"], json!("2020-01-01 10:00:00"));
    }
}
