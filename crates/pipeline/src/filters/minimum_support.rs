//! Filter to drop weakly supported predictions.
//!
//! A prediction backed by a single co-rater is as likely to be noise as
//! signal. With a threshold of 1 (the default used by the service) nothing
//! is removed.

use crate::traits::Filter;
use engine::{Prediction, RatedFilms};

/// Keeps predictions whose co-rater support is at least `min_support`.
pub struct MinimumSupportFilter {
    min_support: u32,
}

impl MinimumSupportFilter {
    pub fn new(min_support: u32) -> Self {
        Self { min_support }
    }
}

impl Filter for MinimumSupportFilter {
    fn name(&self) -> &str {
        "MinimumSupportFilter"
    }

    fn apply(&self, predictions: Vec<Prediction>, _rated: &RatedFilms) -> Vec<Prediction> {
        predictions
            .into_iter()
            .filter(|prediction| prediction.support >= self.min_support)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimum_support_filter() {
        let rated = RatedFilms::new(1);
        let predictions = vec![
            Prediction::new(1, 9.5, 1),
            Prediction::new(2, 7.0, 4),
            Prediction::new(3, 8.0, 3),
        ];

        let filtered = MinimumSupportFilter::new(3).apply(predictions.clone(), &rated);
        let ids: Vec<_> = filtered.iter().map(|p| p.film_id).collect();
        assert_eq!(ids, vec![2, 3]);

        // A threshold of 1 keeps everything the engine can produce
        assert_eq!(MinimumSupportFilter::new(1).apply(predictions, &rated).len(), 3);
    }
}
