//! The FilterPipeline orchestrates multiple filters.
//!
//! This module provides the main FilterPipeline struct that chains
//! multiple filters together using the builder pattern.

use crate::traits::Filter;
use engine::{Prediction, RatedFilms};
use tracing::debug;

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(AlreadyRatedFilter)
///     .add_filter(MinimumSupportFilter::new(3));
///
/// let filtered = pipeline.apply(predictions, &rated);
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Names of the configured filters, in application order.
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Apply all filters in sequence to the predictions.
    pub fn apply(&self, predictions: Vec<Prediction>, rated: &RatedFilms) -> Vec<Prediction> {
        let mut current = predictions;
        for filter in &self.filters {
            let before = current.len();
            current = filter.apply(current, rated);
            debug!(
                "Filter {} kept {} of {} predictions",
                filter.name(),
                current.len(),
                before
            );
        }
        current
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{AlreadyRatedFilter, MinimumSupportFilter};
    use catalog::Mark;

    #[test]
    fn test_empty_pipeline() {
        let pipeline = FilterPipeline::new();
        let rated = RatedFilms::new(1);

        let predictions = vec![Prediction::new(1, 9.0, 2), Prediction::new(2, 8.0, 1)];

        let filtered = pipeline.apply(predictions, &rated);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_filters_run_in_order() {
        let mut rated = RatedFilms::new(1);
        rated.marks.insert(1, Mark::new(7).unwrap());

        let pipeline = FilterPipeline::new()
            .add_filter(AlreadyRatedFilter)
            .add_filter(MinimumSupportFilter::new(2));
        assert_eq!(
            pipeline.filter_names(),
            vec!["AlreadyRatedFilter", "MinimumSupportFilter"]
        );

        let predictions = vec![
            Prediction::new(1, 9.0, 5),
            Prediction::new(2, 8.0, 1),
            Prediction::new(3, 7.0, 2),
        ];

        let filtered = pipeline.apply(predictions, &rated);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].film_id, 3);
    }
}
