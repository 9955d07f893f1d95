//! Filter to remove films the user has already rated.
//!
//! This is always the first filter in the pipeline: a rated film must never
//! come back as a recommendation, whatever produced the prediction.

use crate::traits::Filter;
use engine::{Prediction, RatedFilms};

/// Removes predictions for films present in the user's rated set.
pub struct AlreadyRatedFilter;

impl Filter for AlreadyRatedFilter {
    fn name(&self) -> &str {
        "AlreadyRatedFilter"
    }

    fn apply(&self, predictions: Vec<Prediction>, rated: &RatedFilms) -> Vec<Prediction> {
        predictions
            .into_iter()
            .filter(|prediction| !rated.contains(prediction.film_id))
            .collect()
    }
}
