//! Core traits for the ranking pipeline.
//!
//! This module defines the Filter trait that allows composable,
//! extensible filters to be applied to prediction sets.

use engine::{Prediction, RatedFilms};

/// Core trait for filtering predictions.
///
/// All filters must implement this trait to be used in the FilterPipeline.
///
/// Filters are infallible: dropping everything is a valid outcome, and an
/// empty recommendation list is a normal answer for a new user.
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of predictions.
    ///
    /// # Arguments
    /// * `predictions` - The predictions to filter (takes ownership)
    /// * `rated` - The target user's rated films
    fn apply(&self, predictions: Vec<Prediction>, rated: &RatedFilms) -> Vec<Prediction>;
}
