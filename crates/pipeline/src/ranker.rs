//! Recommendation ranking
//!
//! Turns raw engine predictions into the bounded list the service returns:
//! 1. Run the filter pipeline (already-rated films always go first)
//! 2. Sort by predicted score, highest first
//! 3. Break ties by film id so equal scores come out in a fixed order
//! 4. Keep the top `limit` (5 unless configured otherwise)

use crate::filter_pipeline::FilterPipeline;
use crate::filters::{AlreadyRatedFilter, MinimumSupportFilter};
use engine::{Prediction, RatedFilms};
use std::cmp::Ordering;
use tracing::{debug, instrument};

pub const DEFAULT_LIMIT: usize = 5;

/// Highest score first, then lowest film id.
fn by_score(a: &Prediction, b: &Prediction) -> Ordering {
    b.score.total_cmp(&a.score).then(a.film_id.cmp(&b.film_id))
}

pub struct RecommendationRanker {
    pipeline: FilterPipeline,
    limit: usize,
}

impl RecommendationRanker {
    /// Ranker with the already-rated filter and a limit of 5.
    pub fn new() -> Self {
        Self {
            pipeline: FilterPipeline::new().add_filter(AlreadyRatedFilter),
            limit: DEFAULT_LIMIT,
        }
    }

    /// Configure the maximum number of results (default: 5)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Drop predictions backed by fewer than `min_support` co-raters.
    ///
    /// A threshold of 0 or 1 filters nothing and adds no stage.
    pub fn with_min_support(mut self, min_support: u32) -> Self {
        if min_support > 1 {
            self.pipeline = self.pipeline.add_filter(MinimumSupportFilter::new(min_support));
        }
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Filter, order and truncate predictions for the user in `rated`.
    #[instrument(skip(self, predictions, rated), fields(user_id = rated.user_id))]
    pub fn rank(&self, predictions: Vec<Prediction>, rated: &RatedFilms) -> Vec<Prediction> {
        let mut ranked = self.pipeline.apply(predictions, rated);
        ranked.sort_unstable_by(by_score);
        ranked.truncate(self.limit);

        debug!("Ranked {} recommendations", ranked.len());
        ranked
    }
}

impl Default for RecommendationRanker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{FilmId, Mark};

    fn ids(predictions: &[Prediction]) -> Vec<FilmId> {
        predictions.iter().map(|p| p.film_id).collect()
    }

    #[test]
    fn test_rank_orders_by_score_then_id() {
        let ranker = RecommendationRanker::new();
        let predictions = vec![
            Prediction::new(4, 6.0, 1),
            Prediction::new(3, 8.0, 1),
            Prediction::new(9, 8.0, 1),
            Prediction::new(1, 8.0, 2),
        ];

        let ranked = ranker.rank(predictions, &RatedFilms::new(1));
        assert_eq!(ids(&ranked), vec![1, 3, 9, 4]);
    }

    #[test]
    fn test_rank_truncates_to_five() {
        let ranker = RecommendationRanker::new();
        let predictions: Vec<Prediction> = (1..=8)
            .map(|id| Prediction::new(id, id as f64, 1))
            .collect();

        let ranked = ranker.rank(predictions, &RatedFilms::new(1));
        assert_eq!(ids(&ranked), vec![8, 7, 6, 5, 4]);
    }

    #[test]
    fn test_rank_excludes_rated_films() {
        let mut rated = RatedFilms::new(1);
        rated.marks.insert(2, Mark::new(10).unwrap());

        let predictions = vec![Prediction::new(2, 10.0, 4), Prediction::new(5, 3.0, 1)];
        let ranked = RecommendationRanker::new().rank(predictions, &rated);

        assert_eq!(ids(&ranked), vec![5]);
    }

    #[test]
    fn test_rank_empty_input() {
        let ranked = RecommendationRanker::new().rank(Vec::new(), &RatedFilms::new(1));
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_builders() {
        let predictions = vec![Prediction::new(1, 9.0, 1), Prediction::new(2, 5.0, 3)];

        let ranker = RecommendationRanker::new().with_limit(1).with_min_support(2);
        assert_eq!(ranker.limit(), 1);
        assert_eq!(ids(&ranker.rank(predictions, &RatedFilms::new(1))), vec![2]);
    }
}
