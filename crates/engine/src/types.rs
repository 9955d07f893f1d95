//! Core types shared by the prediction engine and the ranking pipeline.

use catalog::FilmId;

/// A predicted mark for a film the target user has not rated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub film_id: FilmId,

    /// Weighted Slope One estimate, on the 1..=10 mark scale
    /// (it may fall slightly outside when deviations are large)
    pub score: f64,

    /// Total co-rater count behind the estimate (the formula's denominator)
    pub support: u32,
}

impl Prediction {
    pub fn new(film_id: FilmId, score: f64, support: u32) -> Self {
        Self {
            film_id,
            score,
            support,
        }
    }
}

/// Running totals for an ordered film pair `(a, b)`.
///
/// `sum` is the exact sum of `mark_a - mark_b` over co-raters, so the
/// deviation is `sum / count` and nothing is rounded until the very end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoRating {
    pub sum: i64,
    pub count: u32,
}

impl CoRating {
    pub fn new(sum: i64, count: u32) -> Self {
        Self { sum, count }
    }

    /// Average signed mark difference; `None` with no co-raters.
    pub fn deviation(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }

    /// The same totals seen from the other film of the pair.
    pub fn reversed(self) -> Self {
        Self {
            sum: -self.sum,
            count: self.count,
        }
    }

    pub(crate) fn merge(&mut self, other: CoRating) {
        self.sum += other.sum;
        self.count += other.count;
    }
}
