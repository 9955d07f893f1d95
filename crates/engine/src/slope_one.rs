//! Weighted Slope One - item-to-item collaborative filtering
//!
//! Predicts how a user would mark a film they have not seen from how other
//! people's marks on that film differ from their marks on films the user did
//! see: "people who rated X rated Y about 1.5 points higher".
//!
//! ## Algorithm
//! 1. For every film pair `(i, j)` with at least one co-rater, accumulate the
//!    sum of `mark_i - mark_j` and the co-rater count (the deviation matrix)
//! 2. For a target user and every film `j` they have not rated:
//!    `pred(j) = Σ (dev(j,i) + mark_i) · count(j,i) / Σ count(j,i)`
//!    over the films `i` the user rated that share a co-rater with `j`
//! 3. Films with no shared co-rater get no prediction
//!
//! ## Exactness
//! `(dev(j,i) + mark_i) · count(j,i)` is `sum(j,i) + mark_i · count(j,i)`, so
//! both numerator and denominator are integers. The only floating point
//! operation is the final division, which makes a prediction independent of
//! the order marks were recorded or iterated in.
//!
//! ## Maintenance
//! The matrix is built in parallel with rayon (fold per user, reduce by
//! pair), then kept current per mark change in O(|films rated by the user|).

use crate::types::{CoRating, Prediction};
use catalog::{FilmId, Mark, RatingLedger, UserId};
use rayon::prelude::*;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

/// Pairwise co-rating totals. Only `(lo, hi)` with `lo < hi` is stored; the
/// reverse direction is read by flipping the sign.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviationMatrix {
    pairs: HashMap<(FilmId, FilmId), CoRating>,
}

/// Storage key for a pair plus the sign that orients it as `a → b`.
fn oriented(a: FilmId, b: FilmId) -> ((FilmId, FilmId), i64) {
    if a < b { ((a, b), 1) } else { ((b, a), -1) }
}

impl DeviationMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute every pair from scratch.
    #[instrument(skip(ledger))]
    pub fn build(ledger: &RatingLedger) -> Self {
        let raters: Vec<&BTreeMap<FilmId, Mark>> = ledger.users().map(|(_, marks)| marks).collect();

        let pairs = raters
            .par_iter()
            .fold(HashMap::new, |mut local: HashMap<(FilmId, FilmId), CoRating>, marks| {
                // BTreeMap iteration gives i < j for every pair visited
                for (idx, (&i, &mark_i)) in marks.iter().enumerate() {
                    for (&j, &mark_j) in marks.iter().skip(idx + 1) {
                        local
                            .entry((i, j))
                            .or_default()
                            .merge(CoRating::new(i64::from(mark_i) - i64::from(mark_j), 1));
                    }
                }
                local
            })
            .reduce(HashMap::new, |mut acc, local| {
                for (pair, co) in local {
                    acc.entry(pair).or_default().merge(co);
                }
                acc
            });

        debug!("Built deviation matrix: {} pairs from {} raters", pairs.len(), raters.len());
        Self { pairs }
    }

    /// Co-rating totals oriented as `a → b` (`sum` of `mark_a - mark_b`).
    pub fn get(&self, a: FilmId, b: FilmId) -> Option<CoRating> {
        if a == b {
            return None;
        }
        let (key, sign) = oriented(a, b);
        self.pairs
            .get(&key)
            .map(|&co| if sign > 0 { co } else { co.reversed() })
    }

    /// `dev(a, b)`, the average of `mark_a - mark_b` over co-raters.
    pub fn deviation(&self, a: FilmId, b: FilmId) -> Option<f64> {
        self.get(a, b).and_then(|co| co.deviation())
    }

    /// Number of film pairs with at least one co-rater.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Account for a user marking `film_id`.
    ///
    /// `others` is the user's full rated set (an entry for `film_id` itself is
    /// skipped). `previous` is the mark being overwritten, if any: a fresh
    /// mark adds one co-rater to every pair, an overwrite only shifts sums.
    pub fn record(
        &mut self,
        film_id: FilmId,
        mark: Mark,
        previous: Option<Mark>,
        others: &BTreeMap<FilmId, Mark>,
    ) {
        let mark = i64::from(mark);
        for (&other, &other_mark) in others {
            if other == film_id {
                continue;
            }
            let (key, sign) = oriented(film_id, other);
            let co = self.pairs.entry(key).or_default();
            match previous {
                None => co.merge(CoRating::new(sign * (mark - i64::from(other_mark)), 1)),
                Some(old) => co.sum += sign * (mark - i64::from(old)),
            }
        }
    }

    /// Account for a user's mark on `film_id` being removed.
    ///
    /// `others` is the user's remaining rated set. Pairs left without
    /// co-raters are dropped.
    pub fn retract(&mut self, film_id: FilmId, mark: Mark, others: &BTreeMap<FilmId, Mark>) {
        let mark = i64::from(mark);
        for (&other, &other_mark) in others {
            if other == film_id {
                continue;
            }
            let (key, sign) = oriented(film_id, other);
            if let Entry::Occupied(mut slot) = self.pairs.entry(key) {
                let co = slot.get_mut();
                co.sum -= sign * (mark - i64::from(other_mark));
                co.count = co.count.saturating_sub(1);
                if co.count == 0 {
                    slot.remove();
                }
            }
        }
    }
}

/// A ledger snapshot together with its deviation matrix.
///
/// Cheap to share behind an `Arc`; writers clone-on-write and apply mark
/// changes through [`SlopeOne::put_mark`] / [`SlopeOne::remove_mark`], which
/// keep both halves consistent.
#[derive(Debug, Clone, Default)]
pub struct SlopeOne {
    ledger: RatingLedger,
    deviations: DeviationMatrix,
}

impl SlopeOne {
    /// Build the model from a ledger snapshot.
    pub fn new(ledger: RatingLedger) -> Self {
        let deviations = DeviationMatrix::build(&ledger);
        Self { ledger, deviations }
    }

    pub fn ledger(&self) -> &RatingLedger {
        &self.ledger
    }

    pub fn deviations(&self) -> &DeviationMatrix {
        &self.deviations
    }

    /// Predict `user_id`'s mark for a single film.
    ///
    /// `None` when the user already rated it or nothing they rated shares a
    /// co-rater with it.
    pub fn predict(&self, user_id: UserId, film_id: FilmId) -> Option<Prediction> {
        let rated = self.ledger.marks_by(user_id)?;
        if rated.contains_key(&film_id) {
            return None;
        }
        self.estimate(film_id, rated)
    }

    /// Predictions for every film `user_id` has not rated, in film id order.
    ///
    /// A user with no marks gets an empty list.
    #[instrument(skip(self))]
    pub fn predictions(&self, user_id: UserId) -> Vec<Prediction> {
        let Some(rated) = self.ledger.marks_by(user_id) else {
            debug!("User {} has no marks, nothing to predict from", user_id);
            return Vec::new();
        };

        let unrated: Vec<FilmId> = self
            .ledger
            .film_ids()
            .filter(|film_id| !rated.contains_key(film_id))
            .collect();

        let predictions: Vec<Prediction> = unrated
            .par_iter()
            .filter_map(|&film_id| self.estimate(film_id, rated))
            .collect();

        debug!(
            "Predicted {} of {} unrated films from {} marks",
            predictions.len(),
            unrated.len(),
            rated.len()
        );
        predictions
    }

    fn estimate(&self, film_id: FilmId, rated: &BTreeMap<FilmId, Mark>) -> Option<Prediction> {
        let mut numerator: i64 = 0;
        let mut support: u32 = 0;

        for (&other, &mark) in rated {
            if let Some(co) = self.deviations.get(film_id, other) {
                numerator += co.sum + i64::from(mark) * i64::from(co.count);
                support += co.count;
            }
        }

        (support > 0).then(|| Prediction::new(film_id, numerator as f64 / support as f64, support))
    }

    /// Make a film known to the ledger before anyone rates it.
    pub fn insert_film(&mut self, film_id: FilmId) {
        self.ledger.insert_film(film_id);
    }

    /// Record a mark, returning the one it replaced.
    pub fn put_mark(&mut self, film_id: FilmId, user_id: UserId, mark: Mark) -> Option<Mark> {
        let previous = self.ledger.put(film_id, user_id, mark);
        if previous == Some(mark) {
            return previous;
        }
        if let Some(others) = self.ledger.marks_by(user_id) {
            self.deviations.record(film_id, mark, previous, others);
        }
        previous
    }

    /// Remove a mark, returning it if there was one.
    pub fn remove_mark(&mut self, film_id: FilmId, user_id: UserId) -> Option<Mark> {
        let removed = self.ledger.remove(film_id, user_id)?;
        if let Some(others) = self.ledger.marks_by(user_id) {
            self.deviations.retract(film_id, removed, others);
        }
        Some(removed)
    }
}
