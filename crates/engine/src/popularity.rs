//! Popularity ranking
//!
//! Orders films by how many distinct users rated them. The mark value is
//! ignored entirely: a film rated 1 by three people outranks a film rated 10
//! by two. Ties go to the lower film id.

use catalog::{Film, FilmId, RatingLedger};
use std::cmp::Ordering;
use tracing::{debug, instrument};

/// A film and its distinct rater count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Popularity {
    pub film_id: FilmId,
    pub raters: usize,
}

/// Most-rated-first ordering with film id as the tie-break.
fn by_popularity(a: &Popularity, b: &Popularity) -> Ordering {
    b.raters.cmp(&a.raters).then(a.film_id.cmp(&b.film_id))
}

/// Ranks films by rater count.
#[derive(Debug, Clone, Copy)]
pub struct PopularityRanker {
    /// Maximum number of films returned by [`PopularityRanker::rank`]
    limit: usize,
}

impl Default for PopularityRanker {
    fn default() -> Self {
        Self::new()
    }
}

impl PopularityRanker {
    pub fn new() -> Self {
        Self { limit: 10 }
    }

    /// Configure the result size (default: 10)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// The `limit` most rated films of a ledger snapshot, unrated films included.
    #[instrument(skip(self, ledger), fields(limit = self.limit))]
    pub fn rank(&self, ledger: &RatingLedger) -> Vec<Popularity> {
        let mut ranked: Vec<Popularity> = ledger
            .film_ids()
            .map(|film_id| Popularity {
                film_id,
                raters: ledger.rating_count(film_id),
            })
            .collect();

        ranked.sort_unstable_by(by_popularity);
        ranked.truncate(self.limit);

        debug!("Ranked {} popular films", ranked.len());
        ranked
    }

    /// Put hydrated films into popularity order (no truncation).
    pub fn order_films(films: &mut [Film]) {
        films.sort_unstable_by(|a, b| {
            b.rating_count()
                .cmp(&a.rating_count())
                .then(a.id.cmp(&b.id))
        });
    }
}
