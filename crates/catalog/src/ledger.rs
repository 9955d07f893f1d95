//! The rating ledger: a sparse `film → {user → mark}` snapshot.
//!
//! The ledger is the read model the recommendation engine works on. It is
//! built from fully hydrated films and keeps a reverse `user → {film → mark}`
//! index so a user's rated set can be read without scanning every film.

use crate::types::{Film, FilmId, Mark, UserId};
use std::collections::{BTreeMap, HashMap};

/// Sparse rating matrix with indices in both directions.
#[derive(Debug, Clone, Default)]
pub struct RatingLedger {
    /// All marks received by each film (films with no marks are kept)
    by_film: BTreeMap<FilmId, HashMap<UserId, Mark>>,
    /// All marks given by each user
    by_user: HashMap<UserId, BTreeMap<FilmId, Mark>>,
}

impl RatingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from hydrated films.
    pub fn from_films<'a>(films: impl IntoIterator<Item = &'a Film>) -> Self {
        let mut ledger = Self::new();
        for film in films {
            ledger.insert_film(film.id);
            for (&user_id, &mark) in &film.ratings {
                ledger.put(film.id, user_id, mark);
            }
        }
        ledger
    }

    /// Register a film even if nobody rated it yet.
    pub fn insert_film(&mut self, film_id: FilmId) {
        self.by_film.entry(film_id).or_default();
    }

    /// Record a mark, returning the mark it replaced.
    pub fn put(&mut self, film_id: FilmId, user_id: UserId, mark: Mark) -> Option<Mark> {
        self.by_user.entry(user_id).or_default().insert(film_id, mark);
        self.by_film.entry(film_id).or_default().insert(user_id, mark)
    }

    /// Remove a mark, returning it if it existed.
    pub fn remove(&mut self, film_id: FilmId, user_id: UserId) -> Option<Mark> {
        if let Some(marks) = self.by_user.get_mut(&user_id) {
            marks.remove(&film_id);
            if marks.is_empty() {
                self.by_user.remove(&user_id);
            }
        }
        self.by_film.get_mut(&film_id)?.remove(&user_id)
    }

    /// Every film `user_id` rated, in film id order.
    ///
    /// Returns `None` for a user with no marks.
    pub fn marks_by(&self, user_id: UserId) -> Option<&BTreeMap<FilmId, Mark>> {
        self.by_user.get(&user_id)
    }

    /// Number of distinct raters of a film (0 for unknown films).
    pub fn rating_count(&self, film_id: FilmId) -> usize {
        self.by_film.get(&film_id).map_or(0, HashMap::len)
    }

    /// Film ids in ascending order.
    pub fn film_ids(&self) -> impl Iterator<Item = FilmId> + '_ {
        self.by_film.keys().copied()
    }

    /// `(user, rated films)` pairs for every user with at least one mark.
    pub fn users(&self) -> impl Iterator<Item = (UserId, &BTreeMap<FilmId, Mark>)> + '_ {
        self.by_user.iter().map(|(&id, marks)| (id, marks))
    }

    /// Get counts for debugging: `(films, raters, marks)`
    pub fn counts(&self) -> (usize, usize, usize) {
        let marks = self.by_film.values().map(HashMap::len).sum();
        (self.by_film.len(), self.by_user.len(), marks)
    }
}
