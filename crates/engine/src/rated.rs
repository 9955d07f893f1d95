//! The target user's rated-film context.
//!
//! Built once per request from the ledger snapshot and handed explicitly to
//! every engine and ranker call, so no request ever reads another request's
//! user.

use catalog::{FilmId, Mark, RatingLedger, UserId};
use std::collections::BTreeMap;

/// Everything the ranker needs to know about who is asking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RatedFilms {
    pub user_id: UserId,

    /// Films the user rated, with their marks, in film id order
    pub marks: BTreeMap<FilmId, Mark>,
}

impl RatedFilms {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            marks: BTreeMap::new(),
        }
    }

    pub fn contains(&self, film_id: FilmId) -> bool {
        self.marks.contains_key(&film_id)
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

/// Read `user_id`'s marks out of a ledger snapshot.
///
/// Unknown users and users without marks both get an empty context; the
/// caller decides whether an unknown user is an error.
pub fn build_rated_films(ledger: &RatingLedger, user_id: UserId) -> RatedFilms {
    RatedFilms {
        user_id,
        marks: ledger.marks_by(user_id).cloned().unwrap_or_default(),
    }
}
