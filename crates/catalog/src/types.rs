//! Core domain types for the film catalog and the social graph.
//!
//! A [`Film`] is always handled as a fully hydrated aggregate: genres,
//! directors, the MPA classification and the complete rating map travel with
//! it. A [`User`] carries its own set of friend identifiers; the relation is
//! symmetric and only the friend graph service mutates it.

use crate::error::{CatalogError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::{Hash, Hasher};

// =============================================================================
// Identifiers
// =============================================================================

/// Unique identifier for a user
pub type UserId = u64;

/// Unique identifier for a film
pub type FilmId = u64;

/// Identifier of a genre reference
pub type GenreId = u64;

/// Identifier of a director reference
pub type DirectorId = u64;

/// Identifier of an MPA rating classification
pub type MpaId = u64;

// =============================================================================
// Mark
// =============================================================================

/// A bounded integer rating a user assigns to a film.
///
/// The only way to obtain a `Mark` is through [`Mark::new`] (or the matching
/// `TryFrom`), so every mark in the system lies in `MIN..=MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Mark(u8);

impl Mark {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: i64) -> Result<Self> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(CatalogError::InvalidMark(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Mark {
    type Error = CatalogError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Mark> for u8 {
    fn from(mark: Mark) -> Self {
        mark.0
    }
}

impl From<Mark> for i64 {
    fn from(mark: Mark) -> Self {
        mark.0 as i64
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub login: String,
    /// Display name; falls back to the login when registered blank
    pub name: String,
    pub birthday: NaiveDate,
    /// Symmetric friend relation, owned by the friend graph service
    #[serde(default)]
    pub friend_ids: HashSet<UserId>,
}

impl User {
    /// Create a user with no friends yet.
    ///
    /// A blank `name` is replaced by the login.
    pub fn new(
        id: UserId,
        email: impl Into<String>,
        login: impl Into<String>,
        name: impl Into<String>,
        birthday: NaiveDate,
    ) -> Self {
        let mut user = Self {
            id,
            email: email.into(),
            login: login.into(),
            name: name.into(),
            birthday,
            friend_ids: HashSet::new(),
        };
        user.fill_blank_name();
        user
    }

    /// Replace a blank display name with the login.
    pub fn fill_blank_name(&mut self) {
        if self.name.trim().is_empty() {
            self.name = self.login.clone();
        }
    }

    pub fn is_friend_with(&self, other: UserId) -> bool {
        self.friend_ids.contains(&other)
    }
}

// =============================================================================
// Reference data
// =============================================================================

/// Genre reference. Equality and ordering use the identifier only, so a
/// film's genre set is unique by id and iterates in id order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

/// Director reference, identified by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Director {
    pub id: DirectorId,
    pub name: String,
}

/// MPA rating classification (G, PG, PG-13, R, NC-17).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mpa {
    pub id: MpaId,
    pub name: String,
}

macro_rules! identified_by_id {
    ($($ty:ty),*) => {$(
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.id == other.id
            }
        }

        impl Eq for $ty {}

        impl Hash for $ty {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }

        impl PartialOrd for $ty {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $ty {
            fn cmp(&self, other: &Self) -> Ordering {
                self.id.cmp(&other.id)
            }
        }
    )*};
}

identified_by_id!(Genre, Director);

// =============================================================================
// Film
// =============================================================================

/// A film with its full rating map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Film {
    pub id: FilmId,
    pub name: String,
    pub description: String,
    pub release_date: NaiveDate,
    /// Duration in minutes
    pub duration: u32,
    #[serde(default)]
    pub genres: BTreeSet<Genre>,
    #[serde(default)]
    pub directors: BTreeSet<Director>,
    pub mpa: Option<Mpa>,
    /// At most one mark per user; re-rating overwrites
    #[serde(default)]
    pub ratings: HashMap<UserId, Mark>,
}

impl Film {
    pub fn new(id: FilmId, name: impl Into<String>, release_date: NaiveDate, duration: u32) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            release_date,
            duration,
            genres: BTreeSet::new(),
            directors: BTreeSet::new(),
            mpa: None,
            ratings: HashMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_genre(mut self, id: GenreId, name: impl Into<String>) -> Self {
        self.genres.insert(Genre { id, name: name.into() });
        self
    }

    pub fn with_director(mut self, id: DirectorId, name: impl Into<String>) -> Self {
        self.directors.insert(Director { id, name: name.into() });
        self
    }

    pub fn with_mpa(mut self, id: MpaId, name: impl Into<String>) -> Self {
        self.mpa = Some(Mpa { id, name: name.into() });
        self
    }

    /// Number of distinct raters. Derived from the rating map, never stored.
    pub fn rating_count(&self) -> usize {
        self.ratings.len()
    }

    pub fn average_mark(&self) -> Option<f64> {
        if self.ratings.is_empty() {
            return None;
        }
        let total: u32 = self.ratings.values().map(|m| m.value() as u32).sum();
        Some(total as f64 / self.ratings.len() as f64)
    }

    pub fn mark_by(&self, user_id: UserId) -> Option<Mark> {
        self.ratings.get(&user_id).copied()
    }

    /// Set `user_id`'s mark, returning the one it replaced.
    pub fn put_mark(&mut self, user_id: UserId, mark: Mark) -> Option<Mark> {
        self.ratings.insert(user_id, mark)
    }

    pub fn remove_mark(&mut self, user_id: UserId) -> Option<Mark> {
        self.ratings.remove(&user_id)
    }

    pub fn release_year(&self) -> i32 {
        self.release_date.year()
    }

    pub fn has_director(&self, director_id: DirectorId) -> bool {
        self.directors.iter().any(|d| d.id == director_id)
    }
}
