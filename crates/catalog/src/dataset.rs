//! Dataset loading: parse a directory of `.dat` files and assemble hydrated
//! aggregates ready to seed the in-memory stores.
//!
//! Steps:
//! 1. Parse every file (in parallel with rayon)
//! 2. Attach director credits and marks to their films
//! 3. Apply friendships in both directions
//! 4. Validate that every reference points at a declared entity

use crate::error::{CatalogError, Result};
use crate::memory::{InMemoryFilmStorage, InMemoryUserStorage};
use crate::parser::{self, DirectorCredit, MarkRecord};
use crate::types::{Film, FilmId, User, UserId};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Users and films as read from disk, fully assembled.
#[derive(Debug, Default)]
pub struct Dataset {
    pub users: BTreeMap<UserId, User>,
    pub films: BTreeMap<FilmId, Film>,
}

impl Dataset {
    /// Load a dataset directory (see [`crate::parser`] for file formats).
    ///
    /// `directors.dat` is optional; every other file must exist.
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        info!("Loading dataset from {:?}", data_dir);

        let users_path = data_dir.join("users.dat");
        let films_path = data_dir.join("films.dat");
        let marks_path = data_dir.join("marks.dat");
        let friends_path = data_dir.join("friends.dat");
        let directors_path = data_dir.join("directors.dat");

        let ((users, films), (marks, (friendships, credits))) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_users(&users_path),
                    || parser::parse_films(&films_path),
                )
            },
            || {
                rayon::join(
                    || parser::parse_marks(&marks_path),
                    || {
                        rayon::join(
                            || parser::parse_friendships(&friends_path),
                            || {
                                if directors_path.exists() {
                                    parser::parse_director_credits(&directors_path)
                                } else {
                                    Ok(Vec::new())
                                }
                            },
                        )
                    },
                )
            },
        );

        let dataset = Self::assemble(users?, films?, marks?, friendships?, credits?)?;

        let (users, films, marks, friendships) = dataset.counts();
        info!(
            "Loaded {} users, {} films, {} marks, {} friendships",
            users, films, marks, friendships
        );
        Ok(dataset)
    }

    /// Combine parsed records into aggregates, validating every reference.
    pub fn assemble(
        users: Vec<User>,
        films: Vec<Film>,
        marks: Vec<MarkRecord>,
        friendships: Vec<(UserId, UserId)>,
        credits: Vec<DirectorCredit>,
    ) -> Result<Self> {
        let mut dataset = Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
            films: films.into_iter().map(|f| (f.id, f)).collect(),
        };

        for credit in credits {
            dataset
                .films
                .get_mut(&credit.film_id)
                .ok_or(CatalogError::MissingReference {
                    entity: "Film",
                    id: credit.film_id,
                })?
                .directors
                .insert(credit.director);
        }

        for record in marks {
            dataset.require_user(record.user_id)?;
            dataset
                .films
                .get_mut(&record.film_id)
                .ok_or(CatalogError::MissingReference {
                    entity: "Film",
                    id: record.film_id,
                })?
                .put_mark(record.user_id, record.mark);
        }

        for (a, b) in friendships {
            dataset.require_user(a)?;
            dataset.require_user(b)?;
            if a == b {
                continue;
            }
            if let Some(user) = dataset.users.get_mut(&a) {
                user.friend_ids.insert(b);
            }
            if let Some(user) = dataset.users.get_mut(&b) {
                user.friend_ids.insert(a);
            }
        }

        Ok(dataset)
    }

    fn require_user(&self, id: UserId) -> Result<()> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(CatalogError::MissingReference { entity: "User", id })
        }
    }

    /// `(users, films, marks, friendships)`
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        let marks = self.films.values().map(Film::rating_count).sum();
        let edges: usize = self.users.values().map(|u| u.friend_ids.len()).sum();
        (self.users.len(), self.films.len(), marks, edges / 2)
    }

    /// Hand the aggregates over to fresh in-memory stores.
    pub fn into_storages(self) -> (InMemoryUserStorage, InMemoryFilmStorage) {
        (
            InMemoryUserStorage::from_users(self.users.into_values()),
            InMemoryFilmStorage::from_films(self.films.into_values()),
        )
    }
}
