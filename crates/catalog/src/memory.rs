//! In-memory storage backed by `tokio::sync::RwLock`-guarded maps.
//!
//! Every mutation happens under the write lock of the owning map, so a single
//! edge or mark change is atomic. Pairing two edge writes into a symmetric
//! friendship is the caller's job.

use crate::error::{CatalogError, Result};
use crate::storage::{FilmStorage, UserStorage};
use crate::types::{Film, FilmId, Mark, User, UserId};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
pub struct InMemoryUserStorage {
    users: RwLock<BTreeMap<UserId, User>>,
}

impl InMemoryUserStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store. Later duplicates replace earlier ones.
    pub fn from_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users.into_iter().map(|u| (u.id, u)).collect();
        Self {
            users: RwLock::new(users),
        }
    }
}

#[async_trait]
impl UserStorage for InMemoryUserStorage {
    async fn get_by_id(&self, id: UserId) -> Result<User> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(CatalogError::UserNotFound(id))
    }

    async fn get_all(&self) -> Vec<User> {
        self.users.read().await.values().cloned().collect()
    }

    async fn save(&self, user: User) -> Result<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(CatalogError::AlreadyExists {
                entity: "User",
                id: user.id,
            });
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, mut user: User) -> Result<User> {
        let mut users = self.users.write().await;
        let stored = users
            .get_mut(&user.id)
            .ok_or(CatalogError::UserNotFound(user.id))?;
        user.friend_ids = stored.friend_ids.clone();
        *stored = user.clone();
        Ok(user)
    }

    async fn delete(&self, id: UserId) -> Result<()> {
        let mut users = self.users.write().await;
        let removed = users.remove(&id).ok_or(CatalogError::UserNotFound(id))?;
        for friend_id in &removed.friend_ids {
            if let Some(friend) = users.get_mut(friend_id) {
                friend.friend_ids.remove(&id);
            }
        }
        // Edges from half-applied friendships are not listed on the removed side
        for user in users.values_mut() {
            user.friend_ids.remove(&id);
        }
        debug!("Deleted user {} ({} friend edges dropped)", id, removed.friend_ids.len());
        Ok(())
    }

    async fn add_friend_edge(&self, from: UserId, to: UserId) -> Result<()> {
        let mut users = self.users.write().await;
        if !users.contains_key(&to) {
            return Err(CatalogError::UserNotFound(to));
        }
        users
            .get_mut(&from)
            .ok_or(CatalogError::UserNotFound(from))?
            .friend_ids
            .insert(to);
        Ok(())
    }

    async fn remove_friend_edge(&self, from: UserId, to: UserId) -> Result<()> {
        let mut users = self.users.write().await;
        users
            .get_mut(&from)
            .ok_or(CatalogError::UserNotFound(from))?
            .friend_ids
            .remove(&to);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryFilmStorage {
    films: RwLock<BTreeMap<FilmId, Film>>,
}

impl InMemoryFilmStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_films(films: impl IntoIterator<Item = Film>) -> Self {
        let films = films.into_iter().map(|f| (f.id, f)).collect();
        Self {
            films: RwLock::new(films),
        }
    }
}

#[async_trait]
impl FilmStorage for InMemoryFilmStorage {
    async fn get_by_id(&self, id: FilmId) -> Result<Film> {
        self.films
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(CatalogError::FilmNotFound(id))
    }

    async fn get_all(&self) -> Vec<Film> {
        self.films.read().await.values().cloned().collect()
    }

    async fn save(&self, film: Film) -> Result<Film> {
        let mut films = self.films.write().await;
        if films.contains_key(&film.id) {
            return Err(CatalogError::AlreadyExists {
                entity: "Film",
                id: film.id,
            });
        }
        films.insert(film.id, film.clone());
        Ok(film)
    }

    async fn update(&self, mut film: Film) -> Result<Film> {
        let mut films = self.films.write().await;
        let stored = films
            .get_mut(&film.id)
            .ok_or(CatalogError::FilmNotFound(film.id))?;
        film.ratings = std::mem::take(&mut stored.ratings);
        *stored = film.clone();
        Ok(film)
    }

    async fn delete(&self, id: FilmId) -> Result<()> {
        self.films
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(CatalogError::FilmNotFound(id))
    }

    async fn put_mark(&self, film_id: FilmId, user_id: UserId, mark: Mark) -> Result<Option<Mark>> {
        let mut films = self.films.write().await;
        let film = films
            .get_mut(&film_id)
            .ok_or(CatalogError::FilmNotFound(film_id))?;
        Ok(film.put_mark(user_id, mark))
    }

    async fn remove_mark(&self, film_id: FilmId, user_id: UserId) -> Result<Option<Mark>> {
        let mut films = self.films.write().await;
        let film = films
            .get_mut(&film_id)
            .ok_or(CatalogError::FilmNotFound(film_id))?;
        Ok(film.remove_mark(user_id))
    }

    async fn remove_marks_by(&self, user_id: UserId) -> Result<usize> {
        let mut films = self.films.write().await;
        let removed = films
            .values_mut()
            .filter_map(|film| film.remove_mark(user_id))
            .count();
        Ok(removed)
    }
}
