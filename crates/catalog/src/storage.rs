//! Storage collaborator contracts.
//!
//! These traits are the whole surface the service layer sees of persistence.
//! Implementations return fully assembled aggregates; callers never issue
//! their own sub-queries for genres, directors or marks.

use crate::error::Result;
use crate::types::{Film, FilmId, Mark, User, UserId};
use async_trait::async_trait;

/// Users and their directed friend edges.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// `UserNotFound` when the id is unknown
    async fn get_by_id(&self, id: UserId) -> Result<User>;

    /// Every user, ordered by id
    async fn get_all(&self) -> Vec<User>;

    /// `AlreadyExists` when the id is taken
    async fn save(&self, user: User) -> Result<User>;

    /// Replace profile fields. The stored friend set is kept.
    async fn update(&self, user: User) -> Result<User>;

    /// Remove a user together with every friend edge pointing at it.
    async fn delete(&self, id: UserId) -> Result<()>;

    /// Persist the directed edge `from → to`.
    async fn add_friend_edge(&self, from: UserId, to: UserId) -> Result<()>;

    /// Drop the directed edge `from → to` (absent edges are fine).
    async fn remove_friend_edge(&self, from: UserId, to: UserId) -> Result<()>;
}

/// Films and their rating maps.
#[async_trait]
pub trait FilmStorage: Send + Sync {
    /// `FilmNotFound` when the id is unknown
    async fn get_by_id(&self, id: FilmId) -> Result<Film>;

    /// Every film, ordered by id
    async fn get_all(&self) -> Vec<Film>;

    /// `AlreadyExists` when the id is taken
    async fn save(&self, film: Film) -> Result<Film>;

    /// Replace metadata. The stored rating map is kept.
    async fn update(&self, film: Film) -> Result<Film>;

    async fn delete(&self, id: FilmId) -> Result<()>;

    /// Set a user's mark on a film, returning the mark it replaced.
    async fn put_mark(&self, film_id: FilmId, user_id: UserId, mark: Mark) -> Result<Option<Mark>>;

    /// Remove a user's mark, returning it if there was one.
    async fn remove_mark(&self, film_id: FilmId, user_id: UserId) -> Result<Option<Mark>>;

    /// Remove every mark given by `user_id`; returns how many were dropped.
    async fn remove_marks_by(&self, user_id: UserId) -> Result<usize>;
}
