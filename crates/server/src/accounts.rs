//! User accounts: registration, profile updates, lookup and removal.

use std::sync::Arc;

use catalog::{User, UserId, UserStorage};
use tracing::{info, instrument};

use crate::error::Result;
use crate::recommendations::RecommendationService;

pub struct AccountService {
    users: Arc<dyn UserStorage>,
    recommendations: Arc<RecommendationService>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStorage>, recommendations: Arc<RecommendationService>) -> Self {
        Self { users, recommendations }
    }

    /// Store a new user. A blank name falls back to the login and the
    /// friend set always starts empty.
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn register(&self, mut user: User) -> Result<User> {
        user.fill_blank_name();
        user.friend_ids.clear();

        let user = self.users.save(user).await?;
        info!("Registered user {} ({})", user.id, user.login);
        Ok(user)
    }

    /// Replace profile fields. Friends can only change through the friend graph.
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn update(&self, mut user: User) -> Result<User> {
        user.fill_blank_name();
        Ok(self.users.update(user).await?)
    }

    /// Remove a user with their friend edges and every mark they gave.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: UserId) -> Result<()> {
        let marks = self.recommendations.purge_user(id).await?;
        info!("Deleted user {} and {} of their marks", id, marks);
        Ok(())
    }

    pub async fn get(&self, id: UserId) -> Result<User> {
        Ok(self.users.get_by_id(id).await?)
    }

    /// Every user, ordered by id.
    pub async fn all(&self) -> Vec<User> {
        self.users.get_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use catalog::{CatalogError, Film, FilmStorage, InMemoryFilmStorage, InMemoryUserStorage, Mark};
    use chrono::NaiveDate;

    fn user(id: UserId, name: &str) -> User {
        User::new(
            id,
            format!("user{}@example.com", id),
            format!("login{}", id),
            name,
            NaiveDate::from_ymd_opt(1970, 4, 2).unwrap(),
        )
    }

    fn build_test_accounts() -> (AccountService, Arc<InMemoryUserStorage>, Arc<InMemoryFilmStorage>) {
        let users = Arc::new(InMemoryUserStorage::new());
        let films = Arc::new(InMemoryFilmStorage::from_films([Film::new(
            1,
            "Solaris",
            NaiveDate::from_ymd_opt(1972, 3, 20).unwrap(),
            167,
        )]));
        let recommendations = RecommendationService::new(users.clone(), films.clone(), &ServiceConfig::default());
        let service = AccountService::new(users.clone(), Arc::new(recommendations));
        (service, users, films)
    }

    #[tokio::test]
    async fn test_register_fills_blank_name() {
        let (accounts, _, _) = build_test_accounts();

        let mut stranger = user(1, "  ");
        stranger.friend_ids.insert(42);
        let saved = accounts.register(stranger).await.unwrap();

        assert_eq!(saved.name, "login1");
        assert!(saved.friend_ids.is_empty());
    }

    #[tokio::test]
    async fn test_register_duplicate() {
        let (accounts, _, _) = build_test_accounts();
        accounts.register(user(1, "Ann")).await.unwrap();

        let err = accounts.register(user(1, "Ann again")).await.unwrap_err();
        assert!(matches!(
            err,
            crate::ServiceError::Catalog(CatalogError::AlreadyExists { id: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_update_unknown_user() {
        let (accounts, _, _) = build_test_accounts();
        assert!(accounts.update(user(3, "Nobody")).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_cascades_marks_and_friends() {
        let (accounts, users, films) = build_test_accounts();
        accounts.register(user(1, "Ann")).await.unwrap();
        accounts.register(user(2, "Bob")).await.unwrap();
        users.add_friend_edge(1, 2).await.unwrap();
        users.add_friend_edge(2, 1).await.unwrap();
        films.put_mark(1, 1, Mark::new(8).unwrap()).await.unwrap();

        accounts.delete(1).await.unwrap();

        assert!(accounts.get(1).await.unwrap_err().is_not_found());
        assert!(accounts.get(2).await.unwrap().friend_ids.is_empty());
        assert_eq!(films.get_by_id(1).await.unwrap().rating_count(), 0);
        assert_eq!(accounts.all().await.len(), 1);
    }
}
