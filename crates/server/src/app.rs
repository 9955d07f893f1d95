//! The application facade: one object wiring every service to a shared pair
//! of storage collaborators.
//!
//! Account and film services share the recommendation service, so every
//! path that removes users, films or marks also keeps the model cache
//! consistent with storage.

use std::sync::Arc;

use catalog::{Dataset, Film, FilmId, FilmStorage, UserId, UserStorage};
use tracing::info;

use crate::accounts::AccountService;
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::films::FilmService;
use crate::friends::FriendGraph;
use crate::recommendations::{Recommendation, RecommendationService};

pub struct App {
    config: ServiceConfig,
    accounts: AccountService,
    friends: FriendGraph,
    films: FilmService,
    recommendations: Arc<RecommendationService>,
}

impl App {
    pub fn new(users: Arc<dyn UserStorage>, films: Arc<dyn FilmStorage>, config: ServiceConfig) -> Self {
        let recommendations = Arc::new(RecommendationService::new(
            Arc::clone(&users),
            Arc::clone(&films),
            &config,
        ));
        Self {
            accounts: AccountService::new(Arc::clone(&users), Arc::clone(&recommendations)),
            friends: FriendGraph::new(Arc::clone(&users)),
            films: FilmService::new(users, films, Arc::clone(&recommendations)),
            recommendations,
            config,
        }
    }

    /// Seed fresh in-memory stores from a loaded dataset.
    pub fn from_dataset(dataset: Dataset, config: ServiceConfig) -> Self {
        let (users, films, marks, friendships) = dataset.counts();
        info!(
            "Starting with {} users, {} films, {} marks, {} friendships",
            users, films, marks, friendships
        );
        let (users, films) = dataset.into_storages();
        Self::new(Arc::new(users), Arc::new(films), config)
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn accounts(&self) -> &AccountService {
        &self.accounts
    }

    pub fn friends(&self) -> &FriendGraph {
        &self.friends
    }

    pub fn films(&self) -> &FilmService {
        &self.films
    }

    pub fn recommendations(&self) -> &RecommendationService {
        &self.recommendations
    }

    pub async fn get_recommendations(&self, user_id: UserId) -> Result<Vec<Recommendation>> {
        self.recommendations.get_recommendations(user_id).await
    }

    /// Most rated films; `None` uses the configured default count.
    pub async fn get_most_popular(&self, count: Option<usize>) -> Result<Vec<Film>> {
        let count = count.unwrap_or(self.config.popular_count);
        self.recommendations.get_most_popular(count).await
    }

    /// Delete a user with their friendships and marks.
    pub async fn delete_user(&self, id: UserId) -> Result<()> {
        self.accounts.delete(id).await
    }

    pub async fn add_film(&self, film: Film) -> Result<Film> {
        self.films.add(film).await
    }

    pub async fn delete_film(&self, id: FilmId) -> Result<()> {
        self.films.delete(id).await
    }
}
