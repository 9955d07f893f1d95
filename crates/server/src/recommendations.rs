//! # Recommendation Service
//!
//! Coordinates the recommendation path:
//! 1. Check the user exists
//! 2. Fetch (or lazily build) the Slope One model
//! 3. Predict and rank on a blocking thread
//! 4. Hydrate the ranked film ids into full films
//!
//! ## Model cache
//! The model is built once from `FilmStorage::get_all` and then kept current
//! mark by mark. Readers clone an `Arc` and compute without holding any
//! lock. A mark change holds the write lock across the storage write and the
//! model update and goes through `Arc::make_mut`, so an in-flight request
//! keeps its old snapshot and no reader ever sees a half-applied mark.
//! Removing a user or a film goes through this service too: the storage
//! cascade runs under the same write lock and then drops the cache, which is
//! rebuilt on the next request. Every mutation that touches marks is
//! therefore ordered against every other one.

use std::sync::Arc;
use std::time::Instant;

use catalog::{Film, FilmId, FilmStorage, Mark, RatingLedger, UserId, UserStorage};
use engine::{build_rated_films, PopularityRanker, SlopeOne};
use pipeline::RecommendationRanker;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};

/// A recommended film with the mark the engine expects the user to give it.
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub film: Film,
    pub predicted_mark: f64,
    pub support: u32,
}

pub struct RecommendationService {
    users: Arc<dyn UserStorage>,
    films: Arc<dyn FilmStorage>,
    ranker: Arc<RecommendationRanker>,
    model: RwLock<Option<Arc<SlopeOne>>>,
}

impl RecommendationService {
    pub fn new(users: Arc<dyn UserStorage>, films: Arc<dyn FilmStorage>, config: &ServiceConfig) -> Self {
        let ranker = RecommendationRanker::new()
            .with_limit(config.recommendation_limit)
            .with_min_support(config.min_support);
        Self {
            users,
            films,
            ranker: Arc::new(ranker),
            model: RwLock::new(None),
        }
    }

    /// The current model, building it first if the cache is empty.
    pub async fn model(&self) -> Result<Arc<SlopeOne>> {
        if let Some(model) = self.model.read().await.as_ref() {
            return Ok(Arc::clone(model));
        }

        let mut slot = self.model.write().await;
        // Another request may have built it while we waited
        if let Some(model) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }

        let start_time = Instant::now();
        let films = self.films.get_all().await;
        let model = tokio::task::spawn_blocking(move || SlopeOne::new(RatingLedger::from_films(&films)))
            .await
            .map_err(|source| ServiceError::Task {
                task: "Model build",
                source,
            })?;

        let (films, raters, marks) = model.ledger().counts();
        info!(
            "Built Slope One model: {} films, {} raters, {} marks, {} pairs in {:.2?}",
            films,
            raters,
            marks,
            model.deviations().len(),
            start_time.elapsed()
        );

        let model = Arc::new(model);
        *slot = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Store a new film and make it visible to popularity ranking.
    #[instrument(skip(self, film), fields(film_id = film.id))]
    pub async fn add_film(&self, film: Film) -> Result<Film> {
        let mut slot = self.model.write().await;
        let film = self.films.save(film).await?;
        if let Some(model) = slot.as_mut() {
            Arc::make_mut(model).insert_film(film.id);
        }
        Ok(film)
    }

    /// Delete a film with its marks and drop the cached model.
    #[instrument(skip(self))]
    pub async fn remove_film(&self, film_id: FilmId) -> Result<()> {
        let mut slot = self.model.write().await;
        self.films.delete(film_id).await?;
        discard(&mut slot);
        Ok(())
    }

    /// Delete a user together with their friend edges and every mark they
    /// gave, then drop the cached model. Returns how many marks went.
    #[instrument(skip(self))]
    pub async fn purge_user(&self, user_id: UserId) -> Result<usize> {
        let mut slot = self.model.write().await;
        self.users.delete(user_id).await?;
        let removed = self.films.remove_marks_by(user_id).await;
        // Even a failed cascade may have removed marks
        discard(&mut slot);
        Ok(removed?)
    }

    /// Top recommendations for `user_id` (at most the configured limit).
    ///
    /// Fails only if the user is unknown. A user with no marks, or whose
    /// marks share no co-raters with anything, gets an empty list.
    #[instrument(skip(self))]
    pub async fn get_recommendations(&self, user_id: UserId) -> Result<Vec<Recommendation>> {
        let start_time = Instant::now();
        self.users.get_by_id(user_id).await?;

        let model = self.model().await?;
        let ranker = Arc::clone(&self.ranker);
        let ranked = tokio::task::spawn_blocking(move || {
            let rated = build_rated_films(model.ledger(), user_id);
            ranker.rank(model.predictions(user_id), &rated)
        })
        .await
        .map_err(|source| ServiceError::Task {
            task: "Ranking",
            source,
        })?;

        let mut recommendations = Vec::with_capacity(ranked.len());
        for prediction in ranked {
            if let Some(film) = self.load_film(prediction.film_id).await? {
                recommendations.push(Recommendation {
                    film,
                    predicted_mark: prediction.score,
                    support: prediction.support,
                });
            }
        }

        info!(
            "Selected {} recommendations for user {} in {:.2?}",
            recommendations.len(),
            user_id,
            start_time.elapsed()
        );
        Ok(recommendations)
    }

    /// The `count` films with the most distinct raters.
    #[instrument(skip(self))]
    pub async fn get_most_popular(&self, count: usize) -> Result<Vec<Film>> {
        let model = self.model().await?;
        let ranked = PopularityRanker::new().with_limit(count).rank(model.ledger());

        let mut films = Vec::with_capacity(ranked.len());
        for entry in ranked {
            if let Some(film) = self.load_film(entry.film_id).await? {
                films.push(film);
            }
        }
        Ok(films)
    }

    /// Record `user_id`'s mark for `film_id`, returning the mark it replaced.
    #[instrument(skip(self))]
    pub async fn rate(&self, film_id: FilmId, user_id: UserId, mark: i64) -> Result<Option<Mark>> {
        let mark = Mark::new(mark)?;

        // Looked up under the lock so a concurrent purge can't slip in between
        let mut slot = self.model.write().await;
        self.users.get_by_id(user_id).await?;
        let previous = self.films.put_mark(film_id, user_id, mark).await?;
        if let Some(model) = slot.as_mut() {
            Arc::make_mut(model).put_mark(film_id, user_id, mark);
        }

        debug!("User {} marked film {} as {}", user_id, film_id, mark.value());
        Ok(previous)
    }

    /// Remove `user_id`'s mark for `film_id`. Removing an absent mark is fine.
    #[instrument(skip(self))]
    pub async fn unrate(&self, film_id: FilmId, user_id: UserId) -> Result<Option<Mark>> {
        let mut slot = self.model.write().await;
        self.users.get_by_id(user_id).await?;
        let removed = self.films.remove_mark(film_id, user_id).await?;
        if removed.is_some()
            && let Some(model) = slot.as_mut()
        {
            Arc::make_mut(model).remove_mark(film_id, user_id);
        }
        Ok(removed)
    }

    /// A film the ranking referred to; `None` if it vanished meanwhile.
    async fn load_film(&self, film_id: FilmId) -> Result<Option<Film>> {
        match self.films.get_by_id(film_id).await {
            Ok(film) => Ok(Some(film)),
            Err(e) if e.is_not_found() => {
                warn!("Ranked film {} is no longer stored", film_id);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn discard(slot: &mut Option<Arc<SlopeOne>>) {
    if slot.take().is_some() {
        debug!("Slope One model invalidated");
    }
}
