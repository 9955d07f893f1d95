//! Film catalog queries: lookup, director filmographies, search and the
//! films a user rated.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use catalog::{DirectorId, Film, FilmId, FilmStorage, UserId, UserStorage};
use engine::PopularityRanker;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::recommendations::RecommendationService;

/// Ordering for a director's filmography.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectorSort {
    /// Most rated first
    #[default]
    Likes,
    /// Oldest release first
    Year,
}

impl FromStr for DirectorSort {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "likes" => Ok(DirectorSort::Likes),
            "year" => Ok(DirectorSort::Year),
            other => Err(format!("Unknown sort '{}', expected likes or year", other)),
        }
    }
}

/// Which fields a search query is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchBy {
    Title,
    Director,
    #[default]
    Both,
}

impl SearchBy {
    fn title(self) -> bool {
        matches!(self, SearchBy::Title | SearchBy::Both)
    }

    fn director(self) -> bool {
        matches!(self, SearchBy::Director | SearchBy::Both)
    }
}

impl FromStr for SearchBy {
    type Err = String;

    /// Accepts `title`, `director`, or both as a comma separated list.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (mut title, mut director) = (false, false);
        for part in s.split(',').map(|p| p.trim().to_ascii_lowercase()) {
            match part.as_str() {
                "title" => title = true,
                "director" => director = true,
                "both" => (title, director) = (true, true),
                other => return Err(format!("Unknown search field '{}'", other)),
            }
        }
        match (title, director) {
            (true, true) => Ok(SearchBy::Both),
            (true, false) => Ok(SearchBy::Title),
            (false, true) => Ok(SearchBy::Director),
            (false, false) => Err("No search field given".to_string()),
        }
    }
}

impl fmt::Display for SearchBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchBy::Title => write!(f, "title"),
            SearchBy::Director => write!(f, "director"),
            SearchBy::Both => write!(f, "title,director"),
        }
    }
}

pub struct FilmService {
    users: Arc<dyn UserStorage>,
    films: Arc<dyn FilmStorage>,
    recommendations: Arc<RecommendationService>,
}

impl FilmService {
    pub fn new(
        users: Arc<dyn UserStorage>,
        films: Arc<dyn FilmStorage>,
        recommendations: Arc<RecommendationService>,
    ) -> Self {
        Self {
            users,
            films,
            recommendations,
        }
    }

    pub async fn get(&self, id: FilmId) -> Result<Film> {
        Ok(self.films.get_by_id(id).await?)
    }

    /// Every film, ordered by id.
    pub async fn all(&self) -> Vec<Film> {
        self.films.get_all().await
    }

    /// Store a new film. Any marks on the incoming value are discarded.
    pub async fn add(&self, mut film: Film) -> Result<Film> {
        film.ratings.clear();
        self.recommendations.add_film(film).await
    }

    /// Replace metadata; the stored marks are kept.
    pub async fn update(&self, film: Film) -> Result<Film> {
        Ok(self.films.update(film).await?)
    }

    /// Delete a film along with its marks.
    pub async fn delete(&self, id: FilmId) -> Result<()> {
        self.recommendations.remove_film(id).await
    }

    /// Films `user_id` has rated, ordered by id.
    #[instrument(skip(self))]
    pub async fn liked_by(&self, user_id: UserId) -> Result<Vec<Film>> {
        self.users.get_by_id(user_id).await?;
        let films: Vec<Film> = self
            .films
            .get_all()
            .await
            .into_iter()
            .filter(|film| film.mark_by(user_id).is_some())
            .collect();
        Ok(films)
    }

    /// A director's films. An unknown director simply has none.
    #[instrument(skip(self))]
    pub async fn by_director(&self, director_id: DirectorId, sort: DirectorSort) -> Vec<Film> {
        let mut films: Vec<Film> = self
            .films
            .get_all()
            .await
            .into_iter()
            .filter(|film| film.has_director(director_id))
            .collect();

        match sort {
            DirectorSort::Likes => PopularityRanker::order_films(&mut films),
            DirectorSort::Year => films.sort_by(|a, b| {
                a.release_date
                    .cmp(&b.release_date)
                    .then(a.id.cmp(&b.id))
            }),
        }
        debug!("Director {} has {} films", director_id, films.len());
        films
    }

    /// Case-insensitive substring search, most rated first.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, by: SearchBy) -> Vec<Film> {
        let needle = query.to_lowercase();
        let mut films: Vec<Film> = self
            .films
            .get_all()
            .await
            .into_iter()
            .filter(|film| {
                (by.title() && film.name.to_lowercase().contains(&needle))
                    || (by.director()
                        && film
                            .directors
                            .iter()
                            .any(|d| d.name.to_lowercase().contains(&needle)))
            })
            .collect();

        PopularityRanker::order_films(&mut films);
        debug!("Search '{}' by {} matched {} films", query, by, films.len());
        films
    }
}
