//! # Engine Crate
//!
//! Rating prediction and popularity ranking over a `RatingLedger` snapshot.
//!
//! ## Components
//!
//! ### Slope One
//! Weighted Slope One collaborative filtering:
//! - "People who rated X rated Y about this much higher or lower"
//! - Pairwise deviation matrix built in parallel, then updated per mark
//!
//! ### Popularity
//! Films ordered by distinct rater count, independent of mark values.
//!
//! ## Example Usage
//!
//! ```ignore
//! use engine::{build_rated_films, PopularityRanker, SlopeOne};
//! use catalog::RatingLedger;
//!
//! let model = SlopeOne::new(RatingLedger::from_films(&films));
//!
//! let rated = build_rated_films(model.ledger(), user_id);
//! let predictions = model.predictions(user_id);
//!
//! let popular = PopularityRanker::new().with_limit(10).rank(model.ledger());
//! ```

pub mod popularity;
pub mod rated;
pub mod slope_one;
pub mod types;

// Re-export commonly used types
pub use popularity::{Popularity, PopularityRanker};
pub use rated::{build_rated_films, RatedFilms};
pub use slope_one::{DeviationMatrix, SlopeOne};
pub use types::{CoRating, Prediction};
