//! Pipeline for filtering and ranking film predictions.
//!
//! This crate provides:
//! - Filter trait and implementations for prediction filtering
//! - FilterPipeline for composing filters
//! - RecommendationRanker, which filters, orders and truncates
//!
//! ## Architecture
//! The ranker processes engine output in stages:
//! 1. Filters remove unwanted predictions (already rated, weakly supported)
//! 2. Survivors are sorted by score, ties broken by film id
//! 3. The list is cut to the configured size
//!
//! ## Example Usage
//! ```ignore
//! use engine::{build_rated_films, SlopeOne};
//! use pipeline::RecommendationRanker;
//!
//! let rated = build_rated_films(model.ledger(), user_id);
//! let top = RecommendationRanker::new().rank(model.predictions(user_id), &rated);
//! ```

pub mod filter_pipeline;
pub mod filters;
pub mod ranker;
pub mod traits;

// Re-export main types
pub use filter_pipeline::FilterPipeline;
pub use ranker::{RecommendationRanker, DEFAULT_LIMIT};
pub use traits::Filter;
