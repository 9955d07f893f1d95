//! Service layer for the film rating and recommendation service.
//!
//! This crate wires the storage collaborators, the Slope One engine and the
//! ranking pipeline into the operations a request handler calls:
//! - **friends**: symmetric friend graph with partial-failure reporting
//! - **recommendations**: cached Slope One model, top-N and most-popular
//! - **accounts** / **films**: user lifecycle and catalog queries
//! - **app**: the facade tying them together

pub mod accounts;
pub mod app;
pub mod config;
pub mod error;
pub mod films;
pub mod friends;
pub mod recommendations;

pub use accounts::AccountService;
pub use app::App;
pub use config::ServiceConfig;
pub use error::{FriendOp, Result, ServiceError};
pub use films::{DirectorSort, FilmService, SearchBy};
pub use friends::FriendGraph;
pub use recommendations::{Recommendation, RecommendationService};
