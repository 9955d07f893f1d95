//! # Catalog Crate
//!
//! Data model and storage collaborators for the film rating service.
//!
//! ## Main Components
//!
//! - **types**: Domain types (User, Film, Mark, Genre, Director, Mpa)
//! - **ledger**: `RatingLedger`, the sparse film → {user → mark} snapshot
//! - **storage**: `UserStorage` / `FilmStorage` async contracts
//! - **memory**: In-memory implementations of both contracts
//! - **parser** / **dataset**: Load a `.dat` dataset directory
//! - **error**: Error types shared by all of the above
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{Dataset, RatingLedger, FilmStorage};
//! use std::path::Path;
//!
//! let dataset = Dataset::load_from_dir(Path::new("data/sample"))?;
//! let (users, films) = dataset.into_storages();
//!
//! let ledger = RatingLedger::from_films(&films.get_all().await);
//! println!("Film 1 has {} raters", ledger.rating_count(1));
//! ```

pub mod dataset;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod parser;
pub mod storage;
pub mod types;

// Re-export commonly used types for convenience
pub use dataset::Dataset;
pub use error::{CatalogError, Result};
pub use ledger::RatingLedger;
pub use memory::{InMemoryFilmStorage, InMemoryUserStorage};
pub use storage::{FilmStorage, UserStorage};
pub use types::{
    // Identifiers
    DirectorId,
    FilmId,
    GenreId,
    MpaId,
    UserId,
    // Core types
    Director,
    Film,
    Genre,
    Mark,
    Mpa,
    User,
};
