//! Filter implementations for the ranking pipeline.
//!
//! This module contains all the concrete filter implementations
//! that can be composed into a FilterPipeline.

pub mod already_rated;
pub mod minimum_support;

// Re-export for convenience
pub use already_rated::AlreadyRatedFilter;
pub use minimum_support::MinimumSupportFilter;
