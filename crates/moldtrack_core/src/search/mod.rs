//! Client-side search over the denormalized catalog.
//!
//! # Responsibility
//! - Match free-text queries and field filters against catalog views.
//! - Debounce type-as-you-search input with replacement semantics.

pub mod debounce;
pub mod filter;

pub use debounce::Debouncer;
pub use filter::{filter_views, FieldFilter, FilterField, SearchQuery};
