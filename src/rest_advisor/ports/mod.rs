//! Port contract bridging the rest advisor domain to storage adapters.

mod repository;

pub use repository::{RestSuggestionRepository, RestSuggestionRepositoryError};
