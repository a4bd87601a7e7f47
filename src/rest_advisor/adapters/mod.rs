//! Concrete [`super::ports::RestSuggestionRepository`] implementations.

mod memory;
pub mod sqlite;

pub use memory::InMemoryRestSuggestionRepository;
