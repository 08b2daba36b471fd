mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from imgpheno for tests
pub use imgpheno::core::db::{GenusSummary, TaxaRepository, TaxonPhotoCount, TaxonomyDb};
