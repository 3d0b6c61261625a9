//! # Data Loader Crate
//!
//! This crate reads the two tabular inputs of the recommender: a ratings
//! table and a movie catalog, both in the MovieLens "latest" CSV layout.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Rating, Movie, Catalog)
//! - **parser**: Parse CSV files into Rust structs, columns located by name
//! - **dataset**: Load both files together
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::Dataset;
//! use std::path::Path;
//!
//! let dataset = Dataset::load_from_files(
//!     Path::new("data/ml-latest-small/ratings.csv"),
//!     Path::new("data/ml-latest-small/movies.csv"),
//! )?;
//!
//! let toy_story = dataset.catalog.get(1).unwrap();
//! println!("{} ratings, first movie: {}", dataset.ratings.len(), toy_story.title);
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod dataset;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use types::{
    // Type aliases
    UserId,
    MovieId,
    // Core types
    Rating,
    Movie,
    Catalog,
};
pub use dataset::Dataset;
