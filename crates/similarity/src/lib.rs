//! # Similarity Crate
//!
//! The item-to-item collaborative filtering core: "movies rated like this one
//! by the same people".
//!
//! ## Components
//!
//! ### Rating Matrix Builder (`matrix`)
//! Pivots raw ratings into a movie x user sparse matrix, dropping movies and
//! users with too few votes, and records which row holds which movie.
//!
//! ### Similarity Index (`knn`)
//! Exact cosine nearest-neighbour search over the matrix rows, brute force.
//!
//! ### Catalog Resolver (`resolver`)
//! Free-text title lookup plus row <-> movie <-> title translation.
//!
//! ## Example Usage
//!
//! ```ignore
//! use similarity::{build_rating_matrix, resolver, SimilarityIndex, Thresholds};
//!
//! let built = build_rating_matrix(&dataset.ratings, Thresholds::default())?;
//! let (matrix, row_map) = built.into_parts();
//! let index = SimilarityIndex::fit(matrix, 20)?;
//!
//! let movie_id = resolver::find_candidate(&dataset.catalog, "toy story")?;
//! let row = resolver::row_for_item(&row_map, movie_id)?;
//! for hit in index.neighbors(row, 6)? {
//!     let id = resolver::item_for_row(&row_map, hit.row)?;
//!     println!("{} ({:.3})", resolver::title_for_item(&dataset.catalog, id), hit.distance);
//! }
//! ```
//!
//! Everything here is synchronous and read-only once built, so one fitted
//! index can serve any number of threads at once.

// Public modules
pub mod error;
pub mod sparse;
pub mod matrix;
pub mod knn;
pub mod resolver;

// Re-export commonly used types
pub use error::{EngineError, ErrorKind, Result};
pub use sparse::{CsrMatrix, SparseRow};
pub use matrix::{build_rating_matrix, RatingMatrix, RowMap, Thresholds, VoteCounts};
pub use knn::{cosine_distance, Neighbor, SimilarityIndex, DEFAULT_MAX_NEIGHBORS};
pub use resolver::UNKNOWN_TITLE;

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Catalog, Movie, Rating};

    #[test]
    fn test_build_fit_and_query() {
        let ratings = vec![
            Rating::new(1, 10, 5.0),
            Rating::new(1, 20, 4.0),
            Rating::new(2, 10, 1.0),
            Rating::new(2, 20, 5.0),
            Rating::new(3, 10, 5.0),
            Rating::new(3, 20, 4.5),
        ];
        let catalog = Catalog::from_movies(vec![
            Movie::new(1, "First"),
            Movie::new(2, "Second"),
            Movie::new(3, "Third"),
        ])
        .unwrap();

        let (matrix, row_map) = build_rating_matrix(&ratings, Thresholds::new(0, 0))
            .unwrap()
            .into_parts();
        let index = SimilarityIndex::fit(matrix, DEFAULT_MAX_NEIGHBORS).unwrap();

        let movie_id = resolver::find_candidate(&catalog, "first").unwrap();
        let row = resolver::row_for_item(&row_map, movie_id).unwrap();
        let hits = index.neighbors(row, 2).unwrap();

        let nearest = resolver::item_for_row(&row_map, hits[1].row).unwrap();
        assert_eq!(resolver::title_for_item(&catalog, nearest), "Third");
    }
}
