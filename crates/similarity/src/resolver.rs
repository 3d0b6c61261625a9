//! Catalog Resolver
//!
//! Maps free text to a movie id and translates between movie ids, matrix
//! rows and titles.

use crate::error::{EngineError, Result};
use crate::matrix::RowMap;
use data_loader::{Catalog, Movie, MovieId};

/// Title returned for movie ids the catalog does not know
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Every catalog movie whose title contains `query`, case-insensitively, in
/// catalog order.
///
/// Both sides are compared after `str::to_lowercase`, not full Unicode case
/// folding. Context-dependent mappings therefore only match in the same
/// context: a word-final capital sigma lowercases to `ς`, so the query `σ`
/// does not find it.
pub fn matching_movies<'a>(catalog: &'a Catalog, query: &str) -> impl Iterator<Item = &'a Movie> {
    let needle = query.to_lowercase();
    catalog
        .iter()
        .filter(move |movie| movie.title.to_lowercase().contains(&needle))
}

/// First movie, in catalog order, whose title contains `query`.
///
/// No relevance ranking: "Alpha" resolves to whichever title containing
/// "alpha" comes first in the catalog.
pub fn find_candidate(catalog: &Catalog, query: &str) -> Result<MovieId> {
    matching_movies(catalog, query)
        .next()
        .map(|movie| movie.id)
        .ok_or_else(|| EngineError::NoTitleMatch {
            query: query.to_string(),
        })
}

/// Matrix row of a movie. Fails when the movie was filtered out of the matrix.
pub fn row_for_item(row_map: &RowMap, movie_id: MovieId) -> Result<usize> {
    row_map
        .row_of(movie_id)
        .ok_or(EngineError::NotInMatrix { movie_id })
}

/// Movie id stored at a matrix row
pub fn item_for_row(row_map: &RowMap, row: usize) -> Result<MovieId> {
    row_map.movie_at(row).ok_or(EngineError::RowOutOfBounds {
        row,
        rows: row_map.len(),
    })
}

/// Title of a movie, or [`UNKNOWN_TITLE`] when the catalog lacks it
pub fn title_for_item(catalog: &Catalog, movie_id: MovieId) -> &str {
    catalog
        .get(movie_id)
        .map(|movie| movie.title.as_str())
        .unwrap_or(UNKNOWN_TITLE)
}
