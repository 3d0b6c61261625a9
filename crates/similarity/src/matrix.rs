//! Rating Matrix Builder
//!
//! Turns raw `(movie, user, rating)` triples into a movie x user sparse matrix,
//! keeping only movies and users with enough votes.
//!
//! ## Algorithm
//! 1. Count ratings per movie and per user over the full, unfiltered input
//! 2. Keep movies with `votes > min_movie_votes` and users with `votes > min_user_votes`
//! 3. Lay retained movies out as rows (ascending id) and retained users as
//!    columns (ascending id); missing cells are 0.0
//! 4. Store the result as CSR and record the row -> movie mapping
//!
//! Both cutoffs are applied at once against the unfiltered counts. A movie
//! whose raters were all dropped by the user cutoff stays in the matrix as an
//! all-zero row; rows and columns are never re-filtered.

use crate::error::{EngineError, Result};
use crate::sparse::CsrMatrix;
use data_loader::{MovieId, Rating, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument};

/// Minimum vote counts. Both are exclusive: a movie needs strictly more than
/// `min_movie_votes` ratings to become a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub min_movie_votes: u32,
    pub min_user_votes: u32,
}

impl Thresholds {
    pub fn new(min_movie_votes: u32, min_user_votes: u32) -> Self {
        Self {
            min_movie_votes,
            min_user_votes,
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::new(10, 50)
    }
}

/// Bijection between matrix rows and movie ids, fixed for one build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowMap {
    movies: Vec<MovieId>,
    rows: HashMap<MovieId, usize>,
}

impl RowMap {
    fn from_movies(movies: Vec<MovieId>) -> Self {
        let rows = movies
            .iter()
            .enumerate()
            .map(|(row, &movie_id)| (movie_id, row))
            .collect();
        Self { movies, rows }
    }

    pub fn row_of(&self, movie_id: MovieId) -> Option<usize> {
        self.rows.get(&movie_id).copied()
    }

    pub fn movie_at(&self, row: usize) -> Option<MovieId> {
        self.movies.get(row).copied()
    }

    /// Movie ids in row order
    pub fn movies(&self) -> &[MovieId] {
        &self.movies
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

/// Vote counts over the unfiltered rating set
#[derive(Debug, Clone, Default)]
pub struct VoteCounts {
    pub per_movie: HashMap<MovieId, u32>,
    pub per_user: HashMap<UserId, u32>,
}

impl VoteCounts {
    pub fn from_ratings(ratings: &[Rating]) -> Self {
        let mut counts = Self::default();
        for rating in ratings {
            *counts.per_movie.entry(rating.movie_id).or_insert(0) += 1;
            *counts.per_user.entry(rating.user_id).or_insert(0) += 1;
        }
        counts
    }

    fn retained<K: Copy + Ord>(counts: &HashMap<K, u32>, min_votes: u32) -> Vec<K> {
        let mut kept: Vec<K> = counts
            .iter()
            .filter(|&(_, &votes)| votes > min_votes)
            .map(|(&key, _)| key)
            .collect();
        kept.sort_unstable();
        kept
    }
}

/// The filtered matrix together with its row and column labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingMatrix {
    pub matrix: CsrMatrix,
    pub row_map: RowMap,
    /// Column -> user id, ascending
    pub users: Vec<UserId>,
}

impl RatingMatrix {
    /// Split into the matrix and its row map
    pub fn into_parts(self) -> (CsrMatrix, RowMap) {
        (self.matrix, self.row_map)
    }
}

/// Build the filtered rating matrix.
///
/// Fails with a data error when `ratings` is empty or when filtering leaves
/// no rows or no columns. When the same (movie, user) pair is rated more than
/// once, every rating counts as a vote and the last one is kept as the cell
/// value.
#[instrument(skip(ratings), fields(ratings = ratings.len()))]
pub fn build_rating_matrix(ratings: &[Rating], thresholds: Thresholds) -> Result<RatingMatrix> {
    if ratings.is_empty() {
        return Err(EngineError::EmptyRatings);
    }

    let counts = VoteCounts::from_ratings(ratings);
    let movies = VoteCounts::retained(&counts.per_movie, thresholds.min_movie_votes);
    let users = VoteCounts::retained(&counts.per_user, thresholds.min_user_votes);

    info!(
        "Filtering {} movies / {} users down to {} / {} (thresholds > {} / > {})",
        counts.per_movie.len(),
        counts.per_user.len(),
        movies.len(),
        users.len(),
        thresholds.min_movie_votes,
        thresholds.min_user_votes
    );

    if movies.is_empty() || users.is_empty() {
        return Err(EngineError::EmptyMatrix {
            rows: movies.len(),
            cols: users.len(),
        });
    }

    let row_map = RowMap::from_movies(movies);
    let columns: HashMap<UserId, u32> = users
        .iter()
        .enumerate()
        .map(|(col, &user_id)| (user_id, col as u32))
        .collect();

    // One ordered map per row: sorts columns and lets later duplicates overwrite
    let mut rows: Vec<BTreeMap<u32, f32>> = vec![BTreeMap::new(); row_map.len()];
    for rating in ratings {
        if let (Some(row), Some(&col)) = (row_map.row_of(rating.movie_id), columns.get(&rating.user_id)) {
            rows[row].insert(col, rating.rating);
        }
    }

    let matrix = CsrMatrix::from_rows(users.len(), rows);
    debug!(
        "Built {}x{} matrix with {} stored ratings (density {:.5})",
        matrix.rows(),
        matrix.cols(),
        matrix.nnz(),
        matrix.density()
    );

    Ok(RatingMatrix {
        matrix,
        row_map,
        users,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn r(movie_id: MovieId, user_id: UserId, rating: f32) -> Rating {
        Rating::new(movie_id, user_id, rating)
    }

    #[test]
    fn test_thresholds_are_strict() {
        // Movie 1: 3 votes, movie 2: 2 votes. Users 10, 20: 2 votes, user 30: 1 vote.
        let ratings = vec![
            r(1, 10, 4.0),
            r(1, 20, 5.0),
            r(1, 30, 3.0),
            r(2, 10, 2.0),
            r(2, 20, 1.0),
        ];

        let built = build_rating_matrix(&ratings, Thresholds::new(2, 1)).unwrap();
        assert_eq!(built.row_map.movies(), &[1]);
        assert_eq!(built.users, vec![10, 20]);
        assert_eq!(built.matrix.shape(), (1, 2));
        assert_eq!(built.matrix.get(0, 0), 4.0);
        assert_eq!(built.matrix.get(0, 1), 5.0);
    }

    #[test]
    fn test_rows_and_columns_are_sorted_by_id() {
        let ratings = vec![r(30, 9, 1.0), r(10, 5, 2.0), r(20, 7, 3.0), r(10, 9, 4.0)];
        let built = build_rating_matrix(&ratings, Thresholds::new(0, 0)).unwrap();

        assert_eq!(built.row_map.movies(), &[10, 20, 30]);
        assert_eq!(built.users, vec![5, 7, 9]);
        assert_eq!(built.row_map.row_of(20), Some(1));
        assert_eq!(built.row_map.movie_at(2), Some(30));
        assert_eq!(built.matrix.get(0, 2), 4.0);
    }

    #[test]
    fn test_filtering_uses_unfiltered_counts() {
        // Movie 3 passes the movie cutoff on votes from user 99, who is then
        // removed by the user cutoff. Movie 3 stays as an all-zero row.
        let ratings = vec![
            r(1, 10, 4.0),
            r(1, 20, 4.0),
            r(3, 99, 5.0),
            r(3, 99, 5.0),
            r(4, 10, 3.0),
            r(4, 20, 3.0),
            r(5, 10, 1.0),
            r(5, 20, 1.0),
        ];

        let built = build_rating_matrix(&ratings, Thresholds::new(1, 2)).unwrap();
        assert_eq!(built.row_map.movies(), &[1, 3, 4, 5]);
        assert_eq!(built.users, vec![10, 20]);
        let row = built.row_map.row_of(3).unwrap();
        assert!(built.matrix.row(row).unwrap().is_zero());
    }

    #[test]
    fn test_duplicate_pair_keeps_last_rating_and_counts_every_vote() {
        let ratings = vec![r(1, 10, 1.0), r(1, 10, 5.0)];
        let built = build_rating_matrix(&ratings, Thresholds::new(1, 1)).unwrap();
        assert_eq!(built.matrix.get(0, 0), 5.0);
    }

    #[test]
    fn test_empty_ratings_is_data_error() {
        let err = build_rating_matrix(&[], Thresholds::default()).unwrap_err();
        assert!(matches!(err, EngineError::EmptyRatings));
        assert_eq!(err.kind(), ErrorKind::Data);
    }

    #[test]
    fn test_everything_filtered_is_data_error() {
        let ratings = vec![r(1, 10, 4.0)];
        let err = build_rating_matrix(&ratings, Thresholds::new(5, 0)).unwrap_err();
        assert!(matches!(err, EngineError::EmptyMatrix { rows: 0, cols: 1 }));

        let err = build_rating_matrix(&ratings, Thresholds::new(0, 5)).unwrap_err();
        assert!(matches!(err, EngineError::EmptyMatrix { rows: 1, cols: 0 }));
    }

    #[test]
    fn test_every_row_and_column_passes_its_threshold() {
        let mut ratings = Vec::new();
        for movie in 1..=30u32 {
            for user in 1..=(movie % 7 + 1) * 3 {
                ratings.push(r(movie, user * (movie % 3 + 1), (user % 5) as f32 + 0.5));
            }
        }
        let thresholds = Thresholds::new(6, 4);
        let counts = VoteCounts::from_ratings(&ratings);
        let built = build_rating_matrix(&ratings, thresholds).unwrap();

        for &movie in built.row_map.movies() {
            assert!(counts.per_movie[&movie] > thresholds.min_movie_votes);
        }
        for user in &built.users {
            assert!(counts.per_user[user] > thresholds.min_user_votes);
        }
    }

    #[test]
    fn test_into_parts() {
        let ratings = vec![r(1, 10, 4.0), r(2, 10, 3.0)];
        let (matrix, row_map) = build_rating_matrix(&ratings, Thresholds::new(0, 0))
            .unwrap()
            .into_parts();
        assert_eq!(matrix.rows(), row_map.len());
    }
}
