//! Similarity Index - exact cosine k-nearest-neighbour search
//!
//! Every query compares the query row against every row of the matrix
//! (brute force). There is no precomputed structure beyond the matrix itself,
//! so fitting is just taking ownership of it.
//!
//! Cosine distance is `1 - dot(a, b) / (|a| * |b|)`. When either row is all
//! zeros the similarity is defined as 0, i.e. distance 1.

use crate::error::{EngineError, Result};
use crate::sparse::{CsrMatrix, SparseRow};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, instrument};

/// Neighbour capacity used when none is configured
pub const DEFAULT_MAX_NEIGHBORS: usize = 20;

/// One search hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub row: usize,
    pub distance: f32,
}

impl Neighbor {
    /// Ascending distance, ties broken by smaller row index
    fn rank_cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.row.cmp(&other.row))
    }
}

/// Cosine distance between two sparse rows
pub fn cosine_distance(a: &SparseRow<'_>, b: &SparseRow<'_>) -> f32 {
    cosine_distance_with_norms(a, a.norm(), b, b.norm())
}

fn cosine_distance_with_norms(a: &SparseRow<'_>, a_norm: f64, b: &SparseRow<'_>, b_norm: f64) -> f32 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 1.0;
    }
    let similarity = a.dot(b) / (a_norm * b_norm);
    // Rounding can push identical vectors slightly past 1
    (1.0 - similarity).clamp(0.0, 2.0) as f32
}

/// Brute-force cosine index over the rows of a rating matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityIndex {
    matrix: CsrMatrix,
    max_neighbors: usize,
}

impl SimilarityIndex {
    /// Fit the index on a matrix.
    ///
    /// `max_neighbors` is the default neighbour capacity callers are expected
    /// to honour; it does not limit `neighbors` itself.
    pub fn fit(matrix: CsrMatrix, max_neighbors: usize) -> Result<Self> {
        if matrix.rows() == 0 {
            return Err(EngineError::EmptyMatrix {
                rows: 0,
                cols: matrix.cols(),
            });
        }
        if max_neighbors == 0 {
            return Err(EngineError::invalid("max_neighbors", "must be at least 1"));
        }
        debug!(
            "Fitted cosine index on {}x{} matrix (max_neighbors = {})",
            matrix.rows(),
            matrix.cols(),
            max_neighbors
        );
        Ok(Self {
            matrix,
            max_neighbors,
        })
    }

    pub fn matrix(&self) -> &CsrMatrix {
        &self.matrix
    }

    pub fn max_neighbors(&self) -> usize {
        self.max_neighbors
    }

    pub fn rows(&self) -> usize {
        self.matrix.rows()
    }

    /// The `k` rows closest to `row`, query row included.
    ///
    /// Results are sorted by ascending distance, ties by smaller row index.
    /// The query row is always at distance 0 from itself and always part of
    /// the result: it comes first unless other rows tie at 0 with a smaller
    /// index, and when more than `k - 1` such rows exist it takes the slot of
    /// the last of them.
    #[instrument(skip(self))]
    pub fn neighbors(&self, row: usize, k: usize) -> Result<Vec<Neighbor>> {
        let rows = self.matrix.rows();
        let query = self
            .matrix
            .row(row)
            .ok_or(EngineError::RowOutOfBounds { row, rows })?;
        if k == 0 || k > rows {
            return Err(EngineError::invalid(
                "k",
                format!("must be between 1 and {}, got {}", rows, k),
            ));
        }

        let query_norm = query.norm();
        let mut hits: Vec<Neighbor> = (0..rows)
            .into_par_iter()
            .filter_map(|other| {
                let candidate = self.matrix.row(other)?;
                let distance = if other == row {
                    0.0
                } else {
                    cosine_distance_with_norms(&query, query_norm, &candidate, candidate.norm())
                };
                Some(Neighbor {
                    row: other,
                    distance,
                })
            })
            .collect();

        if k < hits.len() {
            hits.select_nth_unstable_by(k - 1, Neighbor::rank_cmp);
            hits.truncate(k);
        }
        hits.sort_unstable_by(Neighbor::rank_cmp);

        if !hits.iter().any(|hit| hit.row == row) {
            if let Some(last) = hits.last_mut() {
                *last = Neighbor { row, distance: 0.0 };
            }
            hits.sort_unstable_by(Neighbor::rank_cmp);
        }

        debug!("Found {} neighbours for row {}", hits.len(), row);
        Ok(hits)
    }
}
