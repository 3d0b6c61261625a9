//! Compressed sparse row storage for the movie x user rating matrix.
//!
//! Only non-zero cells are stored. Within a row, column indices are strictly
//! increasing, which lets two rows be multiplied with a single merge pass.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrMatrix {
    n_rows: usize,
    n_cols: usize,
    /// `indptr[r]..indptr[r + 1]` is the range of row `r` in `indices`/`values`
    indptr: Vec<usize>,
    indices: Vec<u32>,
    values: Vec<f32>,
}

/// Borrowed view of one matrix row
#[derive(Debug, Clone, Copy)]
pub struct SparseRow<'a> {
    pub indices: &'a [u32],
    pub values: &'a [f32],
}

impl CsrMatrix {
    /// Build a matrix from per-row `(column, value)` entries.
    ///
    /// Entries of each row must be sorted by column without duplicates and
    /// every column must be `< n_cols`. Zero values are dropped.
    pub fn from_rows<I, R>(n_cols: usize, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (u32, f32)>,
    {
        let mut indptr = vec![0];
        let mut indices = Vec::new();
        let mut values = Vec::new();

        for row in rows {
            let row_start = indices.len();
            for (col, value) in row {
                debug_assert!((col as usize) < n_cols, "column {} out of range", col);
                debug_assert!(
                    indices[row_start..].last().is_none_or(|&prev| prev < col),
                    "columns must be strictly increasing within a row"
                );
                if value != 0.0 {
                    indices.push(col);
                    values.push(value);
                }
            }
            indptr.push(indices.len());
        }

        Self {
            n_rows: indptr.len() - 1,
            n_cols,
            indptr,
            indices,
            values,
        }
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    pub fn rows(&self) -> usize {
        self.n_rows
    }

    pub fn cols(&self) -> usize {
        self.n_cols
    }

    /// Number of stored (non-zero) cells
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Fraction of cells that are stored
    pub fn density(&self) -> f64 {
        let cells = self.n_rows * self.n_cols;
        if cells == 0 {
            0.0
        } else {
            self.nnz() as f64 / cells as f64
        }
    }

    /// Row `r`, or `None` when out of bounds
    pub fn row(&self, r: usize) -> Option<SparseRow<'_>> {
        if r >= self.n_rows {
            return None;
        }
        let range = self.indptr[r]..self.indptr[r + 1];
        Some(SparseRow {
            indices: &self.indices[range.clone()],
            values: &self.values[range],
        })
    }

    /// Iterate over all rows in order
    pub fn iter_rows(&self) -> impl Iterator<Item = SparseRow<'_>> {
        self.indptr.windows(2).map(|w| SparseRow {
            indices: &self.indices[w[0]..w[1]],
            values: &self.values[w[0]..w[1]],
        })
    }

    /// Value at `(r, c)`, 0.0 where nothing is stored
    pub fn get(&self, r: usize, c: usize) -> f32 {
        self.row(r)
            .and_then(|row| {
                row.indices
                    .binary_search(&(c as u32))
                    .ok()
                    .map(|pos| row.values[pos])
            })
            .unwrap_or(0.0)
    }
}

impl SparseRow<'_> {
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn is_zero(&self) -> bool {
        self.values.is_empty()
    }

    /// Dot product of two rows, accumulated in f64
    pub fn dot(&self, other: &SparseRow<'_>) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f64;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[i] as f64 * other.values[j] as f64;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Euclidean norm
    pub fn norm(&self) -> f64 {
        self.values
            .iter()
            .map(|&v| v as f64 * v as f64)
            .sum::<f64>()
            .sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CsrMatrix {
        // [[1, 0, 2],
        //  [0, 0, 0],
        //  [0, 3, 4]]
        CsrMatrix::from_rows(
            3,
            vec![
                vec![(0, 1.0), (2, 2.0)],
                vec![],
                vec![(1, 3.0), (2, 4.0)],
            ],
        )
    }

    #[test]
    fn test_shape_and_nnz() {
        let m = sample();
        assert_eq!(m.shape(), (3, 3));
        assert_eq!(m.nnz(), 4);
        assert!((m.density() - 4.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_get_returns_zero_for_missing_cells() {
        let m = sample();
        assert_eq!(m.get(0, 2), 2.0);
        assert_eq!(m.get(0, 1), 0.0);
        assert_eq!(m.get(1, 0), 0.0);
        assert_eq!(m.get(7, 0), 0.0);
    }

    #[test]
    fn test_explicit_zeros_are_not_stored() {
        let m = CsrMatrix::from_rows(2, vec![vec![(0, 0.0), (1, 5.0)]]);
        assert_eq!(m.nnz(), 1);
        assert_eq!(m.get(0, 1), 5.0);
    }

    #[test]
    fn test_dot_and_norm() {
        let m = sample();
        let a = m.row(0).unwrap();
        let b = m.row(2).unwrap();
        let empty = m.row(1).unwrap();

        assert_eq!(a.dot(&b), 8.0);
        assert_eq!(a.dot(&empty), 0.0);
        assert!((b.norm() - 5.0).abs() < 1e-12);
        assert!(empty.is_zero());
        assert!(m.row(3).is_none());
    }

    #[test]
    fn test_iter_rows_matches_row() {
        let m = sample();
        let lens: Vec<usize> = m.iter_rows().map(|r| r.nnz()).collect();
        assert_eq!(lens, vec![2, 0, 2]);
    }
}
