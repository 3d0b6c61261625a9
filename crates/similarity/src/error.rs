//! Error taxonomy shared by every engine component.
//!
//! Each variant belongs to one of four kinds (see [`ErrorKind`]). Callers that
//! sit outside the engine map the kind to whatever they show the user; the
//! variant carries the detail.

use data_loader::{DataLoadError, MovieId};
use thiserror::Error;

/// Coarse classification of an [`EngineError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or empty input data, or a matrix that cannot be fitted
    Data,
    /// Bad count, threshold or query text
    InvalidArgument,
    /// No catalog match, or the matched movie is absent from the matrix
    NotFound,
    /// Internal bounds violation
    Index,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No ratings to build a matrix from")]
    EmptyRatings,

    #[error("Filtered rating matrix is empty ({rows} movies x {cols} users)")]
    EmptyMatrix { rows: usize, cols: usize },

    #[error(transparent)]
    Load(#[from] DataLoadError),

    #[error("Invalid argument {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("Movie not found: no title matches '{query}'")]
    NoTitleMatch { query: String },

    #[error(
        "Movie {movie_id} found in catalog but not in filtered training data (it may have too few ratings)"
    )]
    NotInMatrix { movie_id: MovieId },

    #[error("Row {row} out of bounds for matrix with {rows} rows")]
    RowOutOfBounds { row: usize, rows: usize },
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::EmptyRatings
            | EngineError::EmptyMatrix { .. }
            | EngineError::Load(_) => ErrorKind::Data,
            EngineError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            EngineError::NoTitleMatch { .. } | EngineError::NotInMatrix { .. } => {
                ErrorKind::NotFound
            }
            EngineError::RowOutOfBounds { .. } => ErrorKind::Index,
        }
    }

    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        EngineError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_variants_are_distinct() {
        let no_match = EngineError::NoTitleMatch {
            query: "zzz".to_string(),
        };
        let filtered = EngineError::NotInMatrix { movie_id: 2 };

        assert_eq!(no_match.kind(), ErrorKind::NotFound);
        assert_eq!(filtered.kind(), ErrorKind::NotFound);
        assert_ne!(no_match.to_string(), filtered.to_string());
        assert!(filtered.to_string().contains("too few ratings"));
    }

    #[test]
    fn test_load_errors_are_data_errors() {
        let err: EngineError = DataLoadError::ValidationError("bad".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Data);
    }
}
