//! Loading both datasets from disk.

use crate::error::Result;
use crate::parser;
use crate::types::*;
use std::path::Path;
use tracing::info;

/// Ratings plus catalog, as read from disk and before any filtering
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub ratings: Vec<Rating>,
    pub catalog: Catalog,
}

impl Dataset {
    pub fn new(ratings: Vec<Rating>, catalog: Catalog) -> Self {
        Self { ratings, catalog }
    }

    /// Load ratings.csv and movies.csv
    ///
    /// Both files are parsed in parallel with `rayon::join`; the first
    /// error encountered is returned.
    pub fn load_from_files(ratings_path: &Path, movies_path: &Path) -> Result<Self> {
        info!(
            "Loading ratings from {:?} and movies from {:?}",
            ratings_path, movies_path
        );

        let (ratings, movies) = rayon::join(
            || parser::parse_ratings(ratings_path),
            || parser::parse_movies(movies_path),
        );
        let ratings = ratings?;
        let catalog = Catalog::from_movies(movies?)?;

        info!(
            "Loaded {} ratings and {} catalog entries",
            ratings.len(),
            catalog.len()
        );
        Ok(Self { ratings, catalog })
    }

    /// Get counts for debugging/validation
    pub fn counts(&self) -> (usize, usize) {
        (self.ratings.len(), self.catalog.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataLoadError;
    use std::fs;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("data-loader-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_from_files() {
        let dir = scratch_dir("load");
        let ratings = dir.join("ratings.csv");
        let movies = dir.join("movies.csv");
        fs::write(&ratings, "userId,movieId,rating,timestamp\n1,1,4.0,0\n2,1,5.0,0\n").unwrap();
        fs::write(&movies, "movieId,title,genres\n1,Alpha (1990),Drama\n2,Beta,Comedy\n").unwrap();

        let dataset = Dataset::load_from_files(&ratings, &movies).unwrap();
        assert_eq!(dataset.counts(), (2, 2));
        assert_eq!(dataset.catalog.get(1).unwrap().year, Some(1990));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = scratch_dir("missing");
        let result = Dataset::load_from_files(&dir.join("nope.csv"), &dir.join("nope2.csv"));
        assert!(matches!(result, Err(DataLoadError::Io { .. })));
        fs::remove_dir_all(&dir).ok();
    }
}
