//! The fitted model: everything a query needs, built and persisted as one unit.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use data_loader::{Catalog, Dataset, Rating, UserId};
use similarity::{build_rating_matrix, RowMap, SimilarityIndex};

use crate::config::BuildConfig;

/// Default file name for a saved model
pub const DEFAULT_MODEL_FILE: &str = "movie_recommender_v1.bin";

const MODEL_MAGIC: [u8; 8] = *b"REELKNN\0";
const MODEL_FORMAT_VERSION: u32 = 1;

/// Catalog, row map and fitted index (which owns the rating matrix).
///
/// Immutable once built. A rebuild produces a new `Model`; row indices from
/// an old model mean nothing in a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    config: BuildConfig,
    catalog: Catalog,
    row_map: RowMap,
    /// Column -> user id of the rating matrix
    users: Vec<UserId>,
    index: SimilarityIndex,
}

/// Summary numbers for display
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelStats {
    pub movies_in_matrix: usize,
    pub users_in_matrix: usize,
    pub stored_ratings: usize,
    pub density: f64,
    pub catalog_size: usize,
    pub config: BuildConfig,
}

impl Model {
    /// Build the rating matrix and fit the index.
    #[instrument(skip(ratings, catalog), fields(ratings = ratings.len(), catalog = catalog.len()))]
    pub fn build(
        ratings: &[Rating],
        catalog: Catalog,
        config: BuildConfig,
    ) -> similarity::Result<Self> {
        let built = build_rating_matrix(ratings, config.thresholds())?;
        let users = built.users;
        let index = SimilarityIndex::fit(built.matrix, config.max_neighbors)?;

        info!(
            "Built model: {} movies x {} users, catalog of {}",
            index.rows(),
            users.len(),
            catalog.len()
        );

        Ok(Self {
            config,
            catalog,
            row_map: built.row_map,
            users,
            index,
        })
    }

    /// Build from a loaded dataset, consuming it
    pub fn from_dataset(dataset: Dataset, config: BuildConfig) -> similarity::Result<Self> {
        Self::build(&dataset.ratings, dataset.catalog, config)
    }

    /// Load `ratings.csv` and `movies.csv` and build from them.
    ///
    /// Unreadable or malformed files surface as data errors.
    pub fn from_files(
        ratings_path: &Path,
        movies_path: &Path,
        config: BuildConfig,
    ) -> similarity::Result<Self> {
        let dataset = Dataset::load_from_files(ratings_path, movies_path)?;
        Self::from_dataset(dataset, config)
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn row_map(&self) -> &RowMap {
        &self.row_map
    }

    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    pub fn stats(&self) -> ModelStats {
        let matrix = self.index.matrix();
        ModelStats {
            movies_in_matrix: matrix.rows(),
            users_in_matrix: matrix.cols(),
            stored_ratings: matrix.nnz(),
            density: matrix.density(),
            catalog_size: self.catalog.len(),
            config: self.config,
        }
    }

    /// Save the model as a single bincode blob.
    ///
    /// The blob is written to a sibling temporary file and renamed over
    /// `path`, so readers never see a half-written model.
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp_path = temporary_sibling(path);
        {
            let file = File::create(&tmp_path)
                .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
            let mut writer = BufWriter::new(file);
            bincode::serialize_into(&mut writer, &(MODEL_MAGIC, MODEL_FORMAT_VERSION))
                .context("Failed to write model header")?;
            bincode::serialize_into(&mut writer, self).context("Failed to serialize model")?;
            writer.flush().context("Failed to flush model file")?;
        }
        fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to move model into place at {}", path.display()))?;

        info!("Saved model to {}", path.display());
        Ok(())
    }

    /// Load a model written by [`Model::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Model file not found: {}", path.display()))?;
        let mut reader = BufReader::new(file);

        let (magic, version): ([u8; 8], u32) = bincode::deserialize_from(&mut reader)
            .context("Failed to read model header")?;
        if magic != MODEL_MAGIC {
            bail!("{} is not a model file", path.display());
        }
        if version != MODEL_FORMAT_VERSION {
            bail!(
                "Unsupported model format version {} (expected {})",
                version,
                MODEL_FORMAT_VERSION
            );
        }

        let model: Model =
            bincode::deserialize_from(&mut reader).context("Failed to deserialize model")?;
        info!(
            "Loaded model from {} ({} movies in matrix)",
            path.display(),
            model.index.rows()
        );
        Ok(model)
    }
}

fn temporary_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| DEFAULT_MODEL_FILE.into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{DataLoadError, Movie};
    use similarity::{EngineError, ErrorKind};

    fn sample_model() -> Model {
        let ratings = vec![
            Rating::new(1, 10, 5.0),
            Rating::new(1, 20, 3.0),
            Rating::new(2, 10, 4.0),
            Rating::new(2, 20, 2.0),
            Rating::new(3, 10, 1.0),
        ];
        let catalog = Catalog::from_movies(vec![
            Movie::new(1, "One (1990)"),
            Movie::new(2, "Two (1991)"),
            Movie::new(3, "Three (1992)"),
        ])
        .unwrap();
        let config = BuildConfig::new().with_min_movie_votes(1).with_min_user_votes(1);
        Model::build(&ratings, catalog, config).unwrap()
    }

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("recommender-{}-{}.bin", name, std::process::id()))
    }

    #[test]
    fn test_build_reports_stats() {
        let stats = sample_model().stats();
        assert_eq!(stats.movies_in_matrix, 2);
        assert_eq!(stats.users_in_matrix, 2);
        assert_eq!(stats.stored_ratings, 4);
        assert_eq!(stats.catalog_size, 3);
        assert_eq!(stats.density, 1.0);
    }

    #[test]
    fn test_save_and_load() {
        let model = sample_model();
        let path = scratch_path("save-load");

        model.save(&path).unwrap();
        assert!(!temporary_sibling(&path).exists());

        let loaded = Model::load(&path).unwrap();
        assert_eq!(loaded, model);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_rejects_foreign_file() {
        let path = scratch_path("foreign");
        fs::write(&path, b"definitely not a model file").unwrap();

        let err = Model::load(&path).unwrap_err();
        assert!(err.to_string().contains("not a model file"));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_from_files_builds_and_reports_bad_input_as_data_error() {
        let dir = std::env::temp_dir().join(format!("recommender-files-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let ratings = dir.join("ratings.csv");
        let movies = dir.join("movies.csv");
        fs::write(&ratings, "userId,movieId,rating\n10,1,5\n20,1,3\n10,2,4\n20,2,2\n").unwrap();
        fs::write(&movies, "movieId,title,genres\n1,One (1990),Drama\n2,Two (1991),Comedy\n").unwrap();

        let config = BuildConfig::new().with_min_movie_votes(1).with_min_user_votes(1);
        let model = Model::from_files(&ratings, &movies, config).unwrap();
        assert_eq!(model.stats().movies_in_matrix, 2);

        fs::write(&ratings, "userId,movieId,rating\n10,1,inf\n").unwrap();
        let err = Model::from_files(&ratings, &movies, config).unwrap_err();
        assert!(matches!(err, EngineError::Load(DataLoadError::ParseError { line: 2, .. })));
        assert_eq!(err.kind(), ErrorKind::Data);

        let err = Model::from_files(&dir.join("missing.csv"), &movies, config).unwrap_err();
        assert!(matches!(err, EngineError::Load(DataLoadError::Io { .. })));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_file() {
        let err = Model::load(Path::new("/nonexistent/dir/model.bin")).unwrap_err();
        assert!(err.to_string().contains("Model file not found"));
    }
}
