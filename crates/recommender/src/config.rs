//! Build-time configuration for a model.

use serde::{Deserialize, Serialize};
use similarity::{DEFAULT_MAX_NEIGHBORS, Thresholds};

/// Settings used to build a [`crate::Model`]. Stored inside the model file so a
/// loaded model reports how it was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// A movie needs strictly more ratings than this to be recommendable
    pub min_movie_votes: u32,
    /// A user needs strictly more ratings than this to count as a column
    pub min_user_votes: u32,
    /// Neighbour capacity of the fitted index
    pub max_neighbors: usize,
}

impl BuildConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the movie vote cutoff (default: 10)
    pub fn with_min_movie_votes(mut self, votes: u32) -> Self {
        self.min_movie_votes = votes;
        self
    }

    /// Configure the user vote cutoff (default: 50)
    pub fn with_min_user_votes(mut self, votes: u32) -> Self {
        self.min_user_votes = votes;
        self
    }

    /// Configure the neighbour capacity (default: 20)
    pub fn with_max_neighbors(mut self, max_neighbors: usize) -> Self {
        self.max_neighbors = max_neighbors;
        self
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds::new(self.min_movie_votes, self.min_user_votes)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        let thresholds = Thresholds::default();
        Self {
            min_movie_votes: thresholds.min_movie_votes,
            min_user_votes: thresholds.min_user_votes,
            max_neighbors: DEFAULT_MAX_NEIGHBORS,
        }
    }
}
