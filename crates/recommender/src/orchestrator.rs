//! # Recommendation Service
//!
//! Coordinates one query end to end:
//! 1. Validate the query text and requested count
//! 2. Resolve the text to a catalog movie (first title match)
//! 3. Find that movie's row in the rating matrix
//! 4. Ask the similarity index for `count + 1` neighbours (capped by the
//!    index capacity and the number of rows), since the closest one is the
//!    movie itself
//! 5. Drop the query row, attach ids and titles, stop at `count`

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument};

use data_loader::MovieId;
use similarity::{resolver, EngineError, Result};

use crate::model::Model;

/// Final recommendation returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieRecommendation {
    pub movie_id: MovieId,
    pub title: String,
    pub year: Option<u16>,
    pub genres: Vec<String>,
    /// Cosine distance from the queried movie, 0 = identical rating pattern
    pub distance: f32,
}

impl MovieRecommendation {
    /// `1 - distance`, clamped into `[0, 1]`
    pub fn similarity(&self) -> f32 {
        (1.0 - self.distance).clamp(0.0, 1.0)
    }
}

/// A catalog title match, flagged with whether it can be queried
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub movie_id: MovieId,
    pub title: String,
    pub in_matrix: bool,
}

/// Answers queries against one fitted model. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RecommendationService {
    model: Arc<Model>,
}

impl RecommendationService {
    pub fn new(model: Arc<Model>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Main entry point: movies most similar to the first title matching `query`
    ///
    /// # Returns
    /// At most `count` recommendations, by ascending distance, never
    /// including the queried movie.
    #[instrument(skip(self))]
    pub fn recommend(&self, query: &str, count: usize) -> Result<Vec<MovieRecommendation>> {
        let start_time = Instant::now();
        validate_query(query)?;
        if count == 0 {
            return Err(EngineError::InvalidArgument {
                name: "count",
                reason: "must be a positive integer".to_string(),
            });
        }

        let catalog = self.model.catalog();
        let row_map = self.model.row_map();
        let index = self.model.index();

        let movie_id = resolver::find_candidate(catalog, query)?;
        let query_row = resolver::row_for_item(row_map, movie_id)?;
        debug!("Resolved '{}' to movie {} at row {}", query, movie_id, query_row);

        let k = index
            .max_neighbors()
            .min(count.saturating_add(1))
            .min(index.rows());
        let neighbors = index.neighbors(query_row, k)?;

        let mut recommendations = Vec::with_capacity(count.min(neighbors.len()));
        for neighbor in neighbors {
            if neighbor.row == query_row {
                continue;
            }
            let id = resolver::item_for_row(row_map, neighbor.row)?;
            recommendations.push(self.describe(id, neighbor.distance));
            if recommendations.len() >= count {
                break;
            }
        }

        info!(
            "Recommended {} movies for '{}' (movie {}) in {:.2?}",
            recommendations.len(),
            query,
            movie_id,
            start_time.elapsed()
        );
        Ok(recommendations)
    }

    /// Catalog titles containing `query`, in catalog order, at most `limit`
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        validate_query(query)?;
        let row_map = self.model.row_map();
        Ok(resolver::matching_movies(self.model.catalog(), query)
            .take(limit)
            .map(|movie| SearchHit {
                movie_id: movie.id,
                title: movie.title.clone(),
                in_matrix: row_map.row_of(movie.id).is_some(),
            })
            .collect())
    }

    fn describe(&self, movie_id: MovieId, distance: f32) -> MovieRecommendation {
        let catalog = self.model.catalog();
        let movie = catalog.get(movie_id);
        MovieRecommendation {
            movie_id,
            title: resolver::title_for_item(catalog, movie_id).to_string(),
            year: movie.and_then(|m| m.year),
            genres: movie.map(|m| m.genres.clone()).unwrap_or_default(),
            distance,
        }
    }
}

fn validate_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(EngineError::InvalidArgument {
            name: "query",
            reason: "movie search text is required".to_string(),
        });
    }
    Ok(())
}
