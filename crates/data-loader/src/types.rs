//! Core domain types for the ratings and movie datasets.
//!
//! This module defines the fundamental data structures used throughout the system:
//! - Type aliases for domain clarity (UserId, MovieId)
//! - `Rating`, one row of `ratings.csv`
//! - `Movie`, one row of `movies.csv`
//! - `Catalog`, the ordered list of all known movies

use crate::error::{DataLoadError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================
// These make the domain clearer and prevent mixing up user IDs with movie IDs

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a movie
pub type MovieId = u32;

// =============================================================================
// Rating Type
// =============================================================================

/// Represents a single rating from a user for a movie
///
/// Ratings arrive as a multiset: nothing upstream guarantees one rating per
/// (movie, user) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub movie_id: MovieId,
    pub user_id: UserId,
    /// Rating value, always finite
    pub rating: f32,
}

impl Rating {
    pub fn new(movie_id: MovieId, user_id: UserId, rating: f32) -> Self {
        Self {
            movie_id,
            user_id,
            rating,
        }
    }
}

// =============================================================================
// Movie-related Types
// =============================================================================

/// Represents a movie in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    /// Year extracted from title (e.g., "Toy Story (1995)")
    pub year: Option<u16>,
    /// Raw genre labels, empty when the dataset lists none
    pub genres: Vec<String>,
}

impl Movie {
    /// Build a movie from an id and title, deriving the year from the title
    pub fn new(id: MovieId, title: impl Into<String>) -> Self {
        let title = title.into();
        let year = extract_year_from_title(&title);
        Self {
            id,
            title,
            year,
            genres: Vec::new(),
        }
    }

    pub fn with_genres(mut self, genres: Vec<String>) -> Self {
        self.genres = genres;
        self
    }
}

/// Extract year from movie title
///
/// Example: "Toy Story (1995)" -> Some(1995)
///          "Movie Title" -> None
pub(crate) fn extract_year_from_title(title: &str) -> Option<u16> {
    let trimmed = title.trim_end();
    let start = trimmed.rfind('(')?;
    let end = trimmed.rfind(')')?;
    if start < end && end == trimmed.len() - 1 {
        let year_str = &trimmed[start + 1..end];
        if year_str.len() == 4 {
            return year_str.parse::<u16>().ok();
        }
    }
    None
}

// =============================================================================
// Catalog - every known movie, in file order
// =============================================================================

/// The full list of known movies and titles.
///
/// Iteration order is the order movies were inserted (file order when loaded
/// from disk). Title lookups that pick "the first match" depend on it, so the
/// order is part of the catalog's contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    movies: Vec<Movie>,
    positions: HashMap<MovieId, usize>,
}

impl Catalog {
    /// Creates a new, empty Catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from movies in iteration order.
    ///
    /// Fails if two movies share an id.
    pub fn from_movies(movies: Vec<Movie>) -> Result<Self> {
        let mut catalog = Self {
            movies: Vec::with_capacity(movies.len()),
            positions: HashMap::with_capacity(movies.len()),
        };
        for movie in movies {
            catalog.insert(movie)?;
        }
        Ok(catalog)
    }

    /// Append a movie to the end of the catalog
    pub fn insert(&mut self, movie: Movie) -> Result<()> {
        if self.positions.contains_key(&movie.id) {
            return Err(DataLoadError::ValidationError(format!(
                "duplicate movieId {} in catalog",
                movie.id
            )));
        }
        self.positions.insert(movie.id, self.movies.len());
        self.movies.push(movie);
        Ok(())
    }

    /// Get a movie by ID
    pub fn get(&self, id: MovieId) -> Option<&Movie> {
        self.positions.get(&id).map(|&pos| &self.movies[pos])
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Movies in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &Movie> {
        self.movies.iter()
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}
