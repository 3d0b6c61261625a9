//! Recommender crate for the reel-knn engine.
//!
//! Ties the similarity core to a servable unit:
//! - `Model`: catalog + row map + fitted index, built and persisted together
//! - `RecommendationService`: the per-query flow (title -> row -> neighbours)
//! - `ModelHandle`: the swappable "current model" shared by all queries
//! - `BuildConfig`: thresholds and neighbour capacity

pub mod config;
pub mod handle;
pub mod model;
pub mod orchestrator;

pub use config::BuildConfig;
pub use handle::{ModelHandle, ServiceError};
pub use model::{Model, ModelStats, DEFAULT_MODEL_FILE};
pub use orchestrator::{MovieRecommendation, RecommendationService, SearchHit};
