//! Atomically swappable "current model".
//!
//! Readers take a snapshot (`Arc<Model>`) and query it without holding any
//! lock, so a query in flight keeps using the model it started with. A rebuild
//! constructs the new model completely before swapping the pointer; readers
//! see either the old model or the new one, never a partial build.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{info, instrument};

use data_loader::Dataset;
use similarity::{EngineError, ErrorKind};

use crate::config::BuildConfig;
use crate::model::Model;
use crate::orchestrator::{MovieRecommendation, RecommendationService};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Model not loaded. Build one first or load a saved model file")]
    ModelNotLoaded,

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl ServiceError {
    /// Engine error kind, `None` when no model is loaded
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ServiceError::ModelNotLoaded => None,
            ServiceError::Engine(err) => Some(err.kind()),
        }
    }
}

/// Single-writer, multi-reader pointer to the published model
#[derive(Debug, Default)]
pub struct ModelHandle {
    current: RwLock<Option<Arc<Model>>>,
    /// Serialises writers (rebuild and publish) against each other
    rebuild_lock: Mutex<()>,
}

impl ModelHandle {
    /// A handle with nothing published yet
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(model: Model) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(model))),
            rebuild_lock: Mutex::new(()),
        }
    }

    /// The currently published model, if any
    pub fn snapshot(&self) -> Option<Arc<Model>> {
        self.current.read().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot().is_some()
    }

    /// Replace the published model, returning the previous one.
    ///
    /// Waits for any rebuild in progress, so that rebuild cannot overwrite
    /// this model afterwards with one built from older data.
    pub fn publish(&self, model: Model) -> Option<Arc<Model>> {
        let model = Arc::new(model);
        let _guard = self.rebuild_lock.lock();
        self.current.write().replace(model)
    }

    /// Build a model from `dataset` and publish it.
    ///
    /// The build runs without blocking readers. Concurrent rebuilds wait for
    /// each other. On failure the previously published model stays in place.
    #[instrument(skip(self, dataset), fields(ratings = dataset.ratings.len()))]
    pub fn rebuild(&self, dataset: Dataset, config: BuildConfig) -> Result<Arc<Model>, ServiceError> {
        let _guard = self.rebuild_lock.lock();

        let model = Arc::new(Model::from_dataset(dataset, config)?);
        *self.current.write() = Some(Arc::clone(&model));

        info!("Published rebuilt model ({} movies in matrix)", model.index().rows());
        Ok(model)
    }

    /// A service bound to the current snapshot
    pub fn service(&self) -> Result<RecommendationService, ServiceError> {
        self.snapshot()
            .map(RecommendationService::new)
            .ok_or(ServiceError::ModelNotLoaded)
    }

    /// Recommend against the current snapshot
    pub fn recommend(&self, query: &str, count: usize) -> Result<Vec<MovieRecommendation>, ServiceError> {
        Ok(self.service()?.recommend(query, count)?)
    }
}
