//! Lazy model loading.
//!
//! The model is loaded at most once and shared by every request. It can
//! be preloaded at startup or left to load on the first classification.

use super::{OnnxModel, SpectrogramModel};
use crate::error::ModelResult;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Function that turns a model path into a ready model.
pub type ModelLoader =
    Box<dyn Fn(&Path) -> ModelResult<Arc<dyn SpectrogramModel>> + Send + Sync>;

/// Owns the shared model instance.
pub struct ModelManager {
    path: PathBuf,
    loader: ModelLoader,
    model: RwLock<Option<Arc<dyn SpectrogramModel>>>,
    // Serializes loads so concurrent first requests load once
    load_lock: Mutex<()>,
}

impl ModelManager {
    /// Create a manager for an ONNX model file. Nothing is loaded yet.
    pub fn new(path: impl Into<PathBuf>, input_name: Option<String>) -> Self {
        Self::with_loader(
            path,
            Box::new(move |path| {
                let model = OnnxModel::load(path, input_name.clone())?;
                Ok(Arc::new(model) as Arc<dyn SpectrogramModel>)
            }),
        )
    }

    /// Create a manager with a custom loader.
    pub fn with_loader(path: impl Into<PathBuf>, loader: ModelLoader) -> Self {
        Self {
            path: path.into(),
            loader,
            model: RwLock::new(None),
            load_lock: Mutex::new(()),
        }
    }

    /// Path of the model file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the model if it is not cached yet and return it.
    pub fn load(&self) -> ModelResult<Arc<dyn SpectrogramModel>> {
        if let Some(model) = self.cached() {
            return Ok(model);
        }

        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Another caller may have finished loading while we waited
        if let Some(model) = self.cached() {
            return Ok(model);
        }

        tracing::debug!("Loading model from {}", self.path.display());
        let model = (self.loader)(&self.path).inspect_err(|e| {
            tracing::error!("Failed to load model: {}", e);
        })?;
        tracing::info!("Model loaded from {}", self.path.display());

        *self.model.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Get the cached model, loading it on first use.
    pub fn get(&self) -> ModelResult<Arc<dyn SpectrogramModel>> {
        self.load()
    }

    /// Whether the model is currently in memory.
    pub fn is_loaded(&self) -> bool {
        self.cached().is_some()
    }

    /// Drop the cached model. In-flight predictions keep their own handle.
    pub fn unload(&self) {
        *self.model.write().unwrap_or_else(PoisonError::into_inner) = None;
        tracing::debug!("Model unloaded");
    }

    fn cached(&self) -> Option<Arc<dyn SpectrogramModel>> {
        self.model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
