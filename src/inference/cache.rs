//! Process-wide, lazily loaded model handle
//!
//! The first caller that needs the model loads it; concurrent callers wait for
//! that single load instead of starting their own. A successful load is kept
//! for the lifetime of the cache. A failed load is not kept, so a later call
//! tries again.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use burn::tensor::backend::Backend;
use tokio::sync::OnceCell;
use tracing::{error, info};

use super::predictor::ModelHandle;
use crate::backend::DefaultBackend;
use crate::utils::error::ModelLoadError;

/// Loads a [`ModelHandle`] at most once and shares it read-only
pub struct ModelCache<B: Backend = DefaultBackend> {
    path: PathBuf,
    device: B::Device,
    cell: OnceCell<Arc<ModelHandle<B>>>,
}

impl ModelCache<DefaultBackend> {
    /// Cache for the artifact at `path` on the default device
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_device(path, crate::backend::default_device())
    }
}

impl<B: Backend> ModelCache<B> {
    /// Cache for the artifact at `path` on `device`
    pub fn with_device(path: impl Into<PathBuf>, device: B::Device) -> Self {
        Self {
            path: path.into(),
            device,
            cell: OnceCell::new(),
        }
    }

    /// Artifact path this cache loads from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The handle, if it has been loaded
    pub fn get(&self) -> Option<Arc<ModelHandle<B>>> {
        self.cell.get().cloned()
    }

    /// Whether the handle has been loaded
    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Return the cached handle, loading it first if needed
    ///
    /// Loading runs on the blocking thread pool.
    pub async fn get_or_load(&self) -> Result<Arc<ModelHandle<B>>, ModelLoadError> {
        let handle = self
            .cell
            .get_or_try_init(|| async {
                let path = self.path.clone();
                let device = self.device.clone();

                let loaded = tokio::task::spawn_blocking(move || ModelHandle::load(&path, &device))
                    .await
                    .map_err(|e| ModelLoadError::Interrupted(e.to_string()))?;

                match loaded {
                    Ok(handle) => {
                        info!("Model cached from {:?}", self.path);
                        Ok(Arc::new(handle))
                    }
                    Err(e) => {
                        error!("Model load failed: {}", e);
                        Err(e)
                    }
                }
            })
            .await?;

        Ok(Arc::clone(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::artifact::test_support::tiny_artifact;

    #[tokio::test]
    async fn test_missing_artifact_is_not_cached() {
        let cache = ModelCache::new("models/missing.json");

        let result = cache.get_or_load().await;
        assert!(matches!(result, Err(ModelLoadError::NotFound(_))));
        assert!(!cache.is_loaded());
        assert!(cache.get().is_none());
    }

    #[tokio::test]
    async fn test_handle_is_loaded_once_and_shared() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ModelCache::new(tiny_artifact(dir.path()));

        let (first, second) = tokio::join!(cache.get_or_load(), cache.get_or_load());
        let (first, second) = (first.unwrap(), second.unwrap());

        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.is_loaded());

        let third = cache.get_or_load().await.unwrap();
        assert!(Arc::ptr_eq(&first, &third));
    }

    #[tokio::test]
    async fn test_load_succeeds_after_artifact_appears() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ModelCache::new(dir.path().join("tomato.json"));

        assert!(cache.get_or_load().await.is_err());

        tiny_artifact(dir.path());
        assert!(cache.get_or_load().await.is_ok());
    }
}
