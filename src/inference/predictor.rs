//! Classifier Gateway
//!
//! Rebuilds a classifier from a model artifact and runs single-image
//! predictions with it. A [`ModelHandle`] is built once and then only read:
//! predictions never change the weights, so repeated predictions on the same
//! image give the same label and confidence.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use burn::{
    module::Module,
    record::CompactRecorder,
    tensor::{backend::Backend, Tensor, TensorData},
};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::preprocess::{decode_image, image_to_chw};
use crate::backend::{default_device, DefaultBackend};
use crate::model::{LeafClassifier, ModelManifest};
use crate::utils::error::{InferenceError, ModelLoadError};

/// Number of alternatives reported with each prediction
pub const TOP_K: usize = 5;

/// A class and its probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    pub class_index: usize,
    pub label: String,
    pub probability: f32,
}

/// Result of a single prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Raw class label as stored in the manifest, e.g. `Tomato___Early_blight`
    pub label: String,

    /// Probability of the predicted class, in `[0, 1]`
    pub confidence: f32,

    /// Predicted class index
    pub class_index: usize,

    /// Highest-probability classes, best first
    pub top_k: Vec<ClassScore>,

    /// Inference time in milliseconds
    pub inference_time_ms: f64,
}

impl Prediction {
    /// Build a prediction from a probability distribution over `labels`
    pub fn from_probabilities(
        probabilities: &[f32],
        labels: &[String],
        inference_time: Duration,
    ) -> Result<Self, InferenceError> {
        if probabilities.is_empty() || probabilities.len() != labels.len() {
            return Err(InferenceError::Output(format!(
                "expected {} probabilities, got {}",
                labels.len(),
                probabilities.len()
            )));
        }

        let mut ranked: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
        // Stable sort: ties keep the lower class index first
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let top_k: Vec<ClassScore> = ranked
            .iter()
            .take(TOP_K)
            .map(|&(class_index, probability)| ClassScore {
                class_index,
                label: labels[class_index].clone(),
                probability,
            })
            .collect();

        let best = &top_k[0];
        Ok(Self {
            label: best.label.clone(),
            confidence: best.probability,
            class_index: best.class_index,
            top_k,
            inference_time_ms: inference_time.as_secs_f64() * 1000.0,
        })
    }
}

/// A loaded classifier, ready for prediction
///
/// The network sits behind a mutex because Burn modules are `Send` but not
/// `Sync` on every backend. The lock is held only for the forward pass, which
/// never mutates the module, so a lock poisoned by a panicking caller is
/// taken over as is.
pub struct ModelHandle<B: Backend = DefaultBackend> {
    model: Mutex<LeafClassifier<B>>,
    manifest: ModelManifest,
    source: PathBuf,
    device: B::Device,
}

impl ModelHandle<DefaultBackend> {
    /// Load an artifact on the default backend and device
    pub fn load_default(manifest_path: &Path) -> Result<Self, ModelLoadError> {
        Self::load(manifest_path, &default_device())
    }
}

impl<B: Backend> ModelHandle<B> {
    /// Load the artifact described by the manifest at `manifest_path`
    ///
    /// Fails with [`ModelLoadError`] if the manifest or weight record is
    /// missing, or if either cannot be reconstructed.
    pub fn load(manifest_path: &Path, device: &B::Device) -> Result<Self, ModelLoadError> {
        info!("Loading model from {:?}", manifest_path);
        let manifest = ModelManifest::load(manifest_path)?;

        let weights_path = manifest.weights_path(manifest_path);
        let record_file = weights_path.with_extension("mpk");
        if !record_file.is_file() {
            return Err(ModelLoadError::Weights(
                record_file,
                "file not found".to_string(),
            ));
        }

        let model = LeafClassifier::<B>::new(&manifest.network, device)
            .load_file(&weights_path, &CompactRecorder::new(), device)
            .map_err(|e| ModelLoadError::Weights(record_file.clone(), format!("{:?}", e)))?;

        info!(
            "Model ready: {} classes, {}x{} input",
            manifest.labels.len(),
            manifest.input_size,
            manifest.input_size
        );

        Ok(Self::from_parts(model, manifest, manifest_path, device))
    }

    /// Wrap an in-memory model. `manifest.labels` must match its classes.
    pub fn from_parts(
        model: LeafClassifier<B>,
        manifest: ModelManifest,
        source: &Path,
        device: &B::Device,
    ) -> Self {
        Self {
            model: Mutex::new(model),
            manifest,
            source: source.to_path_buf(),
            device: device.clone(),
        }
    }

    /// Class labels in output-index order
    pub fn labels(&self) -> &[String] {
        &self.manifest.labels
    }

    /// Manifest the handle was built from
    pub fn manifest(&self) -> &ModelManifest {
        &self.manifest
    }

    /// Path the handle was loaded from
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Predict the class of a decoded image
    pub fn predict(&self, image: &DynamicImage) -> Result<Prediction, InferenceError> {
        let size = self.manifest.input_size;
        let pixels = image_to_chw(image, size as u32)?;
        let input = Tensor::<B, 4>::from_data(
            TensorData::new(pixels, [1, 3, size, size]),
            &self.device,
        );

        let start = Instant::now();
        let output = {
            let model = self.model.lock().unwrap_or_else(PoisonError::into_inner);
            model.forward_softmax(input)
        };
        let probabilities: Vec<f32> = output
            .into_data()
            .to_vec()
            .map_err(|e| InferenceError::Output(format!("{:?}", e)))?;
        let elapsed = start.elapsed();

        let prediction = Prediction::from_probabilities(&probabilities, self.labels(), elapsed)?;
        debug!(
            "Predicted {} ({:.2}%) in {:.2} ms",
            prediction.label,
            prediction.confidence * 100.0,
            prediction.inference_time_ms
        );
        Ok(prediction)
    }

    /// Decode image bytes (JPEG/PNG) and predict
    pub fn predict_bytes(&self, bytes: &[u8]) -> Result<Prediction, InferenceError> {
        let image = decode_image(bytes)?;
        self.predict(&image)
    }
}

impl<B: Backend> std::fmt::Debug for ModelHandle<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("source", &self.source)
            .field("labels", &self.manifest.labels.len())
            .field("input_size", &self.manifest.input_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::artifact::test_support::{tiny_artifact, tomato_labels};
    use image::{Rgb, RgbImage};
    use std::sync::Arc;

    fn leaf_image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(40, 30, |x, y| {
            Rgb([(x * 6) as u8, 120, (y * 8) as u8])
        }))
    }

    #[test]
    fn test_from_probabilities_picks_argmax() {
        let labels = tomato_labels();
        let prediction = Prediction::from_probabilities(
            &[0.1, 0.6, 0.2, 0.1],
            &labels,
            Duration::from_millis(5),
        )
        .unwrap();

        assert_eq!(prediction.class_index, 1);
        assert_eq!(prediction.label, "Tomato___Early_blight");
        assert_eq!(prediction.confidence, 0.6);
        assert_eq!(prediction.top_k.len(), 4);
        assert_eq!(prediction.top_k[1].class_index, 2);
    }

    #[test]
    fn test_from_probabilities_rejects_length_mismatch() {
        let labels = tomato_labels();
        let result = Prediction::from_probabilities(&[1.0], &labels, Duration::ZERO);
        assert!(matches!(result, Err(InferenceError::Output(_))));
    }

    #[test]
    fn test_load_nonexistent_path() {
        let result = ModelHandle::load_default(Path::new("models/missing.json"));
        assert!(matches!(result, Err(ModelLoadError::NotFound(_))));
    }

    #[test]
    fn test_load_missing_weights() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = tiny_artifact(dir.path());
        std::fs::remove_file(dir.path().join("tomato.mpk")).unwrap();

        let result = ModelHandle::load_default(&manifest_path);
        assert!(matches!(result, Err(ModelLoadError::Weights(_, _))));
    }

    #[test]
    fn test_load_rejects_input_smaller_than_pooling() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = tiny_artifact(dir.path());
        let mut manifest = ModelManifest::load(&manifest_path).unwrap();
        // two blocks need at least 4x4 pixels
        manifest.input_size = 2;
        manifest.save(&manifest_path).unwrap();

        let result = ModelHandle::load_default(&manifest_path);
        assert!(matches!(result, Err(ModelLoadError::Geometry(_))));
    }

    #[test]
    fn test_predict_after_poisoned_lock() {
        let dir = tempfile::tempdir().unwrap();
        let handle = Arc::new(ModelHandle::load_default(&tiny_artifact(dir.path())).unwrap());
        let image = leaf_image();
        let before = handle.predict(&image).unwrap();

        let holder = Arc::clone(&handle);
        let crashed = std::thread::spawn(move || {
            let _model = holder.model.lock().unwrap();
            panic!("caller died while holding the model");
        })
        .join();
        assert!(crashed.is_err());
        assert!(handle.model.is_poisoned());

        let after = handle.predict(&image).unwrap();
        assert_eq!(after.label, before.label);
        assert_eq!(after.confidence, before.confidence);
    }

    #[test]
    fn test_load_and_predict() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = tiny_artifact(dir.path());

        let handle = ModelHandle::load_default(&manifest_path).unwrap();
        assert_eq!(handle.labels(), tomato_labels().as_slice());
        assert_eq!(handle.source(), manifest_path.as_path());

        let prediction = handle.predict(&leaf_image()).unwrap();
        assert!(handle.labels().contains(&prediction.label));
        assert!((0.0..=1.0).contains(&prediction.confidence));
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let handle = ModelHandle::load_default(&tiny_artifact(dir.path())).unwrap();
        let image = leaf_image();

        let first = handle.predict(&image).unwrap();
        let second = handle.predict(&image).unwrap();

        assert_eq!(first.label, second.label);
        assert_eq!(first.confidence, second.confidence);
    }

    #[test]
    fn test_predict_bytes_rejects_malformed_input() {
        let dir = tempfile::tempdir().unwrap();
        let handle = ModelHandle::load_default(&tiny_artifact(dir.path())).unwrap();

        let result = handle.predict_bytes(b"\x89PNG but truncated");
        assert!(matches!(result, Err(InferenceError::Decode(_))));
    }
}
