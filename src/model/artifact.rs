//! Writing Model Artifacts
//!
//! Saves a network's weights with Burn's `CompactRecorder` and writes the
//! manifest next to them. Loading lives in the classifier gateway
//! ([`crate::inference::predictor::ModelHandle::load`]).

use std::path::{Path, PathBuf};

use burn::{module::Module, record::CompactRecorder, tensor::backend::Backend};
use tracing::info;

use super::cnn::{LeafClassifier, LeafClassifierConfig};
use super::config::{ModelManifest, Provenance};
use crate::backend::{default_device, DefaultBackend};
use crate::utils::error::{LeafCureError, Result};

/// Save `model` and `manifest` so that `manifest_path` can be loaded back
///
/// The weight record is written to the manifest's `weights` path, resolved
/// against the manifest directory.
pub fn save_artifact<B: Backend>(
    model: LeafClassifier<B>,
    manifest: &ModelManifest,
    manifest_path: &Path,
) -> Result<()> {
    if let Some(dir) = manifest_path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let weights_path = manifest.weights_path(manifest_path);
    model
        .save_file(&weights_path, &CompactRecorder::new())
        .map_err(|e| LeafCureError::Serialization(format!("Failed to save weights: {:?}", e)))?;
    manifest.save(manifest_path)?;

    info!("Saved model artifact to {:?}", manifest_path);
    Ok(())
}

/// Write an artifact with freshly initialized (untrained) weights
///
/// Useful for exercising the inference pipeline before a trained model
/// exists. The weight record is named after the manifest file stem. Nothing
/// is written if the manifest would not load back.
pub fn scaffold_artifact(
    labels: Vec<String>,
    manifest_path: &Path,
    network: LeafClassifierConfig,
    input_size: usize,
    dataset_dir: Option<PathBuf>,
) -> Result<ModelManifest> {
    if labels.is_empty() {
        return Err(LeafCureError::Config(
            "Cannot scaffold a model without class labels".to_string(),
        ));
    }

    let stem = manifest_path
        .file_stem()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("model"));

    let manifest = ModelManifest::new(labels, stem)
        .with_network(network)
        .with_input_size(input_size)
        .with_provenance(Provenance {
            dataset_dir,
            export_path: Some(manifest_path.to_path_buf()),
            trained: false,
        });
    manifest.validate()?;

    let device = default_device();
    let model: LeafClassifier<DefaultBackend> = manifest.network.init(&device);
    save_artifact(model, &manifest, manifest_path)?;

    Ok(manifest)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Labels used by the small test artifacts
    pub fn tomato_labels() -> Vec<String> {
        [
            "Tomato___Bacterial_spot",
            "Tomato___Early_blight",
            "Tomato___Target_Spot",
            "Tomato___healthy",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    /// A network small enough to run quickly in tests
    pub fn tiny_network() -> LeafClassifierConfig {
        LeafClassifierConfig::new()
            .with_base_filters(4)
            .with_num_blocks(2)
            .with_hidden_units(8)
    }

    /// Scaffold a tiny artifact in `dir` and return its manifest path
    pub fn tiny_artifact(dir: &Path) -> PathBuf {
        let manifest_path = dir.join("tomato.json");
        scaffold_artifact(tomato_labels(), &manifest_path, tiny_network(), 32, None).unwrap();
        manifest_path
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::utils::error::ModelLoadError;

    #[test]
    fn test_scaffold_writes_manifest_and_weights() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("models").join("tomato.json");

        let manifest = scaffold_artifact(
            tomato_labels(),
            &manifest_path,
            tiny_network(),
            32,
            Some(PathBuf::from("data")),
        )
        .unwrap();

        assert!(manifest_path.is_file());
        assert!(dir.path().join("models").join("tomato.mpk").is_file());
        assert_eq!(manifest.network.num_classes, 4);
        assert_eq!(manifest.weights, PathBuf::from("tomato"));
        assert!(!manifest.provenance.trained);
    }

    #[test]
    fn test_scaffold_rejects_input_smaller_than_pooling() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("tomato.json");

        let result = scaffold_artifact(
            tomato_labels(),
            &manifest_path,
            LeafClassifierConfig::new(),
            8,
            None,
        );

        assert!(matches!(
            result,
            Err(LeafCureError::ModelLoad(ModelLoadError::Geometry(_)))
        ));
        assert!(!manifest_path.exists());
        assert!(!dir.path().join("tomato.mpk").exists());
    }

    #[test]
    fn test_scaffold_requires_labels() {
        let dir = tempfile::tempdir().unwrap();
        let result = scaffold_artifact(
            Vec::new(),
            &dir.path().join("empty.json"),
            tiny_network(),
            32,
            None,
        );
        assert!(matches!(result, Err(LeafCureError::Config(_))));
    }
}
