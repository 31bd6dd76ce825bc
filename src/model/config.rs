//! Model Artifact Manifest
//!
//! A model artifact is a JSON manifest plus a Burn `CompactRecorder` weight
//! record stored next to it:
//!
//! ```text
//! models/tomato.json   <- ModelManifest
//! models/tomato.mpk    <- weights
//! ```
//!
//! The manifest carries everything needed to rebuild the network and to turn
//! its output indices back into class labels.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::cnn::LeafClassifierConfig;
use super::portable_path::{native_path, optional_native_path};
use crate::utils::error::ModelLoadError;

/// Current manifest format version
pub const MANIFEST_VERSION: u32 = 1;

/// Default square input size in pixels
pub const DEFAULT_INPUT_SIZE: usize = 128;

/// Largest accepted square input size in pixels
pub const MAX_INPUT_SIZE: usize = 4096;

/// Most convolutional blocks a manifest may ask for
pub const MAX_NUM_BLOCKS: usize = 8;

/// Most filters a manifest may ask for in the first block
pub const MAX_BASE_FILTERS: usize = 1024;

/// Channels produced by preprocessing (RGB)
pub const IMAGE_CHANNELS: usize = 3;

/// Where an artifact came from. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Dataset directory the class labels were taken from
    #[serde(default, with = "optional_native_path")]
    pub dataset_dir: Option<PathBuf>,

    /// Location the artifact was exported to
    #[serde(default, with = "optional_native_path")]
    pub export_path: Option<PathBuf>,

    /// Whether the weights were trained or freshly initialized
    #[serde(default)]
    pub trained: bool,
}

/// Manifest describing a serialized classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    /// Manifest format version
    pub version: u32,

    /// Class labels in output-index order, e.g. `Tomato___Early_blight`
    pub labels: Vec<String>,

    /// Square input size the network expects
    pub input_size: usize,

    /// Network hyperparameters
    pub network: LeafClassifierConfig,

    /// Weight record, relative to the manifest directory unless absolute.
    /// Written without extension; the recorder appends `.mpk`.
    #[serde(with = "native_path")]
    pub weights: PathBuf,

    #[serde(default)]
    pub provenance: Provenance,
}

impl ModelManifest {
    /// Create a manifest for the given labels with default network settings
    pub fn new(labels: Vec<String>, weights: impl Into<PathBuf>) -> Self {
        let network = LeafClassifierConfig::new().with_num_classes(labels.len());
        Self {
            version: MANIFEST_VERSION,
            labels,
            input_size: DEFAULT_INPUT_SIZE,
            network,
            weights: weights.into(),
            provenance: Provenance::default(),
        }
    }

    /// Set the input size
    pub fn with_input_size(mut self, input_size: usize) -> Self {
        self.input_size = input_size;
        self
    }

    /// Replace the network configuration, keeping the class count in sync
    pub fn with_network(mut self, network: LeafClassifierConfig) -> Self {
        self.network = network.with_num_classes(self.labels.len());
        self
    }

    /// Set the provenance block
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// Check internal consistency after deserialization
    pub fn validate(&self) -> Result<(), ModelLoadError> {
        if self.version != MANIFEST_VERSION {
            return Err(ModelLoadError::UnsupportedVersion {
                found: self.version,
                expected: MANIFEST_VERSION,
            });
        }

        if self.labels.len() != self.network.num_classes {
            return Err(ModelLoadError::LabelMismatch {
                labels: self.labels.len(),
                classes: self.network.num_classes,
            });
        }

        self.validate_geometry()
    }

    /// Check that the network can run on `input_size` x `input_size` RGB images
    ///
    /// Every block halves the spatial size, so the input must be at least
    /// `2^num_blocks` pixels wide.
    pub fn validate_geometry(&self) -> Result<(), ModelLoadError> {
        let network = &self.network;
        let invalid = |msg: String| Err(ModelLoadError::Geometry(msg));

        if self.labels.is_empty() {
            return invalid("the manifest lists no class labels".to_string());
        }
        if network.in_channels != IMAGE_CHANNELS {
            return invalid(format!(
                "network expects {} input channels, images have {}",
                network.in_channels, IMAGE_CHANNELS
            ));
        }
        if network.num_blocks > MAX_NUM_BLOCKS {
            return invalid(format!(
                "{} convolutional blocks exceeds the limit of {}",
                network.num_blocks, MAX_NUM_BLOCKS
            ));
        }
        if network.base_filters == 0 || network.base_filters > MAX_BASE_FILTERS {
            return invalid(format!(
                "base filters must be between 1 and {}, got {}",
                MAX_BASE_FILTERS, network.base_filters
            ));
        }
        if network.hidden_units == 0 {
            return invalid("hidden units must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&network.dropout_rate) {
            return invalid(format!(
                "dropout rate must be in [0, 1], got {}",
                network.dropout_rate
            ));
        }

        let min_size = 1usize << network.num_blocks;
        if self.input_size < min_size || self.input_size > MAX_INPUT_SIZE {
            return invalid(format!(
                "input size {} must be between {} and {} for {} blocks",
                self.input_size, min_size, MAX_INPUT_SIZE, network.num_blocks
            ));
        }

        Ok(())
    }

    /// Resolve the weight record path against the manifest location
    pub fn weights_path(&self, manifest_path: &Path) -> PathBuf {
        if self.weights.is_absolute() {
            return self.weights.clone();
        }
        manifest_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(&self.weights)
    }

    /// Read and validate a manifest from disk
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        if !path.is_file() {
            return Err(ModelLoadError::NotFound(path.to_path_buf()));
        }

        let json = std::fs::read_to_string(path)
            .map_err(|e| ModelLoadError::Read(path.to_path_buf(), e))?;
        let manifest: Self = serde_json::from_str(&json)
            .map_err(|e| ModelLoadError::Manifest(path.to_path_buf(), e.to_string()))?;

        manifest.validate()?;
        Ok(manifest)
    }

    /// Write the manifest as pretty JSON
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }
}
