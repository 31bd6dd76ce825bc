//! Model module: the Burn CNN and the artifact format it is stored in
//!
//! - `artifact`: saving weights and manifest together
//! - `cnn`: the classifier network
//! - `config`: the JSON manifest written next to the weight record
//! - `portable_path`: conversion of paths recorded on another platform

pub mod artifact;
pub mod cnn;
pub mod config;
pub mod portable_path;

// Re-export main types for convenience
pub use artifact::{save_artifact, scaffold_artifact};
pub use cnn::{LeafClassifier, LeafClassifierConfig};
pub use config::{ModelManifest, Provenance, MANIFEST_VERSION};
pub use portable_path::PathStyle;
