//! Error Handling Module
//!
//! Defines the error taxonomy for leafcure: model loading failures,
//! per-request inference failures, and a crate-wide error that wraps both.
//! Uses thiserror for ergonomic error definitions.
//!
//! An unrecognized disease is *not* an error; see [`crate::remedy::Advisory`].

use std::path::PathBuf;

use thiserror::Error;

/// Failure to reconstruct a classifier from a model artifact.
///
/// Fatal to the operation that needed the model. Never repaired by guessing.
#[derive(Error, Debug)]
pub enum ModelLoadError {
    /// The manifest file does not exist
    #[error("Model artifact not found at '{0}'")]
    NotFound(PathBuf),

    /// The manifest exists but could not be read
    #[error("Failed to read model artifact '{0}': {1}")]
    Read(PathBuf, #[source] std::io::Error),

    /// The manifest could not be deserialized
    #[error("Malformed model manifest '{0}': {1}")]
    Manifest(PathBuf, String),

    /// The manifest was written by an incompatible format version
    #[error("Unsupported model format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// The manifest labels disagree with the network head
    #[error("Manifest lists {labels} labels but the network has {classes} output classes")]
    LabelMismatch { labels: usize, classes: usize },

    /// The network shape cannot process the manifest's input size
    #[error("Invalid model geometry: {0}")]
    Geometry(String),

    /// The weight record referenced by the manifest is missing or unreadable
    #[error("Failed to load weights from '{0}': {1}")]
    Weights(PathBuf, String),

    /// The loading task died before producing a handle
    #[error("Model loading was interrupted: {0}")]
    Interrupted(String),
}

/// Failure to run a prediction on a single image.
///
/// Recoverable: the caller reports it and may try again with another image.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// The bytes could not be decoded as a supported image
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// The image decoded to zero pixels
    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// The network output could not be read back
    #[error("Failed to extract probabilities: {0}")]
    Output(String),
}

impl From<image::ImageError> for InferenceError {
    fn from(err: image::ImageError) -> Self {
        InferenceError::Decode(err.to_string())
    }
}

/// Main error type for leafcure operations
#[derive(Error, Debug)]
pub enum LeafCureError {
    /// Error loading the classifier
    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),

    /// Error running inference
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// Error with dataset discovery
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for LeafCureError {
    fn from(err: serde_json::Error) -> Self {
        LeafCureError::Serialization(err.to_string())
    }
}

/// Convenience Result type for leafcure operations
pub type Result<T> = std::result::Result<T, LeafCureError>;
