//! Inference module: the classifier gateway
//!
//! This module provides:
//! - Image decoding and preprocessing
//! - Loading a model artifact into a [`ModelHandle`] and predicting with it
//! - A lazily initialized, shared handle for long-running processes

pub mod cache;
pub mod predictor;
pub mod preprocess;

// Re-export main types for convenience
pub use cache::ModelCache;
pub use predictor::{ClassScore, ModelHandle, Prediction, TOP_K};
pub use preprocess::{decode_image, image_to_chw};
