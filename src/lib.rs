//! # leafcure
//!
//! Leaf disease identification: a Burn image classifier behind a small
//! gateway, and an ordered keyword catalog that turns the predicted disease
//! into a treatment recommendation.
//!
//! ## Modules
//!
//! - `model`: CNN architecture and the on-disk artifact (manifest + weights)
//! - `inference`: preprocessing, the classifier gateway, and a lazy shared handle
//! - `remedy`: label normalization and catalog lookup
//! - `diagnosis`: the composed image -> advice pipeline
//! - `dataset`: class discovery from a folder-per-class dataset
//! - `utils`: logging and error types
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use leafcure::{diagnosis, ModelHandle};
//!
//! let handle = ModelHandle::load_default("models/tomato.json".as_ref())?;
//! let bytes = std::fs::read("leaf.jpg")?;
//! let result = diagnosis::diagnose(&handle, &bytes)?;
//! println!("{}", result.render());
//! ```

pub mod backend;
pub mod dataset;
pub mod diagnosis;
pub mod inference;
pub mod model;
pub mod remedy;
pub mod utils;

// Re-export commonly used items for convenience
pub use diagnosis::{diagnose, Diagnosis};
pub use inference::{ModelCache, ModelHandle, Prediction};
pub use model::{LeafClassifierConfig, ModelManifest};
pub use remedy::{normalize, resolve, Advisory, NormalizedLabel, REMEDY_CATALOG};
pub use utils::error::{InferenceError, LeafCureError, ModelLoadError, Result};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
