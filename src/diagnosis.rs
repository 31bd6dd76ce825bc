//! Diagnosis pipeline: image in, label + confidence + advice out

use burn::tensor::backend::Backend;
use image::DynamicImage;
use serde::Serialize;

use crate::inference::{ClassScore, ModelHandle, Prediction};
use crate::remedy::{self, Advisory};
use crate::utils::error::InferenceError;
use crate::utils::format_confidence;

/// What the caller renders for one image
#[derive(Debug, Clone, Serialize)]
pub struct Diagnosis {
    /// Display form of the disease, e.g. `Early Blight`
    pub label: String,
    /// Label exactly as the classifier reported it
    pub raw_label: String,
    /// Probability of the predicted class
    pub confidence: f32,
    /// Treatment advice for the label
    pub advisory: Advisory,
    /// True when no catalog keyword matched the label
    pub unknown_disease: bool,
    /// Runner-up classes, best first
    pub alternatives: Vec<ClassScore>,
}

impl Diagnosis {
    /// Attach advice to a prediction
    pub fn from_prediction(prediction: &Prediction) -> Self {
        let (normalized, advisory) = remedy::lookup(&prediction.label);

        Self {
            label: normalized.display,
            raw_label: prediction.label.clone(),
            confidence: prediction.confidence,
            unknown_disease: advisory.is_unknown(),
            advisory,
            alternatives: prediction.top_k.iter().skip(1).cloned().collect(),
        }
    }

    /// Plain-text rendering for terminals
    pub fn render(&self) -> String {
        format!(
            "Disease: {}\nConfidence: {}\n\nCure Suggestion:\n{}\n",
            self.label,
            format_confidence(self.confidence),
            self.advisory.text
        )
    }
}

/// Diagnose an already decoded image
pub fn diagnose_image<B: Backend>(
    handle: &ModelHandle<B>,
    image: &DynamicImage,
) -> Result<Diagnosis, InferenceError> {
    let prediction = handle.predict(image)?;
    Ok(Diagnosis::from_prediction(&prediction))
}

/// Diagnose JPEG/PNG bytes
pub fn diagnose<B: Backend>(
    handle: &ModelHandle<B>,
    bytes: &[u8],
) -> Result<Diagnosis, InferenceError> {
    let prediction = handle.predict_bytes(bytes)?;
    Ok(Diagnosis::from_prediction(&prediction))
}
