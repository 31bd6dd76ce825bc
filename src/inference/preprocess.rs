//! Image preprocessing for the classifier
//!
//! Decode, convert to RGB, resize to the network input size, scale to
//! `[0, 1]` and apply ImageNet normalization. Output is CHW, flattened.

use image::{imageops::FilterType, DynamicImage};

use crate::utils::error::InferenceError;

/// ImageNet normalization mean values (RGB)
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet normalization std values (RGB)
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decode JPEG/PNG (or any format the `image` crate recognizes) from memory
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, InferenceError> {
    let image = image::load_from_memory(bytes)?;
    ensure_not_empty(&image)?;
    Ok(image)
}

fn ensure_not_empty(image: &DynamicImage) -> Result<(), InferenceError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(InferenceError::EmptyImage {
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(())
}

/// Resize to `size`x`size` and normalize into a CHW vector of `3 * size * size`
pub fn image_to_chw(image: &DynamicImage, size: u32) -> Result<Vec<f32>, InferenceError> {
    ensure_not_empty(image)?;

    let rgb = image.resize_exact(size, size, FilterType::Lanczos3).to_rgb8();
    let num_pixels = (size * size) as usize;
    let mut normalized = vec![0.0f32; 3 * num_pixels];

    for (i, pixel) in rgb.pixels().enumerate() {
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            normalized[c * num_pixels + i] = (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }

    Ok(normalized)
}
