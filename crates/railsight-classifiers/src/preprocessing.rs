//! Image decoding and tensor conversion

use candle_core::{Device, Tensor};
use image::{imageops::FilterType, DynamicImage};
use railsight_core::{Error, Result};

/// ImageNet normalization mean values (RGB)
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet normalization std values (RGB)
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decode an uploaded image, sniffing the format from its content
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(Error::image("empty upload"));
    }

    image::load_from_memory(bytes).map_err(|e| Error::image(format!("cannot decode image: {}", e)))
}

/// Resize to `size`x`size`, normalize, and lay out as a `[1, 3, size, size]` tensor
pub fn image_to_tensor(image: &DynamicImage, size: u32, device: &Device) -> Result<Tensor> {
    let resized = image.resize_exact(size, size, FilterType::Triangle);
    let data = normalize_chw(&resized);
    let side = size as usize;

    Tensor::from_vec(data, (1, 3, side, side), device)
        .map_err(|e| Error::model(format!("Failed to create input tensor: {}", e)))
}

/// Normalize to a flat CHW vector with ImageNet statistics
fn normalize_chw(image: &DynamicImage) -> Vec<f32> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let num_pixels = (width * height) as usize;

    let mut normalized = vec![0.0f32; 3 * num_pixels];
    for (i, pixel) in rgb.pixels().enumerate() {
        for channel in 0..3 {
            let value = pixel[channel] as f32 / 255.0;
            normalized[channel * num_pixels + i] =
                (value - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel];
        }
    }

    normalized
}
