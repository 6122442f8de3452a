// Copyright (C) 2025 Bellande Artificial Intelligence Computer Vision Research Innovation Center, Ronaldson Bellande

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::core::error::{PipelineError, Result};
use crate::core::tensor::Tensor;
use image::RgbImage;

pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

pub trait Preprocessor: Send + Sync {
    fn process(&self, tensor: &Tensor) -> Result<Tensor>;
}

pub struct Normalize {
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl Normalize {
    pub fn new(mean: Vec<f32>, std: Vec<f32>) -> Result<Self> {
        if mean.len() != std.len() {
            return Err(PipelineError::InvalidInputs(format!(
                "mean has {} channels but std has {}",
                mean.len(),
                std.len()
            )));
        }
        if std.iter().any(|&s| s == 0.0) {
            return Err(PipelineError::InvalidInputs(
                "std must be non-zero".to_string(),
            ));
        }
        Ok(Normalize { mean, std })
    }

    pub fn imagenet() -> Self {
        Normalize {
            mean: IMAGENET_MEAN.to_vec(),
            std: IMAGENET_STD.to_vec(),
        }
    }
}

impl Preprocessor for Normalize {
    fn process(&self, tensor: &Tensor) -> Result<Tensor> {
        if tensor.shape.len() != 3 {
            return Err(PipelineError::InvalidShape(format!(
                "Normalize expects [C, H, W], got {:?}",
                tensor.shape
            )));
        }

        let (channels, height, width) = (tensor.shape[0], tensor.shape[1], tensor.shape[2]);
        if channels != self.mean.len() {
            return Err(PipelineError::ShapeMismatch(format!(
                "tensor has {} channels, normalization has {}",
                channels,
                self.mean.len()
            )));
        }

        let plane = height * width;
        let mut normalized = tensor.data.clone();
        for c in 0..channels {
            for value in &mut normalized[c * plane..(c + 1) * plane] {
                *value = (*value - self.mean[c]) / self.std[c];
            }
        }

        Tensor::new(normalized, tensor.shape.clone())
    }
}

/// Converts an RGB image into a `[3, H, W]` tensor scaled to `[0, 1]`.
pub fn to_tensor(image: &RgbImage) -> Tensor {
    let (width, height) = image.dimensions();
    let plane = (width * height) as usize;
    let mut data = vec![0.0f32; plane * 3];

    for (x, y, pixel) in image.enumerate_pixels() {
        let base = (y * width + x) as usize;
        data[base] = f32::from(pixel[0]) / 255.0;
        data[plane + base] = f32::from(pixel[1]) / 255.0;
        data[2 * plane + base] = f32::from(pixel[2]) / 255.0;
    }

    Tensor {
        data,
        shape: vec![3, height as usize, width as usize],
    }
}

/// `[classes]` vector with a single 1.0 at `label`.
pub fn one_hot(label: i64, classes: usize) -> Result<Tensor> {
    if label < 0 || label as usize >= classes {
        return Err(PipelineError::LabelOutOfRange { label, classes });
    }
    let mut encoded = Tensor::zeros(&[classes]);
    encoded.data_mut()[label as usize] = 1.0;
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn one_hot_sums_to_one() {
        let encoded = one_hot(2, 5).unwrap();
        assert_eq!(encoded.shape(), &[5]);
        assert_eq!(encoded.data(), &[0.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(encoded.data().iter().sum::<f32>(), 1.0);
    }

    #[test]
    fn one_hot_rejects_labels_outside_class_count() {
        assert!(matches!(
            one_hot(5, 5),
            Err(PipelineError::LabelOutOfRange { label: 5, classes: 5 })
        ));
        assert!(one_hot(-1, 5).is_err());
    }

    #[test]
    fn to_tensor_is_channel_first() {
        let img = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        let tensor = to_tensor(&img);
        assert_eq!(tensor.shape(), &[3, 1, 2]);
        assert_eq!(tensor.data(), &[1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn normalize_applies_per_channel() {
        let tensor = Tensor::new(vec![1.0, 1.0, 0.5, 0.5], vec![2, 1, 2]).unwrap();
        let normalize = Normalize::new(vec![0.5, 0.5], vec![0.5, 0.25]).unwrap();
        let out = normalize.process(&tensor).unwrap();
        assert_eq!(out.data(), &[1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn normalize_rejects_channel_mismatch() {
        let tensor = Tensor::zeros(&[1, 2, 2]);
        assert!(Normalize::imagenet().process(&tensor).is_err());
    }
}
