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

use crate::core::error::Result;
use crate::core::tensor::Tensor;
use crate::data::augmentation::{
    center_crop_window, crop, finalize, random_resized_crop_window, Augment, ColorJitter, Mode,
    RandomGrayscale, RandomHorizontalFlip, Transform,
};
use crate::data::image_decoder::ImageShape;
use crate::utilities::config::Configuration;
use image::RgbImage;
use rand::RngCore;

pub const CROP_SCALE: (f32, f32) = (0.08, 1.0);
pub const CROP_RATIO: (f32, f32) = (3.0 / 4.0, 4.0 / 3.0);
pub const CENTER_CROP_PROPORTION: f32 = 0.875;

/// SimCLR augmentation: random resized crop, flip, color distortion and
/// random grayscale in training; center crop in evaluation.
pub struct SimAugment {
    mode: Mode,
    img_size: usize,
    standardize: bool,
    transforms: Vec<Box<dyn Transform>>,
}

impl SimAugment {
    pub fn new(config: &Configuration, mode: Mode) -> Self {
        Self::with_strength(config, mode, 1.0)
    }

    /// `strength` scales the color distortion, 1.0 matches SimCLR.
    pub fn with_strength(config: &Configuration, mode: Mode, strength: f32) -> Self {
        let transforms: Vec<Box<dyn Transform>> = match mode {
            Mode::Train => vec![
                Box::new(RandomHorizontalFlip::new(0.5)),
                Box::new(ColorJitter::new(
                    0.8 * strength,
                    0.8 * strength,
                    0.8 * strength,
                    0.2 * strength,
                    0.8,
                )),
                Box::new(RandomGrayscale::new(0.2)),
            ],
            Mode::Eval => Vec::new(),
        };

        SimAugment {
            mode,
            img_size: config.img_size,
            standardize: config.standardize,
            transforms,
        }
    }
}

impl Augment for SimAugment {
    fn augment(
        &self,
        image: &RgbImage,
        shape: ImageShape,
        rng: &mut dyn RngCore,
    ) -> Result<Tensor> {
        let window = match self.mode {
            Mode::Train => random_resized_crop_window(shape, CROP_SCALE, CROP_RATIO, rng),
            Mode::Eval => center_crop_window(shape, CENTER_CROP_PROPORTION),
        };

        let mut current = crop(image, window);
        for transform in &self.transforms {
            current = transform.apply(current, rng)?;
        }

        finalize(&current, self.img_size, self.standardize)
    }

    fn name(&self) -> &str {
        "SimAugment"
    }
}
