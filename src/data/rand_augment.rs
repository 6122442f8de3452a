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
    adjust_brightness, adjust_contrast, adjust_saturation, blend, center_crop_window, clamp_u8,
    crop, finalize, random_resized_crop_window, Augment, Mode, RandomHorizontalFlip, Transform,
};
use crate::data::image_decoder::ImageShape;
use crate::data::sim_augment::{CENTER_CROP_PROPORTION, CROP_RATIO, CROP_SCALE};
use crate::utilities::config::Configuration;
use image::{Rgb, RgbImage};
use rand::{Rng, RngCore};
use rand_distr::{Distribution, Normal};

pub const MAX_LEVEL: f32 = 30.0;

// Gray fill used by geometric ops for pixels that map outside the source.
const FILL: Rgb<u8> = Rgb([128, 128, 128]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    AutoContrast,
    Equalize,
    Invert,
    Rotate,
    Posterize,
    Solarize,
    Color,
    Contrast,
    Brightness,
    Sharpness,
    ShearX,
    ShearY,
    TranslateX,
    TranslateY,
}

impl Operation {
    pub const ALL: [Operation; 14] = [
        Operation::AutoContrast,
        Operation::Equalize,
        Operation::Invert,
        Operation::Rotate,
        Operation::Posterize,
        Operation::Solarize,
        Operation::Color,
        Operation::Contrast,
        Operation::Brightness,
        Operation::Sharpness,
        Operation::ShearX,
        Operation::ShearY,
        Operation::TranslateX,
        Operation::TranslateY,
    ];

    /// Applies the op at `level` in `0..=1`. Signed ops pick their direction from `rng`.
    pub fn apply(self, image: &RgbImage, level: f32, rng: &mut dyn RngCore) -> RgbImage {
        let sign = if rng.gen::<bool>() { 1.0 } else { -1.0 };
        match self {
            Operation::AutoContrast => auto_contrast(image),
            Operation::Equalize => equalize(image),
            Operation::Invert => invert(image),
            Operation::Rotate => rotate(image, (sign * level * 30.0).to_radians()),
            Operation::Posterize => posterize(image, 8 - (level * 4.0) as u8),
            Operation::Solarize => solarize(image, 256.0 - level * 256.0),
            Operation::Color => adjust_saturation(image, 1.0 + sign * level * 0.9),
            Operation::Contrast => adjust_contrast(image, 1.0 + sign * level * 0.9),
            Operation::Brightness => adjust_brightness(image, 1.0 + sign * level * 0.9),
            Operation::Sharpness => sharpness(image, 1.0 + sign * level * 0.9),
            Operation::ShearX => shear(image, sign * level * 0.3, 0.0),
            Operation::ShearY => shear(image, 0.0, sign * level * 0.3),
            Operation::TranslateX => {
                translate(image, sign * level * 0.45 * image.width() as f32, 0.0)
            }
            Operation::TranslateY => {
                translate(image, 0.0, sign * level * 0.45 * image.height() as f32)
            }
        }
    }
}

/// RandAugment: random resized crop and flip, then `layers` ops drawn
/// uniformly with replacement, each at a shared magnitude. Evaluation uses the
/// center crop only.
pub struct RandAugment {
    mode: Mode,
    img_size: usize,
    standardize: bool,
    layers: usize,
    magnitude: f32,
    magnitude_std: f32,
    flip: RandomHorizontalFlip,
}

impl RandAugment {
    pub fn new(config: &Configuration, mode: Mode) -> Self {
        RandAugment {
            mode,
            img_size: config.img_size,
            standardize: config.standardize,
            layers: config.randaug.layers,
            magnitude: config.randaug.magnitude,
            magnitude_std: config.randaug.magnitude_std,
            flip: RandomHorizontalFlip::new(0.5),
        }
    }

    fn sample_level(&self, rng: &mut dyn RngCore) -> f32 {
        let magnitude = if self.magnitude_std > 0.0 {
            match Normal::new(self.magnitude, self.magnitude_std) {
                Ok(normal) => normal.sample(rng),
                Err(_) => self.magnitude,
            }
        } else {
            self.magnitude
        };
        magnitude.clamp(0.0, MAX_LEVEL) / MAX_LEVEL
    }
}

impl Augment for RandAugment {
    fn augment(
        &self,
        image: &RgbImage,
        shape: ImageShape,
        rng: &mut dyn RngCore,
    ) -> Result<Tensor> {
        let current = match self.mode {
            Mode::Train => {
                let window = random_resized_crop_window(shape, CROP_SCALE, CROP_RATIO, rng);
                let mut current = self.flip.apply(crop(image, window), rng)?;
                for _ in 0..self.layers {
                    let op = Operation::ALL[rng.gen_range(0..Operation::ALL.len())];
                    let level = self.sample_level(rng);
                    current = op.apply(&current, level, rng);
                }
                current
            }
            Mode::Eval => crop(image, center_crop_window(shape, CENTER_CROP_PROPORTION)),
        };

        finalize(&current, self.img_size, self.standardize)
    }

    fn name(&self) -> &str {
        "RandAugment"
    }
}

pub fn invert(image: &RgbImage) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for c in 0..3 {
            pixel[c] = 255 - pixel[c];
        }
    }
    out
}

/// Inverts every channel value at or above `threshold`.
pub fn solarize(image: &RgbImage, threshold: f32) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for c in 0..3 {
            if f32::from(pixel[c]) >= threshold {
                pixel[c] = 255 - pixel[c];
            }
        }
    }
    out
}

/// Keeps the top `bits` bits of each channel.
pub fn posterize(image: &RgbImage, bits: u8) -> RgbImage {
    let shift = 8 - bits.clamp(1, 8);
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for c in 0..3 {
            pixel[c] = (pixel[c] >> shift) << shift;
        }
    }
    out
}

/// Stretches each channel so its min maps to 0 and its max to 255.
pub fn auto_contrast(image: &RgbImage) -> RgbImage {
    let mut lo = [255u8; 3];
    let mut hi = [0u8; 3];
    for pixel in image.pixels() {
        for c in 0..3 {
            lo[c] = lo[c].min(pixel[c]);
            hi[c] = hi[c].max(pixel[c]);
        }
    }

    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for c in 0..3 {
            if hi[c] > lo[c] {
                let scale = 255.0 / f32::from(hi[c] - lo[c]);
                pixel[c] = clamp_u8(f32::from(pixel[c] - lo[c]) * scale);
            }
        }
    }
    out
}

/// Per-channel histogram equalization.
pub fn equalize(image: &RgbImage) -> RgbImage {
    let total = (image.width() * image.height()) as usize;
    let mut lut = [[0u8; 256]; 3];

    for c in 0..3 {
        let mut histogram = [0usize; 256];
        for pixel in image.pixels() {
            histogram[pixel[c] as usize] += 1;
        }

        let first = histogram.iter().position(|&n| n > 0).unwrap_or(0);
        let denominator = total - histogram[first];
        let mut cumulative = 0usize;
        for (value, &count) in histogram.iter().enumerate() {
            cumulative += count;
            lut[c][value] = if denominator == 0 {
                // single-valued channel stays as is
                value as u8
            } else {
                let above_first = cumulative.saturating_sub(histogram[first]);
                clamp_u8(above_first as f32 * 255.0 / denominator as f32)
            };
        }
    }

    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for c in 0..3 {
            pixel[c] = lut[c][pixel[c] as usize];
        }
    }
    out
}

/// Blends with a 3x3 smoothed copy; `factor > 1` sharpens.
pub fn sharpness(image: &RgbImage, factor: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return image.clone();
    }

    let mut smoothed = image.clone();
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut acc = [0.0f32; 3];
            for dy in 0..3 {
                for dx in 0..3 {
                    let weight = if dx == 1 && dy == 1 { 5.0 } else { 1.0 };
                    let p = image.get_pixel(x + dx - 1, y + dy - 1);
                    for c in 0..3 {
                        acc[c] += weight * f32::from(p[c]);
                    }
                }
            }
            smoothed.put_pixel(
                x,
                y,
                Rgb([
                    clamp_u8(acc[0] / 13.0),
                    clamp_u8(acc[1] / 13.0),
                    clamp_u8(acc[2] / 13.0),
                ]),
            );
        }
    }

    blend(image, &smoothed, factor)
}

/// Inverse-maps every output pixel through `source_of` with nearest sampling.
fn warp<F>(image: &RgbImage, source_of: F) -> RgbImage
where
    F: Fn(f32, f32) -> (f32, f32),
{
    let (width, height) = image.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let (sx, sy) = source_of(x as f32, y as f32);
        let (sx, sy) = (sx.round(), sy.round());
        if sx >= 0.0 && sy >= 0.0 && sx < width as f32 && sy < height as f32 {
            *image.get_pixel(sx as u32, sy as u32)
        } else {
            FILL
        }
    })
}

pub fn rotate(image: &RgbImage, radians: f32) -> RgbImage {
    let cx = (image.width() as f32 - 1.0) / 2.0;
    let cy = (image.height() as f32 - 1.0) / 2.0;
    let (sin, cos) = radians.sin_cos();
    warp(image, |x, y| {
        let (dx, dy) = (x - cx, y - cy);
        (cos * dx + sin * dy + cx, -sin * dx + cos * dy + cy)
    })
}

pub fn shear(image: &RgbImage, shear_x: f32, shear_y: f32) -> RgbImage {
    warp(image, |x, y| (x + shear_x * y, y + shear_y * x))
}

pub fn translate(image: &RgbImage, dx: f32, dy: f32) -> RgbImage {
    warp(image, |x, y| (x - dx, y - dy))
}
