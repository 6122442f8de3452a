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
use crate::data::image_decoder::ImageShape;
use crate::data::preprocessing::{to_tensor, Normalize, Preprocessor};
use crate::data::rand_augment::RandAugment;
use crate::data::sim_augment::SimAugment;
use crate::utilities::config::Configuration;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Turns one decoded image into one augmented `[3, S, S]` view.
pub trait Augment: Send + Sync {
    fn augment(&self, image: &RgbImage, shape: ImageShape, rng: &mut dyn RngCore)
        -> Result<Tensor>;
    fn name(&self) -> &str;
}

/// Single image-to-image step inside an augmentation strategy.
pub trait Transform: Send + Sync {
    fn apply(&self, image: RgbImage, rng: &mut dyn RngCore) -> Result<RgbImage>;
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AugmentKind {
    Sim,
    Rand,
}

impl FromStr for AugmentKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sim" => Ok(AugmentKind::Sim),
            "rand" => Ok(AugmentKind::Rand),
            other => Err(PipelineError::InvalidConfiguration(format!(
                "unknown augmentation strategy {:?}, expected \"sim\" or \"rand\"",
                other
            ))),
        }
    }
}

impl fmt::Display for AugmentKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AugmentKind::Sim => write!(f, "sim"),
            AugmentKind::Rand => write!(f, "rand"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Train,
    Eval,
}

impl FromStr for Mode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "train" => Ok(Mode::Train),
            "eval" | "val" | "test" => Ok(Mode::Eval),
            other => Err(PipelineError::InvalidConfiguration(format!(
                "unknown mode {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Mode::Train => write!(f, "train"),
            Mode::Eval => write!(f, "eval"),
        }
    }
}

/// Builds the strategy selected by `config.augment`.
pub fn build_augment(config: &Configuration, mode: Mode) -> Box<dyn Augment> {
    match config.augment {
        AugmentKind::Sim => Box::new(SimAugment::new(config, mode)),
        AugmentKind::Rand => Box::new(RandAugment::new(config, mode)),
    }
}

/// Resizes to `img_size` square, converts to a tensor and optionally standardizes.
pub(crate) fn finalize(image: &RgbImage, img_size: usize, standardize: bool) -> Result<Tensor> {
    let size = img_size as u32;
    let tensor = if image.dimensions() == (size, size) {
        to_tensor(image)
    } else {
        to_tensor(&imageops::resize(image, size, size, FilterType::Triangle))
    };

    if standardize {
        Normalize::imagenet().process(&tensor)
    } else {
        Ok(tensor)
    }
}

/// Crop window `(x, y, width, height)` in pixel coordinates.
pub type CropWindow = (u32, u32, u32, u32);

/// Samples an Inception-style crop: area fraction in `scale`, aspect ratio in
/// `ratio`, both drawn relative to the header shape. Falls back to the whole
/// image when no candidate fits after ten attempts.
pub fn random_resized_crop_window(
    shape: ImageShape,
    scale: (f32, f32),
    ratio: (f32, f32),
    rng: &mut dyn RngCore,
) -> CropWindow {
    let (height, width) = (shape.height as f32, shape.width as f32);
    let area = height * width;
    let (log_lo, log_hi) = (ratio.0.ln(), ratio.1.ln());

    for _ in 0..10 {
        let target_area = area * rng.gen_range(scale.0..=scale.1);
        let aspect = rng.gen_range(log_lo..=log_hi).exp();

        let w = (target_area * aspect).sqrt().round();
        let h = (target_area / aspect).sqrt().round();

        if w >= 1.0 && h >= 1.0 && w <= width && h <= height {
            let (w, h) = (w as u32, h as u32);
            let x = rng.gen_range(0..=shape.width as u32 - w);
            let y = rng.gen_range(0..=shape.height as u32 - h);
            return (x, y, w, h);
        }
    }

    (0, 0, shape.width as u32, shape.height as u32)
}

/// Centered square covering `proportion` of the short side.
pub fn center_crop_window(shape: ImageShape, proportion: f32) -> CropWindow {
    let short = shape.height.min(shape.width) as f32;
    let side = ((short * proportion).round() as u32).max(1);
    let x = (shape.width as u32).saturating_sub(side) / 2;
    let y = (shape.height as u32).saturating_sub(side) / 2;
    (x, y, side, side)
}

/// Crops `window`, clamped to the actual image bounds.
pub fn crop(image: &RgbImage, window: CropWindow) -> RgbImage {
    let (img_w, img_h) = image.dimensions();
    let (x, y, w, h) = window;
    let x = x.min(img_w.saturating_sub(1));
    let y = y.min(img_h.saturating_sub(1));
    let w = w.min(img_w - x).max(1);
    let h = h.min(img_h - y).max(1);
    imageops::crop_imm(image, x, y, w, h).to_image()
}

pub struct RandomHorizontalFlip {
    p: f32,
}

impl RandomHorizontalFlip {
    pub fn new(p: f32) -> Self {
        RandomHorizontalFlip { p: p.clamp(0.0, 1.0) }
    }
}

impl Transform for RandomHorizontalFlip {
    fn apply(&self, image: RgbImage, rng: &mut dyn RngCore) -> Result<RgbImage> {
        if rng.gen::<f32>() >= self.p {
            return Ok(image);
        }
        Ok(imageops::flip_horizontal(&image))
    }

    fn name(&self) -> &str {
        "RandomHorizontalFlip"
    }
}

/// Brightness, contrast, saturation and hue jitter in random order, applied
/// with probability `p`.
pub struct ColorJitter {
    brightness: f32,
    contrast: f32,
    saturation: f32,
    hue: f32,
    p: f32,
}

impl ColorJitter {
    pub fn new(brightness: f32, contrast: f32, saturation: f32, hue: f32, p: f32) -> Self {
        ColorJitter {
            brightness,
            contrast,
            saturation,
            hue,
            p,
        }
    }

    fn factor(strength: f32, rng: &mut dyn RngCore) -> f32 {
        if strength <= 0.0 {
            return 1.0;
        }
        rng.gen_range((1.0 - strength).max(0.0)..=1.0 + strength)
    }
}

impl Transform for ColorJitter {
    fn apply(&self, mut image: RgbImage, rng: &mut dyn RngCore) -> Result<RgbImage> {
        if rng.gen::<f32>() >= self.p {
            return Ok(image);
        }

        let mut order = [0usize, 1, 2, 3];
        order.shuffle(rng);

        for step in order {
            image = match step {
                0 => adjust_brightness(&image, Self::factor(self.brightness, rng)),
                1 => adjust_contrast(&image, Self::factor(self.contrast, rng)),
                2 => adjust_saturation(&image, Self::factor(self.saturation, rng)),
                _ => {
                    if self.hue > 0.0 {
                        adjust_hue(&image, rng.gen_range(-self.hue..=self.hue))
                    } else {
                        image
                    }
                }
            };
        }

        Ok(image)
    }

    fn name(&self) -> &str {
        "ColorJitter"
    }
}

pub struct RandomGrayscale {
    p: f32,
}

impl RandomGrayscale {
    pub fn new(p: f32) -> Self {
        RandomGrayscale { p }
    }
}

impl Transform for RandomGrayscale {
    fn apply(&self, image: RgbImage, rng: &mut dyn RngCore) -> Result<RgbImage> {
        if rng.gen::<f32>() >= self.p {
            return Ok(image);
        }
        Ok(grayscale(&image))
    }

    fn name(&self) -> &str {
        "RandomGrayscale"
    }
}

pub(crate) fn luma(pixel: &Rgb<u8>) -> f32 {
    0.2989 * f32::from(pixel[0]) + 0.5870 * f32::from(pixel[1]) + 0.1140 * f32::from(pixel[2])
}

pub(crate) fn clamp_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

pub fn grayscale(image: &RgbImage) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let gray = clamp_u8(luma(pixel));
        *pixel = Rgb([gray, gray, gray]);
    }
    out
}

/// `degenerate + (image - degenerate) * factor` per channel.
pub(crate) fn blend(image: &RgbImage, degenerate: &RgbImage, factor: f32) -> RgbImage {
    let mut out = image.clone();
    for (dst, src) in out.pixels_mut().zip(degenerate.pixels()) {
        for c in 0..3 {
            let d = f32::from(src[c]);
            dst[c] = clamp_u8(d + (f32::from(dst[c]) - d) * factor);
        }
    }
    out
}

pub fn adjust_brightness(image: &RgbImage, factor: f32) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for c in 0..3 {
            pixel[c] = clamp_u8(f32::from(pixel[c]) * factor);
        }
    }
    out
}

pub fn adjust_contrast(image: &RgbImage, factor: f32) -> RgbImage {
    let count = (image.width() * image.height()).max(1) as f32;
    let mean = image.pixels().map(luma).sum::<f32>() / count;
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for c in 0..3 {
            pixel[c] = clamp_u8(mean + (f32::from(pixel[c]) - mean) * factor);
        }
    }
    out
}

pub fn adjust_saturation(image: &RgbImage, factor: f32) -> RgbImage {
    blend(image, &grayscale(image), factor)
}

/// Rotates hue by `delta` turns (`-0.5..=0.5`).
pub fn adjust_hue(image: &RgbImage, delta: f32) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let (h, s, v) = rgb_to_hsv(pixel);
        *pixel = hsv_to_rgb((h + delta).rem_euclid(1.0), s, v);
    }
    out
}

fn rgb_to_hsv(pixel: &Rgb<u8>) -> (f32, f32, f32) {
    let r = f32::from(pixel[0]) / 255.0;
    let g = f32::from(pixel[1]) / 255.0;
    let b = f32::from(pixel[2]) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        ((g - b) / delta).rem_euclid(6.0) / 6.0
    } else if max == g {
        ((b - r) / delta + 2.0) / 6.0
    } else {
        ((r - g) / delta + 4.0) / 6.0
    };
    let s = if max == 0.0 { 0.0 } else { delta / max };
    (h, s, max)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
    let sector = h * 6.0;
    let c = v * s;
    let x = c * (1.0 - (sector.rem_euclid(2.0) - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match sector as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    Rgb([
        clamp_u8((r + m) * 255.0),
        clamp_u8((g + m) * 255.0),
        clamp_u8((b + m) * 255.0),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 10) as u8, (y * 10) as u8, 100])
        })
    }

    #[test]
    fn parses_strategy_flags() {
        assert_eq!("sim".parse::<AugmentKind>().unwrap(), AugmentKind::Sim);
        assert_eq!("rand".parse::<AugmentKind>().unwrap(), AugmentKind::Rand);
        assert!("auto".parse::<AugmentKind>().is_err());
        assert_eq!("val".parse::<Mode>().unwrap(), Mode::Eval);
    }

    #[test]
    fn random_crop_window_stays_inside_image() {
        let mut rng = StdRng::seed_from_u64(3);
        let shape = ImageShape::new(50, 80, 3);
        for _ in 0..200 {
            let (x, y, w, h) = random_resized_crop_window(shape, (0.08, 1.0), (0.75, 1.333), &mut rng);
            assert!(w >= 1 && h >= 1);
            assert!(x + w <= 80 && y + h <= 50);
        }
    }

    #[test]
    fn center_crop_window_is_centered_square() {
        let window = center_crop_window(ImageShape::new(100, 200, 3), 0.875);
        assert_eq!(window, (56, 6, 88, 88));
    }

    #[test]
    fn flip_with_p1_mirrors_columns() {
        let mut rng = StdRng::seed_from_u64(0);
        let image = gradient(3, 1);
        let flipped = RandomHorizontalFlip::new(1.0).apply(image.clone(), &mut rng).unwrap();
        assert_eq!(flipped.get_pixel(0, 0), image.get_pixel(2, 0));
    }

    #[test]
    fn grayscale_equalizes_channels() {
        let gray = grayscale(&gradient(4, 4));
        assert!(gray.pixels().all(|p| p[0] == p[1] && p[1] == p[2]));
    }

    #[test]
    fn hue_round_trip_is_identity_at_zero_delta() {
        let image = gradient(5, 5);
        let shifted = adjust_hue(&image, 0.0);
        for (a, b) in image.pixels().zip(shifted.pixels()) {
            for c in 0..3 {
                assert!((i16::from(a[c]) - i16::from(b[c])).abs() <= 1);
            }
        }
    }

    #[test]
    fn finalize_produces_standardized_square_tensor() {
        let tensor = finalize(&gradient(10, 6), 8, true).unwrap();
        assert_eq!(tensor.shape(), &[3, 8, 8]);
        let raw = finalize(&gradient(10, 6), 8, false).unwrap();
        assert!(raw.data().iter().all(|&v| (0.0..=1.0).contains(&v)));
    }
}
