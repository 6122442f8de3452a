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
use crate::utilities::byte::{BigEndian, ReadBytes};
use image::RgbImage;
use std::io::Cursor;
use std::path::Path;

/// Image dimensions as stored in the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageShape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl ImageShape {
    pub fn new(height: usize, width: usize, channels: usize) -> Self {
        ImageShape {
            height,
            width,
            channels,
        }
    }
}

/// Reads a whole file into memory.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|e| {
        PipelineError::IOError(format!("Failed to read image file {}: {}", path.display(), e))
    })
}

/// Checks the JPEG start-of-image signature.
pub fn is_jpeg(bytes: &[u8]) -> bool {
    bytes.len() >= 3 && bytes[0..3] == [0xFF, 0xD8, 0xFF]
}

/// Returns the frame dimensions of a JPEG without decoding any pixel data.
pub fn extract_jpeg_shape(bytes: &[u8]) -> Result<ImageShape> {
    if !is_jpeg(bytes) {
        return Err(PipelineError::ImageError(
            "Not a valid JPEG file".to_string(),
        ));
    }

    let mut reader = Cursor::new(bytes);
    reader.set_position(2);

    loop {
        let marker = next_marker(&mut reader)?;
        match marker {
            // start of frame, any coding process
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                let _length = reader.read_u16::<BigEndian>().map_err(truncated)?;
                let _precision = reader.read_u8().map_err(truncated)?;
                let height = reader.read_u16::<BigEndian>().map_err(truncated)? as usize;
                let width = reader.read_u16::<BigEndian>().map_err(truncated)? as usize;
                let channels = reader.read_u8().map_err(truncated)? as usize;

                if height == 0 || width == 0 || channels == 0 {
                    return Err(PipelineError::ImageError(format!(
                        "Invalid JPEG frame {}x{}x{}",
                        height, width, channels
                    )));
                }
                return Ok(ImageShape::new(height, width, channels));
            }
            0xD9 | 0xDA => {
                return Err(PipelineError::ImageError(
                    "JPEG has no frame header before scan data".to_string(),
                ))
            }
            // standalone markers carry no length
            0x01 | 0xD0..=0xD7 => {}
            _ => {
                let length = reader.read_u16::<BigEndian>().map_err(truncated)? as u64;
                if length < 2 {
                    return Err(PipelineError::ImageError(format!(
                        "Invalid segment length {} for marker 0xFF{:02X}",
                        length, marker
                    )));
                }
                reader.skip_bytes(length - 2).map_err(truncated)?;
            }
        }
    }
}

/// Decodes a JPEG to 8-bit RGB regardless of its stored channel count.
pub fn decode_jpeg(bytes: &[u8]) -> Result<RgbImage> {
    if !is_jpeg(bytes) {
        return Err(PipelineError::ImageError(
            "Not a valid JPEG file".to_string(),
        ));
    }
    let image = image::load_from_memory_with_format(bytes, image::ImageFormat::Jpeg)?;
    Ok(image.to_rgb8())
}

fn next_marker(reader: &mut Cursor<&[u8]>) -> Result<u8> {
    let prefix = reader.read_u8().map_err(truncated)?;
    if prefix != 0xFF {
        return Err(PipelineError::ImageError(format!(
            "Invalid JPEG marker prefix 0x{:02X}",
            prefix
        )));
    }
    // fill bytes may repeat 0xFF before the marker code
    let mut code = reader.read_u8().map_err(truncated)?;
    while code == 0xFF {
        code = reader.read_u8().map_err(truncated)?;
    }
    Ok(code)
}

fn truncated(e: std::io::Error) -> PipelineError {
    PipelineError::ImageError(format!("Truncated JPEG header: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn encode_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 128]));
        let mut bytes = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, 90)
            .encode_image(&img)
            .unwrap();
        bytes
    }

    #[test]
    fn header_shape_matches_encoded_size() {
        let bytes = encode_jpeg(40, 24);
        assert_eq!(extract_jpeg_shape(&bytes).unwrap(), ImageShape::new(24, 40, 3));
    }

    #[test]
    fn decode_yields_rgb_of_header_size() {
        let bytes = encode_jpeg(17, 9);
        let img = decode_jpeg(&bytes).unwrap();
        assert_eq!(img.dimensions(), (17, 9));
    }

    #[test]
    fn grayscale_jpeg_decodes_to_three_channels() {
        let gray = image::GrayImage::from_pixel(8, 8, image::Luma([200]));
        let mut bytes = Vec::new();
        image::codecs::jpeg::JpegEncoder::new(&mut bytes)
            .encode_image(&gray)
            .unwrap();

        assert_eq!(extract_jpeg_shape(&bytes).unwrap().channels, 1);
        let rgb = decode_jpeg(&bytes).unwrap();
        assert_eq!(rgb.as_raw().len(), 8 * 8 * 3);
    }

    #[test]
    fn rejects_non_jpeg_bytes() {
        let png_magic = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A];
        assert!(extract_jpeg_shape(&png_magic).is_err());
        assert!(decode_jpeg(&png_magic).is_err());
    }

    #[test]
    fn truncated_header_is_an_error() {
        let bytes = encode_jpeg(16, 16);
        assert!(extract_jpeg_shape(&bytes[..6]).is_err());
    }
}
