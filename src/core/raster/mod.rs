//! # Raster Module
//!
//! The decoded pixel buffer every detector consumes.
//!
//! A `RasterImage` is immutable once built: 8 bits per channel, row-major,
//! with an optional handle on the encoded bytes it was decoded from (only
//! error-level analysis looks at those).
//!
//! ## Submodules
//! - `decode` - turns encoded bytes or files into rasters
//! - `resize` - SIMD downscaling for the transform-based detectors

pub mod decode;
pub mod resize;

use image::{DynamicImage, GrayImage, RgbImage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::LoadError;

pub use decode::{decode_bytes, decode_file, FastDecoder, ImageFormat};
pub use resize::{fit_within, FastResizer};

/// Channel order of a raster's pixel buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelLayout {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
}

impl ChannelLayout {
    /// Bytes per pixel
    pub fn channels(&self) -> usize {
        match self {
            ChannelLayout::Gray => 1,
            ChannelLayout::GrayAlpha => 2,
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgba => 4,
        }
    }
}

/// Decoded image, shared read-only by every detector
#[derive(Debug, Clone)]
pub struct RasterImage {
    width: u32,
    height: u32,
    layout: ChannelLayout,
    pixels: Arc<[u8]>,
    source: Option<Arc<[u8]>>,
}

impl RasterImage {
    /// Wrap a raw pixel buffer, checking it matches the stated geometry
    pub fn new(
        width: u32,
        height: u32,
        layout: ChannelLayout,
        pixels: Vec<u8>,
    ) -> Result<Self, LoadError> {
        if width == 0 || height == 0 {
            return Err(LoadError::InvalidDimensions { width, height });
        }

        let expected = width as usize * height as usize * layout.channels();
        if pixels.len() != expected {
            return Err(LoadError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            width,
            height,
            layout,
            pixels: pixels.into(),
            source: None,
        })
    }

    /// Convert an `image` crate buffer; deeper bit depths are reduced to 8 bits
    pub fn from_dynamic(image: DynamicImage) -> Result<Self, LoadError> {
        let (width, height) = (image.width(), image.height());
        match image {
            DynamicImage::ImageLuma8(buffer) => {
                Self::new(width, height, ChannelLayout::Gray, buffer.into_raw())
            }
            DynamicImage::ImageLumaA8(buffer) => {
                Self::new(width, height, ChannelLayout::GrayAlpha, buffer.into_raw())
            }
            DynamicImage::ImageRgb8(buffer) => {
                Self::new(width, height, ChannelLayout::Rgb, buffer.into_raw())
            }
            DynamicImage::ImageRgba8(buffer) => {
                Self::new(width, height, ChannelLayout::Rgba, buffer.into_raw())
            }
            other if other.color().has_alpha() => {
                Self::new(width, height, ChannelLayout::Rgba, other.to_rgba8().into_raw())
            }
            other => Self::new(width, height, ChannelLayout::Rgb, other.to_rgb8().into_raw()),
        }
    }

    /// Attach the encoded byte stream this raster was decoded from
    pub fn with_source(mut self, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.source = Some(bytes.into());
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Original encoded bytes, if the loader kept them
    pub fn source(&self) -> Option<&[u8]> {
        self.source.as_deref()
    }

    /// Luminance channel using BT.601 weights (0.299, 0.587, 0.114)
    pub fn luma(&self) -> GrayImage {
        let channels = self.layout.channels();
        let data: Vec<u8> = self
            .pixels
            .chunks_exact(channels)
            .map(|px| match self.layout {
                ChannelLayout::Gray | ChannelLayout::GrayAlpha => px[0],
                ChannelLayout::Rgb | ChannelLayout::Rgba => rgb_to_luma(px[0], px[1], px[2]),
            })
            .collect();
        // Length is guaranteed by the constructor
        GrayImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }

    /// Three-channel copy, alpha dropped and gray expanded
    pub fn to_rgb(&self) -> RgbImage {
        let channels = self.layout.channels();
        let data: Vec<u8> = self
            .pixels
            .chunks_exact(channels)
            .flat_map(|px| match self.layout {
                ChannelLayout::Gray | ChannelLayout::GrayAlpha => [px[0], px[0], px[0]],
                ChannelLayout::Rgb | ChannelLayout::Rgba => [px[0], px[1], px[2]],
            })
            .collect();
        RgbImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }
}

/// BT.601 luminance of one RGB pixel
pub fn rgb_to_luma(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64)
        .round()
        .clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn new_rejects_zero_dimensions() {
        let result = RasterImage::new(0, 4, ChannelLayout::Gray, Vec::new());
        assert!(matches!(result, Err(LoadError::InvalidDimensions { .. })));
    }

    #[test]
    fn new_rejects_short_buffer() {
        let result = RasterImage::new(4, 4, ChannelLayout::Rgb, vec![0; 47]);
        match result {
            Err(LoadError::BufferSize { expected, actual }) => {
                assert_eq!(expected, 48);
                assert_eq!(actual, 47);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn luma_uses_bt601_weights() {
        let raster = RasterImage::new(1, 1, ChannelLayout::Rgb, vec![255, 0, 0]).unwrap();
        assert_eq!(raster.luma().get_pixel(0, 0)[0], 76);

        let raster = RasterImage::new(1, 1, ChannelLayout::Rgba, vec![0, 255, 0, 10]).unwrap();
        assert_eq!(raster.luma().get_pixel(0, 0)[0], 150);
    }

    #[test]
    fn gray_expands_to_rgb() {
        let raster = RasterImage::new(2, 1, ChannelLayout::Gray, vec![10, 200]).unwrap();
        let rgb = raster.to_rgb();
        assert_eq!(rgb.get_pixel(1, 0).0, [200, 200, 200]);
    }

    #[test]
    fn from_dynamic_keeps_layout() {
        let buffer = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8, y as u8, 7]));
        let raster = RasterImage::from_dynamic(DynamicImage::ImageRgb8(buffer)).unwrap();
        assert_eq!(raster.layout(), ChannelLayout::Rgb);
        assert_eq!((raster.width(), raster.height()), (3, 2));
        assert_eq!(raster.to_rgb().get_pixel(2, 1).0, [2, 1, 7]);
    }

    #[test]
    fn source_is_optional() {
        let raster = RasterImage::new(1, 1, ChannelLayout::Gray, vec![0]).unwrap();
        assert!(raster.source().is_none());
        let raster = raster.with_source(vec![1u8, 2, 3]);
        assert_eq!(raster.source(), Some(&[1u8, 2, 3][..]));
    }
}
