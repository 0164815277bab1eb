/// Frame pixels and perceptual luminance
///
/// Frames arrive as packed 8-bit RGBA. The meter only cares about how
/// bright the frame looks, so each pixel is reduced to Rec. 601 luma
/// and averaged over the whole frame.

use cgmath::{InnerSpace, Vector3};

use crate::error::SampleError;

/// Rec. 601 luma coefficients for R, G, B
const LUMA_WEIGHTS: Vector3<f64> = Vector3 {
    x: 0.299,
    y: 0.587,
    z: 0.114,
};

/// Maximum value of an 8-bit channel
const CHANNEL_MAX: f64 = 255.0;

/// One frame of packed RGBA8 pixel data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA bytes, 4 per pixel
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self { width, height, data }
    }

    /// A frame filled with a single color
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        Self {
            width,
            height,
            data: rgba.repeat(count),
        }
    }

    /// View the buffer as pixels, checking it matches its dimensions
    pub fn pixels(&self) -> Result<&[[u8; 4]], SampleError> {
        if self.width == 0 || self.height == 0 {
            return Err(SampleError::EmptyFrame {
                width: self.width,
                height: self.height,
            });
        }

        let expected = self.width as usize * self.height as usize * 4;
        if self.data.len() != expected {
            return Err(SampleError::BufferSize {
                width: self.width,
                height: self.height,
                expected,
                actual: self.data.len(),
            });
        }

        bytemuck::try_cast_slice(&self.data).map_err(|_| SampleError::BufferSize {
            width: self.width,
            height: self.height,
            expected,
            actual: self.data.len(),
        })
    }
}

impl From<image::RgbaImage> for PixelBuffer {
    fn from(image: image::RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }
}

/// Normalized luma of one pixel, alpha ignored
pub fn pixel_luminance([r, g, b, _alpha]: [u8; 4]) -> f64 {
    Vector3::new(r as f64, g as f64, b as f64).dot(LUMA_WEIGHTS) / CHANNEL_MAX
}

/// Average normalized luminance of a frame, in [0, 1]
pub fn average_luminance(frame: &PixelBuffer) -> Result<f64, SampleError> {
    let pixels = frame.pixels()?;
    let total: f64 = pixels.iter().copied().map(pixel_luminance).sum();
    Ok(total / pixels.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_black_and_white_frames() {
        let black = PixelBuffer::solid(4, 3, [0, 0, 0, 255]);
        assert_eq!(average_luminance(&black).unwrap(), 0.0);

        let white = PixelBuffer::solid(4, 3, [255, 255, 255, 255]);
        assert!((average_luminance(&white).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_channel_weights() {
        assert!((pixel_luminance([255, 0, 0, 255]) - 0.299).abs() < 1e-12);
        assert!((pixel_luminance([0, 255, 0, 255]) - 0.587).abs() < 1e-12);
        assert!((pixel_luminance([0, 0, 255, 255]) - 0.114).abs() < 1e-12);
    }

    #[test]
    fn test_alpha_is_ignored() {
        let opaque = PixelBuffer::solid(2, 2, [200, 100, 50, 255]);
        let clear = PixelBuffer::solid(2, 2, [200, 100, 50, 0]);
        assert_eq!(
            average_luminance(&opaque).unwrap(),
            average_luminance(&clear).unwrap()
        );
    }

    #[test]
    fn test_mean_over_pixels() {
        // One white pixel, one black pixel
        let frame = PixelBuffer::new(2, 1, vec![255, 255, 255, 255, 0, 0, 0, 255]);
        assert!((average_luminance(&frame).unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_frame_is_an_error() {
        let empty = PixelBuffer::new(0, 0, Vec::new());
        assert!(matches!(
            average_luminance(&empty),
            Err(SampleError::EmptyFrame { .. })
        ));

        let no_rows = PixelBuffer::new(640, 0, Vec::new());
        assert!(average_luminance(&no_rows).is_err());
    }

    #[test]
    fn test_truncated_buffer_is_an_error() {
        let frame = PixelBuffer::new(2, 2, vec![0; 15]);
        assert!(matches!(
            average_luminance(&frame),
            Err(SampleError::BufferSize { expected: 16, actual: 15, .. })
        ));
    }

    #[test]
    fn test_from_rgba_image() {
        let image = image::RgbaImage::from_pixel(3, 2, image::Rgba([128, 128, 128, 255]));
        let frame = PixelBuffer::from(image);
        assert_eq!((frame.width, frame.height), (3, 2));
        assert_eq!(frame.data.len(), 24);
        let luminance = average_luminance(&frame).unwrap();
        assert!((luminance - 128.0 / 255.0).abs() < 1e-9);
    }
}
