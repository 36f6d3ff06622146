use image::RgbaImage;

use super::engine::RawImageBuffer;
use super::error::DecodeError;
use super::surface::{DisplaySurface, SurfaceSize};

/// Turns raw engine output into a displayable image.
///
/// Bytes pass through untouched: no colour-space conversion and no alpha
/// premultiplication. A buffer whose length disagrees with the requested
/// dimensions is rejected, never truncated or padded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDecoder;

impl ImageDecoder {
    pub fn decode(
        &self,
        buffer: RawImageBuffer,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, DecodeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::EmptyDimensions { width, height });
        }

        let expected = SurfaceSize::new(width, height).buffer_size();
        let actual = buffer.len();
        if actual != expected {
            return Err(DecodeError::LengthMismatch {
                width,
                height,
                expected,
                actual,
            });
        }

        RgbaImage::from_raw(width, height, buffer.into_bytes()).ok_or(
            DecodeError::LengthMismatch {
                width,
                height,
                expected,
                actual,
            },
        )
    }

    /// The single write of a decoded image into the host surface
    pub fn present<D: DisplaySurface + ?Sized>(&self, image: &RgbaImage, surface: &mut D) {
        surface.put_image(image);
    }
}
