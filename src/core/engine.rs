use std::thread;
use std::time::Duration;

use super::error::EngineError;

/// Bytes per RGBA8 pixel
pub const BYTES_PER_PIXEL: usize = 4;

/// Raw RGBA8 output of one engine call, row-major from the top-left corner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImageBuffer(Vec<u8>);

impl RawImageBuffer {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Reinterpret one packed `u32` per pixel in memory order.
    /// On little-endian targets `0xAABBGGRR` becomes `[RR, GG, BB, AA]`.
    pub fn from_packed(pixels: &[u32]) -> Self {
        Self(bytemuck::cast_slice::<u32, u8>(pixels).to_vec())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Opaque image generator behind a single blocking call.
///
/// A successful call returns exactly `width * height * 4` bytes. Anything
/// else, including a panic, fails the request that made the call.
pub trait RenderEngine {
    fn render(
        &mut self,
        width: u32,
        height: u32,
        sample_count: u32,
        is_random_scene: bool,
        is_jittered_sampling: bool,
    ) -> Result<RawImageBuffer, EngineError>;
}

impl<F> RenderEngine for F
where
    F: FnMut(u32, u32, u32, bool, bool) -> Result<RawImageBuffer, EngineError>,
{
    fn render(
        &mut self,
        width: u32,
        height: u32,
        sample_count: u32,
        is_random_scene: bool,
        is_jittered_sampling: bool,
    ) -> Result<RawImageBuffer, EngineError> {
        self(width, height, sample_count, is_random_scene, is_jittered_sampling)
    }
}

/// Diagnostic stand-in used when no real renderer is linked in.
///
/// Predefined requests get a horizontal/vertical gradient, random requests a
/// checkerboard whose cell size follows the sample count. Uniform sampling
/// darkens the blue channel so the two sampler modes are told apart at a glance.
#[derive(Debug, Clone, Default)]
pub struct PatternEngine {
    work: Duration,
}

impl PatternEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block for `work` on every call, standing in for real compute time
    pub fn with_work(work: Duration) -> Self {
        Self { work }
    }

    fn pixel(x: u32, y: u32, width: u32, height: u32, sample_count: u32, random: bool) -> [u8; 3] {
        if random {
            let cell = sample_count.clamp(1, 64) * 2;
            if ((x / cell) + (y / cell)) % 2 == 0 {
                [230, 230, 230]
            } else {
                [40, 40, 40]
            }
        } else {
            let r = (x as u64 * 255 / width.max(1) as u64) as u8;
            let g = (y as u64 * 255 / height.max(1) as u64) as u8;
            [r, g, 200]
        }
    }
}

impl RenderEngine for PatternEngine {
    fn render(
        &mut self,
        width: u32,
        height: u32,
        sample_count: u32,
        is_random_scene: bool,
        is_jittered_sampling: bool,
    ) -> Result<RawImageBuffer, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::Failed(format!(
                "cannot render a {}x{} image",
                width, height
            )));
        }

        if !self.work.is_zero() {
            thread::sleep(self.work);
        }

        let mut bytes = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
        for y in 0..height {
            for x in 0..width {
                let [r, g, b] = Self::pixel(x, y, width, height, sample_count, is_random_scene);
                let b = if is_jittered_sampling { b } else { b / 2 };
                bytes.extend_from_slice(&[r, g, b, 255]);
            }
        }

        Ok(RawImageBuffer::from_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_pixels_keep_memory_order() {
        let packed = [u32::from_ne_bytes([1, 2, 3, 4]), u32::from_ne_bytes([5, 6, 7, 8])];
        let buffer = RawImageBuffer::from_packed(&packed);
        assert_eq!(buffer.as_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn pattern_engine_fills_exact_length() {
        let mut engine = PatternEngine::new();
        let buffer = engine.render(31, 17, 4, false, true).unwrap();
        assert_eq!(buffer.len(), 31 * 17 * 4);
        assert!(buffer.as_bytes().chunks(4).all(|px| px[3] == 255));
    }

    #[test]
    fn pattern_engine_distinguishes_modes() {
        let mut engine = PatternEngine::new();
        let predefined = engine.render(16, 16, 4, false, true).unwrap();
        let random = engine.render(16, 16, 4, true, true).unwrap();
        let uniform = engine.render(16, 16, 4, false, false).unwrap();

        assert_ne!(predefined, random);
        assert_ne!(predefined, uniform);
    }

    #[test]
    fn pattern_engine_rejects_empty_image() {
        let mut engine = PatternEngine::new();
        assert!(matches!(
            engine.render(0, 10, 1, false, false),
            Err(EngineError::Failed(_))
        ));
    }

    #[test]
    fn closures_are_engines() {
        let mut calls = Vec::new();
        let mut engine = |w: u32, h: u32, s: u32, random: bool, jittered: bool| -> Result<RawImageBuffer, EngineError> {
            calls.push((w, h, s, random, jittered));
            Ok(RawImageBuffer::from_bytes(vec![0; (w * h * 4) as usize]))
        };

        let buffer = engine.render(2, 3, 16, false, true).unwrap();
        assert_eq!(buffer.len(), 24);
        drop(engine);
        assert_eq!(calls, vec![(2, 3, 16, false, true)]);
    }
}
