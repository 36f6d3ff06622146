use image::RgbaImage;

use super::engine::BYTES_PER_PIXEL;
use super::status::RenderStatus;

/// Pixel dimensions of a display surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of pixels
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Total size in bytes for an RGBA buffer
    pub fn buffer_size(&self) -> usize {
        self.pixel_count() * BYTES_PER_PIXEL
    }
}

/// Addressable pixel target owned by the host
pub trait DisplaySurface {
    fn size(&self) -> SurfaceSize;

    /// Change the pixel dimensions, discarding current contents
    fn resize(&mut self, size: SurfaceSize);

    /// Write `image` at the origin, clipped to the surface
    fn put_image(&mut self, image: &RgbaImage);
}

/// Host controls the orchestrator reports back to
pub trait ControlSurface {
    /// Lock or unlock every input on the surface
    fn set_interactive(&mut self, interactive: bool);

    fn set_status(&mut self, status: &RenderStatus);
}

/// Handles to the host's control and display surfaces.
/// Built once at startup and passed by reference to whoever needs them.
#[derive(Debug)]
pub struct HostContext<C, D> {
    pub control: C,
    pub display: D,
}

impl<C: ControlSurface, D: DisplaySurface> HostContext<C, D> {
    pub fn new(control: C, display: D) -> Self {
        Self { control, display }
    }
}

/// In-memory RGBA surface, used by the headless host and in tests
#[derive(Debug, Clone)]
pub struct PixelSurface {
    size: SurfaceSize,
    pixels: Vec<u8>,
    writes: usize,
}

impl PixelSurface {
    /// Create a transparent surface
    pub fn new(width: u32, height: u32) -> Self {
        let size = SurfaceSize::new(width, height);
        Self {
            size,
            pixels: vec![0; size.buffer_size()],
            writes: 0,
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Number of images written since creation
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl DisplaySurface for PixelSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
        self.pixels = vec![0; size.buffer_size()];
    }

    fn put_image(&mut self, image: &RgbaImage) {
        let cols = image.width().min(self.size.width) as usize;
        let rows = image.height().min(self.size.height) as usize;
        let src_stride = image.width() as usize * BYTES_PER_PIXEL;
        let dst_stride = self.size.width as usize * BYTES_PER_PIXEL;
        let src = image.as_raw();

        for row in 0..rows {
            let src_start = row * src_stride;
            let dst_start = row * dst_stride;
            let len = cols * BYTES_PER_PIXEL;
            self.pixels[dst_start..dst_start + len]
                .copy_from_slice(&src[src_start..src_start + len]);
        }

        self.writes += 1;
    }
}
