use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Capture width requested from the host video source
pub const FRAME_WIDTH: u32 = 480;

/// Capture height requested from the host video source
pub const FRAME_HEIGHT: u32 = 360;

/// Bytes per pixel for `FrameFormat::ImageData` (RGBA)
pub const BYTES_PER_PIXEL: usize = 4;

/// Pixel layout of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameFormat {
    /// Tightly packed RGBA, one byte per channel
    #[serde(rename = "image-data")]
    ImageData,
}

impl Default for FrameFormat {
    fn default() -> Self {
        FrameFormat::ImageData
    }
}

/// Parameters of a single `get_frame` request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRequest {
    pub format: FrameFormat,
    pub width: u32,
    pub height: u32,
}

impl Default for FrameRequest {
    fn default() -> Self {
        Self {
            format: FrameFormat::ImageData,
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
        }
    }
}

/// One immutable snapshot of pixel data from the video source
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if data.len() != expected {
            bail!(
                "Frame buffer holds {} bytes, expected {} for {}x{} RGBA",
                data.len(),
                expected,
                width,
                height
            );
        }
        Ok(Self { width, height, data })
    }

    /// Frame where every pixel has the same RGBA value
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * BYTES_PER_PIXEL);
        for _ in 0..pixels {
            data.extend_from_slice(&rgba);
        }
        Self { width, height, data }
    }

    /// Grayscale frame built from a luma function of pixel coordinates
    pub fn from_luma_fn<F>(width: u32, height: u32, mut luma: F) -> Self
    where
        F: FnMut(u32, u32) -> u8,
    {
        let mut data = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
        for y in 0..height {
            for x in 0..width {
                let l = luma(x, y);
                data.extend_from_slice(&[l, l, l, 255]);
            }
        }
        Self { width, height, data }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}
