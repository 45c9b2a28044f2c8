//! RGBA pixel buffers exchanged between frame sources, the detector and the
//! render surface.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;

use crate::error::{CoreError, Result};

/// Bytes per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// File extensions treated as still frames.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

/// A `width × height` RGBA image, row-major, top-left origin.
///
/// The detector never trusts `pixels.len()` to equal `width × height × 4`:
/// buffers built with [`FrameBuffer::from_raw`] may be short, and any pixel
/// whose offset falls outside the data is skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width:  usize,
    pub height: usize,
    pixels:     Vec<u8>,
}

impl FrameBuffer {
    /// An opaque black frame.
    pub fn black(width: usize, height: usize) -> Self {
        Self::filled(width, height, [0, 0, 0, 255])
    }

    /// A frame with every pixel set to `rgba`.
    pub fn filled(width: usize, height: usize, rgba: [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity(width * height * CHANNELS);
        for _ in 0..width * height {
            pixels.extend_from_slice(&rgba);
        }
        FrameBuffer { width, height, pixels }
    }

    /// Wrap RGBA data, checking its length against the dimensions.
    pub fn from_rgba(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self> {
        if pixels.len() != width * height * CHANNELS {
            return Err(CoreError::FrameShape { width, height, len: pixels.len() });
        }
        Ok(FrameBuffer { width, height, pixels })
    }

    /// Wrap RGBA data without checking its length.
    pub fn from_raw(width: usize, height: usize, pixels: Vec<u8>) -> Self {
        FrameBuffer { width, height, pixels }
    }

    /// Load an image from disk, resized to exactly `width × height`.
    pub fn load<P: AsRef<Path>>(path: P, width: usize, height: usize) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| CoreError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = img
            .resize_exact(width as u32, height as u32, FilterType::Triangle)
            .to_rgba8();
        Self::from_rgba(width, height, rgba.into_raw())
    }

    /// True when there is nothing to score: no data or a zero dimension.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty() || self.width == 0 || self.height == 0
    }

    pub fn len(&self) -> usize { self.pixels.len() }

    pub fn as_bytes(&self) -> &[u8] { &self.pixels }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] { &mut self.pixels }

    /// True when both frames have the same dimensions and byte length.
    pub fn same_shape(&self, other: &FrameBuffer) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.pixels.len() == other.pixels.len()
    }

    /// The pixel at `(x, y)`, if it lies inside both the dimensions and the data.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * CHANNELS;
        self.pixels
            .get(i..i + CHANNELS)
            .map(|p| [p[0], p[1], p[2], p[3]])
    }

    /// Reshape to `width × height`, reusing the allocation, and fill with `rgba`.
    pub fn reset(&mut self, width: usize, height: usize, rgba: [u8; 4]) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.reserve(width * height * CHANNELS);
        for _ in 0..width * height {
            self.pixels.extend_from_slice(&rgba);
        }
    }

    /// Overwrite this buffer with a copy of `other`, reallocating if needed.
    pub fn copy_from(&mut self, other: &FrameBuffer) {
        self.width = other.width;
        self.height = other.height;
        self.pixels.clear();
        self.pixels.extend_from_slice(&other.pixels);
    }

    /// Pack into `0xAARRGGBB` words for a software framebuffer.
    pub fn write_argb(&self, out: &mut Vec<u32>) {
        out.clear();
        out.extend(self.pixels.chunks_exact(CHANNELS).map(|p| {
            ((p[3] as u32) << 24) | ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32
        }));
    }
}

/// Image files directly inside `dir`, sorted by name.
pub fn list_image_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut frames: Vec<PathBuf> = std::fs::read_dir(dir.as_ref())?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_image(p))
        .collect();
    frames.sort();
    Ok(frames)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
        .unwrap_or(false)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
