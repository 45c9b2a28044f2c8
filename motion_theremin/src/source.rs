//! Frame sources: where each tick's camera image comes from.
//!
//! The driver doesn't care whether pixels came from the synthetic camera or
//! a folder of stills; both hand out RGBA [`FrameBuffer`]s at the profile's
//! capture size.

use std::path::{Path, PathBuf};

use motion_core::frame::list_image_files;
use motion_core::FrameBuffer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::error::{AppError, Result};

/// Render ticks per second the sources assume when pacing themselves.
pub const TICK_HZ: f32 = 60.0;

// ════════════════════════════════════════════════════════════════════════════
// FrameSource trait
// ════════════════════════════════════════════════════════════════════════════

pub trait FrameSource {
    /// Capture size in pixels.
    fn dimensions(&self) -> (usize, usize);

    /// Step to the frame for the next tick.
    fn poll(&mut self) -> Result<()>;

    /// The frame for this tick; `None` or an empty frame means not ready.
    fn current_frame(&self) -> Option<&FrameBuffer>;

    /// Pointer position in `0..1` window coordinates, if the source reacts to it.
    fn steer(&mut self, _pointer: Option<(f32, f32)>) {}
}

// ════════════════════════════════════════════════════════════════════════════
// SimFrameSource: synthetic camera
// ════════════════════════════════════════════════════════════════════════════

/// Skin-ish colour of the simulated hand.
const HAND_RGB: [u8; 3] = [232, 188, 156];

/// A static textured scene with sensor noise and a hand that follows the
/// pointer.  With the pointer outside the window the scene is still and
/// only noise varies, which stays below every profile's change threshold.
pub struct SimFrameSource {
    width:      usize,
    height:     usize,
    background: Vec<u8>,
    frame:      FrameBuffer,
    hand:       Option<(f32, f32)>,
    noise:      u8,
    rng:        StdRng,
}

impl SimFrameSource {
    pub fn new(width: usize, height: usize, noise: u8, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None    => StdRng::from_os_rng(),
        };
        let background = backdrop(width, height);
        SimFrameSource {
            width,
            height,
            frame: FrameBuffer::from_raw(width, height, background.clone()),
            background,
            hand: None,
            noise,
            rng,
        }
    }

    /// Hand radius in pixels.
    fn radius(&self) -> f32 {
        (self.height.min(self.width) as f32 / 8.0).max(1.0)
    }
}

impl FrameSource for SimFrameSource {
    fn dimensions(&self) -> (usize, usize) { (self.width, self.height) }

    fn poll(&mut self) -> Result<()> {
        let noise = self.noise as i16;
        let r = self.radius();
        let out = self.frame.as_bytes_mut();
        out.copy_from_slice(&self.background);

        if noise > 0 {
            for px in out.chunks_exact_mut(4) {
                let d: i16 = self.rng.random_range(-noise..=noise);
                for c in &mut px[..3] {
                    *c = (*c as i16 + d).clamp(0, 255) as u8;
                }
            }
        }

        if let Some((hx, hy)) = self.hand {
            let (cx, cy) = (hx * self.width as f32, hy * self.height as f32);
            let x0 = (cx - r).floor().max(0.0) as usize;
            let y0 = (cy - r).floor().max(0.0) as usize;
            let x1 = ((cx + r).ceil() as usize).min(self.width);
            let y1 = ((cy + r).ceil() as usize).min(self.height);
            for y in y0..y1 {
                for x in x0..x1 {
                    let (dx, dy) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
                    if dx * dx + dy * dy <= r * r {
                        let i = (y * self.width + x) * 4;
                        out[i..i + 3].copy_from_slice(&HAND_RGB);
                    }
                }
            }
        }
        Ok(())
    }

    fn current_frame(&self) -> Option<&FrameBuffer> { Some(&self.frame) }

    fn steer(&mut self, pointer: Option<(f32, f32)>) {
        self.hand = pointer.filter(|(x, y)| (0.0..=1.0).contains(x) && (0.0..=1.0).contains(y));
    }
}

/// Dim diagonal gradient with a faint grid, so the feedback view has
/// something to show through the dimming.
fn backdrop(width: usize, height: usize) -> Vec<u8> {
    let mut px = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let t = (x + y) as f32 / (width + height).max(1) as f32;
            let grid = if x % 32 == 0 || y % 32 == 0 { 24 } else { 0 };
            let r = (40.0 + 50.0 * t) as u8 + grid;
            let g = (50.0 + 30.0 * t) as u8 + grid;
            let b = (90.0 - 40.0 * t) as u8 + grid;
            px.extend_from_slice(&[r, g, b, 255]);
        }
    }
    px
}

// ════════════════════════════════════════════════════════════════════════════
// SequenceFrameSource: folder of stills
// ════════════════════════════════════════════════════════════════════════════

/// Plays a directory of images in name order at `fps`, looping.
///
/// Frames are decoded one at a time as playback reaches them and resized to
/// the capture size.
pub struct SequenceFrameSource {
    files:     Vec<PathBuf>,
    width:     usize,
    height:    usize,
    step:      f32,
    clock:     f32,
    index:     usize,
    loaded:    Option<usize>,
    frame:     Option<FrameBuffer>,
}

impl SequenceFrameSource {
    pub fn open<P: AsRef<Path>>(dir: P, width: usize, height: usize, fps: f32) -> Result<Self> {
        let dir = dir.as_ref();
        let files = list_image_files(dir)?;
        if files.is_empty() {
            return Err(AppError::EmptySequence(dir.to_path_buf()));
        }
        info!("{} frames from {} at {} fps", files.len(), dir.display(), fps);
        Ok(SequenceFrameSource {
            files,
            width,
            height,
            step:   (fps / TICK_HZ).max(0.0),
            clock:  0.0,
            index:  0,
            loaded: None,
            frame:  None,
        })
    }

    pub fn len(&self) -> usize { self.files.len() }

    pub fn is_empty(&self) -> bool { self.files.is_empty() }

    /// Index of the frame currently shown.
    pub fn position(&self) -> usize { self.index }
}

impl FrameSource for SequenceFrameSource {
    fn dimensions(&self) -> (usize, usize) { (self.width, self.height) }

    fn poll(&mut self) -> Result<()> {
        if self.loaded.is_some() {
            self.clock += self.step;
            while self.clock >= 1.0 {
                self.clock -= 1.0;
                self.index = (self.index + 1) % self.files.len();
            }
        }
        if self.loaded != Some(self.index) {
            // Mark first so a bad file is skipped rather than retried every tick.
            self.loaded = Some(self.index);
            self.frame = None;
            let path = &self.files[self.index];
            debug!("loading {}", path.display());
            self.frame = Some(FrameBuffer::load(path, self.width, self.height)?);
        }
        Ok(())
    }

    fn current_frame(&self) -> Option<&FrameBuffer> { self.frame.as_ref() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, name: &str, rgb: [u8; 3]) {
        image::RgbaImage::from_pixel(8, 6, image::Rgba([rgb[0], rgb[1], rgb[2], 255]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn sim_frame_has_capture_shape() {
        let mut src = SimFrameSource::new(32, 24, 6, Some(1));
        src.poll().unwrap();
        let f = src.current_frame().unwrap();
        assert_eq!((f.width, f.height, f.len()), (32, 24, 32 * 24 * 4));
        assert_eq!(src.dimensions(), (32, 24));
    }

    #[test]
    fn sim_noise_stays_small() {
        let mut src = SimFrameSource::new(16, 16, 6, Some(7));
        src.poll().unwrap();
        let a = src.current_frame().unwrap().clone();
        src.poll().unwrap();
        let b = src.current_frame().unwrap();
        for (p, q) in a.as_bytes().chunks(4).zip(b.as_bytes().chunks(4)) {
            let diff: i32 = (0..3).map(|c| (p[c] as i32 - q[c] as i32).abs()).sum();
            assert!(diff <= 36, "noise diff {}", diff);
            assert_eq!(q[3], 255);
        }
    }

    #[test]
    fn sim_hand_follows_pointer() {
        let mut src = SimFrameSource::new(40, 40, 0, Some(3));
        src.steer(Some((0.5, 0.5)));
        src.poll().unwrap();
        let f = src.current_frame().unwrap();
        assert_eq!(f.pixel(20, 20), Some([232, 188, 156, 255]));
        assert_ne!(f.pixel(0, 0), Some([232, 188, 156, 255]));

        src.steer(Some((1.5, 0.5)));
        src.poll().unwrap();
        assert_ne!(src.current_frame().unwrap().pixel(20, 20), Some([232, 188, 156, 255]));
    }

    #[test]
    fn sequence_requires_images() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            SequenceFrameSource::open(dir.path(), 4, 3, 15.0),
            Err(AppError::EmptySequence(_))
        ));
    }

    #[test]
    fn sequence_paces_and_loops() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "000.png", [255, 0, 0]);
        write_png(dir.path(), "001.png", [0, 0, 255]);
        // 30 fps at 60 Hz: a new frame every second tick.
        let mut src = SequenceFrameSource::open(dir.path(), 4, 3, 30.0).unwrap();
        assert!(src.current_frame().is_none());

        let mut seen = Vec::new();
        for _ in 0..5 {
            src.poll().unwrap();
            seen.push(src.position());
        }
        assert_eq!(seen, vec![0, 0, 1, 1, 0]);
        assert_eq!(src.current_frame().unwrap().pixel(0, 0), Some([255, 0, 0, 255]));
    }

    #[test]
    fn unreadable_frame_is_reported_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("000.png"), b"not a png").unwrap();
        let mut src = SequenceFrameSource::open(dir.path(), 4, 3, 1.0).unwrap();
        assert!(src.poll().is_err());
        assert!(src.poll().is_ok());
        assert!(src.current_frame().is_none());
    }
}
