//! Software-rendered window using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────┬─────────────────┐
//! │                                      │  MOTION  [███ ] │
//! │   feedback image (scaled to 640×480) │  gain / cutoff  │
//! │                                      │  pitch targets  │
//! │      [press space to start audio]    │                 │
//! │                                      │  base params    │
//! │                                      │  voice settings │
//! ├──────────────────────────────────────┴─────────────────┤
//! │  status                                                │
//! │  key legend                                            │
//! └────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};
use motion_core::FrameBuffer;

use crate::error::{AppError, Result};
use crate::font;
use crate::surface::{ControlEvent, Overlay, RenderSurface};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:    usize = 900;
pub const WIN_H:    usize = 560;
pub const VIEW_W:   usize = 640;
pub const VIEW_H:   usize = 480;
const PANEL_X:      usize = VIEW_W + 16;
const STATUS_Y:     usize = VIEW_H;
const METER_W:      usize = WIN_W - PANEL_X - 16;
const METER_H:      usize = 14;
const TEXT_SCALE:   usize = 2;
const LINE_H:       usize = (font::GLYPH_H + 3) * TEXT_SCALE;
const BG_COLOR:     u32   = 0xFF101418;
const PANEL_BG:     u32   = 0xFF16213E;
const STATUS_BG:    u32   = 0xFF0F3460;
const METER_COLOR:  u32   = 0xFF00FF64;
const LABEL_COLOR:  u32   = 0xFFAADDFF;
const VALUE_COLOR:  u32   = 0xFFEEEEEE;
const DIM_TEXT:     u32   = 0xFF888888;

const PITCH_STEP_SEMITONES: f32 = 1.0;
const CUTOFF_STEP:          f32 = 1.1;
const RESONANCE_STEP:       f32 = 0.5;
const AMOUNT_STEP:          f32 = 0.05;

// ════════════════════════════════════════════════════════════════════════════
// Canvas: an ARGB framebuffer with the drawing primitives
// ════════════════════════════════════════════════════════════════════════════

pub struct Canvas {
    width:  usize,
    height: usize,
    buf:    Vec<u32>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Canvas { width, height, buf: vec![BG_COLOR; width * height] }
    }

    pub fn pixels(&self) -> &[u32] { &self.buf }

    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.buf[y * self.width + x])
    }

    pub fn clear(&mut self, color: u32) {
        self.buf.fill(color);
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < self.width && y < self.height {
            self.buf[y * self.width + x] = color;
        }
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.buf[row * self.width + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..x + w {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y + h - 1, color);
        }
        for row in y..y + h {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    /// Draw `text` with each font pixel as a `scale × scale` block.
    fn draw_text(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            if cx >= self.width { break; }
            for row in 0..font::GLYPH_H {
                for col in 0..font::GLYPH_W {
                    if font::lit(ch, col, row) {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += font::ADVANCE * scale;
        }
    }

    /// Nearest-neighbour scale `frame` into the `w × h` box at `(x, y)`.
    /// Pixels missing from a short buffer come out black.
    fn blit(&mut self, frame: &FrameBuffer, x: usize, y: usize, w: usize, h: usize) {
        if frame.width == 0 || frame.height == 0 { return; }
        for dy in 0..h.min(self.height.saturating_sub(y)) {
            let sy = dy * frame.height / h;
            for dx in 0..w.min(self.width.saturating_sub(x)) {
                let sx = dx * frame.width / w;
                let [r, g, b, _] = frame.pixel(sx, sy).unwrap_or([0, 0, 0, 255]);
                self.buf[(y + dy) * self.width + x + dx] =
                    0xFF00_0000 | ((r as u32) << 16) | ((g as u32) << 8) | b as u32;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// draw: everything for one tick
// ════════════════════════════════════════════════════════════════════════════

pub fn draw(canvas: &mut Canvas, feedback: Option<&FrameBuffer>, overlay: &Overlay<'_>) {
    canvas.clear(BG_COLOR);

    // ── Feedback view ─────────────────────────────────────────────────────
    match feedback {
        Some(frame) => canvas.blit(frame, 0, 0, VIEW_W, VIEW_H),
        None => {
            let msg = "WAITING FOR FRAMES";
            let w = font::text_width(msg) * TEXT_SCALE;
            canvas.draw_text(msg, (VIEW_W - w) / 2, VIEW_H / 2, TEXT_SCALE, DIM_TEXT);
        }
    }

    if !overlay.audio_started {
        let msg = "PRESS SPACE TO START AUDIO";
        let scale = 3;
        let w = font::text_width(msg) * scale;
        let (bx, by) = ((VIEW_W - w) / 2 - 12, VIEW_H / 2 - 30);
        canvas.fill_rect(bx, by, w + 24, 5 * scale + 24, STATUS_BG);
        canvas.draw_border(bx, by, w + 24, 5 * scale + 24, METER_COLOR);
        canvas.draw_text(msg, bx + 12, by + 12, scale, VALUE_COLOR);
    }

    // ── Side panel ────────────────────────────────────────────────────────
    canvas.fill_rect(VIEW_W, 0, WIN_W - VIEW_W, VIEW_H, PANEL_BG);
    let mut y = 16;
    panel_row(canvas, &mut y, "MOTION", &format!("{:3.0}%", overlay.motion_percent), VALUE_COLOR);

    canvas.draw_border(PANEL_X, y, METER_W, METER_H, LABEL_COLOR);
    let fill = ((overlay.motion_percent.clamp(0.0, 100.0) / 100.0) * (METER_W - 2) as f32) as usize;
    canvas.fill_rect(PANEL_X + 1, y + 1, fill, METER_H - 2, METER_COLOR);
    y += METER_H + LINE_H;

    match overlay.params {
        Some(p) => {
            let color = if p.is_silent() { DIM_TEXT } else { METER_COLOR };
            let gain = if p.is_silent() { "SILENT".to_string() } else { format!("{:+.1} DB", p.gain.db()) };
            panel_row(canvas, &mut y, "GAIN", &gain, color);
            panel_row(canvas, &mut y, "CUTOFF", &format!("{:.0} HZ", p.cutoff_hz), color);
            panel_row(canvas, &mut y, "PITCH", &format!("{:.1} HZ", p.pitch_hz), color);
        }
        None => {
            for label in ["GAIN", "CUTOFF", "PITCH"] {
                panel_row(canvas, &mut y, label, "-", DIM_TEXT);
            }
        }
    }
    y += LINE_H;

    let voice = overlay.voice;
    let profile = overlay.profile;
    let rows = [
        ("BASE CUT",   format!("{:.0} HZ", overlay.base.base_cutoff_hz)),
        ("BASE PITCH", format!("{:.1} HZ", overlay.base.base_pitch_hz)),
        ("WAVE",       voice.waveform.name().to_string()),
        ("RES",        format!("{:.1}", voice.resonance)),
        ("DIST",       format!("{:.2}", voice.distortion)),
        ("REVERB",     format!("{:.2}", voice.reverb_mix)),
        ("PROFILE",    format!("{} {}X{} /{}", profile.class.name(),
                               profile.capture_width, profile.capture_height, profile.stride)),
    ];
    for (label, value) in &rows {
        panel_row(canvas, &mut y, label, value, VALUE_COLOR);
    }

    // ── Status bar ────────────────────────────────────────────────────────
    canvas.fill_rect(0, STATUS_Y, WIN_W, WIN_H - STATUS_Y, STATUS_BG);
    canvas.draw_text(overlay.status, 10, STATUS_Y + 14, TEXT_SCALE, VALUE_COLOR);
    canvas.draw_text(
        "SPACE=START  </>=PITCH  UP/DOWN=CUTOFF  W=WAVE  R/F=RES  G/V=DIST  B/N=REVERB  Q=QUIT",
        10, WIN_H - 20, 1, DIM_TEXT,
    );
}

fn panel_row(canvas: &mut Canvas, y: &mut usize, label: &str, value: &str, color: u32) {
    canvas.draw_text(label, PANEL_X, *y, TEXT_SCALE, LABEL_COLOR);
    canvas.draw_text(value, PANEL_X + 100, *y, TEXT_SCALE, color);
    *y += LINE_H;
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    canvas: Canvas,
}

impl Visualizer {
    pub fn new() -> Result<Self> {
        let mut window = Window::new(
            "Motion Theremin",
            WIN_W, WIN_H,
            WindowOptions { resize: false, ..WindowOptions::default() },
        ).map_err(|e| AppError::Window(e.to_string()))?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer { window, canvas: Canvas::new(WIN_W, WIN_H) })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Keys pressed since the last call.
    pub fn poll_input(&mut self) -> Vec<ControlEvent> {
        let mut events = Vec::new();
        if !self.window.is_open() {
            events.push(ControlEvent::Quit);
            return events;
        }

        // Keys that trigger on first press only
        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        // Keys that repeat while held
        let held     = |k: Key| self.window.is_key_pressed(k, KeyRepeat::Yes);

        if one_shot(Key::Q) || one_shot(Key::Escape) { events.push(ControlEvent::Quit); }
        if one_shot(Key::Space) { events.push(ControlEvent::Unlock); }
        if one_shot(Key::W)     { events.push(ControlEvent::CycleWaveform); }

        let repeating = [
            (Key::Left,  ControlEvent::Transpose(-PITCH_STEP_SEMITONES)),
            (Key::Right, ControlEvent::Transpose(PITCH_STEP_SEMITONES)),
            (Key::Up,    ControlEvent::Brighten(CUTOFF_STEP)),
            (Key::Down,  ControlEvent::Brighten(1.0 / CUTOFF_STEP)),
            (Key::R,     ControlEvent::Resonance(RESONANCE_STEP)),
            (Key::F,     ControlEvent::Resonance(-RESONANCE_STEP)),
            (Key::G,     ControlEvent::Distortion(AMOUNT_STEP)),
            (Key::V,     ControlEvent::Distortion(-AMOUNT_STEP)),
            (Key::B,     ControlEvent::ReverbMix(AMOUNT_STEP)),
            (Key::N,     ControlEvent::ReverbMix(-AMOUNT_STEP)),
        ];
        events.extend(repeating.iter().filter(|(k, _)| held(*k)).map(|(_, e)| *e));
        events
    }

    /// Mouse position over the feedback view, in `0..1` coordinates.
    pub fn pointer(&self) -> Option<(f32, f32)> {
        let (x, y) = self.window.get_mouse_pos(MouseMode::Discard)?;
        let (u, v) = (x / VIEW_W as f32, y / VIEW_H as f32);
        ((0.0..1.0).contains(&u) && (0.0..1.0).contains(&v)).then_some((u, v))
    }
}

impl RenderSurface for Visualizer {
    fn present(&mut self, feedback: Option<&FrameBuffer>, overlay: &Overlay<'_>) -> Result<()> {
        draw(&mut self.canvas, feedback, overlay);
        self.window
            .update_with_buffer(self.canvas.pixels(), WIN_W, WIN_H)
            .map_err(|e| AppError::Window(e.to_string()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use motion_core::{BaseParams, ControlParameters, DeviceClass, DeviceProfile, Gain, MotionMetric};
    use motion_synth::VoiceSettings;

    fn render(feedback: Option<&FrameBuffer>, percent: f32, started: bool) -> Canvas {
        let voice = VoiceSettings::default();
        let profile = DeviceProfile::for_class(DeviceClass::Constrained, MotionMetric::Ratio);
        let overlay = Overlay {
            motion_percent: percent,
            params: Some(ControlParameters {
                gain: Gain::Db(0.0), cutoff_hz: 900.0, pitch_offset: 5.0, pitch_hz: 70.41,
            }),
            base: BaseParams::default(),
            voice: &voice,
            profile: &profile,
            status: "READY",
            audio_started: started,
        };
        let mut c = Canvas::new(WIN_W, WIN_H);
        draw(&mut c, feedback, &overlay);
        c
    }

    #[test]
    fn feedback_is_scaled_into_view() {
        let frame = FrameBuffer::filled(320, 240, [0, 255, 100, 255]);
        let c = render(Some(&frame), 0.0, true);
        assert_eq!(c.get(0, 0), Some(0xFF00FF64));
        assert_eq!(c.get(VIEW_W - 1, VIEW_H - 1), Some(0xFF00FF64));
        assert_eq!(c.get(VIEW_W, 0), Some(PANEL_BG));
    }

    #[test]
    fn short_feedback_blits_black() {
        let frame = FrameBuffer::from_raw(2, 2, vec![255; 8]);
        let c = render(Some(&frame), 0.0, true);
        assert_eq!(c.get(0, 0), Some(0xFFFFFFFF));
        assert_eq!(c.get(0, VIEW_H - 1), Some(0xFF000000));
    }

    #[test]
    fn meter_fill_tracks_percent() {
        let meter_y = 16 + LINE_H + METER_H / 2;
        let empty = render(None, 0.0, true);
        assert_eq!(empty.get(PANEL_X + 2, meter_y), Some(PANEL_BG));
        let full = render(None, 100.0, true);
        assert_eq!(full.get(PANEL_X + METER_W - 2, meter_y), Some(METER_COLOR));
        let half = render(None, 50.0, true);
        assert_eq!(half.get(PANEL_X + METER_W / 4, meter_y), Some(METER_COLOR));
        assert_eq!(half.get(PANEL_X + 3 * METER_W / 4, meter_y), Some(PANEL_BG));
    }

    #[test]
    fn start_prompt_until_unlocked() {
        let frame = FrameBuffer::black(320, 240);
        let locked = render(Some(&frame), 0.0, false);
        let unlocked = render(Some(&frame), 0.0, true);
        let prompt_px = (VIEW_W / 2, VIEW_H / 2 - 30);
        assert_eq!(locked.get(prompt_px.0, prompt_px.1), Some(METER_COLOR));
        assert_eq!(unlocked.get(prompt_px.0, prompt_px.1), Some(0xFF000000));
    }

    #[test]
    fn text_clips_at_edge() {
        let mut c = Canvas::new(10, 10);
        c.draw_text("WWWWWWWW", 0, 0, 2, 0xFFFFFFFF);
        c.draw_border(5, 5, 20, 20, 0xFFFFFFFF);
        assert_eq!(c.pixels().len(), 100);
    }
}
