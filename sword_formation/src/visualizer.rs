//! Software-rendered 3-D view using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ (status pill)                              ┌───────────┐ │
//! │                                            │ detector  │ │
//! │                                            └───────────┘ │
//! │                   blades, projected through              │
//! │                   the smoothed camera pose               │
//! │                                                          │
//! │                         TITLE                            │
//! │                         hint                             │
//! │ key legend                                               │
//! └──────────────────────────────────────────────────────────┘
//! ```

use std::sync::mpsc::Sender;
use std::time::Duration;

use formation_core::{CameraPose, FormationPoint, Viewport};
use formation_core::synthetic::HandShape;
use glam::Vec3;
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::app::AppState;
use crate::error::AppError;
use crate::overlay::{self, TITLE};
use crate::source::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W: usize = 960;
pub const WIN_H: usize = 600;

const BG_COLOR:    u32 = 0xFF05070D;
const PILL_BG:     u32 = 0xFF14161C;
const MARKER:      u32 = 0xFFFFFFFF;
const LEGEND:      u32 = 0xFF777777;
const HINT:        u32 = 0xFFBBBBBB;

const SOURCE_W: usize = 105;
const SOURCE_H: usize = 80;

/// Vertical field of view, radians.
const FOV_Y: f32 = 60.0 * std::f32::consts::PI / 180.0;
const NEAR: f32 = 0.5;
const BLADE_LEN: f32 = 1.6;
const NUDGE: f32 = 0.01;

// ════════════════════════════════════════════════════════════════════════════
// Projector
// ════════════════════════════════════════════════════════════════════════════

/// Pinhole projection for one camera pose, y up in world, y down on screen.
#[derive(Clone, Copy, Debug)]
pub struct Projector {
    eye:     Vec3,
    right:   Vec3,
    up:      Vec3,
    forward: Vec3,
    focal:   f32,
    cx:      f32,
    cy:      f32,
}

impl Projector {
    pub fn new(pose: &CameraPose, width: usize, height: usize) -> Self {
        let forward = (pose.look_at - pose.position).try_normalize().unwrap_or(Vec3::NEG_Z);
        let right = forward.cross(Vec3::Y).try_normalize().unwrap_or(Vec3::X);
        Projector {
            eye: pose.position,
            right,
            up: right.cross(forward),
            forward,
            focal: height as f32 * 0.5 / (FOV_Y * 0.5).tan(),
            cx: width as f32 * 0.5,
            cy: height as f32 * 0.5,
        }
    }

    /// Screen position and view depth, or `None` behind the near plane.
    pub fn project(&self, p: Vec3) -> Option<(f32, f32, f32)> {
        let d = p - self.eye;
        let depth = d.dot(self.forward);
        if !(depth >= NEAR) {
            return None;
        }
        let k = self.focal / depth;
        Some((self.cx + d.dot(self.right) * k, self.cy - d.dot(self.up) * k, depth))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf:    Vec<u32>,
    sim_tx: Sender<SimInput>,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>) -> Result<Self, AppError> {
        let mut window = Window::new(
            "Sword Formation",
            WIN_W, WIN_H,
            WindowOptions { resize: false, ..WindowOptions::default() },
        )
        .map_err(|e| AppError::Window(e.to_string()))?;

        window.limit_update_rate(Some(Duration::from_millis(16)));

        Ok(Visualizer { window, buf: vec![BG_COLOR; WIN_W * WIN_H], sim_tx })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    pub fn viewport(&self) -> Viewport {
        let (w, h) = self.window.get_size();
        Viewport::new(w as u32, h as u32)
    }

    /// Poll the keyboard and forward simulator input.  Returns false on quit.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        let held     = |k: Key| self.window.is_key_down(k);

        let mut inputs = Vec::new();
        if one_shot(Key::Q) || one_shot(Key::Escape) {
            let _ = self.sim_tx.send(SimInput::Quit);
            return false;
        }
        for (key, shape) in [
            (Key::Key1, HandShape::Point),
            (Key::Key2, HandShape::OpenPalm),
            (Key::Key3, HandShape::Fist),
            (Key::Key4, HandShape::Horns),
        ] {
            if one_shot(key) { inputs.push(SimInput::Shape(shape)); }
        }
        if one_shot(Key::H) { inputs.push(SimInput::ToggleHidden); }

        let mut dx = 0.0;
        let mut dy = 0.0;
        if held(Key::Left)  { dx -= NUDGE; }
        if held(Key::Right) { dx += NUDGE; }
        if held(Key::Up)    { dy -= NUDGE; }
        if held(Key::Down)  { dy += NUDGE; }
        if dx != 0.0 || dy != 0.0 { inputs.push(SimInput::Nudge { dx, dy }); }

        for input in inputs {
            let _ = self.sim_tx.send(input);
        }
        true
    }

    /// Render one frame.
    pub fn render(&mut self, app: &AppState) {
        self.buf.fill(BG_COLOR);

        let state = app.state();
        let pose = app.camera_pose();
        let proj = Projector::new(&pose, WIN_W, WIN_H);
        let color = overlay::mode_color(state.gesture_mode);

        // ── Blades, far to near ───────────────────────────────────────────
        let mut blades: Vec<(f32, &FormationPoint)> = state
            .formation
            .points
            .iter()
            .filter_map(|p| proj.project(p.position).map(|(_, _, z)| (z, p)))
            .collect();
        blades.sort_by(|a, b| b.0.total_cmp(&a.0));
        for (depth, blade) in blades {
            let half = blade.heading * (BLADE_LEN * 0.5);
            let (Some(a), Some(b)) = (proj.project(blade.position - half), proj.project(blade.position + half)) else {
                continue;
            };
            let shade = (1.3 - depth / 120.0).clamp(0.35, 1.0);
            self.draw_line(a.0, a.1, b.0, b.1, blend(BG_COLOR, color, shade));
            self.set_pixel_f(b.0, b.1, blend(color, MARKER, 0.6));
        }

        // ── Hand marker ───────────────────────────────────────────────────
        if let Some((x, y, _)) = app.hand_marker().and_then(|m| proj.project(m)) {
            self.draw_diamond(x as isize, y as isize, 5, MARKER);
        }

        // ── Status pill ───────────────────────────────────────────────────
        let hud = app.overlay();
        let report = app.report();
        self.fill_rect(10, 10, 240, 24, PILL_BG);
        self.draw_text(hud.status, 20, 15, 2, hud.status_color);
        let counts = format!("BLADES {}  {}", report.blade_count, if report.fresh { "LIVE" } else { "HOLD" });
        self.draw_text(&counts, 12, 40, 1, LEGEND);

        // ── Detector indicator ────────────────────────────────────────────
        let sx = WIN_W - SOURCE_W - 10;
        self.fill_rect(sx, 10, SOURCE_W, SOURCE_H, PILL_BG);
        let border = overlay::source_color(app.source_ready());
        self.draw_border(sx, 10, SOURCE_W, SOURCE_H, border);
        self.draw_border(sx + 1, 11, SOURCE_W - 2, SOURCE_H - 2, border);
        self.draw_text("DETECTOR", sx + 8, 14, 1, border);

        // ── Title, hint, legend ───────────────────────────────────────────
        self.draw_text_centered(TITLE, WIN_H - 80, 3, hud.title_color);
        self.draw_text_centered(hud.hint, WIN_H - 54, 2, HINT);
        self.draw_text(
            "1=POINT 2=PALM 3=FIST 4=HORNS  ARROWS=MOVE  H=HIDE  Q=QUIT",
            10, WIN_H - 14, 1, LEGEND,
        );

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(WIN_H) {
            let start = row * WIN_W;
            for px in &mut self.buf[start + x.min(WIN_W)..start + (x + w).min(WIN_W)] {
                *px = color;
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

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    fn set_pixel_f(&mut self, x: f32, y: f32, color: u32) {
        if x >= 0.0 && y >= 0.0 {
            self.set_pixel(x as usize, y as usize, color);
        }
    }

    /// DDA line; off-screen pixels are dropped.
    fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: u32) {
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().min(4096.0) as usize;
        if steps == 0 {
            self.set_pixel_f(x0, y0, color);
            return;
        }
        let (sx, sy) = ((x1 - x0) / steps as f32, (y1 - y0) / steps as f32);
        for i in 0..=steps {
            self.set_pixel_f(x0 + sx * i as f32, y0 + sy * i as f32, color);
        }
    }

    fn draw_diamond(&mut self, cx: isize, cy: isize, r: isize, color: u32) {
        for dy in -r..=r {
            let dx = r - dy.abs();
            for (x, y) in [(cx + dx, cy + dy), (cx - dx, cy + dy)] {
                if x >= 0 && y >= 0 {
                    self.set_pixel(x as usize, y as usize, color);
                }
            }
        }
    }

    fn draw_text(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let bits = glyph(ch);
            for row in 0..5 {
                for col in 0..3 {
                    if bits & (1 << (14 - (row * 3 + col))) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale;
            if cx >= WIN_W { break; }
        }
    }

    fn draw_text_centered(&mut self, text: &str, y: usize, scale: usize, color: u32) {
        let width = text.chars().count() * 4 * scale;
        self.draw_text(text, WIN_W.saturating_sub(width) / 2, y, scale, color);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// 3×5 bitmap font, packed row-major into the low 15 bits (top-left = bit 14)
// ────────────────────────────────────────────────────────────────────────────

const GLYPHS: &[(char, u16)] = &[
    (' ', 0x0000), ('!', 0x2482), ('(', 0x2922), (')', 0x224a), ('+', 0x05d0),
    (',', 0x0014), ('-', 0x01c0), ('.', 0x0002), ('/', 0x12a4), ('0', 0x7b6f),
    ('1', 0x2c97), ('2', 0x73e7), ('3', 0x73cf), ('4', 0x5bc9), ('5', 0x79cf),
    ('6', 0x79ef), ('7', 0x7249), ('8', 0x7bef), ('9', 0x7bcf), (':', 0x0410),
    ('<', 0x1511), ('=', 0x0e38), ('>', 0x4454), ('A', 0x7bed), ('B', 0x6bae),
    ('C', 0x7927), ('D', 0x6b6e), ('E', 0x79e7), ('F', 0x79e4), ('G', 0x796f),
    ('H', 0x5bed), ('I', 0x7497), ('J', 0x126f), ('K', 0x5bad), ('L', 0x4927),
    ('M', 0x5f6d), ('N', 0x7b6d), ('O', 0x7b6f), ('P', 0x7be4), ('Q', 0x7b79),
    ('R', 0x6bad), ('S', 0x79cf), ('T', 0x7492), ('U', 0x5b6f), ('V', 0x5b52),
    ('W', 0x5b7d), ('X', 0x5aad), ('Y', 0x5bd2), ('Z', 0x72a7),
];

/// Unknown characters render as a centred dot.
fn glyph(c: char) -> u16 {
    let c = c.to_ascii_uppercase();
    GLYPHS
        .binary_search_by_key(&c, |&(k, _)| k)
        .map(|i| GLYPHS[i].1)
        .unwrap_or(0x0080)
}

/// Mix two ARGB colours; `t` = 0 gives `a`, 1 gives `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    [16u32, 8, 0].iter().fold(0xFF00_0000, |out, &shift| {
        let ca = ((a >> shift) & 0xFF) as f32;
        let cb = ((b >> shift) & 0xFF) as f32;
        out | (((ca + (cb - ca) * t).round() as u32) << shift)
    })
}
