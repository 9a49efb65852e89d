mod color;
mod font;

// Re-export public API
pub use color::StreakColor;
pub use font::render_status;
pub(crate) use font::{draw_text, draw_text_sized, FONT_HEIGHT, STATUS_BAR_HEIGHT};

use crate::state::FrameSnapshot;

/// Smallest drawable area; tiny windows are padded up to this.
const MIN_DISPLAY: usize = 64;
/// Longest particle streak in pixels.
const MAX_STREAK: f64 = 18.0;

const BACKGROUND: [u8; 3] = [0x10, 0x12, 0x18];
const OBSTACLE: [f64; 3] = [0x3A as f64, 0x3C as f64, 0x44 as f64];
const STROKE: [f64; 3] = [0.0, 200.0, 200.0];

/// Dynamic render layout computed from window pixel size.
pub struct RenderConfig {
    pub display_width: usize,
    pub display_height: usize,
    pub frame_width: usize,
    pub frame_height: usize,
}

impl RenderConfig {
    /// Lay out a frame of exactly `pixel_width` x `pixel_height` (or the
    /// minimum), with the status bar taken from the bottom.
    pub fn fit(pixel_width: usize, pixel_height: usize) -> Self {
        let display_width = pixel_width.max(MIN_DISPLAY);
        let display_height = pixel_height.saturating_sub(STATUS_BAR_HEIGHT).max(MIN_DISPLAY / 2);
        Self {
            display_width,
            display_height,
            frame_width: display_width,
            frame_height: display_height + STATUS_BAR_HEIGHT,
        }
    }
}

/// Per-frame drawing switches toggled from the keyboard.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
    pub pressure_tint: bool,
    pub streak_color: StreakColor,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            pressure_tint: false,
            streak_color: StreakColor::Mono,
        }
    }
}

// Screen blend: 1 - (1-bg)(1-fg*alpha). Never darkens.
#[inline]
fn screen_blend(buf: &mut [u8], off: usize, c: [f64; 3], alpha: f64) {
    for k in 0..3 {
        let b = buf[off + k] as f64;
        let f = (c[k] * alpha).min(255.0);
        buf[off + k] = (b + f - b * f / 255.0).min(255.0) as u8;
    }
}

// Linear mix toward `c` by `alpha`.
#[inline]
fn mix(buf: &mut [u8], off: usize, c: [f64; 3], alpha: f64) {
    for k in 0..3 {
        let b = buf[off + k] as f64;
        buf[off + k] = (b + (c[k] - b) * alpha).clamp(0.0, 255.0) as u8;
    }
}

/// Bresenham line from (x0,y0) to (x1,y1), clipped to the display area.
fn draw_line_blended(
    buf: &mut [u8],
    cfg: &RenderConfig,
    (x0, y0): (isize, isize),
    (x1, y1): (isize, isize),
    color: [f64; 3],
    alpha: f64,
) {
    let (dw, dh) = (cfg.display_width as isize, cfg.display_height as isize);
    let mut cx = x0;
    let mut cy = y0;
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx: isize = if x0 < x1 { 1 } else { -1 };
    let sy: isize = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if cx >= 0 && cx < dw && cy >= 0 && cy < dh {
            let off = (cy as usize * cfg.frame_width + cx as usize) * 4;
            screen_blend(buf, off, color, alpha);
        }
        if cx == x1 && cy == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            cx += sx;
        }
        if e2 <= dx {
            err += dx;
            cy += sy;
        }
    }
}

/// Streak length for a particle moving at `speed` px/s.
pub fn streak_length(speed: f64) -> f64 {
    if speed.is_finite() {
        (2.0 + 0.06 * speed).min(MAX_STREAK)
    } else {
        2.0
    }
}

/// Render background, obstacle, strokes and particle streaks into a
/// pre-allocated RGBA buffer. The buffer is resized as needed.
pub fn render_into(buf: &mut Vec<u8>, snap: &FrameSnapshot, cfg: &RenderConfig, opts: RenderOptions) {
    let dw = cfg.display_width;
    let dh = cfg.display_height;
    let fw = cfg.frame_width;
    buf.resize(fw * cfg.frame_height * 4, 0);

    // Display pixels per canvas pixel.
    let sx = if snap.width > 0 { dw as f64 / snap.width as f64 } else { 1.0 };
    let sy = if snap.height > 0 { dh as f64 / snap.height as f64 } else { 1.0 };

    for y in 0..dh {
        let cy = (y as f64 + 0.5) / sy;
        for x in 0..dw {
            let cx = (x as f64 + 0.5) / sx;
            let off = (y * fw + x) * 4;
            if opts.pressure_tint {
                let t = color::pressure_to_unit(snap.pressure_at(cx, cy), snap.pressure_scale);
                let c = color::diverging_rgba(t);
                // Keep the tint dim so streaks stay readable.
                for k in 0..3 {
                    buf[off + k] = (BACKGROUND[k] as f64 * 0.6 + c[k] as f64 * 0.35) as u8;
                }
            } else {
                buf[off..off + 3].copy_from_slice(&BACKGROUND);
            }
            buf[off + 3] = 255;

            if let Some(mask) = &snap.obstacle {
                let a = mask.alpha_at(cx as i64, cy as i64);
                if a > 0 {
                    mix(buf, off, OBSTACLE, a as f64 / 255.0);
                }
            }
        }
    }

    let to_screen = |x: f64, y: f64| ((x * sx).round() as isize, (y * sy).round() as isize);

    for shape in &snap.shapes {
        for seg in shape.points.windows(2) {
            let a = to_screen(seg[0].0, seg[0].1);
            let b = to_screen(seg[1].0, seg[1].1);
            let alpha = if shape.closed { 0.45 } else { 0.8 };
            draw_line_blended(buf, cfg, a, b, STROKE, alpha);
        }
    }

    let streak = opts.streak_color.rgb();
    for p in &snap.particles {
        let speed = p.speed();
        if !p.x.is_finite() || !p.y.is_finite() {
            continue;
        }
        let len = streak_length(speed);
        let (ux, uy) = if speed > 1e-6 { (p.vx / speed, p.vy / speed) } else { (1.0, 0.0) };
        let head = to_screen(p.x, p.y);
        let tail = to_screen(p.x - ux * len, p.y - uy * len);
        draw_line_blended(buf, cfg, tail, head, streak, 0.55);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aeroflow::particles::Particle;
    use aeroflow::shaping::DynamicShape;
    use aeroflow::ObstacleMask;
    use std::sync::Arc;

    fn blank_snapshot(w: usize, h: usize) -> FrameSnapshot {
        let mut snap = FrameSnapshot::new_empty(0);
        snap.width = w;
        snap.height = h;
        snap
    }

    fn pixel(buf: &[u8], cfg: &RenderConfig, x: usize, y: usize) -> [u8; 3] {
        let off = (y * cfg.frame_width + x) * 4;
        [buf[off], buf[off + 1], buf[off + 2]]
    }

    #[test]
    fn test_fit_reserves_status_bar() {
        let cfg = RenderConfig::fit(800, 450);
        assert_eq!(cfg.frame_width, 800);
        assert_eq!(cfg.frame_height, 450);
        assert_eq!(cfg.display_height, 450 - STATUS_BAR_HEIGHT);
    }

    #[test]
    fn test_fit_minimum() {
        let cfg = RenderConfig::fit(0, 0);
        assert!(cfg.display_width >= MIN_DISPLAY);
        assert!(cfg.display_height > 0);
    }

    #[test]
    fn test_streak_length_capped() {
        assert_eq!(streak_length(0.0), 2.0);
        assert!((streak_length(100.0) - 8.0).abs() < 1e-12);
        assert_eq!(streak_length(10_000.0), 18.0);
        assert_eq!(streak_length(f64::NAN), 2.0);
    }

    #[test]
    fn test_empty_frame_is_background() {
        let cfg = RenderConfig::fit(100, 80);
        let snap = blank_snapshot(100, cfg.display_height);
        let mut buf = Vec::new();
        render_into(&mut buf, &snap, &cfg, RenderOptions::default());
        assert_eq!(buf.len(), cfg.frame_width * cfg.frame_height * 4);
        assert_eq!(pixel(&buf, &cfg, 50, 30), BACKGROUND);
    }

    #[test]
    fn test_streak_trails_behind_velocity() {
        let cfg = RenderConfig::fit(100, 80);
        let mut snap = blank_snapshot(100, cfg.display_height);
        snap.particles.push(Particle { x: 50.0, y: 30.0, vx: 200.0, vy: 0.0, age: 0.0 });
        let mut buf = Vec::new();
        render_into(&mut buf, &snap, &cfg, RenderOptions::default());
        // Speed 200 gives a 14px streak ending at the particle.
        assert_ne!(pixel(&buf, &cfg, 40, 30), BACKGROUND, "tail should be drawn upstream");
        assert_eq!(pixel(&buf, &cfg, 56, 30), BACKGROUND, "nothing ahead of the particle");
    }

    #[test]
    fn test_obstacle_is_filled() {
        let cfg = RenderConfig::fit(100, 80);
        let mut snap = blank_snapshot(100, cfg.display_height);
        let mask = ObstacleMask::rect(100, cfg.display_height, 20, 20, 20, 20).unwrap();
        snap.obstacle = Some(Arc::new(mask));
        let mut buf = Vec::new();
        render_into(&mut buf, &snap, &cfg, RenderOptions::default());
        assert_eq!(pixel(&buf, &cfg, 30, 30), [0x3A, 0x3C, 0x44]);
        assert_eq!(pixel(&buf, &cfg, 70, 30), BACKGROUND);
    }

    #[test]
    fn test_pressure_tint_changes_background() {
        let cfg = RenderConfig::fit(60, 60);
        let mut snap = blank_snapshot(60, cfg.display_height);
        snap.cols = 2;
        snap.rows = 2;
        snap.cell_size = 40;
        snap.pressure_scale = 100.0;
        snap.pressure = vec![100.0, -100.0, 100.0, -100.0];
        let mut tinted = Vec::new();
        render_into(
            &mut tinted,
            &snap,
            &cfg,
            RenderOptions { pressure_tint: true, ..Default::default() },
        );
        let left = pixel(&tinted, &cfg, 5, 5);
        let right = pixel(&tinted, &cfg, 50, 5);
        assert!(left[0] > right[0], "high pressure should read redder: {:?} vs {:?}", left, right);
        assert!(right[2] > left[2], "low pressure should read bluer: {:?} vs {:?}", left, right);
    }

    #[test]
    fn test_strokes_drawn() {
        let cfg = RenderConfig::fit(100, 80);
        let mut snap = blank_snapshot(100, cfg.display_height);
        snap.shapes.push(DynamicShape {
            points: vec![(10.0, 10.0), (80.0, 10.0)],
            closed: false,
        });
        let mut buf = Vec::new();
        render_into(&mut buf, &snap, &cfg, RenderOptions::default());
        assert_ne!(pixel(&buf, &cfg, 45, 10), BACKGROUND);
    }
}
