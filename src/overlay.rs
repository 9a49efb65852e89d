use aeroflow::particles::DEFAULT_COUNT;
use aeroflow::solver::SimParams;

use crate::renderer::{self, FONT_HEIGHT};

/// Number of adjustable parameters.
pub const PARAM_COUNT: usize = 7;

/// Panel layout constants.
const GAUGE_WIDTH: usize = 8;

/// Overlay panel state.
pub struct OverlayState {
    pub visible: bool,
    pub selected: usize,
}

impl OverlayState {
    pub fn new() -> Self {
        Self {
            visible: false,
            selected: 0,
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn navigate(&mut self, delta: isize) {
        let count = PARAM_COUNT as isize;
        self.selected = ((self.selected as isize + delta).rem_euclid(count)) as usize;
    }
}

/// Everything the panel edits: wind parameters plus the tracer count.
#[derive(Clone, Debug, PartialEq)]
pub struct PanelValues {
    pub params: SimParams,
    pub particle_count: usize,
}

impl Default for PanelValues {
    fn default() -> Self {
        Self {
            params: SimParams::default(),
            particle_count: DEFAULT_COUNT,
        }
    }
}

/// Definition of an adjustable parameter.
pub struct ParamDef {
    pub name: &'static str,
    pub short: &'static str,
    pub desc: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub fine_step: f64,
    pub default: f64,
    pub get: fn(&PanelValues) -> f64,
    pub set: fn(&mut PanelValues, f64),
}

/// Wind parameters exposed in the panel. Booleans are edited as 0/1 and the
/// crosswind angle in degrees.
pub const PARAM_DEFS: [ParamDef; PARAM_COUNT] = [
    ParamDef {
        name: "wind",
        short: "speed",
        desc: "base wind speed in px per second",
        min: 0.0,
        max: 400.0,
        step: 5.0,
        fine_step: 1.0,
        default: 80.0,
        get: |p| p.params.base_wind_speed,
        set: |p, v| p.params.base_wind_speed = v,
    },
    ParamDef {
        name: "vort",
        short: "vortex",
        desc: "wake swirl and shedding strength",
        min: 0.0,
        max: 3.0,
        step: 0.05,
        fine_step: 0.01,
        default: 0.9,
        get: |p| p.params.vortex_strength,
        set: |p, v| p.params.vortex_strength = v,
    },
    ParamDef {
        name: "turb",
        short: "turbulence",
        desc: "noise amplitude and particle jitter",
        min: 0.0,
        max: 1.0,
        step: 0.02,
        fine_step: 0.005,
        default: 0.18,
        get: |p| p.params.turbulence,
        set: |p, v| p.params.turbulence = v,
    },
    ParamDef {
        name: "xmag",
        short: "crosswind",
        desc: "crosswind magnitude",
        min: 0.0,
        max: 200.0,
        step: 5.0,
        fine_step: 1.0,
        default: 0.0,
        get: |p| p.params.crosswind_mag,
        set: |p, v| p.params.crosswind_mag = v,
    },
    ParamDef {
        name: "xang",
        short: "angle",
        desc: "crosswind direction in degrees, 90 points down",
        min: -180.0,
        max: 180.0,
        step: 15.0,
        fine_step: 1.0,
        default: 0.0,
        get: |p| p.params.crosswind_angle.to_degrees(),
        set: |p, v| p.params.crosswind_angle = v.to_radians(),
    },
    ParamDef {
        name: "gust",
        short: "gusts",
        desc: "random particle gust impulses, 0 off 1 on",
        min: 0.0,
        max: 1.0,
        step: 1.0,
        fine_step: 1.0,
        default: 0.0,
        get: |p| if p.params.gusts_enabled { 1.0 } else { 0.0 },
        set: |p, v| p.params.gusts_enabled = v >= 0.5,
    },
    ParamDef {
        name: "pcnt",
        short: "particles",
        desc: "tracer count, reseeds on change",
        min: 0.0,
        max: 4000.0,
        step: 100.0,
        fine_step: 10.0,
        default: DEFAULT_COUNT as f64,
        get: |p| p.particle_count as f64,
        set: |p, v| p.particle_count = v.max(0.0).round() as usize,
    },
];

/// Adjust a parameter by delta steps (positive = increase, negative = decrease).
/// If `fine` is true, use fine_step instead of step.
/// Returns true if the value actually changed.
pub fn adjust_param(params: &mut PanelValues, selected: usize, delta: i32, fine: bool) -> bool {
    let def = &PARAM_DEFS[selected];
    let old = (def.get)(params);
    let step = if fine { def.fine_step } else { def.step };
    let new_val = (old + delta as f64 * step).clamp(def.min, def.max);
    (def.set)(params, new_val);
    (new_val - old).abs() > f64::EPSILON
}

/// Reset a parameter to its default value.
pub fn reset_param(params: &mut PanelValues, selected: usize) {
    let def = &PARAM_DEFS[selected];
    (def.set)(params, def.default);
}

/// Value text: whole numbers for coarse parameters, otherwise two or
/// three decimals, on/off for switches.
fn format_value(def: &ParamDef, val: f64) -> String {
    if def.max - def.min == 1.0 && def.step == 1.0 {
        return if val >= 0.5 { "on".to_string() } else { "off".to_string() };
    }
    if def.step >= 1.0 {
        format!("{:.0}", val)
    } else if def.fine_step >= 0.01 {
        format!("{:.2}", val)
    } else {
        format!("{:.3}", val)
    }
}

mod colors {
    pub const BORDER: [u8; 3] = [0x3A, 0x46, 0x52];
    pub const HEADER: [u8; 3] = [0x5A, 0xAA, 0xFF];
    pub const LABEL_NORMAL: [u8; 3] = [0x8A, 0x8A, 0x90];
    pub const LABEL_SELECTED: [u8; 3] = [0xFF, 0xFF, 0xFF];
    pub const VALUE: [u8; 3] = [0xD0, 0xD0, 0xD0];
    pub const DESC_NORMAL: [u8; 3] = [0x60, 0x60, 0x68];
    pub const DESC_SELECTED: [u8; 3] = [0xB0, 0xB0, 0xB8];
    pub const HINT: [u8; 3] = [0x50, 0x80, 0xA0];
    pub const CURSOR: [u8; 3] = [0x5A, 0xAA, 0xFF];
    pub const GAUGE_EMPTY: [u8; 3] = [0x20, 0x22, 0x28];
}

/// Write an opaque pixel, ignoring anything outside the buffer.
#[inline]
fn put(buf: &mut [u8], frame_width: usize, x: usize, y: usize, rgb: [u8; 3]) {
    let off = (y * frame_width + x) * 4;
    if let Some(px) = buf.get_mut(off..off + 4) {
        px[..3].copy_from_slice(&rgb);
        px[3] = 255;
    }
}

/// Scale the RGB of a rectangle by `factor`.
fn dim_rect(buf: &mut [u8], frame_width: usize, x0: usize, y0: usize, w: usize, h: usize, factor: f64) {
    for y in y0..y0 + h {
        for x in x0..(x0 + w).min(frame_width) {
            let off = (y * frame_width + x) * 4;
            if let Some(px) = buf.get_mut(off..off + 3) {
                for c in px.iter_mut() {
                    *c = (*c as f64 * factor) as u8;
                }
            }
        }
    }
}

fn draw_frame(buf: &mut [u8], frame_width: usize, x0: usize, y0: usize, w: usize, h: usize, rgb: [u8; 3]) {
    if w == 0 || h == 0 {
        return;
    }
    let (x1, y1) = (x0 + w - 1, y0 + h - 1);
    for x in x0..=x1 {
        put(buf, frame_width, x, y0, rgb);
        put(buf, frame_width, x, y1, rgb);
    }
    for y in y0..=y1 {
        put(buf, frame_width, x0, y, rgb);
        put(buf, frame_width, x1, y, rgb);
    }
}

/// Horizontal gauge `len` pixels wide, filled left to right by `ratio`.
fn draw_gauge(buf: &mut [u8], frame_width: usize, x: usize, y: usize, ratio: f64, len: usize, height: usize) {
    let filled = ((ratio.clamp(0.0, 1.0) * len as f64).round() as usize).min(len);
    for dx in 0..len {
        let rgb = if dx < filled {
            let t = dx as f64 / len.max(1) as f64;
            [0x20, (0x50 as f64 + t * 0x60 as f64) as u8, (0x90 as f64 + t * 0x6F as f64) as u8]
        } else {
            colors::GAUGE_EMPTY
        };
        for dy in 0..height {
            put(buf, frame_width, x + dx, y + dy, rgb);
        }
    }
}

/// Draw the parameter panel centered in the display area. No-op when hidden.
pub fn render_overlay(
    buf: &mut [u8],
    frame_width: usize,
    display_width: usize,
    display_height: usize,
    state: &OverlayState,
    params: &PanelValues,
) {
    if !state.visible {
        return;
    }

    // 5x7 glyphs scaled to 7x9.
    let cw: usize = 7;
    let ch: usize = 9;
    let step = cw + 2;
    let row_h = ch + 4;
    let pad = 10;

    // cursor(2) name(6) gauge(8) gap value(5) gap short(10)
    let panel_w = 33 * step + pad * 2;
    let panel_h = pad * 2 + row_h + 4 + PARAM_COUNT * row_h + 6 + row_h + 4 + FONT_HEIGHT + 2;

    let panel_w = panel_w.min(display_width.saturating_sub(4));
    let panel_h = panel_h.min(display_height.saturating_sub(4));
    let px = display_width.saturating_sub(panel_w) / 2;
    let py = display_height.saturating_sub(panel_h) / 2;

    dim_rect(buf, frame_width, px, py, panel_w, panel_h, 0.25);
    draw_frame(buf, frame_width, px, py, panel_w, panel_h, colors::BORDER);

    let left = px + pad;
    let mut cy = py + pad;

    renderer::draw_text_sized(buf, frame_width, left, cy, "wind parameters", colors::HEADER, cw, ch);
    cy += row_h + 4;

    for (i, def) in PARAM_DEFS.iter().enumerate() {
        let selected = i == state.selected;
        let (label, desc) = if selected {
            (colors::LABEL_SELECTED, colors::DESC_SELECTED)
        } else {
            (colors::LABEL_NORMAL, colors::DESC_NORMAL)
        };

        if selected {
            renderer::draw_text_sized(buf, frame_width, left, cy, ">", colors::CURSOR, cw, ch);
        }
        renderer::draw_text_sized(buf, frame_width, left + 2 * step, cy, def.name, label, cw, ch);

        let val = (def.get)(params);
        let span = def.max - def.min;
        let ratio = if span > 0.0 { (val - def.min) / span } else { 0.0 };
        let gauge_x = left + 8 * step;
        draw_gauge(buf, frame_width, gauge_x, cy, ratio, GAUGE_WIDTH * step, ch);

        let mut cx = gauge_x + (GAUGE_WIDTH + 1) * step;
        cx = renderer::draw_text_sized(buf, frame_width, cx, cy, &format_value(def, val), colors::VALUE, cw, ch);
        renderer::draw_text_sized(buf, frame_width, cx + step, cy, def.short, desc, cw, ch);

        cy += row_h;
    }

    cy += 6;
    let current = &PARAM_DEFS[state.selected];
    renderer::draw_text_sized(buf, frame_width, left, cy, current.desc, colors::DESC_SELECTED, cw, ch);
    cy += row_h + 4;

    renderer::draw_text(
        buf,
        frame_width,
        left,
        cy,
        "space=close  ud=nav  lr=adj  ,.=fine  r=reset",
        colors::HINT,
    );
}
