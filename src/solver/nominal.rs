use super::grid::FieldGrid;
use super::params::{SimParams, Tuning};
use crate::obstacle::{ObstacleMask, SOLID_ALPHA};

/// Reference wind speed at which the raw base vector has unit scale.
const WIND_SCALE: f64 = 80.0;
/// Pixel stride of the repulsion scan.
const SCAN_STEP: usize = 2;

/// Radius (px) around each cell center scanned for obstacle pixels.
pub fn repulsion_radius(width: usize, height: usize) -> f64 {
    ((width.min(height) as f64 * 0.06).round()).max(10.0)
}

/// First pass: time-independent velocity per cell from wind, crosswind,
/// obstacle repulsion and downstream swirl. Overwrites every cell.
pub fn build_nominal(
    grid: &mut FieldGrid,
    width: usize,
    height: usize,
    params: &SimParams,
    tuning: &Tuning,
    obstacle: Option<&ObstacleMask>,
) {
    let wind_factor = params.base_wind_speed / WIND_SCALE;
    let (cw_x, cw_y) = params.crosswind();
    let radius = repulsion_radius(width, height);
    let bounds = obstacle.and_then(|m| m.bounds());
    let midline = height as f64 * 0.5;

    for gy in 0..grid.rows {
        for gx in 0..grid.cols {
            let (cx, cy) = grid.cell_center(gx, gy);

            let mut vx = 1.2 * wind_factor + cw_x * 0.01;
            let bias = if cy < midline { -0.06 } else { 0.06 };
            let mut vy = bias * wind_factor + cw_y * 0.01;

            if let Some(mask) = obstacle {
                if let Some((rx, ry)) = repulsion(mask, cx, cy, radius, width, height) {
                    vx += rx * tuning.repulsion_gain;
                    vy += ry * tuning.repulsion_gain;
                }
            }

            if let Some(b) = bounds {
                let (ox, oy) = b.center();
                if cx > ox {
                    let rel_x = (cx - ox) / (width as f64 - ox).max(1.0);
                    let swirl = (-rel_x * 3.0).exp() * params.vortex_strength;
                    let above = if cy < oy { -1.0 } else { 1.0 };
                    let phase = (cx * 0.06 + cy * 0.03).sin();
                    vx += -above * phase * swirl * 1.2;
                    vy += phase * swirl * 1.2;
                }
            }

            let mag = vx.hypot(vy) + 1e-4;
            let speed = (params.base_wind_speed * 0.8 + (mag * 160.0).min(420.0)).clamp(12.0, 600.0);
            let i = grid.idx(gx, gy);
            grid.set_velocity(i, (vx / mag * speed, vy / mag * speed));
        }
    }
}

/// Weighted mean push-away direction from solid pixels within `radius`.
/// None when no solid pixel contributes.
fn repulsion(
    mask: &ObstacleMask,
    cx: f64,
    cy: f64,
    radius: f64,
    width: usize,
    height: usize,
) -> Option<(f64, f64)> {
    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;
    if max_x < 0 || max_y < 0 {
        return None;
    }
    let sx0 = ((cx - radius).floor() as i64).max(0);
    let sy0 = ((cy - radius).floor() as i64).max(0);
    let sx1 = ((cx + radius).ceil() as i64).min(max_x);
    let sy1 = ((cy + radius).ceil() as i64).min(max_y);

    let (mut rx, mut ry, mut total) = (0.0, 0.0, 0.0);
    for sy in (sy0..=sy1).step_by(SCAN_STEP) {
        for sx in (sx0..=sx1).step_by(SCAN_STEP) {
            let a = mask.alpha_at(sx, sy);
            if a <= SOLID_ALPHA {
                continue;
            }
            let dx = cx - sx as f64;
            let dy = cy - sy as f64;
            let dist = dx.hypot(dy) + 0.001;
            let falloff = ((radius - dist) / radius).max(0.0);
            let w = falloff * falloff * (a as f64 / 255.0);
            rx += dx / dist * w;
            ry += dy / dist * w;
            total += w;
        }
    }
    (total > 0.0).then(|| (rx / total, ry / total))
}
