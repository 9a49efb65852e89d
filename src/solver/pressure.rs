use super::grid::FieldGrid;
use super::params::SimParams;
use crate::obstacle::Bounds;

/// Base Strouhal number before vortex-strength scaling.
const STROUHAL_BASE: f64 = 0.18;

/// Third pass: Bernoulli-like pressure proxy per cell with a low-pressure
/// wake behind the obstacle that deepens with local rotation.
///
/// Every value lands in `[-Vref², Vref²]`.
pub fn compute_pressure(
    grid: &mut FieldGrid,
    params: &SimParams,
    bounds: Option<Bounds>,
    vorticity: &[f64],
) {
    let v_ref = params.reference_speed();
    let v_ref2 = v_ref * v_ref;
    let wake_depth = 0.6 * params.vortex_strength * (1.0 + params.turbulence * 0.9);

    for gy in 0..grid.rows {
        for gx in 0..grid.cols {
            let i = grid.idx(gx, gy);
            let (vx, vy) = grid.velocity_at(i);
            let mut p = v_ref2 - (vx * vx + vy * vy);

            if let Some(b) = bounds {
                let (cx, cy) = grid.cell_center(gx, gy);
                let (ox, oy) = b.center();
                let (w, h) = (b.w as f64, b.h as f64);
                let rel_x = cx - ox;
                let rel_y = cy - oy;
                if rel_x > 0.0 && rel_x < (w * 4.0).max(1.0) && rel_y.abs() < h * 1.6 {
                    let down_fall = (-rel_x / (w * 1.4)).exp();
                    let lat_fall = (-(rel_y / (h * 0.55)).powi(2)).exp();
                    let local = vorticity.get(i).copied().unwrap_or(0.0).abs();
                    let boost = 1.0 + (local * 6.0).min(2.5);
                    let effect = wake_depth * down_fall * lat_fall * boost;
                    p -= (v_ref2 * 0.7).min(effect * v_ref2 * 0.45);
                }
            }

            // NaN-safe clamp: a non-finite speed collapses to the low bound.
            grid.pressure[i] = if p.is_nan() { -v_ref2 } else { p.clamp(-v_ref2, v_ref2) };
        }
    }
}

/// Estimated vortex-shedding frequency (Hz) behind the obstacle.
/// Zero when there is no obstacle.
pub fn strouhal_frequency(params: &SimParams, bounds: Option<Bounds>) -> f64 {
    match bounds {
        Some(b) if b.h > 0 => {
            let u = params.reference_speed();
            let d = b.h as f64;
            let st = (STROUHAL_BASE * (0.5 + 0.6 * params.vortex_strength.min(2.0))).clamp(0.04, 0.35);
            st * u / (d + 1e-6)
        }
        _ => 0.0,
    }
}
