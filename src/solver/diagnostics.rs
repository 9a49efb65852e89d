use super::grid::FieldGrid;
use super::params::SimParams;
use crate::obstacle::{ObstacleMask, SOLID_ALPHA};

/// Aerodynamic readout integrated over the obstacle silhouette.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Diagnostics {
    /// Drag coefficient (streamwise, +x).
    pub drag_coefficient: f64,
    /// Lift coefficient (positive up, i.e. -y on screen).
    pub lift_coefficient: f64,
    /// Yaw moment about the bounding-box center.
    pub yaw_moment: f64,
    /// Pressure-weighted centroid of the surface samples.
    pub center_of_pressure: (f64, f64),
    /// Bounding-box center used as the moment reference.
    pub center_of_geometry: (f64, f64),
    /// Estimated shedding frequency (Hz); zero without shedding.
    pub strouhal_hz: f64,
    pub reference_speed: f64,
    /// Opaque pixel count used as projected area.
    pub area: usize,
}

impl Diagnostics {
    /// Center of pressure relative to the bounding-box center.
    pub fn cp_offset(&self) -> (f64, f64) {
        (
            self.center_of_pressure.0 - self.center_of_geometry.0,
            self.center_of_pressure.1 - self.center_of_geometry.1,
        )
    }
}

/// Pressure proxy at a world point; zero before the grid exists.
pub fn sample_pressure(grid: Option<&FieldGrid>, x: f64, y: f64) -> f64 {
    grid.map_or(0.0, |g| g.sample_pressure(x, y))
}

/// Integrate pressure times outward normal over every opaque pixel.
///
/// Returns None when there is no obstacle or it has no solid pixels.
pub fn compute_diagnostics(
    mask: Option<&ObstacleMask>,
    grid: Option<&FieldGrid>,
    params: &SimParams,
    strouhal_hz: f64,
) -> Option<Diagnostics> {
    let mask = mask?;
    let b = mask.bounds()?;
    let v_ref = params.reference_speed();
    let cg = b.center();

    let (mut force_x, mut force_y) = (0.0, 0.0);
    let (mut sum_p, mut cp_x, mut cp_y) = (0.0, 0.0, 0.0);
    let mut yaw = 0.0;
    let mut count = 0usize;

    let x_end = (b.x + b.w).min(mask.width());
    let y_end = (b.y + b.h).min(mask.height());
    for y in b.y..y_end {
        for x in b.x..x_end {
            let (ix, iy) = (x as i64, y as i64);
            if mask.alpha_at(ix, iy) <= SOLID_ALPHA {
                continue;
            }
            let (gx, gy) = mask.alpha_gradient(ix, iy);
            let len = gx.hypot(gy) + 1e-8;
            let (nx, ny) = (gx / len, gy / len);

            let (xf, yf) = (x as f64, y as f64);
            let p = sample_pressure(grid, xf, yf);
            force_x += p * nx;
            force_y += p * ny;
            sum_p += p;
            cp_x += p * xf;
            cp_y += p * yf;
            yaw += p * ny * (xf - cg.0);
            count += 1;
        }
    }

    let center_of_pressure = if sum_p != 0.0 {
        (cp_x / sum_p, cp_y / sum_p)
    } else {
        cg
    };
    let area = count.max(1);
    let q = 0.5 * v_ref * v_ref;
    let norm = q * area as f64;

    Some(Diagnostics {
        drag_coefficient: force_x / norm,
        lift_coefficient: -force_y / norm,
        yaw_moment: yaw,
        center_of_pressure,
        center_of_geometry: cg,
        strouhal_hz,
        reference_speed: v_ref,
        area: count,
    })
}
