use std::f64::consts::TAU;

use super::grid::FieldGrid;
use super::params::{SimParams, Tuning};
use crate::obstacle::{Bounds, ObstacleMask, SURFACE_PROBE};
use crate::shaping::ShapeHistory;

/// Cheap coherent noise in roughly [-1, 1] built from three sine bands.
pub fn soft_noise(x: f64, y: f64, z: f64) -> f64 {
    (x * 0.021 + z * 0.5).sin() * 0.5
        + (y * 0.017 - z * 0.7).sin() * 0.35
        + ((x + y) * 0.012 + z * 0.25).sin() * 0.15
}

/// Radius (px) around the obstacle center inside which near-field effects act.
pub fn proximity_radius(width: usize, height: usize) -> f64 {
    (width.min(height) as f64 * 0.28).round().max(10.0)
}

/// Read-only view of everything a velocity sample depends on.
///
/// Sampling is a pure function of this view and the query point, so a
/// sampler can be shared freely across many queries in one frame.
#[derive(Clone, Copy)]
pub struct FlowSampler<'a> {
    pub grid: Option<&'a FieldGrid>,
    pub params: &'a SimParams,
    pub tuning: &'a Tuning,
    pub obstacle: Option<&'a ObstacleMask>,
    pub vorticity: &'a [f64],
    pub shapes: &'a ShapeHistory,
    pub width: usize,
    pub height: usize,
    pub time: f64,
    pub strouhal: f64,
}

/// Unit streamwise direction and its left-hand normal.
struct Frame {
    mag: f64,
    u: (f64, f64),
    o: (f64, f64),
}

impl Frame {
    fn of(v: (f64, f64)) -> Self {
        let mag = v.0.hypot(v.1) + 1e-6;
        let u = (v.0 / mag, v.1 / mag);
        Self { mag, u, o: (-u.1, u.0) }
    }
}

impl FlowSampler<'_> {
    /// Velocity at world point (x, y).
    pub fn sample(&self, x: f64, y: f64) -> (f64, f64) {
        let p = self.params;
        let (cw_x, cw_y) = p.crosswind();

        let Some(grid) = self.grid else {
            return (p.base_wind_speed.max(10.0) + cw_x, cw_y);
        };
        let (mut vx, mut vy) = grid.sample_velocity(x, y);

        // Hard wall.
        if let Some(mask) = self.obstacle {
            if mask.is_solid(x, y) {
                return (0.0, 0.0);
            }
        }

        let bounds = self.obstacle.and_then(|m| m.bounds());
        let proximity = bounds.map_or(0.0, |b| {
            let (ocx, ocy) = b.center();
            let dist = (x - ocx).hypot(y - ocy);
            let closeness = (1.0 - dist / proximity_radius(self.width, self.height)).max(0.0);
            closeness * closeness
        });

        let t = self.time;
        let noise = soft_noise(x * 0.8, y * 0.8, t * 0.6);
        let shear = soft_noise((x + 200.0) * 0.6, (y - 100.0) * 0.6, t * 0.9);

        vx += cw_x * 0.18;
        vy += cw_y * 0.18;

        // Turbulence amplitude fades toward the body.
        let gust = if p.gusts_enabled { 1.6 } else { 1.0 };
        let perturb = p.turbulence.max(0.0) * 0.9 * gust
            * (1.0 - proximity * self.tuning.turbulence_damping);

        let base = Frame::of((vx, vy));
        let wave = (t * 0.8 + (x + y) * 0.002).sin();
        vx += (base.o.0 * noise + base.u.0 * shear * 0.2) * perturb * base.mag * 0.06
            + base.u.0 * wave * perturb * 12.0;
        vy += (base.o.1 * noise + base.u.1 * shear * 0.2) * perturb * base.mag * 0.06
            + base.u.1 * wave * perturb * 12.0;

        if proximity > 0.0 {
            let keep = 1.0 - proximity * self.tuning.boundary_damping;
            vx *= keep;
            vy *= keep;

            (vx, vy) = self.near_field((vx, vy), x, y, proximity, &base);
            if let Some(mask) = self.obstacle {
                (vx, vy) = self.fin((vx, vy), mask, x, y, proximity, base.mag);
            }
        }

        if let Some(b) = bounds {
            (vx, vy) = self.shedding((vx, vy), grid, b, x, y);
        }

        self.shapes.steer(x, y, (vx, vy))
    }

    /// Lift perturbation, drag reduction and crosswind redirection near the body.
    fn near_field(&self, v: (f64, f64), x: f64, y: f64, proximity: f64, base: &Frame) -> (f64, f64) {
        let p = self.params;
        let (turb, vs) = (p.turbulence, p.vortex_strength);
        let (mut vx, mut vy) = v;

        let lift_coef = 0.00045 * vs * (1.0 + turb * 1.6);
        let lift = lift_coef * base.mag * base.mag * proximity;
        let drag_coef = 0.0009 * (1.0 + turb) * (1.0 + vs * 0.2);
        let drag = drag_coef * base.mag * proximity;

        let sign = signum0(soft_noise(x * 0.3, y * 0.3, self.time * 0.4));
        vx += base.o.0 * lift * sign;
        vy += base.o.1 * lift * sign;

        let reduce = (1.0 - drag / (base.mag + 1e-6)).max(0.0);
        vx *= reduce;
        vy *= reduce;

        let cross = p.crosswind_mag * 0.0009 * proximity;
        vx += -base.o.1 * cross;
        vy += base.o.0 * cross;
        (vx, vy)
    }

    /// Surface-following suction along the tangent plus a normal push
    /// proportional to incidence.
    fn fin(
        &self,
        v: (f64, f64),
        mask: &ObstacleMask,
        x: f64,
        y: f64,
        proximity: f64,
        base_mag: f64,
    ) -> (f64, f64) {
        let Some(surf) = mask.surface_normal(x, y) else {
            return v;
        };
        let probe = SURFACE_PROBE as f64;
        if surf.dist > probe {
            return v;
        }
        let p = self.params;
        let turb = p.turbulence;
        let (mut vx, mut vy) = v;

        let f = Frame::of(v);
        let (nx, ny) = (surf.nx, surf.ny);
        let (tx, ty) = (-ny, nx);
        let cos_t = (f.u.0 * tx + f.u.1 * ty).clamp(-1.0, 1.0);
        let near = 1.0 - surf.dist / probe;

        let fin_base = 0.14 * (1.0 + turb * 0.6) * p.vortex_strength;
        let suction = fin_base * proximity * (1.0 + cos_t) * near;
        vx += tx * suction * f.mag * 0.9;
        vy += ty * suction * f.mag * 0.9;

        let incidence = f.u.0 * nx + f.u.1 * ny;
        let push = 0.12 * incidence * proximity * near * base_mag * (0.6 + turb * 0.6);
        vx += nx * push;
        vy += ny * push;
        (vx, vy)
    }

    /// Alternating transverse kicks in the wake plus wake-core energy loss.
    fn shedding(&self, v: (f64, f64), grid: &FieldGrid, b: Bounds, x: f64, y: f64) -> (f64, f64) {
        let p = self.params;
        let (ocx, ocy) = b.center();
        let (bw, bh) = (b.w as f64, b.h as f64);
        let rel_x = x - ocx;
        let rel_y = y - ocy;
        let wake_width = (bh * 0.9).max(24.0);
        let wake_extent = (bw * 4.0).max(80.0);
        if !(rel_x > 0.0 && rel_x < wake_extent && rel_y.abs() < bh * 1.6) {
            return v;
        }

        let f = self.strouhal.max(0.0);
        let phase = (TAU * f * self.time - rel_x * 0.08).sin();
        let down_fall = (-rel_x / (bw * 1.2)).exp();
        let lat_fall = (-rel_y.abs() / (wake_width * 0.9)).exp();
        let shear = p.vortex_strength * 1.05 * down_fall * lat_fall;

        let omega = self
            .vorticity
            .get(grid.nearest_cell(x, y))
            .copied()
            .unwrap_or(0.0);
        let omega_boost = 1.0 + (omega.abs() * 10.0).min(3.0);

        let (mut vx, mut vy) = v;
        let frame = Frame::of(v);
        let inject = shear * 80.0 * 0.8 * omega_boost;
        vx += frame.o.0 * inject * phase * 0.9;
        vy += frame.o.1 * inject * phase * 0.9;

        let core = (-(rel_y / (bh * 0.45).max(1.0)).powi(2)).exp() * down_fall;
        let energy_loss = 1.0 - (0.18 * shear * (1.0 + p.turbulence)).min(0.65);
        let keep = 1.0 - core * (1.0 - energy_loss);
        (vx * keep, vy * keep)
    }
}

/// Sign with zero mapped to zero.
fn signum0(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::nominal::build_nominal;

    struct Fixture {
        grid: FieldGrid,
        params: SimParams,
        tuning: Tuning,
        mask: Option<ObstacleMask>,
        vorticity: Vec<f64>,
        shapes: ShapeHistory,
    }

    impl Fixture {
        fn new(params: SimParams, mask: Option<ObstacleMask>) -> Self {
            let tuning = Tuning::default();
            let mut grid = FieldGrid::new(400, 300, tuning.cell_size);
            build_nominal(&mut grid, 400, 300, &params, &tuning, mask.as_ref());
            let vorticity = vec![0.0; grid.cols * grid.rows];
            Self {
                grid,
                params,
                tuning,
                mask,
                vorticity,
                shapes: ShapeHistory::new(),
            }
        }

        fn sampler(&self, time: f64) -> FlowSampler<'_> {
            FlowSampler {
                grid: Some(&self.grid),
                params: &self.params,
                tuning: &self.tuning,
                obstacle: self.mask.as_ref(),
                vorticity: &self.vorticity,
                shapes: &self.shapes,
                width: 400,
                height: 300,
                time,
                strouhal: 1.5,
            }
        }
    }

    fn still() -> SimParams {
        SimParams {
            turbulence: 0.0,
            vortex_strength: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_soft_noise_range() {
        for i in 0..200 {
            let v = soft_noise(i as f64 * 13.7, i as f64 * -7.1, i as f64 * 0.3);
            assert!(v.abs() <= 1.0 + 1e-12, "noise out of range: {}", v);
        }
    }

    #[test]
    fn test_fallback_without_grid() {
        let params = SimParams {
            base_wind_speed: 4.0,
            crosswind_mag: 3.0,
            crosswind_angle: std::f64::consts::FRAC_PI_2,
            ..Default::default()
        };
        let fx = Fixture::new(params, None);
        let s = FlowSampler {
            grid: None,
            ..fx.sampler(0.0)
        };
        let (vx, vy) = s.sample(123.0, 45.0);
        assert!((vx - 10.0).abs() < 1e-9, "wind floors at 10, got {}", vx);
        assert!((vy - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_midline_scenario() {
        let fx = Fixture::new(still(), None);
        let s = fx.sampler(0.0);
        let (vx, vy) = s.sample(200.0, 150.0);
        assert!(vy.abs() < 1e-9, "midline vertical bias cancels, vy={}", vy);
        let raw = 1.2f64.hypot(0.06) + 1e-4;
        let expected = 64.0 + raw * 160.0;
        assert!((12.0..=600.0).contains(&vx));
        assert!((vx - 1.2 / raw * expected).abs() < 1e-6, "vx={}", vx);
    }

    #[test]
    fn test_deterministic_at_zero_turbulence() {
        let fx = Fixture::new(still(), None);
        let s = fx.sampler(0.0);
        let a = s.sample(77.0, 33.0);
        let b = s.sample(77.0, 33.0);
        assert_eq!(a, b);
        // No turbulence means time has no effect in open flow.
        assert_eq!(a, fx.sampler(12.5).sample(77.0, 33.0));
    }

    #[test]
    fn test_hard_wall_returns_zero() {
        let mask = ObstacleMask::rect(400, 300, 150, 120, 40, 60).unwrap();
        let params = SimParams {
            turbulence: 1.0,
            gusts_enabled: true,
            crosswind_mag: 50.0,
            ..Default::default()
        };
        let fx = Fixture::new(params, Some(mask));
        for t in [0.0, 1.3, 9.0] {
            assert_eq!(fx.sampler(t).sample(170.0, 150.0), (0.0, 0.0));
        }
    }

    #[test]
    fn test_turbulence_varies_with_time() {
        let params = SimParams {
            turbulence: 0.8,
            ..still()
        };
        let fx = Fixture::new(params, None);
        let a = fx.sampler(0.0).sample(100.0, 100.0);
        let b = fx.sampler(3.0).sample(100.0, 100.0);
        assert_ne!(a, b);
        assert!(a.0.is_finite() && a.1.is_finite());
    }

    #[test]
    fn test_boundary_damping_scales_near_body() {
        let mask = ObstacleMask::rect(400, 300, 180, 130, 40, 40).unwrap();
        let damped = Fixture::new(still(), Some(mask.clone()));
        let mut free = Fixture::new(still(), Some(mask));
        free.tuning.boundary_damping = 0.0;

        // 10px upstream of the body: inside the proximity radius, beyond the fin probe.
        let (dx, dy) = damped.sampler(0.0).sample(170.0, 150.0);
        let (fx, fy) = free.sampler(0.0).sample(170.0, 150.0);
        let closeness = 1.0 - 30.0 / proximity_radius(400, 300);
        let keep = 1.0 - 0.4 * closeness * closeness;
        assert!((dx - fx * keep).abs() < 1e-9, "dx={} fx={} keep={}", dx, fx, keep);
        assert!((dy - fy * keep).abs() < 1e-9, "dy={} fy={} keep={}", dy, fy, keep);
    }

    #[test]
    fn test_shedding_alternates() {
        let mask = ObstacleMask::rect(400, 300, 100, 130, 20, 40).unwrap();
        let params = SimParams {
            turbulence: 0.0,
            vortex_strength: 1.0,
            ..Default::default()
        };
        let fx = Fixture::new(params, Some(mask));
        let b = fx.mask.as_ref().unwrap().bounds().unwrap();
        // Peak phase at x=160 for f = 1.5 Hz, then half a period later.
        let t0 = (4.0 + std::f64::consts::FRAC_PI_2) / (TAU * 1.5);
        let t1 = t0 + 0.5 / 1.5;
        let (_, a) = fx.sampler(t0).shedding((100.0, 0.0), &fx.grid, b, 160.0, 150.0);
        let (_, c) = fx.sampler(t1).shedding((100.0, 0.0), &fx.grid, b, 160.0, 150.0);
        assert!(a > 1.0, "peak kick should be clearly positive, got {}", a);
        assert!((a + c).abs() < 1e-6, "half a period later the kick reverses: {} vs {}", a, c);
    }

    #[test]
    fn test_shedding_outside_wake_is_noop() {
        let mask = ObstacleMask::rect(400, 300, 100, 130, 20, 40).unwrap();
        let fx = Fixture::new(SimParams::default(), Some(mask));
        let b = fx.mask.as_ref().unwrap().bounds().unwrap();
        let s = fx.sampler(1.0);
        assert_eq!(s.shedding((50.0, 5.0), &fx.grid, b, 90.0, 150.0), (50.0, 5.0));
        assert_eq!(s.shedding((50.0, 5.0), &fx.grid, b, 300.0, 150.0), (50.0, 5.0));
        assert_eq!(s.shedding((50.0, 5.0), &fx.grid, b, 150.0, 260.0), (50.0, 5.0));
    }

    #[test]
    fn test_fin_steers_along_surface() {
        let mask = ObstacleMask::rect(400, 300, 0, 150, 400, 150).unwrap();
        let fx = Fixture::new(SimParams::default(), Some(mask));
        let m = fx.mask.as_ref().unwrap();
        // Flow running parallel to a floor just below the point.
        let (vx, vy) = fx.sampler(0.0).fin((100.0, 0.0), m, 200.0, 149.0, 1.0, 100.0);
        assert!(vx.is_finite() && vy.is_finite());
        assert!((vx, vy) != (100.0, 0.0), "fin should act within the probe distance");
        // Far from any surface nothing happens.
        assert_eq!(fx.sampler(0.0).fin((100.0, 0.0), m, 200.0, 60.0, 1.0, 100.0), (100.0, 0.0));
    }

    #[test]
    fn test_shaping_stroke_applies_last() {
        let mut fx = Fixture::new(still(), None);
        fx.shapes.start(200.0, 100.0);
        fx.shapes.append(200.0, 200.0);
        fx.shapes.end();
        let (vx, vy) = fx.sampler(0.0).sample(200.0, 140.0);
        assert!(vy > 50.0, "stroke should turn the flow downward, got ({}, {})", vx, vy);
    }

    #[test]
    fn test_outside_canvas_stays_finite() {
        let mask = ObstacleMask::rect(200, 200, 50, 50, 20, 20).unwrap();
        let fx = Fixture::new(SimParams::default(), Some(mask));
        for &(x, y) in &[(-500.0, -500.0), (1e6, 3.0), (399.0, 299.0)] {
            let (vx, vy) = fx.sampler(2.0).sample(x, y);
            assert!(vx.is_finite() && vy.is_finite(), "({}, {}) -> ({}, {})", x, y, vx, vy);
        }
    }
}
