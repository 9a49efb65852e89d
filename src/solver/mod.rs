pub mod diagnostics;
pub mod grid;
pub mod nominal;
pub mod params;
pub mod pressure;
pub mod sampler;
pub mod vorticity;

pub use diagnostics::Diagnostics;
pub use grid::FieldGrid;
pub use params::{ParamsUpdate, SimParams, Tuning};
pub use sampler::FlowSampler;

use std::sync::Arc;
use std::time::Instant;

use crate::obstacle::ObstacleMask;
use crate::shaping::{DynamicShape, ShapeHistory};
use nominal::build_nominal;
use pressure::{compute_pressure, strouhal_frequency};
use vorticity::inject_vorticity_feedback;

/// Owned flow-field context: grid, parameters, obstacle, clock and strokes.
///
/// Queries take `&self` and never mutate; the three-pass rebuild runs only
/// on parameter or obstacle changes, or when the caller asks for it after
/// a resize.
#[derive(Clone, Debug)]
pub struct FlowField {
    width: usize,
    height: usize,
    grid: Option<FieldGrid>,
    params: SimParams,
    tuning: Tuning,
    /// Shared read-only; snapshots hold the same allocation.
    obstacle: Option<Arc<ObstacleMask>>,
    time: f64,
    vorticity: Vec<f64>,
    strouhal: f64,
    shapes: ShapeHistory,
}

impl FlowField {
    pub fn new(params: SimParams, tuning: Tuning) -> Self {
        Self {
            width: 0,
            height: 0,
            grid: None,
            params,
            tuning,
            obstacle: None,
            time: 0.0,
            vorticity: Vec::new(),
            strouhal: 0.0,
            shapes: ShapeHistory::new(),
        }
    }

    /// Reallocate zeroed grid arrays for a `width` x `height` canvas.
    /// Always reallocates, even for unchanged dimensions. Does not rebuild.
    pub fn resize(&mut self, width: usize, height: usize) {
        let grid = FieldGrid::new(width, height, self.tuning.cell_size);
        log::debug!(
            "resize {}x{} -> grid {}x{} (cell {}px)",
            width,
            height,
            grid.cols,
            grid.rows,
            grid.cell_size
        );
        self.width = width;
        self.height = height;
        self.vorticity = vec![0.0; grid.cols * grid.rows];
        self.grid = Some(grid);
    }

    /// Run nominal, vorticity and pressure passes in order and refresh the
    /// Strouhal estimate. No-op before the first resize.
    pub fn rebuild(&mut self) {
        let bounds = self.obstacle.as_ref().and_then(|m| m.bounds());
        self.strouhal = strouhal_frequency(&self.params, bounds);
        let Some(grid) = self.grid.as_mut() else {
            return;
        };
        let start = Instant::now();
        build_nominal(
            grid,
            self.width,
            self.height,
            &self.params,
            &self.tuning,
            self.obstacle.as_deref(),
        );
        inject_vorticity_feedback(grid, self.params.turbulence, &mut self.vorticity);
        compute_pressure(grid, &self.params, bounds, &self.vorticity);
        log::debug!(
            "rebuild {}x{} cells in {:.2?} (strouhal {:.3} Hz)",
            grid.cols,
            grid.rows,
            start.elapsed(),
            self.strouhal
        );
    }

    /// Advance the animation clock (seconds).
    pub fn tick(&mut self, t: f64) {
        if t.is_finite() {
            self.time = t;
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Merge the fields present in `update` and rebuild if any value changed.
    pub fn apply_params(&mut self, update: &ParamsUpdate) {
        if !self.params.apply(update) {
            log::debug!("params unchanged, rebuild skipped");
            return;
        }
        log::info!(
            "params: wind {:.1} vortex {:.2} turbulence {:.2} gusts {} crosswind {:.1}@{:.0}deg",
            self.params.base_wind_speed,
            self.params.vortex_strength,
            self.params.turbulence,
            self.params.gusts_enabled,
            self.params.crosswind_mag,
            self.params.crosswind_angle.to_degrees()
        );
        self.rebuild();
    }

    /// Replace (or clear) the obstacle and rebuild.
    pub fn set_obstacle(&mut self, obstacle: Option<ObstacleMask>) {
        match obstacle.as_ref().map(|m| (m, m.bounds())) {
            Some((m, Some(b))) => log::info!(
                "obstacle {}x{} mask, bounds {}x{} at ({}, {})",
                m.width(),
                m.height(),
                b.w,
                b.h,
                b.x,
                b.y
            ),
            Some((m, None)) => log::warn!("obstacle {}x{} mask has no solid pixels", m.width(), m.height()),
            None => log::info!("obstacle cleared"),
        }
        self.obstacle = obstacle.map(Arc::new);
        self.rebuild();
    }

    /// Borrowed read-only sampler over the current state.
    pub fn sampler(&self) -> FlowSampler<'_> {
        FlowSampler {
            grid: self.grid.as_ref(),
            params: &self.params,
            tuning: &self.tuning,
            obstacle: self.obstacle.as_deref(),
            vorticity: &self.vorticity,
            shapes: &self.shapes,
            width: self.width,
            height: self.height,
            time: self.time,
            strouhal: self.strouhal,
        }
    }

    /// Velocity at world point (x, y).
    pub fn sample_flow(&self, x: f64, y: f64) -> (f64, f64) {
        self.sampler().sample(x, y)
    }

    /// Pressure proxy at world point (x, y); zero before the first resize.
    pub fn sample_pressure(&self, x: f64, y: f64) -> f64 {
        diagnostics::sample_pressure(self.grid.as_ref(), x, y)
    }

    /// Aerodynamic readout, or None without an obstacle.
    pub fn compute_diagnostics(&self) -> Option<Diagnostics> {
        diagnostics::compute_diagnostics(
            self.obstacle.as_deref(),
            self.grid.as_ref(),
            &self.params,
            self.strouhal,
        )
    }

    pub fn strouhal(&self) -> f64 {
        self.strouhal
    }

    pub fn vorticity(&self) -> &[f64] {
        &self.vorticity
    }

    pub fn grid(&self) -> Option<&FieldGrid> {
        self.grid.as_ref()
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn obstacle(&self) -> Option<&ObstacleMask> {
        self.obstacle.as_deref()
    }

    /// Shared handle to the current mask, for readers on other threads.
    pub fn shared_obstacle(&self) -> Option<&Arc<ObstacleMask>> {
        self.obstacle.as_ref()
    }

    /// Canvas size from the last resize.
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn start_shape(&mut self, x: f64, y: f64) {
        self.shapes.start(x, y);
    }

    pub fn append_shape_point(&mut self, x: f64, y: f64) {
        self.shapes.append(x, y);
    }

    pub fn end_shape(&mut self) {
        self.shapes.end();
    }

    pub fn clear_shapes(&mut self) {
        self.shapes.clear();
    }

    pub fn dynamic_shapes(&self) -> &[DynamicShape] {
        self.shapes.shapes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(w: usize, h: usize) -> FlowField {
        let mut f = FlowField::new(SimParams::default(), Tuning::default());
        f.resize(w, h);
        f.rebuild();
        f
    }

    fn cylinder(w: usize, h: usize) -> ObstacleMask {
        ObstacleMask::ellipse(w, h, w as f64 * 0.35, h as f64 * 0.5, 24.0, 24.0).unwrap()
    }

    #[test]
    fn test_fallback_before_resize() {
        let params = SimParams {
            base_wind_speed: 5.0,
            ..Default::default()
        };
        let f = FlowField::new(params, Tuning::default());
        assert_eq!(f.sample_flow(10.0, 10.0), (10.0, 0.0));
        assert_eq!(f.sample_pressure(10.0, 10.0), 0.0);
        assert!(f.grid().is_none());
    }

    #[test]
    fn test_resize_dimensions() {
        let f = field(400, 300);
        let g = f.grid().unwrap();
        assert_eq!((g.cols, g.rows), (67, 50));
        assert_eq!(f.vorticity().len(), 67 * 50);
        assert_eq!(f.size(), (400, 300));
    }

    #[test]
    fn test_resize_same_size_zeroes() {
        let mut f = field(120, 90);
        assert!(f.grid().unwrap().velocity.iter().any(|&v| v != 0.0));
        f.resize(120, 90);
        let g = f.grid().unwrap();
        assert!(g.velocity.iter().all(|&v| v == 0.0), "resize must not rebuild");
        assert!(g.pressure.iter().all(|&p| p == 0.0));
    }

    #[test]
    fn test_pressure_bounded() {
        let mut f = field(400, 300);
        f.set_obstacle(Some(cylinder(400, 300)));
        let v2 = f.params().reference_speed().powi(2);
        let g = f.grid().unwrap();
        for &p in &g.pressure {
            assert!(p.is_finite() && p >= -v2 && p <= v2, "pressure out of range: {}", p);
        }
    }

    #[test]
    fn test_midline_flows_downstream() {
        let mut f = field(400, 300);
        f.apply_params(&ParamsUpdate {
            turbulence: Some(0.0),
            vortex_strength: Some(0.0),
            ..Default::default()
        });
        let (vx, vy) = f.sample_flow(200.0, 150.0);
        assert!(vy.abs() < 1e-9, "vertical bias should cancel on the midline, vy={}", vy);
        // Nominal speed for the (1.2, -/+0.06) raw vector at wind 80.
        let raw = 1.2f64.hypot(0.06) + 1e-4;
        let expected = (64.0 + raw * 160.0) * 1.2 / raw;
        assert!((vx - expected).abs() < 1e-6, "vx={} expected {}", vx, expected);
    }

    #[test]
    fn test_unchanged_params_skip_rebuild() {
        let mut f = field(120, 90);
        f.resize(120, 90);
        f.apply_params(&ParamsUpdate::from_params(&SimParams::default()));
        assert!(
            f.grid().unwrap().velocity.iter().all(|&v| v == 0.0),
            "identical params must not rebuild"
        );
        f.apply_params(&ParamsUpdate {
            turbulence: Some(0.3),
            ..Default::default()
        });
        assert!(f.grid().unwrap().velocity.iter().any(|&v| v != 0.0), "a change rebuilds");
    }

    #[test]
    fn test_obstacle_shared_not_copied() {
        let mut f = field(200, 150);
        assert!(f.shared_obstacle().is_none());
        f.set_obstacle(Some(cylinder(200, 150)));
        let a = Arc::clone(f.shared_obstacle().unwrap());
        let b = f.shared_obstacle().unwrap();
        assert!(Arc::ptr_eq(&a, b));
        assert!(std::ptr::eq(f.obstacle().unwrap(), &*a));
    }

    #[test]
    fn test_diagnostics_follow_obstacle() {
        let mut f = field(400, 300);
        assert!(f.compute_diagnostics().is_none());
        assert_eq!(f.strouhal(), 0.0);

        f.set_obstacle(Some(cylinder(400, 300)));
        let d = f.compute_diagnostics().unwrap();
        assert!(d.drag_coefficient.is_finite() && d.lift_coefficient.is_finite());
        assert!(f.strouhal() > 0.0);

        f.set_obstacle(None);
        assert!(f.compute_diagnostics().is_none());
    }

    #[test]
    fn test_hard_wall_inside_obstacle() {
        let mut f = field(400, 300);
        f.set_obstacle(Some(cylinder(400, 300)));
        assert_eq!(f.sample_flow(140.0, 150.0), (0.0, 0.0));
    }

    #[test]
    fn test_apply_params_rebuilds() {
        let mut f = field(200, 150);
        let before = f.grid().unwrap().velocity.clone();
        f.apply_params(&ParamsUpdate {
            base_wind_speed: Some(200.0),
            ..Default::default()
        });
        assert_eq!(f.params().base_wind_speed, 200.0);
        assert_eq!(f.params().turbulence, 0.18, "unspecified fields keep their value");
        assert_ne!(f.grid().unwrap().velocity, before);
    }

    #[test]
    fn test_apply_params_converts_degrees() {
        let mut f = field(100, 100);
        f.apply_params(&ParamsUpdate {
            crosswind_angle_deg: Some(90.0),
            crosswind_mag: Some(10.0),
            ..Default::default()
        });
        let (cx, cy) = f.params().crosswind();
        assert!(cx.abs() < 1e-9 && (cy - 10.0).abs() < 1e-9, "crosswind=({}, {})", cx, cy);
    }

    #[test]
    fn test_sampling_does_not_mutate() {
        let mut f = field(200, 150);
        f.tick(1.25);
        let a = f.sample_flow(50.0, 60.0);
        let b = f.sample_flow(50.0, 60.0);
        assert_eq!(a, b);
        assert_eq!(f.time(), 1.25);
    }

    #[test]
    fn test_shape_operations() {
        let mut f = field(200, 150);
        f.start_shape(10.0, 10.0);
        f.append_shape_point(20.0, 20.0);
        f.end_shape();
        assert_eq!(f.dynamic_shapes().len(), 1);
        assert!(f.dynamic_shapes()[0].closed);
        f.clear_shapes();
        assert!(f.dynamic_shapes().is_empty());
    }
}
