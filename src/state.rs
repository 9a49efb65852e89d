use std::sync::Arc;

use aeroflow::particles::Particle;
use aeroflow::shaping::DynamicShape;
use aeroflow::solver::{Diagnostics, FlowField};
use aeroflow::ObstacleMask;

/// Everything the renderer needs for one frame, copied out of the
/// physics thread so the field can keep advancing.
pub struct FrameSnapshot {
    /// Canvas size the simulation runs at.
    pub width: usize,
    pub height: usize,
    pub time: f64,
    pub particles: Vec<Particle>,
    /// Pressure proxy per grid cell, row-major.
    pub pressure: Vec<f64>,
    pub cols: usize,
    pub rows: usize,
    pub cell_size: usize,
    /// `Vref²`, the pressure clamp bound.
    pub pressure_scale: f64,
    pub obstacle: Option<Arc<ObstacleMask>>,
    pub shapes: Vec<DynamicShape>,
    pub diagnostics: Option<Diagnostics>,
}

impl FrameSnapshot {
    /// Pre-allocate a snapshot buffer for the given particle count.
    pub fn new_empty(particle_count: usize) -> Self {
        FrameSnapshot {
            width: 0,
            height: 0,
            time: 0.0,
            particles: Vec::with_capacity(particle_count),
            pressure: Vec::new(),
            cols: 0,
            rows: 0,
            cell_size: 1,
            pressure_scale: 1.0,
            obstacle: None,
            shapes: Vec::new(),
            diagnostics: None,
        }
    }

    /// Copy current state into this buffer, reusing its allocations.
    /// The obstacle is shared with the field, not copied.
    pub fn capture(&mut self, field: &FlowField, particles: &[Particle]) {
        let (w, h) = field.size();
        self.width = w;
        self.height = h;
        self.time = field.time();

        self.particles.clear();
        self.particles.extend_from_slice(particles);

        match field.grid() {
            Some(g) => {
                self.pressure.clear();
                self.pressure.extend_from_slice(&g.pressure);
                self.cols = g.cols;
                self.rows = g.rows;
                self.cell_size = g.cell_size;
            }
            None => {
                self.pressure.clear();
                self.cols = 0;
                self.rows = 0;
            }
        }
        self.pressure_scale = field.params().reference_speed().powi(2);

        self.obstacle = field.shared_obstacle().cloned();
        self.shapes.clear();
        self.shapes.extend_from_slice(field.dynamic_shapes());
        self.diagnostics = field.compute_diagnostics();
    }

    /// Pressure proxy of the cell covering canvas point (x, y), or 0.
    pub fn pressure_at(&self, x: f64, y: f64) -> f64 {
        if self.cols == 0 || self.rows == 0 {
            return 0.0;
        }
        let c = self.cell_size as f64;
        let gx = ((x / c) as usize).min(self.cols - 1);
        let gy = ((y / c) as usize).min(self.rows - 1);
        self.pressure.get(gy * self.cols + gx).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aeroflow::solver::{SimParams, Tuning};

    fn field_with_obstacle() -> FlowField {
        let mask = ObstacleMask::ellipse(200, 120, 70.0, 60.0, 15.0, 15.0).unwrap();
        let mut f = FlowField::new(SimParams::default(), Tuning::default());
        f.resize(200, 120);
        f.set_obstacle(Some(mask));
        f
    }

    #[test]
    fn test_new_empty_has_no_data() {
        let snap = FrameSnapshot::new_empty(100);
        assert!(snap.particles.is_empty());
        assert!(snap.particles.capacity() >= 100);
        assert!(snap.diagnostics.is_none());
        assert_eq!(snap.pressure_at(10.0, 10.0), 0.0);
    }

    #[test]
    fn test_capture_copies_field_state() {
        let mut f = field_with_obstacle();
        f.start_shape(1.0, 1.0);
        f.append_shape_point(5.0, 5.0);
        let particles = vec![Particle { x: 3.0, y: 4.0, ..Default::default() }; 5];
        let mut snap = FrameSnapshot::new_empty(5);
        snap.capture(&f, &particles);

        assert_eq!((snap.width, snap.height), (200, 120));
        assert_eq!(snap.particles.len(), 5);
        assert_eq!(snap.pressure.len(), snap.cols * snap.rows);
        assert_eq!(snap.shapes.len(), 1);
        let shared = snap.obstacle.as_ref().unwrap();
        assert!(Arc::ptr_eq(shared, f.shared_obstacle().unwrap()), "mask should be shared, not cloned");
        assert!(snap.diagnostics.is_some());
        assert_eq!(snap.pressure_scale, 6400.0);
    }

    #[test]
    fn test_capture_reuses_buffer() {
        let mut f = field_with_obstacle();
        let mut snap = FrameSnapshot::new_empty(10);
        let many = vec![Particle::default(); 10];
        snap.capture(&f, &many);
        assert!(snap.obstacle.is_some());
        f.set_obstacle(None);
        let few = vec![Particle::default(); 3];
        snap.capture(&f, &few);
        assert_eq!(snap.particles.len(), 3);
        assert!(snap.obstacle.is_none());
    }

    #[test]
    fn test_pressure_at_clamps_to_grid() {
        let f = field_with_obstacle();
        let mut snap = FrameSnapshot::new_empty(0);
        snap.capture(&f, &[]);
        let last = snap.pressure[snap.pressure.len() - 1];
        assert_eq!(snap.pressure_at(10_000.0, 10_000.0), last);
    }
}
