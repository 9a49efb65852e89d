/// Coarse velocity and pressure arrays covering the canvas.
///
/// Cell `(gx, gy)` represents the world point
/// `((gx + 0.5) * cell_size, (gy + 0.5) * cell_size)`.
#[derive(Clone, Debug)]
pub struct FieldGrid {
    pub cols: usize,
    pub rows: usize,
    pub cell_size: usize,
    /// Interleaved (vx, vy) per cell, row-major.
    pub velocity: Vec<f64>,
    pub pressure: Vec<f64>,
}

/// Cell count needed to cover `extent` pixels, never below 2.
pub fn cells_for(extent: usize, cell_size: usize) -> usize {
    extent.div_ceil(cell_size.max(1)).max(2)
}

impl FieldGrid {
    /// Freshly allocated, all-zero grid sized for a `width x height` canvas.
    pub fn new(width: usize, height: usize, cell_size: usize) -> Self {
        let cell_size = cell_size.max(1);
        let cols = cells_for(width, cell_size);
        let rows = cells_for(height, cell_size);
        Self {
            cols,
            rows,
            cell_size,
            velocity: vec![0.0; cols * rows * 2],
            pressure: vec![0.0; cols * rows],
        }
    }

    #[inline]
    pub const fn idx(&self, gx: usize, gy: usize) -> usize {
        gy * self.cols + gx
    }

    /// World-space center of a cell.
    #[inline]
    pub fn cell_center(&self, gx: usize, gy: usize) -> (f64, f64) {
        let g = self.cell_size as f64;
        ((gx as f64 + 0.5) * g, (gy as f64 + 0.5) * g)
    }

    #[inline]
    pub fn velocity_at(&self, i: usize) -> (f64, f64) {
        (self.velocity[i * 2], self.velocity[i * 2 + 1])
    }

    #[inline]
    pub fn set_velocity(&mut self, i: usize, v: (f64, f64)) {
        self.velocity[i * 2] = v.0;
        self.velocity[i * 2 + 1] = v.1;
    }

    /// Bilinear weights for a world point using the half-cell convention.
    /// Returns the four corner cell indices and the fractional offsets.
    fn bilinear(&self, x: f64, y: f64) -> ([usize; 4], f64, f64) {
        let g = self.cell_size as f64;
        let gx = x / g - 0.5;
        let gy = y / g - 0.5;
        let max_x = (self.cols - 1) as f64;
        let max_y = (self.rows - 1) as f64;
        let x0 = gx.floor().clamp(0.0, max_x);
        let y0 = gy.floor().clamp(0.0, max_y);
        let x1 = (x0 + 1.0).min(max_x);
        let y1 = (y0 + 1.0).min(max_y);
        let fx = (gx - x0).clamp(0.0, 1.0);
        let fy = (gy - y0).clamp(0.0, 1.0);
        let (x0, y0, x1, y1) = (x0 as usize, y0 as usize, x1 as usize, y1 as usize);
        (
            [
                self.idx(x0, y0),
                self.idx(x1, y0),
                self.idx(x0, y1),
                self.idx(x1, y1),
            ],
            fx,
            fy,
        )
    }

    /// Bilinearly interpolated velocity at a world point.
    pub fn sample_velocity(&self, x: f64, y: f64) -> (f64, f64) {
        if !x.is_finite() || !y.is_finite() {
            return (0.0, 0.0);
        }
        let ([i00, i10, i01, i11], fx, fy) = self.bilinear(x, y);
        let lerp2 = |c: usize| {
            let a = self.velocity[i00 * 2 + c] * (1.0 - fx) + self.velocity[i10 * 2 + c] * fx;
            let b = self.velocity[i01 * 2 + c] * (1.0 - fx) + self.velocity[i11 * 2 + c] * fx;
            a * (1.0 - fy) + b * fy
        };
        (lerp2(0), lerp2(1))
    }

    /// Bilinearly interpolated pressure proxy at a world point.
    pub fn sample_pressure(&self, x: f64, y: f64) -> f64 {
        if !x.is_finite() || !y.is_finite() {
            return 0.0;
        }
        let ([i00, i10, i01, i11], fx, fy) = self.bilinear(x, y);
        let p = &self.pressure;
        let a = p[i00] * (1.0 - fx) + p[i10] * fx;
        let b = p[i01] * (1.0 - fx) + p[i11] * fx;
        a * (1.0 - fy) + b * fy
    }

    /// Value of a per-cell scalar field at the cell nearest to a world point.
    pub fn nearest_cell(&self, x: f64, y: f64) -> usize {
        let g = self.cell_size as f64;
        let gx = (x / g).floor().clamp(0.0, (self.cols - 1) as f64) as usize;
        let gy = (y / g).floor().clamp(0.0, (self.rows - 1) as f64) as usize;
        self.idx(gx, gy)
    }
}
