use thiserror::Error;

/// Alpha above which a pixel counts as solid for flow sampling and collision.
pub const SOLID_ALPHA: u8 = 10;
/// Alpha above which a pixel counts as solid for point containment.
pub const STRICT_ALPHA: u8 = 128;

/// Maximum distance (px) walked from a fluid pixel to find the surface.
pub const SURFACE_PROBE: usize = 6;

#[derive(Debug, Error, PartialEq)]
pub enum MaskError {
    #[error("mask has zero size ({width}x{height})")]
    Empty { width: usize, height: usize },
    #[error("mask data length {actual} does not match {width}x{height} (expected {expected})")]
    SizeMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
}

/// Tight axis-aligned box of solid pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl Bounds {
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.w as f64 / 2.0,
            self.y as f64 + self.h as f64 / 2.0,
        )
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }
}

/// Local surface orientation near a fluid pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceNormal {
    /// Unit normal pointing from solid into fluid.
    pub nx: f64,
    pub ny: f64,
    /// Pixel steps walked against the normal before hitting solid.
    pub dist: f64,
}

/// Alpha solidity field supplied by the obstacle provider.
///
/// Read-only to the solver. Every read clamps into the mask's own
/// dimensions, so a mask that lags behind a canvas resize stays safe.
#[derive(Clone, Debug)]
pub struct ObstacleMask {
    width: usize,
    height: usize,
    alpha: Vec<u8>,
    bounds: Option<Bounds>,
}

impl ObstacleMask {
    pub fn from_alpha(width: usize, height: usize, alpha: Vec<u8>) -> Result<Self, MaskError> {
        if width == 0 || height == 0 {
            return Err(MaskError::Empty { width, height });
        }
        let expected = width * height;
        if alpha.len() != expected {
            return Err(MaskError::SizeMismatch {
                width,
                height,
                expected,
                actual: alpha.len(),
            });
        }
        let bounds = compute_bounds(width, height, &alpha);
        Ok(Self {
            width,
            height,
            alpha,
            bounds,
        })
    }

    /// Build from canvas-style RGBA bytes, keeping only the alpha channel.
    pub fn from_rgba(width: usize, height: usize, rgba: &[u8]) -> Result<Self, MaskError> {
        let expected = width * height * 4;
        if rgba.len() != expected {
            return Err(MaskError::SizeMismatch {
                width,
                height,
                expected,
                actual: rgba.len(),
            });
        }
        let alpha = rgba.chunks_exact(4).map(|px| px[3]).collect();
        Self::from_alpha(width, height, alpha)
    }

    /// Rasterize a shape by evaluating `coverage(x, y)` at every pixel center.
    /// Coverage is in [0, 1] and maps linearly onto alpha.
    pub fn from_fn(
        width: usize,
        height: usize,
        coverage: impl Fn(f64, f64) -> f64,
    ) -> Result<Self, MaskError> {
        let mut alpha = vec![0u8; width * height];
        for y in 0..height {
            for x in 0..width {
                let c = coverage(x as f64, y as f64).clamp(0.0, 1.0);
                alpha[y * width + x] = (c * 255.0).round() as u8;
            }
        }
        Self::from_alpha(width, height, alpha)
    }

    /// Ellipse with a one-pixel anti-aliased rim.
    pub fn ellipse(
        width: usize,
        height: usize,
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
    ) -> Result<Self, MaskError> {
        let rx = rx.max(0.5);
        let ry = ry.max(0.5);
        let r_min = rx.min(ry);
        Self::from_fn(width, height, |x, y| {
            let dx = (x - cx) / rx;
            let dy = (y - cy) / ry;
            let d = (dx * dx + dy * dy).sqrt();
            (1.0 - d) * r_min + 0.5
        })
    }

    /// Solid axis-aligned rectangle.
    pub fn rect(
        width: usize,
        height: usize,
        x: usize,
        y: usize,
        w: usize,
        h: usize,
    ) -> Result<Self, MaskError> {
        let (x0, y0) = (x as f64, y as f64);
        let (x1, y1) = ((x + w) as f64, (y + h) as f64);
        Self::from_fn(width, height, |px, py| {
            if px >= x0 && px < x1 && py >= y0 && py < y1 {
                1.0
            } else {
                0.0
            }
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn data(&self) -> &[u8] {
        &self.alpha
    }

    /// Alpha at integer pixel coordinates, clamped into the mask.
    pub fn alpha_at(&self, ix: i64, iy: i64) -> u8 {
        let x = ix.clamp(0, self.width as i64 - 1) as usize;
        let y = iy.clamp(0, self.height as i64 - 1) as usize;
        self.alpha[y * self.width + x]
    }

    /// Loose solidity at a continuous point (rounded, clamped).
    pub fn is_solid(&self, x: f64, y: f64) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return false;
        }
        self.alpha_at(x.round() as i64, y.round() as i64) > SOLID_ALPHA
    }

    /// Loose solidity of the pixel containing (x, y). Outside the mask is fluid.
    pub fn is_solid_pixel(&self, x: f64, y: f64) -> bool {
        if !(x >= 0.0 && y >= 0.0) {
            return false;
        }
        let (ix, iy) = (x as usize, y as usize);
        if ix >= self.width || iy >= self.height {
            return false;
        }
        self.alpha[iy * self.width + ix] > SOLID_ALPHA
    }

    /// Strict point containment used for hit-testing.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        let Some(b) = self.bounds else {
            return false;
        };
        if !(x >= 0.0 && y >= 0.0) {
            return false;
        }
        let (ix, iy) = (x.floor() as usize, y.floor() as usize);
        if !b.contains(ix, iy) {
            return false;
        }
        self.alpha[iy * self.width + ix] > STRICT_ALPHA
    }

    /// Raw 4-neighbour alpha gradient (solid to fluid), scaled to [-1, 1].
    /// Neighbour indices are clamped into the mask.
    pub fn alpha_gradient(&self, ix: i64, iy: i64) -> (f64, f64) {
        let a_l = self.alpha_at(ix - 1, iy) as f64;
        let a_r = self.alpha_at(ix + 1, iy) as f64;
        let a_u = self.alpha_at(ix, iy - 1) as f64;
        let a_d = self.alpha_at(ix, iy + 1) as f64;
        ((a_l - a_r) / 255.0, (a_u - a_d) / 255.0)
    }

    /// Surface normal near a fluid point, if the surface is within
    /// [`SURFACE_PROBE`] pixels.
    pub fn surface_normal(&self, x: f64, y: f64) -> Option<SurfaceNormal> {
        if self.width < 3 || self.height < 3 || !x.is_finite() || !y.is_finite() {
            return None;
        }
        let ix = (x.round() as i64).clamp(1, self.width as i64 - 2);
        let iy = (y.round() as i64).clamp(1, self.height as i64 - 2);
        if self.alpha_at(ix, iy) > STRICT_ALPHA {
            return None;
        }
        let (gx, gy) = self.alpha_gradient(ix, iy);
        let len = gx.hypot(gy);
        if len < 1e-4 {
            return None;
        }
        let (nx, ny) = (gx / len, gy / len);

        // Walk into the solid until we hit it.
        (0..=SURFACE_PROBE).find_map(|s| {
            let s = s as f64;
            let px = (ix as f64 - nx * s).round() as i64;
            let py = (iy as f64 - ny * s).round() as i64;
            (self.alpha_at(px, py) > SOLID_ALPHA).then_some(SurfaceNormal { nx, ny, dist: s })
        })
    }
}

fn compute_bounds(width: usize, height: usize, alpha: &[u8]) -> Option<Bounds> {
    let mut min_x = usize::MAX;
    let mut min_y = usize::MAX;
    let mut max_x = 0;
    let mut max_y = 0;
    let mut found = false;
    for y in 0..height {
        for x in 0..width {
            if alpha[y * width + x] > SOLID_ALPHA {
                found = true;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
    }
    found.then(|| Bounds {
        x: min_x,
        y: min_y,
        w: max_x - min_x + 1,
        h: max_y - min_y + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_alpha_size_mismatch() {
        let err = ObstacleMask::from_alpha(4, 4, vec![0; 10]).unwrap_err();
        assert_eq!(
            err,
            MaskError::SizeMismatch {
                width: 4,
                height: 4,
                expected: 16,
                actual: 10
            }
        );
        assert!(ObstacleMask::from_alpha(0, 4, vec![]).is_err());
    }

    #[test]
    fn test_empty_mask_has_no_bounds() {
        let mask = ObstacleMask::from_alpha(8, 8, vec![0; 64]).unwrap();
        assert!(mask.bounds().is_none());
        assert!(!mask.contains_point(4.0, 4.0));
    }

    #[test]
    fn test_bounds_ignore_faint_pixels() {
        let mut alpha = vec![0u8; 10 * 10];
        alpha[2 * 10 + 3] = 255;
        alpha[6 * 10 + 7] = 200;
        alpha[9 * 10 + 9] = 10; // at threshold, not solid
        let mask = ObstacleMask::from_alpha(10, 10, alpha).unwrap();
        let b = mask.bounds().unwrap();
        assert_eq!(b, Bounds { x: 3, y: 2, w: 5, h: 5 });
        assert_eq!(b.center(), (5.5, 4.5));
    }

    #[test]
    fn test_from_rgba_takes_alpha() {
        let mut rgba = vec![0u8; 3 * 3 * 4];
        rgba[(1 * 3 + 1) * 4 + 3] = 255;
        let mask = ObstacleMask::from_rgba(3, 3, &rgba).unwrap();
        assert_eq!(mask.alpha_at(1, 1), 255);
        assert_eq!(mask.bounds(), Some(Bounds { x: 1, y: 1, w: 1, h: 1 }));
    }

    #[test]
    fn test_alpha_at_clamps() {
        let mask = ObstacleMask::rect(10, 10, 0, 0, 2, 2).unwrap();
        assert_eq!(mask.alpha_at(-5, -5), 255);
        assert_eq!(mask.alpha_at(100, 100), 0);
        assert!(mask.is_solid(-3.0, 0.4), "clamped read should hit the corner block");
    }

    #[test]
    fn test_strict_vs_loose() {
        let mut alpha = vec![0u8; 5 * 5];
        alpha[2 * 5 + 2] = 100;
        let mask = ObstacleMask::from_alpha(5, 5, alpha).unwrap();
        assert!(mask.is_solid(2.0, 2.0));
        assert!(mask.is_solid_pixel(2.7, 2.2));
        assert!(!mask.contains_point(2.5, 2.5), "alpha 100 is below strict threshold");
    }

    #[test]
    fn test_is_solid_pixel_outside_is_fluid() {
        let mask = ObstacleMask::rect(10, 10, 0, 0, 10, 10).unwrap();
        assert!(!mask.is_solid_pixel(-1.0, 5.0));
        assert!(!mask.is_solid_pixel(5.0, 10.0));
        assert!(!mask.is_solid_pixel(f64::NAN, 5.0));
        assert!(mask.is_solid_pixel(9.9, 9.9));
    }

    #[test]
    fn test_ellipse_center_solid_edge_fluid() {
        let mask = ObstacleMask::ellipse(100, 100, 50.0, 50.0, 20.0, 10.0).unwrap();
        assert!(mask.contains_point(50.0, 50.0));
        assert!(!mask.is_solid(50.0, 65.0));
        assert!(!mask.is_solid(75.0, 50.0));
        let b = mask.bounds().unwrap();
        assert!(b.w > b.h, "wide ellipse should have wide bounds: {:?}", b);
    }

    #[test]
    fn test_gradient_points_into_fluid() {
        // Solid left half.
        let mask = ObstacleMask::rect(20, 20, 0, 0, 10, 20).unwrap();
        let (gx, gy) = mask.alpha_gradient(10, 10);
        assert!(gx > 0.0, "gradient should point toward +x fluid, got {}", gx);
        assert!(gy.abs() < 1e-12);
    }

    #[test]
    fn test_surface_normal_distance() {
        let mask = ObstacleMask::rect(20, 20, 0, 0, 10, 20).unwrap();
        let n = mask.surface_normal(10.0, 10.0).unwrap();
        assert!((n.nx - 1.0).abs() < 1e-9 && n.ny.abs() < 1e-9);
        assert_eq!(n.dist, 1.0);
    }

    #[test]
    fn test_surface_normal_none_in_open_flow() {
        let mask = ObstacleMask::rect(40, 40, 0, 0, 5, 5).unwrap();
        assert!(mask.surface_normal(30.0, 30.0).is_none());
        let tiny = ObstacleMask::from_alpha(2, 2, vec![255; 4]).unwrap();
        assert!(tiny.surface_normal(0.0, 0.0).is_none());
    }
}
