use aeroflow::{MaskError, ObstacleMask};

/// Built-in obstacle silhouettes, cycled from the keyboard.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Preset {
    Cylinder,
    Plate,
    Wedge,
}

impl Preset {
    pub fn next(self) -> Self {
        match self {
            Preset::Cylinder => Preset::Plate,
            Preset::Plate => Preset::Wedge,
            Preset::Wedge => Preset::Cylinder,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Preset::Cylinder => "cylinder",
            Preset::Plate => "plate",
            Preset::Wedge => "wedge",
        }
    }

    /// Rasterize the preset for a `width` x `height` canvas. The body sits
    /// a third of the way in, vertically centered, sized from the short side.
    pub fn build(self, width: usize, height: usize) -> Result<ObstacleMask, MaskError> {
        let (w, h) = (width as f64, height as f64);
        let cx = w * 0.33;
        let cy = h * 0.5;
        let size = w.min(h) * 0.12;
        match self {
            Preset::Cylinder => ObstacleMask::ellipse(width, height, cx, cy, size, size),
            Preset::Plate => {
                let pw = (size * 0.25).max(2.0);
                let ph = size * 2.4;
                ObstacleMask::rect(
                    width,
                    height,
                    (cx - pw * 0.5).max(0.0) as usize,
                    (cy - ph * 0.5).max(0.0) as usize,
                    pw as usize,
                    ph as usize,
                )
            }
            Preset::Wedge => {
                // Apex pointing upstream, flat base facing downstream.
                let len = size * 2.2;
                let half = size;
                let x0 = cx - len * 0.5;
                ObstacleMask::from_fn(width, height, move |x, y| {
                    let t = (x - x0) / len;
                    if !(0.0..=1.0).contains(&t) {
                        return 0.0;
                    }
                    let reach = half * t;
                    (reach - (y - cy).abs() + 0.5).clamp(0.0, 1.0)
                })
            }
        }
    }
}
