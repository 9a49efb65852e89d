/// Blue-White-Red diverging colormap: deep blue -> blue -> white -> red -> deep red.
/// Low pressure maps to blue, free stream to white, stagnation to red.
pub(crate) const BLUE_WHITE_RED_STOPS: [(f64, f64, f64); 5] = [
    (10.0, 30.0, 150.0),   // deep blue              (0.00)
    (80.0, 130.0, 230.0),  // medium blue            (0.25)
    (245.0, 245.0, 245.0), // near white             (0.50)
    (230.0, 100.0, 70.0),  // medium red             (0.75)
    (150.0, 20.0, 20.0),   // deep red               (1.00)
];

/// Convert a [0.0, 1.0] value to RGBA on the diverging palette.
pub fn diverging_rgba(t: f64) -> [u8; 4] {
    let stops = &BLUE_WHITE_RED_STOPS;
    let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
    let seg = t * 4.0;
    let i = (seg as usize).min(3);
    let s = seg - i as f64;

    let (r0, g0, b0) = stops[i];
    let (r1, g1, b1) = stops[i + 1];

    [
        (r0 + s * (r1 - r0)) as u8,
        (g0 + s * (g1 - g0)) as u8,
        (b0 + s * (b1 - b0)) as u8,
        255,
    ]
}

/// Map a signed pressure proxy in `[-scale, scale]` onto [0, 1].
pub fn pressure_to_unit(p: f64, scale: f64) -> f64 {
    if scale <= 0.0 {
        return 0.5;
    }
    (p / scale * 0.5 + 0.5).clamp(0.0, 1.0)
}

/// Particle streak palettes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StreakColor {
    Mono,
    Blue,
    Warm,
}

impl StreakColor {
    pub fn next(self) -> Self {
        match self {
            StreakColor::Mono => StreakColor::Blue,
            StreakColor::Blue => StreakColor::Warm,
            StreakColor::Warm => StreakColor::Mono,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StreakColor::Mono => "mono",
            StreakColor::Blue => "blue",
            StreakColor::Warm => "warm",
        }
    }

    pub fn rgb(self) -> [f64; 3] {
        match self {
            StreakColor::Mono => [225.0, 225.0, 225.0],
            StreakColor::Blue => [90.0, 170.0, 255.0],
            StreakColor::Warm => [255.0, 150.0, 80.0],
        }
    }
}
