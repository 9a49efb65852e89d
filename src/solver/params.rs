use serde::Deserialize;

/// Wind and turbulence settings that drive a field rebuild.
#[derive(Clone, Debug, PartialEq)]
pub struct SimParams {
    pub base_wind_speed: f64,
    pub vortex_strength: f64,
    pub turbulence: f64,
    pub gusts_enabled: bool,
    pub crosswind_mag: f64,
    /// Crosswind direction in radians (0 = +x, screen y down).
    pub crosswind_angle: f64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            base_wind_speed: 80.0,
            vortex_strength: 0.9,
            turbulence: 0.18,
            gusts_enabled: false,
            crosswind_mag: 0.0,
            crosswind_angle: 0.0,
        }
    }
}

impl SimParams {
    /// Crosswind as a velocity vector.
    pub fn crosswind(&self) -> (f64, f64) {
        (
            self.crosswind_mag * self.crosswind_angle.cos(),
            self.crosswind_mag * self.crosswind_angle.sin(),
        )
    }

    /// Reference speed for pressure and force normalization.
    pub fn reference_speed(&self) -> f64 {
        self.base_wind_speed.max(1.0)
    }

    /// Overwrite only the fields present in `update`.
    /// Returns true if anything changed.
    pub fn apply(&mut self, update: &ParamsUpdate) -> bool {
        let before = self.clone();
        if let Some(v) = update.base_wind_speed {
            self.base_wind_speed = v;
        }
        if let Some(v) = update.vortex_strength {
            self.vortex_strength = v;
        }
        if let Some(v) = update.turbulence {
            self.turbulence = v;
        }
        if let Some(v) = update.gusts_enabled {
            self.gusts_enabled = v;
        }
        if let Some(v) = update.crosswind_mag {
            self.crosswind_mag = v;
        }
        if let Some(deg) = update.crosswind_angle_deg {
            self.crosswind_angle = deg.to_radians();
        }
        *self != before
    }
}

/// Partial parameter update from a UI or config provider.
/// The crosswind angle arrives in degrees.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamsUpdate {
    pub base_wind_speed: Option<f64>,
    pub vortex_strength: Option<f64>,
    pub turbulence: Option<f64>,
    pub gusts_enabled: Option<bool>,
    pub crosswind_mag: Option<f64>,
    pub crosswind_angle_deg: Option<f64>,
}

impl ParamsUpdate {
    /// Full update carrying every field of `params`.
    pub fn from_params(params: &SimParams) -> Self {
        Self {
            base_wind_speed: Some(params.base_wind_speed),
            vortex_strength: Some(params.vortex_strength),
            turbulence: Some(params.turbulence),
            gusts_enabled: Some(params.gusts_enabled),
            crosswind_mag: Some(params.crosswind_mag),
            crosswind_angle_deg: Some(params.crosswind_angle.to_degrees()),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fold a newer update on top of this one; later fields win.
    pub fn merge(&mut self, newer: &ParamsUpdate) {
        self.base_wind_speed = newer.base_wind_speed.or(self.base_wind_speed);
        self.vortex_strength = newer.vortex_strength.or(self.vortex_strength);
        self.turbulence = newer.turbulence.or(self.turbulence);
        self.gusts_enabled = newer.gusts_enabled.or(self.gusts_enabled);
        self.crosswind_mag = newer.crosswind_mag.or(self.crosswind_mag);
        self.crosswind_angle_deg = newer.crosswind_angle_deg.or(self.crosswind_angle_deg);
    }
}

/// Empirical constants that differ between field-model generations.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Tuning {
    /// Grid cell size in pixels.
    pub cell_size: usize,
    /// Scale of the obstacle push-away vector in the nominal pass.
    pub repulsion_gain: f64,
    /// Fraction of sampled speed removed at full proximity.
    pub boundary_damping: f64,
    /// Fraction of turbulence amplitude removed at full proximity.
    pub turbulence_damping: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            cell_size: 6,
            repulsion_gain: 5.2,
            boundary_damping: 0.4,
            turbulence_damping: 0.9,
        }
    }
}

impl Tuning {
    /// Constants of the earlier, softer field model.
    pub fn legacy() -> Self {
        Self {
            cell_size: 6,
            repulsion_gain: 2.0,
            boundary_damping: 0.85,
            turbulence_damping: 0.9,
        }
    }
}
