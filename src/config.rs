use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::particles::DEFAULT_COUNT;
use crate::solver::{SimParams, Tuning};

pub const CONFIG_FILE: &str = "aeroflow.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub wind: WindConfig,
    pub tuning: Tuning,
    pub display: DisplayConfig,
    pub particles: ParticleConfig,
}

/// Initial wind parameters. The crosswind angle is given in degrees.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindConfig {
    pub base_wind_speed: f64,
    pub vortex_strength: f64,
    pub turbulence: f64,
    pub gusts_enabled: bool,
    pub crosswind_mag: f64,
    pub crosswind_angle_deg: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: usize,
    pub height: usize,
    pub target_fps: usize,
    /// Frames simulated by `--headless` before exiting.
    pub headless_frames: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub count: usize,
    pub seed: u64,
}

impl Default for WindConfig {
    fn default() -> Self {
        let p = SimParams::default();
        Self {
            base_wind_speed: p.base_wind_speed,
            vortex_strength: p.vortex_strength,
            turbulence: p.turbulence,
            gusts_enabled: p.gusts_enabled,
            crosswind_mag: p.crosswind_mag,
            crosswind_angle_deg: p.crosswind_angle.to_degrees(),
        }
    }
}

impl WindConfig {
    pub fn to_params(&self) -> SimParams {
        SimParams {
            base_wind_speed: self.base_wind_speed,
            vortex_strength: self.vortex_strength,
            turbulence: self.turbulence,
            gusts_enabled: self.gusts_enabled,
            crosswind_mag: self.crosswind_mag,
            crosswind_angle: self.crosswind_angle_deg.to_radians(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 450,
            target_fps: 60,
            headless_frames: 300,
        }
    }
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            seed: 42,
        }
    }
}

/// Parse a config file. Missing sections and keys take their defaults.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let display = path.display().to_string();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse { path: display, source })
}

/// Load `aeroflow.yaml` from the working directory, falling back to
/// defaults when it is missing or invalid.
pub fn load() -> Config {
    let path = Path::new(CONFIG_FILE);
    if !path.exists() {
        log::debug!("{} not found; using defaults", CONFIG_FILE);
        return Config::default();
    }
    match load_from(path) {
        Ok(cfg) => {
            log::info!("loaded {}", CONFIG_FILE);
            cfg
        }
        Err(e) => {
            log::warn!("{e}; using defaults");
            Config::default()
        }
    }
}
