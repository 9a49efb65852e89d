//! Pseudo-fluid wind field around a 2D obstacle silhouette, with tracer
//! particles and surface-integrated force diagnostics.

pub mod config;
pub mod obstacle;
pub mod particles;
pub mod shaping;
pub mod solver;

pub use obstacle::{Bounds, MaskError, ObstacleMask};
pub use particles::{Particle, ParticleSystem};
pub use solver::{Diagnostics, FlowField, ParamsUpdate, SimParams, Tuning};
