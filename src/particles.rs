//! Tracer particles advected through a [`FlowField`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::obstacle::ObstacleMask;
use crate::solver::FlowField;

pub const DEFAULT_COUNT: usize = 900;

/// Fraction of the gap to the sampled flow closed each update.
const VELOCITY_BLEND: f64 = 0.12;
/// Per-particle chance of a gust impulse per update.
const GUST_PROBABILITY: f64 = 0.003;
/// Impulse along the outward alpha gradient after hitting a solid pixel.
const BOUNCE_IMPULSE: f64 = 60.0;
const BOUNCE_DAMPING: f64 = 0.4;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Seconds alive; seeded with a random phase.
    pub age: f64,
}

impl Particle {
    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.vx.is_finite() && self.vy.is_finite()
    }
}

pub struct ParticleSystem {
    particles: Vec<Particle>,
    rng: StdRng,
    width: usize,
    height: usize,
}

impl ParticleSystem {
    /// Empty system with a deterministic random stream.
    pub fn new(seed: u64) -> Self {
        Self {
            particles: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            width: 0,
            height: 0,
        }
    }

    /// Replace all particles with `count` at rest, uniformly over the canvas.
    pub fn init(&mut self, count: usize, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        let (w, h) = (width as f64, height as f64);
        let rng = &mut self.rng;
        self.particles = (0..count)
            .map(|_| Particle {
                x: rng.gen::<f64>() * w,
                y: rng.gen::<f64>() * h,
                vx: 0.0,
                vy: 0.0,
                age: rng.gen::<f64>() * 4.0,
            })
            .collect();
        log::debug!("seeded {} particles over {}x{}", count, width, height);
    }

    /// New canvas bounds for recycling; positions are kept.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Advance every particle by `dt` seconds through `field`.
    pub fn update(&mut self, dt: f64, field: &FlowField) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let params = field.params();
        let jitter = 6.0 * (0.2 + params.turbulence);
        let gusts = params.gusts_enabled;
        let mask = field.obstacle();
        let sampler = field.sampler();
        let (w, h) = (self.width as f64, self.height as f64);

        for p in &mut self.particles {
            let (fx, fy) = sampler.sample(p.x, p.y);
            p.vx += (fx - p.vx) * VELOCITY_BLEND;
            p.vy += (fy - p.vy) * VELOCITY_BLEND;

            p.x += p.vx * dt;
            p.y += p.vy * dt;

            p.vx += (self.rng.gen::<f64>() - 0.5) * jitter * dt;
            p.vy += (self.rng.gen::<f64>() - 0.5) * jitter * dt;

            if gusts && self.rng.gen::<f64>() < GUST_PROBABILITY {
                let g = 200.0 + self.rng.gen::<f64>() * 260.0;
                p.vx += g * (0.6 + self.rng.gen::<f64>() * 0.9);
                p.vy += (self.rng.gen::<f64>() - 0.5) * g * 0.2;
            }

            if !p.is_finite() || p.x > w + 20.0 || p.y < -40.0 || p.y > h + 40.0 {
                respawn(p, &mut self.rng, h);
            }

            if let Some(mask) = mask {
                if mask.is_solid_pixel(p.x, p.y) {
                    bounce(p, mask, dt);
                }
            }

            p.age += dt;
        }
    }
}

/// Re-enter just left of the canvas at a random height, at rest.
fn respawn(p: &mut Particle, rng: &mut StdRng, height: f64) {
    p.x = -10.0 - rng.gen::<f64>() * 40.0;
    p.y = rng.gen::<f64>() * height;
    p.vx = 0.0;
    p.vy = 0.0;
}

/// Step back out of the solid and kick along the outward alpha gradient.
fn bounce(p: &mut Particle, mask: &ObstacleMask, dt: f64) {
    p.x -= p.vx * dt * 1.5;
    p.y -= p.vy * dt * 1.5;

    let (mw, mh) = (mask.width() as i64, mask.height() as i64);
    let ix = (p.x.round() as i64).min(mw - 2).max(1);
    let iy = (p.y.round() as i64).min(mh - 2).max(1);
    let (gx, gy) = mask.alpha_gradient(ix, iy);
    let len = gx.hypot(gy) + 1e-6;

    p.vx = (p.vx + gx / len * BOUNCE_IMPULSE) * BOUNCE_DAMPING;
    p.vy = (p.vy + gy / len * BOUNCE_IMPULSE) * BOUNCE_DAMPING;
}
