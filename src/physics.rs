use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use aeroflow::config::Config;
use aeroflow::solver::{FlowField, ParamsUpdate};
use aeroflow::{ObstacleMask, ParticleSystem};

use crate::state::FrameSnapshot;

/// Requests from the render thread to the physics thread.
#[derive(Debug)]
pub enum Command {
    Params(ParamsUpdate),
    Obstacle(Option<ObstacleMask>),
    ShapeStart(f64, f64),
    ShapeAppend(f64, f64),
    ShapeEnd,
    ClearShapes,
    Reseed,
    /// Replace the particle set with this many, reseeded.
    ParticleCount(usize),
    /// New canvas size: regrid, rebuild and reseed.
    Resize(usize, usize),
    Pause(bool),
}

/// Field, particles and clock advanced together one frame at a time.
pub struct Simulation {
    field: FlowField,
    particles: ParticleSystem,
    particle_count: usize,
    time: f64,
    paused: bool,
}

impl Simulation {
    pub fn new(cfg: &Config, width: usize, height: usize) -> Self {
        let mut field = FlowField::new(cfg.wind.to_params(), cfg.tuning.clone());
        field.resize(width, height);
        field.rebuild();
        let mut particles = ParticleSystem::new(cfg.particles.seed);
        particles.init(cfg.particles.count, width, height);
        Self {
            field,
            particles,
            particle_count: cfg.particles.count,
            time: 0.0,
            paused: false,
        }
    }

    pub fn field(&self) -> &FlowField {
        &self.field
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Params(update) => self.field.apply_params(&update),
            Command::Obstacle(mask) => self.field.set_obstacle(mask),
            Command::ShapeStart(x, y) => self.field.start_shape(x, y),
            Command::ShapeAppend(x, y) => self.field.append_shape_point(x, y),
            Command::ShapeEnd => self.field.end_shape(),
            Command::ClearShapes => self.field.clear_shapes(),
            Command::Reseed => self.reseed(),
            Command::ParticleCount(count) => {
                if count != self.particle_count {
                    log::info!("particle count {} -> {}", self.particle_count, count);
                    self.particle_count = count;
                    self.reseed();
                }
            }
            Command::Resize(w, h) => {
                if w == 0 || h == 0 {
                    log::warn!("ignoring resize to {}x{}", w, h);
                    return;
                }
                if (w, h) == self.field.size() {
                    return;
                }
                self.field.resize(w, h);
                self.field.rebuild();
                self.reseed();
            }
            Command::Pause(p) => self.paused = p,
        }
    }

    fn reseed(&mut self) {
        let (w, h) = self.field.size();
        self.particles.init(self.particle_count, w, h);
    }

    /// Advance the clock and particles by `dt` seconds unless paused.
    pub fn step(&mut self, dt: f64) {
        if self.paused {
            return;
        }
        self.time += dt;
        self.field.tick(self.time);
        self.particles.update(dt, &self.field);
    }

    pub fn snapshot_into(&self, dst: &mut FrameSnapshot) {
        dst.capture(&self.field, self.particles.particles());
    }
}

/// Channels connecting the main (render) thread to the physics thread.
pub struct PhysicsChannels {
    pub cmd_tx: mpsc::Sender<Command>,
    pub snap_rx: mpsc::Receiver<FrameSnapshot>,
    pub snap_return_tx: mpsc::Sender<FrameSnapshot>,
}

/// Spawn the physics thread. It steps at a fixed `1 / target_fps` and
/// blocks on a one-slot snapshot channel, so it runs at the render rate.
pub fn spawn_physics_thread(
    mut sim: Simulation,
    target_fps: usize,
    running: Arc<AtomicBool>,
) -> (PhysicsChannels, std::thread::JoinHandle<()>) {
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
    let (snap_tx, snap_rx) = mpsc::sync_channel::<FrameSnapshot>(1);
    let (snap_return_tx, snap_return_rx) = mpsc::channel::<FrameSnapshot>();
    let dt = 1.0 / target_fps.max(1) as f64;

    let handle = std::thread::spawn(move || {
        let count = sim.particles().len();
        let mut snap_buf = FrameSnapshot::new_empty(count);

        while running.load(Ordering::SeqCst) {
            while let Ok(cmd) = cmd_rx.try_recv() {
                sim.apply(cmd);
            }
            sim.step(dt);
            sim.snapshot_into(&mut snap_buf);
            if snap_tx.send(snap_buf).is_err() {
                break;
            }
            snap_buf = snap_return_rx
                .try_recv()
                .unwrap_or_else(|_| FrameSnapshot::new_empty(count));
        }
        log::debug!("physics thread stopped at t={:.2}s", sim.time);
    });

    let channels = PhysicsChannels {
        cmd_tx,
        snap_rx,
        snap_return_tx,
    };
    (channels, handle)
}
