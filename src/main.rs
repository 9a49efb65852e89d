mod overlay;
mod physics;
mod presets;
mod renderer;
mod state;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use aeroflow::config::{self, Config};
use aeroflow::solver::ParamsUpdate;
use aeroflow::Diagnostics;
use physics::{Command, PhysicsChannels, Simulation};
use presets::Preset;
use state::FrameSnapshot;

struct Defaults;

impl Defaults {
    const PRESET: Preset = Preset::Cylinder;
    /// Quiet period before a parameter edit is sent for a rebuild.
    const DEBOUNCE_MS: u64 = 80;
    /// Headless runs log diagnostics once per simulated second.
    const HEADLESS_LOG_SECONDS: usize = 1;
}

/// Convert RGBA &[u8] buffer to 0RGB &[u32] buffer for minifb.
fn rgba_to_argb(rgba: &[u8], out: &mut [u32]) {
    for (dst, px) in out.iter_mut().zip(rgba.chunks_exact(4)) {
        *dst = (px[0] as u32) << 16 | (px[1] as u32) << 8 | px[2] as u32;
    }
}

/// Status bar readout: drag, lift, yaw moment, CP offset and shedding
/// frequency, or `-` without an obstacle.
fn format_status(diag: Option<&Diagnostics>) -> String {
    match diag {
        Some(d) => {
            let (ox, oy) = d.cp_offset();
            format!(
                "cd {:.2}  cl {:.2}  mz {:.2}  cp {:+.1},{:+.1}  f {:.2}hz",
                d.drag_coefficient, d.lift_coefficient, d.yaw_moment, ox, oy, d.strouhal_hz
            )
        }
        None => "-".to_string(),
    }
}

/// Right-hand side of the status bar: current body and toggles.
fn format_hint(preset: Option<Preset>, paused: bool, panel: bool) -> String {
    let body = preset.map_or("none", Preset::label);
    let mut hint = format!("{body}  o=shape x=clear v=tint c=color");
    if paused {
        hint.push_str("  paused");
    }
    if !panel {
        hint.push_str("  space=params");
    }
    hint
}

fn is_headless() -> bool {
    std::env::args().skip(1).any(|a| a == "--headless")
}

fn build_preset(preset: Option<Preset>, width: usize, height: usize) -> Option<aeroflow::ObstacleMask> {
    let preset = preset?;
    match preset.build(width, height) {
        Ok(mask) => Some(mask),
        Err(e) => {
            log::warn!("could not build {} preset: {}", preset.label(), e);
            None
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cfg = config::load();
    if is_headless() {
        run_headless(&cfg);
        Ok(())
    } else {
        run_gui(&cfg)
    }
}

/// Step the simulation without a window and log diagnostics.
fn run_headless(cfg: &Config) {
    let (width, height) = (cfg.display.width, cfg.display.height);
    let fps = cfg.display.target_fps.max(1);
    let dt = 1.0 / fps as f64;

    let mut sim = Simulation::new(cfg, width, height);
    sim.apply(Command::Obstacle(build_preset(Some(Defaults::PRESET), width, height)));
    log::info!(
        "headless: {}x{} canvas, {} frames at {} fps",
        width,
        height,
        cfg.display.headless_frames,
        fps
    );

    let log_every = fps * Defaults::HEADLESS_LOG_SECONDS;
    let start = Instant::now();
    for frame in 1..=cfg.display.headless_frames {
        sim.step(dt);
        if frame % log_every == 0 {
            let diag = sim.field().compute_diagnostics();
            log::info!("t={:.2}s  {}", sim.field().time(), format_status(diag.as_ref()));
        }
    }
    log::info!(
        "headless done in {:.2}s, {} particles",
        start.elapsed().as_secs_f64(),
        sim.particles().len()
    );
}

fn run_gui(cfg: &Config) -> anyhow::Result<()> {
    let target_fps = cfg.display.target_fps.max(1);
    let mut render_cfg = renderer::RenderConfig::fit(cfg.display.width, cfg.display.height);
    let mut w = render_cfg.frame_width;
    let mut h = render_cfg.frame_height;

    // Simulation canvas; follows the window after a debounced resize.
    let (mut canvas_w, mut canvas_h) = (render_cfg.display_width, render_cfg.display_height);

    let mut window = Window::new(
        "aeroflow",
        w,
        h,
        WindowOptions {
            resize: true,
            ..WindowOptions::default()
        },
    )
    .map_err(|e| anyhow!("failed to create window: {e}"))?;
    window.set_target_fps(target_fps);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("installing Ctrl+C handler")?;

    let mut preset = Some(Defaults::PRESET);
    let mut sim = Simulation::new(cfg, canvas_w, canvas_h);
    sim.apply(Command::Obstacle(build_preset(preset, canvas_w, canvas_h)));
    let mut panel = overlay::PanelValues {
        params: sim.field().params().clone(),
        particle_count: sim.particle_count(),
    };
    let mut sent_count = panel.particle_count;

    let (channels, physics_thread) = physics::spawn_physics_thread(sim, target_fps, running.clone());
    let PhysicsChannels {
        cmd_tx,
        snap_rx,
        snap_return_tx,
    } = channels;
    // A closed channel means the physics thread is gone; the loop exits
    // through `running` in that case.
    let send = |cmd: Command| {
        if cmd_tx.send(cmd).is_err() {
            log::debug!("physics thread no longer accepting commands");
        }
    };

    let mut overlay_state = overlay::OverlayState::new();
    let mut options = renderer::RenderOptions::default();
    let mut paused = false;
    let mut pending_params: Option<Instant> = None;
    let mut pending_resize: Option<Instant> = None;
    let mut drawing = false;

    let mut framebuf = vec![0u32; w * h];
    let mut rgba_buf: Vec<u8> = Vec::new();
    let mut last_snap: Option<FrameSnapshot> = None;
    let mut needs_redraw = false;
    let mut frame_count = 0u32;
    let mut last_fps_time = Instant::now();

    while window.is_open() && running.load(Ordering::SeqCst) {
        // Escape closes the panel first, then quits.
        if window.is_key_pressed(Key::Escape, KeyRepeat::No) {
            if overlay_state.visible {
                overlay_state.visible = false;
                needs_redraw = true;
            } else {
                break;
            }
        }
        if window.is_key_pressed(Key::Q, KeyRepeat::No) {
            break;
        }

        if window.is_key_pressed(Key::Space, KeyRepeat::No) {
            overlay_state.toggle();
            needs_redraw = true;
        }

        if overlay_state.visible {
            if window.is_key_pressed(Key::Up, KeyRepeat::Yes) {
                overlay_state.navigate(-1);
                needs_redraw = true;
            }
            if window.is_key_pressed(Key::Down, KeyRepeat::Yes) {
                overlay_state.navigate(1);
                needs_redraw = true;
            }
            let edits = [
                (Key::Left, -1, false),
                (Key::Right, 1, false),
                (Key::Comma, -1, true),
                (Key::Period, 1, true),
            ];
            for (key, delta, fine) in edits {
                if window.is_key_pressed(key, KeyRepeat::Yes)
                    && overlay::adjust_param(&mut panel, overlay_state.selected, delta, fine)
                {
                    pending_params = Some(Instant::now());
                    needs_redraw = true;
                }
            }
            if window.is_key_pressed(Key::R, KeyRepeat::No) {
                overlay::reset_param(&mut panel, overlay_state.selected);
                pending_params = Some(Instant::now());
                needs_redraw = true;
            }
        } else if window.is_key_pressed(Key::R, KeyRepeat::No) {
            send(Command::Reseed);
        }

        let debounce = Duration::from_millis(Defaults::DEBOUNCE_MS);
        if pending_params.is_some_and(|t| t.elapsed() >= debounce) {
            send(Command::Params(ParamsUpdate::from_params(&panel.params)));
            if panel.particle_count != sent_count {
                sent_count = panel.particle_count;
                send(Command::ParticleCount(sent_count));
            }
            pending_params = None;
        }

        if window.is_key_pressed(Key::O, KeyRepeat::No) {
            let next = preset.map_or(Defaults::PRESET, Preset::next);
            preset = Some(next);
            log::info!("obstacle preset: {}", next.label());
            send(Command::Obstacle(build_preset(preset, canvas_w, canvas_h)));
        }
        if window.is_key_pressed(Key::X, KeyRepeat::No) {
            preset = None;
            send(Command::Obstacle(None));
            send(Command::ClearShapes);
        }
        if window.is_key_pressed(Key::V, KeyRepeat::No) {
            options.pressure_tint = !options.pressure_tint;
            needs_redraw = true;
        }
        if window.is_key_pressed(Key::C, KeyRepeat::No) {
            options.streak_color = options.streak_color.next();
            log::debug!("streak color: {}", options.streak_color.label());
            needs_redraw = true;
        }
        if window.is_key_pressed(Key::P, KeyRepeat::No) {
            paused = !paused;
            send(Command::Pause(paused));
            needs_redraw = true;
        }

        // Mouse drag draws a shaping stroke in the coordinates of the canvas
        // currently on screen.
        let (shown_w, shown_h) = last_snap
            .as_ref()
            .map_or((canvas_w, canvas_h), |s| (s.width, s.height));
        let mouse = window
            .get_mouse_pos(MouseMode::Discard)
            .filter(|&(_, my)| (my as usize) < render_cfg.display_height)
            .map(|(mx, my)| {
                (
                    mx as f64 * shown_w as f64 / render_cfg.display_width as f64,
                    my as f64 * shown_h as f64 / render_cfg.display_height as f64,
                )
            });
        let down = window.get_mouse_down(MouseButton::Left);
        match (drawing, down, mouse) {
            (false, true, Some((x, y))) => {
                drawing = true;
                send(Command::ShapeStart(x, y));
            }
            (true, true, Some((x, y))) => send(Command::ShapeAppend(x, y)),
            (true, false, _) | (true, true, None) => {
                drawing = false;
                send(Command::ShapeEnd);
            }
            _ => {}
        }

        let (new_w, new_h) = window.get_size();
        if new_w != w || new_h != h {
            render_cfg = renderer::RenderConfig::fit(new_w, new_h);
            w = render_cfg.frame_width;
            h = render_cfg.frame_height;
            framebuf = vec![0u32; w * h];
            pending_resize = Some(Instant::now());
            needs_redraw = true;
        }
        if pending_resize.is_some_and(|t| t.elapsed() >= debounce) {
            pending_resize = None;
            let size = (render_cfg.display_width, render_cfg.display_height);
            if size != (canvas_w, canvas_h) {
                (canvas_w, canvas_h) = size;
                log::info!("canvas resized to {}x{}", canvas_w, canvas_h);
                send(Command::Resize(canvas_w, canvas_h));
                if preset.is_some() {
                    send(Command::Obstacle(build_preset(preset, canvas_w, canvas_h)));
                }
            }
        }

        let mut snap = None;
        while let Ok(s) = snap_rx.try_recv() {
            if let Some(old) = snap.replace(s) {
                let _ = snap_return_tx.send(old);
            }
        }
        if let Some(s) = snap {
            if let Some(old) = last_snap.replace(s) {
                let _ = snap_return_tx.send(old);
            }
            needs_redraw = true;
        }

        if needs_redraw {
            if let Some(s) = &last_snap {
                renderer::render_into(&mut rgba_buf, s, &render_cfg, options);
                renderer::render_status(
                    &mut rgba_buf,
                    &render_cfg,
                    &format_status(s.diagnostics.as_ref()),
                    &format_hint(preset, paused, overlay_state.visible),
                );
                overlay::render_overlay(
                    &mut rgba_buf,
                    render_cfg.frame_width,
                    render_cfg.display_width,
                    render_cfg.display_height,
                    &overlay_state,
                    &panel,
                );
                rgba_to_argb(&rgba_buf, &mut framebuf);
            }
            needs_redraw = false;
        }

        window
            .update_with_buffer(&framebuf, w, h)
            .map_err(|e| anyhow!("window update failed: {e}"))?;

        frame_count += 1;
        if last_fps_time.elapsed() >= Duration::from_secs(1) {
            window.set_title(&format!("aeroflow - {frame_count} fps"));
            frame_count = 0;
            last_fps_time = Instant::now();
        }
    }

    running.store(false, Ordering::SeqCst);
    drop(snap_rx);
    if physics_thread.join().is_err() {
        log::error!("physics thread panicked");
    }
    Ok(())
}
