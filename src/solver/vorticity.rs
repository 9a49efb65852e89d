use super::grid::FieldGrid;

/// Discrete curl of the grid velocity: omega = dvy/dx - dvx/dy.
///
/// Central differences over `2 * cell_size`. Border cells are left at zero.
/// `omega` is resized to `cols * rows` and fully overwritten.
pub fn compute_vorticity(grid: &FieldGrid, omega: &mut Vec<f64>) {
    let (cols, rows) = (grid.cols, grid.rows);
    omega.clear();
    omega.resize(cols * rows, 0.0);
    let span = 2.0 * grid.cell_size as f64;
    let v = &grid.velocity;

    for gy in 1..rows.saturating_sub(1) {
        for gx in 1..cols.saturating_sub(1) {
            let left = grid.idx(gx - 1, gy) * 2;
            let right = grid.idx(gx + 1, gy) * 2;
            let up = grid.idx(gx, gy - 1) * 2;
            let down = grid.idx(gx, gy + 1) * 2;
            let dvy_dx = (v[right + 1] - v[left + 1]) / span;
            let dvx_dy = (v[down] - v[up]) / span;
            omega[grid.idx(gx, gy)] = dvy_dx - dvx_dy;
        }
    }
}

/// Second pass: compute vorticity, then nudge each interior cell
/// perpendicular to its own velocity in proportion to local rotation.
///
/// The curl is taken from the unmodified nominal field before any
/// feedback is written back, and is left in `omega` for the pressure pass.
pub fn inject_vorticity_feedback(grid: &mut FieldGrid, turbulence: f64, omega: &mut Vec<f64>) {
    compute_vorticity(grid, omega);

    for gy in 1..grid.rows.saturating_sub(1) {
        for gx in 1..grid.cols.saturating_sub(1) {
            let i = grid.idx(gx, gy);
            let w = omega[i];
            let rot = (w.abs() * 12.0).clamp(0.0, 1.0) * turbulence * 0.5;
            let (vx, vy) = grid.velocity_at(i);
            let mag = vx.hypot(vy) + 1e-6;
            let (ux, uy) = (vx / mag, vy / mag);
            let px = -uy * w * rot * 0.6 * mag;
            let py = ux * w * rot * 0.6 * mag;
            grid.set_velocity(i, (vx + px, vy + py));
        }
    }
}
