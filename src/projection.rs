//! Pressure projection by in-place Gauss-Seidel relaxation over the wall mask.
//!
//! Each sweep visits cells row by row. A solid cell pins its four faces to zero. An open
//! cell measures its net outflow `d` and pushes `1.9 * d` back through the faces it shares
//! with open neighbours, split evenly between them. Later cells in the same sweep see the
//! corrected faces, so sweep order is part of the result.
//!
//! The accumulated corrections double as a pressure readout, scaled by
//! `density * cell_size / dt` and rebuilt from zero on every call.

use crate::state::GridState;
use crate::{CellFlags, Field2, MacVelocity2};

/// Over-relaxation applied to every divergence correction.
pub const OVER_RELAXATION: f32 = 1.9;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Relaxation {
    /// The cell is solid; its faces were zeroed.
    Solid,
    /// Open cell with no open neighbour; nothing can carry the correction, so it was skipped.
    Isolated,
    /// Open cell corrected by `correction` per unit neighbour openness.
    Corrected { correction: f32 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProjectionReport {
    /// Open cells skipped because every neighbour is solid.
    pub skipped_cells: usize,
    pub max_divergence_before: f32,
    pub max_divergence_after: f32,
}

/// Relaxes cell `(x, y)` once, mutating the velocity faces around it in place.
pub fn relax_cell(
    velocity: &mut MacVelocity2,
    walls: &CellFlags,
    x: usize,
    y: usize,
) -> Relaxation {
    let (u, v) = velocity.components_mut();
    if !walls.is_open(x, y) {
        u.set(x, y, 0.0);
        u.set(x + 1, y, 0.0);
        v.set(x, y, 0.0);
        v.set(x, y + 1, 0.0);
        return Relaxation::Solid;
    }
    let d = -u.get(x, y) + u.get(x + 1, y) + v.get(x, y) - v.get(x, y + 1);
    let (xi, yi) = (x as i64, y as i64);
    let left = walls.openness(xi - 1, yi);
    let right = walls.openness(xi + 1, yi);
    let up = walls.openness(xi, yi - 1);
    let down = walls.openness(xi, yi + 1);
    let s = left + right + up + down;
    if s == 0.0 {
        return Relaxation::Isolated;
    }
    let d = d * OVER_RELAXATION;
    u.add(x, y, d * left / s);
    u.add(x + 1, y, -d * right / s);
    v.add(x, y, -d * up / s);
    v.add(x, y + 1, d * down / s);
    Relaxation::Corrected { correction: d / s }
}

/// Runs `iterations` relaxation sweeps and rebuilds `state.pressure` from the corrections.
pub fn project(
    state: &mut GridState,
    iterations: usize,
    density: f32,
    dt: f32,
) -> ProjectionReport {
    debug_assert!(iterations >= 1, "iterations must be >= 1");
    debug_assert!(dt > 0.0, "dt must be > 0");
    let cells = state.cells();
    let pressure_scale = density * state.cell_size() / dt;
    let max_divergence_before = divergence(&state.velocity, &state.walls).max_abs();

    let walls = &state.walls;
    let velocity = &mut state.velocity;
    let pressure = &mut state.pressure;
    pressure.fill(0.0);
    let mut skipped_cells = 0;
    for sweep in 0..iterations {
        for y in 0..cells {
            for x in 0..cells {
                match relax_cell(velocity, walls, x, y) {
                    Relaxation::Solid => {}
                    Relaxation::Isolated => {
                        if sweep == 0 {
                            skipped_cells += 1;
                            log::trace!("cell ({x}, {y}) has no open neighbour; skipped");
                        }
                    }
                    Relaxation::Corrected { correction } => {
                        pressure.add(x, y, correction * pressure_scale);
                    }
                }
            }
        }
    }

    ProjectionReport {
        skipped_cells,
        max_divergence_before,
        max_divergence_after: divergence(&state.velocity, &state.walls).max_abs(),
    }
}

/// Net outflow of every open cell; solid cells read zero.
pub fn divergence(velocity: &MacVelocity2, walls: &CellFlags) -> Field2 {
    assert_eq!(walls.grid(), velocity.grid().cell_grid(), "cell grid mismatch");
    let u = velocity.u();
    let v = velocity.v();
    Field2::from_fn(walls.grid(), |x, y| {
        if !walls.is_open(x, y) {
            return 0.0;
        }
        -u.get(x, y) + u.get(x + 1, y) + v.get(x, y) - v.get(x, y + 1)
    })
}
