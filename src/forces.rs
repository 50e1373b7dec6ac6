//! Body forces: uniform vertical gravity and the inlet jet.

use crate::config::InletConfig;
use crate::error::{SimError, SimResult};
use crate::state::GridState;
use crate::MacGrid2;
use std::ops::Range;

/// Fixed band of `u` faces that gains `boost` every frame, independent of `dt`.
#[derive(Clone, Debug, PartialEq)]
pub struct InletJet {
    pub column: usize,
    pub rows: Range<usize>,
    pub boost: f32,
}

impl InletJet {
    /// Resolves the configured band against a grid, clipping rows to the grid height.
    pub fn resolve(config: &InletConfig, grid: MacGrid2) -> SimResult<Self> {
        let u_grid = grid.u_grid();
        if config.column >= u_grid.width() {
            return Err(SimError::config(format!(
                "inlet column {} outside u faces 0..{}",
                config.column,
                u_grid.width()
            )));
        }
        let start = config
            .row_start
            .unwrap_or(grid.height() / 2)
            .min(u_grid.height());
        let end = start.saturating_add(config.rows).min(u_grid.height());
        Ok(Self {
            column: config.column,
            rows: start..end,
            boost: config.boost,
        })
    }
}

/// Adds `gravity * dt` to every `v` sample, then adds the jet boost to its band.
pub fn apply_forces(state: &mut GridState, gravity: f32, jet: &InletJet, dt: f32) {
    if gravity != 0.0 {
        let dv = gravity * dt;
        state
            .velocity
            .v_mut()
            .update_with_index(|_, _, value| value + dv);
    }
    let u = state.velocity.u_mut();
    for row in jet.rows.clone() {
        u.add(jet.column, row, jet.boost);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f32, b: f32, tol: f32) {
        assert!(
            (a - b).abs() <= tol,
            "expected {a} to be within {tol} of {b}"
        );
    }

    fn jet_for(state: &GridState) -> InletJet {
        InletJet::resolve(&InletConfig::default(), state.grid()).unwrap()
    }

    #[test]
    fn default_jet_matches_reference_band() {
        let state = GridState::new(80.0).unwrap();
        let jet = jet_for(&state);
        assert_eq!(jet.column, 3);
        assert_eq!(jet.rows, 5..10);
        assert_eq!(jet.boost, 500.0);
    }

    #[test]
    fn jet_rows_clip_to_grid() {
        let state = GridState::new(300.0).unwrap();
        let jet = jet_for(&state);
        assert_eq!(jet.rows, 1..3);
        let config = InletConfig {
            row_start: Some(50),
            ..InletConfig::default()
        };
        let jet = InletJet::resolve(&config, state.grid()).unwrap();
        assert!(jet.rows.is_empty());
    }

    #[test]
    fn jet_column_out_of_range_is_rejected() {
        let state = GridState::new(300.0).unwrap();
        let config = InletConfig {
            column: 4,
            ..InletConfig::default()
        };
        assert!(InletJet::resolve(&config, state.grid()).is_err());
    }

    #[test]
    fn gravity_adds_uniform_acceleration() {
        let mut state = GridState::new(80.0).unwrap();
        let jet = InletJet {
            column: 0,
            rows: 0..0,
            boost: 0.0,
        };
        apply_forces(&mut state, -2.0, &jet, 0.5);
        let v = state.velocity.v();
        for y in 0..11 {
            for x in 0..10 {
                assert_close(v.get(x, y), -1.0, 1e-6);
            }
        }
        assert_eq!(state.velocity.u().max_abs(), 0.0);
    }

    #[test]
    fn jet_boost_accumulates_without_dt_scaling() {
        let mut state = GridState::new(80.0).unwrap();
        let jet = jet_for(&state);
        apply_forces(&mut state, 0.0, &jet, 0.001);
        apply_forces(&mut state, 0.0, &jet, 0.5);
        let u = state.velocity.u();
        for y in 0..10 {
            for x in 0..11 {
                let expected = if x == 3 && (5..10).contains(&y) {
                    1000.0
                } else {
                    0.0
                };
                assert_eq!(u.get(x, y), expected, "face ({x}, {y})");
            }
        }
        assert_eq!(state.velocity.v().max_abs(), 0.0);
    }
}
