//! Semi-Lagrangian self-advection of the staggered velocity field.
//!
//! Every interior face traces back one step along the local velocity and takes the
//! bilinearly interpolated value found there. Results go into fresh buffers, so every
//! sample reads the pre-advection field. Domain boundary faces are carried over as-is.
//!
//! Rows grow in the direction opposite to positive `v` (see the divergence stencil in
//! `projection`), so a back-trace moves `-u * dt` along columns and `+v * dt` along rows.

use crate::state::GridState;
use crate::{MacVelocity2, StaggeredField2};

pub fn advect(state: &mut GridState, dt: f32) {
    state.velocity = advect_velocity(&state.velocity, dt);
}

pub fn advect_velocity(velocity: &MacVelocity2, dt: f32) -> MacVelocity2 {
    let grid = velocity.grid();
    let width = grid.width();
    let height = grid.height();
    let u = velocity.u();
    let v = velocity.v();
    let u_grid = u.grid();
    let v_grid = v.grid();

    let u_next = StaggeredField2::from_fn(u_grid, |x, y| {
        let value = u.get(x, y);
        if x == 0 || x == width {
            return value;
        }
        let v_avg = 0.25 * (v.get(x - 1, y) + v.get(x, y) + v.get(x - 1, y + 1) + v.get(x, y + 1));
        let pos = u_grid.index_position(x, y);
        u.sample_linear((pos.0 - value * dt, pos.1 + v_avg * dt))
    });
    let v_next = StaggeredField2::from_fn(v_grid, |x, y| {
        let value = v.get(x, y);
        if y == 0 || y == height {
            return value;
        }
        let u_avg = 0.25 * (u.get(x, y - 1) + u.get(x, y) + u.get(x + 1, y - 1) + u.get(x + 1, y));
        let pos = v_grid.index_position(x, y);
        v.sample_linear((pos.0 - u_avg * dt, pos.1 + value * dt))
    });
    MacVelocity2::from_components(grid, u_next, v_next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MacGrid2, Vec2};

    fn assert_close(a: f32, b: f32, tol: f32) {
        assert!(
            (a - b).abs() <= tol,
            "expected {a} to be within {tol} of {b}"
        );
    }

    #[test]
    fn zero_velocity_is_unchanged() {
        let mut state = GridState::new(80.0).unwrap();
        let before = state.velocity.clone();
        advect(&mut state, 0.1);
        assert_eq!(state.velocity, before);
    }

    #[test]
    fn uniform_velocity_is_unchanged() {
        let grid = MacGrid2::new(8, 8, 10.0);
        let velocity = MacVelocity2::new(grid, Vec2::new(3.0, -2.0));
        let advected = advect_velocity(&velocity, 0.5);
        for y in 0..8 {
            for x in 0..9 {
                assert_close(advected.u().get(x, y), 3.0, 1e-5);
            }
        }
        for y in 0..9 {
            for x in 0..8 {
                assert_close(advected.v().get(x, y), -2.0, 1e-5);
            }
        }
    }

    #[test]
    fn horizontal_flow_shifts_vertical_profile() {
        let grid = MacGrid2::new(10, 10, 80.0);
        let u = StaggeredField2::new(grid.u_grid(), 1.0);
        let v = StaggeredField2::from_fn(grid.v_grid(), |x, _| x as f32);
        let velocity = MacVelocity2::from_components(grid, u, v);
        // Half a cell per step.
        let advected = advect_velocity(&velocity, 40.0);
        for y in 1..10 {
            for x in 0..10 {
                let expected = (x as f32 - 0.5).max(0.0);
                assert_close(advected.v().get(x, y), expected, 1e-4);
            }
        }
        for x in 0..10 {
            assert_eq!(advected.v().get(x, 0), x as f32);
            assert_eq!(advected.v().get(x, 10), x as f32);
        }
    }

    #[test]
    fn positive_v_pulls_from_higher_rows() {
        let grid = MacGrid2::new(10, 10, 1.0);
        let u = StaggeredField2::from_fn(grid.u_grid(), |_, y| y as f32);
        let v = StaggeredField2::new(grid.v_grid(), 0.5);
        let velocity = MacVelocity2::from_components(grid, u, v);
        let advected = advect_velocity(&velocity, 1.0);
        for y in 0..10 {
            for x in 1..10 {
                let expected = (y as f32 + 0.5).min(9.0);
                assert_close(advected.u().get(x, y), expected, 1e-5);
            }
        }

        // The v pass traces along its own value.
        let u = StaggeredField2::new(grid.u_grid(), 0.0);
        let v = StaggeredField2::from_fn(grid.v_grid(), |_, y| y as f32);
        let velocity = MacVelocity2::from_components(grid, u, v);
        let advected = advect_velocity(&velocity, 0.1);
        for y in 1..10 {
            for x in 0..10 {
                let expected = (y as f32 * 1.1).min(10.0);
                assert_close(advected.v().get(x, y), expected, 1e-4);
            }
        }
    }

    #[test]
    fn u_face_uses_mean_of_four_surrounding_v() {
        let grid = MacGrid2::new(8, 8, 1.0);
        let u = StaggeredField2::from_fn(grid.u_grid(), |_, y| y as f32 * 0.1);
        let v = StaggeredField2::from_fn(grid.v_grid(), |x, y| match (x, y) {
            (3, 4) => 0.2,
            (4, 4) => 0.4,
            (3, 5) => 0.6,
            (4, 5) => 0.8,
            _ => 0.0,
        });
        let velocity = MacVelocity2::from_components(grid, u, v);
        let advected = advect_velocity(&velocity, 1.0);
        // Mean v is 0.5, so the face reads row 4.5.
        assert_close(advected.u().get(4, 4), 0.45, 1e-5);
    }

    #[test]
    fn v_face_uses_mean_of_four_surrounding_u() {
        let grid = MacGrid2::new(8, 8, 1.0);
        let u = StaggeredField2::from_fn(grid.u_grid(), |x, y| match (x, y) {
            (4, 3) => 0.2,
            (4, 4) => 0.4,
            (5, 3) => 0.6,
            (5, 4) => 0.8,
            _ => 0.0,
        });
        let v = StaggeredField2::from_fn(grid.v_grid(), |x, _| x as f32 * 0.1);
        let velocity = MacVelocity2::from_components(grid, u, v);
        let advected = advect_velocity(&velocity, 1.0);
        // Mean u is 0.5, so the face reads column 3.5.
        assert_close(advected.v().get(4, 4), 0.35, 1e-5);
    }

    #[test]
    fn boundary_faces_are_carried_over() {
        let grid = MacGrid2::new(6, 6, 1.0);
        let u = StaggeredField2::from_fn(grid.u_grid(), |x, _| match x {
            0 => 5.0,
            6 => 7.0,
            _ => 0.0,
        });
        let v = StaggeredField2::from_fn(grid.v_grid(), |_, y| match y {
            0 => -4.0,
            6 => 9.0,
            _ => 0.0,
        });
        let velocity = MacVelocity2::from_components(grid, u, v);
        let advected = advect_velocity(&velocity, 0.1);
        for y in 0..6 {
            assert_eq!(advected.u().get(0, y), 5.0);
            assert_eq!(advected.u().get(6, y), 7.0);
        }
        for x in 0..6 {
            assert_eq!(advected.v().get(x, 0), -4.0);
            assert_eq!(advected.v().get(x, 6), 9.0);
        }
    }

    #[test]
    fn back_trace_outside_domain_clamps_to_edge() {
        let grid = MacGrid2::new(5, 5, 1.0);
        let u = StaggeredField2::from_fn(grid.u_grid(), |x, _| 1.0e6 + x as f32);
        let v = StaggeredField2::new(grid.v_grid(), 0.0);
        let velocity = MacVelocity2::from_components(grid, u, v);
        let advected = advect_velocity(&velocity, 1.0);
        assert!(advected.is_finite());
        for y in 0..5 {
            for x in 1..5 {
                assert_eq!(advected.u().get(x, y), velocity.u().get(0, y));
            }
        }
    }

    #[test]
    fn shapes_are_preserved() {
        let mut state = GridState::new(80.0).unwrap();
        state.velocity.u_mut().set(3, 5, 500.0);
        advect(&mut state, 0.016);
        let u = state.velocity.u().grid();
        let v = state.velocity.v().grid();
        assert_eq!((u.height(), u.width()), (10, 11));
        assert_eq!((v.height(), v.width()), (11, 10));
    }
}
