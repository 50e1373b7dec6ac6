use crate::advection::advect;
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::forces::{apply_forces, InletJet};
use crate::projection::{project, ProjectionReport};
use crate::state::GridState;
use crate::Field2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimParams {
    pub gravity: f32,
    pub density: f32,
    pub iterations: usize,
}

impl From<&SimConfig> for SimParams {
    fn from(config: &SimConfig) -> Self {
        Self {
            gravity: config.gravity,
            density: config.density,
            iterations: config.iterations,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepReport {
    pub frame: u64,
    pub projection: ProjectionReport,
    pub max_speed: f32,
    pub kinetic_energy: f32,
}

/// One simulation: grid state plus the constants that drive it.
///
/// `advance` runs forces, projection and advection in that order; nothing else
/// mutates the state between calls.
#[derive(Clone, Debug)]
pub struct EulerSim {
    state: GridState,
    params: SimParams,
    jet: InletJet,
    frame: u64,
}

impl EulerSim {
    pub fn new(config: &SimConfig) -> SimResult<Self> {
        config.validate()?;
        let state = GridState::with_obstacles(config.cell_size, &config.obstacles)?;
        let jet = InletJet::resolve(&config.inlet, state.grid())?;
        log::info!(
            "euler grid {n}x{n}, cell size {cell_size}, {iterations} sweep(s), jet at column {column} rows {rows:?}",
            n = state.cells(),
            cell_size = state.cell_size(),
            iterations = config.iterations,
            column = jet.column,
            rows = jet.rows,
        );
        Ok(Self {
            state,
            params: SimParams::from(config),
            jet,
            frame: 0,
        })
    }

    /// Advances one frame of `dt` seconds.
    ///
    /// A non-positive or non-finite `dt` is rejected before anything is touched. If a phase
    /// leaves a non-finite velocity behind, the error names that phase and the state is left
    /// as that phase produced it.
    pub fn advance(&mut self, dt: f32) -> SimResult<StepReport> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimError::InvalidTimeStep { dt });
        }
        apply_forces(&mut self.state, self.params.gravity, &self.jet, dt);
        self.ensure_finite("force integration")?;
        let projection = project(
            &mut self.state,
            self.params.iterations,
            self.params.density,
            dt,
        );
        self.ensure_finite("projection")?;
        advect(&mut self.state, dt);
        self.ensure_finite("advection")?;
        self.frame += 1;

        let report = StepReport {
            frame: self.frame,
            projection,
            max_speed: self.state.velocity.max_abs(),
            kinetic_energy: self.state.velocity.energy(),
        };
        log::debug!(
            "frame {} dt {:.4}: divergence {:.3e} -> {:.3e}, skipped {}, max speed {:.3}",
            report.frame,
            dt,
            projection.max_divergence_before,
            projection.max_divergence_after,
            projection.skipped_cells,
            report.max_speed,
        );
        Ok(report)
    }

    /// Pressure rescaled onto `[0, 1]`; a uniform field reads as all zeros.
    pub fn pressure_field(&self) -> Field2 {
        self.state.pressure.normalized()
    }

    pub fn raw_pressure(&self) -> &Field2 {
        &self.state.pressure
    }

    pub fn state(&self) -> &GridState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GridState {
        &mut self.state
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    fn ensure_finite(&self, phase: &'static str) -> SimResult<()> {
        if self.state.velocity.is_finite() {
            Ok(())
        } else {
            log::error!("non-finite velocity after {phase} on frame {}", self.frame + 1);
            Err(SimError::NonFiniteVelocity { phase })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InletConfig;

    fn small_config() -> SimConfig {
        SimConfig {
            cell_size: 80.0,
            ..SimConfig::default()
        }
    }

    #[test]
    fn advance_rejects_bad_dt() {
        let mut sim = EulerSim::new(&small_config()).unwrap();
        for dt in [0.0, -0.1, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                sim.advance(dt),
                Err(SimError::InvalidTimeStep { .. })
            ));
        }
        assert_eq!(sim.frame(), 0);
        assert_eq!(sim.state().velocity.max_abs(), 0.0);
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = SimConfig {
            iterations: 0,
            ..small_config()
        };
        assert!(EulerSim::new(&config).is_err());
        let config = SimConfig {
            inlet: InletConfig {
                column: 99,
                ..InletConfig::default()
            },
            ..small_config()
        };
        assert!(EulerSim::new(&config).is_err());
    }

    #[test]
    fn jet_drives_flow_and_pressure() {
        let mut sim = EulerSim::new(&small_config()).unwrap();
        let report = sim.advance(1.0 / 60.0).unwrap();
        assert_eq!(report.frame, 1);
        assert!(report.max_speed > 0.0);
        assert!(report.projection.max_divergence_before > 0.0);
        let pressure = sim.pressure_field();
        let (min_value, max_value) = pressure.min_max();
        assert_eq!(min_value, 0.0);
        assert_eq!(max_value, 1.0);
    }

    #[test]
    fn quiet_grid_reads_uniform_pressure() {
        let config = SimConfig {
            inlet: InletConfig {
                boost: 0.0,
                ..InletConfig::default()
            },
            ..small_config()
        };
        let mut sim = EulerSim::new(&config).unwrap();
        sim.advance(0.1).unwrap();
        assert!(sim.pressure_field().as_slice().iter().all(|value| *value == 0.0));
        assert_eq!(sim.state().velocity.max_abs(), 0.0);
    }

    #[test]
    fn non_finite_forcing_is_reported() {
        let mut sim = EulerSim::new(&small_config()).unwrap();
        sim.state_mut().velocity.u_mut().set(4, 4, f32::NAN);
        let err = sim.advance(0.1).unwrap_err();
        assert!(matches!(
            err,
            SimError::NonFiniteVelocity {
                phase: "force integration"
            }
        ));
        assert_eq!(sim.frame(), 0);
    }

    #[test]
    fn many_frames_stay_finite() {
        let config = SimConfig {
            iterations: 20,
            ..small_config()
        };
        let mut sim = EulerSim::new(&config).unwrap();
        for _ in 0..30 {
            sim.advance(1.0 / 60.0).unwrap();
        }
        assert_eq!(sim.frame(), 30);
        assert!(sim.raw_pressure().as_slice().iter().all(|value| value.is_finite()));
    }
}
