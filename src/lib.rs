mod advection;
mod config;
mod error;
mod field;
mod forces;
mod grid;
mod mac;
mod projection;
mod sim;
mod state;
mod vec2;

pub use advection::{advect, advect_velocity};
pub use config::{load as load_config, parse as parse_config, InletConfig, Obstacle, SimConfig};
pub use error::{SimError, SimResult};
pub use field::Field2;
pub use forces::{apply_forces, InletJet};
pub use grid::Grid2;
pub use mac::{CellFlags, CellType, MacGrid2, MacVelocity2, StaggeredField2, StaggeredGrid2};
pub use projection::{
    divergence, project, relax_cell, ProjectionReport, Relaxation, OVER_RELAXATION,
};
pub use sim::{EulerSim, SimParams, StepReport};
pub use state::{GridState, DOMAIN_EXTENT, MAX_CELLS, MIN_CELLS};
pub use vec2::Vec2;
