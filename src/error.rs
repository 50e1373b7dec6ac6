//! Error type shared by construction, configuration and stepping.

use std::path::PathBuf;
use thiserror::Error;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("cell size must be finite and > 0, got {cell_size}")]
    InvalidCellSize { cell_size: f32 },

    #[error("grid needs at least 3 cells per axis, got {cells}")]
    GridTooSmall { cells: usize },

    #[error("grid of {cells} cells per axis exceeds the limit of {limit}")]
    GridTooLarge { cells: f32, limit: usize },

    #[error("time step must be finite and > 0, got {dt}")]
    InvalidTimeStep { dt: f32 },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("velocity field became non-finite during {phase}")]
    NonFiniteVelocity { phase: &'static str },

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl SimError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
