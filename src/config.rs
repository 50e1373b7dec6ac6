use crate::error::{SimError, SimResult};
use serde::Deserialize;
use std::path::Path;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub cell_size: f32,
    pub gravity: f32,
    pub density: f32,
    pub iterations: usize,
    pub inlet: InletConfig,
    pub obstacles: Vec<Obstacle>,
}

/// Band of `u` faces that receives a fixed horizontal boost every frame.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct InletConfig {
    pub column: usize,
    /// First row of the band; `None` starts at the middle row.
    pub row_start: Option<usize>,
    pub rows: usize,
    pub boost: f32,
}

/// Solid disc rasterised into the wall mask at construction, in domain units.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Obstacle {
    pub center: [f32; 2],
    pub radius: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            cell_size: 10.0,
            gravity: 0.0,
            density: 1.0,
            iterations: 1,
            inlet: InletConfig::default(),
            obstacles: Vec::new(),
        }
    }
}

impl Default for InletConfig {
    fn default() -> Self {
        Self {
            column: 3,
            row_start: None,
            rows: 5,
            boost: 500.0,
        }
    }
}

impl SimConfig {
    pub fn with_cell_size(cell_size: f32) -> Self {
        Self {
            cell_size,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(SimError::InvalidCellSize {
                cell_size: self.cell_size,
            });
        }
        if self.iterations == 0 {
            return Err(SimError::config("iterations must be >= 1"));
        }
        if !self.density.is_finite() || self.density <= 0.0 {
            return Err(SimError::config(format!(
                "density must be finite and > 0, got {}",
                self.density
            )));
        }
        if !self.gravity.is_finite() {
            return Err(SimError::config("gravity must be finite"));
        }
        if !self.inlet.boost.is_finite() {
            return Err(SimError::config("inlet boost must be finite"));
        }
        for obstacle in &self.obstacles {
            let finite = obstacle.center.iter().all(|value| value.is_finite())
                && obstacle.radius.is_finite();
            if !finite || obstacle.radius < 0.0 {
                return Err(SimError::config(format!(
                    "obstacle at {:?} has invalid radius {}",
                    obstacle.center, obstacle.radius
                )));
            }
        }
        Ok(())
    }
}

/// Loads a YAML config. A missing file yields the defaults; a broken one is an error.
pub fn load(path: &Path) -> SimResult<SimConfig> {
    if !path.exists() {
        log::warn!("{} not found; using default configuration", path.display());
        return Ok(SimConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|source| SimError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse(&contents).map_err(|source| SimError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

pub fn parse(contents: &str) -> Result<SimConfig, serde_yaml::Error> {
    serde_yaml::from_str(contents)
}
