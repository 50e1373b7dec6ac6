//! Grid state: the velocity, pressure and wall fields of one simulation.

use crate::config::Obstacle;
use crate::error::{SimError, SimResult};
use crate::{CellFlags, CellType, Field2, MacGrid2, MacVelocity2, Vec2};

/// Side length of the square simulated domain, in length units.
pub const DOMAIN_EXTENT: f32 = 800.0;

/// Smallest grid with at least one interior cell.
pub const MIN_CELLS: usize = 3;

/// Largest supported grid, per axis.
pub const MAX_CELLS: usize = 4096;

/// Plain aggregate over the four simulation fields.
///
/// `velocity.u()` has `(N + 1) x N` samples and `velocity.v()` has `N x (N + 1)`,
/// both indexed `(column, row)`. `walls` is fixed after construction.
#[derive(Clone, Debug)]
pub struct GridState {
    pub velocity: MacVelocity2,
    pub pressure: Field2,
    pub walls: CellFlags,
    cell_size: f32,
}

impl GridState {
    /// Allocates an `N x N` grid with `N = ceil(DOMAIN_EXTENT / cell_size)`,
    /// a solid outer ring, an open interior and all velocities and pressures at zero.
    pub fn new(cell_size: f32) -> SimResult<Self> {
        let cells = cells_for(cell_size)?;
        let grid = MacGrid2::new(cells, cells, cell_size);
        let walls = CellFlags::from_fn(grid.cell_grid(), |x, y| {
            if x == 0 || y == 0 || x + 1 == cells || y + 1 == cells {
                CellType::Solid
            } else {
                CellType::Fluid
            }
        });
        Ok(Self {
            velocity: MacVelocity2::new(grid, Vec2::zero()),
            pressure: Field2::new(grid.cell_grid(), 0.0),
            walls,
            cell_size,
        })
    }

    /// Like [`GridState::new`], with every cell whose centre lies inside an obstacle made solid.
    pub fn with_obstacles(cell_size: f32, obstacles: &[Obstacle]) -> SimResult<Self> {
        let mut state = Self::new(cell_size)?;
        let cell_grid = state.walls.grid();
        for obstacle in obstacles {
            let center = Vec2::from(obstacle.center);
            let radius_sq = obstacle.radius * obstacle.radius;
            for y in 0..cell_grid.height() {
                for x in 0..cell_grid.width() {
                    let (cx, cy) = cell_grid.cell_center(x, y);
                    if Vec2::new(cx, cy).sub(center).length_squared() <= radius_sq {
                        state.walls.set(x, y, CellType::Solid);
                    }
                }
            }
        }
        let open = state.walls.count(CellType::Fluid);
        log::debug!(
            "grid {n}x{n} with {obstacles} obstacle(s), {open} open cells",
            n = state.cells(),
            obstacles = obstacles.len(),
        );
        Ok(state)
    }

    /// Cells per axis.
    pub fn cells(&self) -> usize {
        self.velocity.grid().width()
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn grid(&self) -> MacGrid2 {
        self.velocity.grid()
    }
}

fn cells_for(cell_size: f32) -> SimResult<usize> {
    if !cell_size.is_finite() || cell_size <= 0.0 {
        return Err(SimError::InvalidCellSize { cell_size });
    }
    let cells = (DOMAIN_EXTENT / cell_size).ceil();
    if cells > MAX_CELLS as f32 {
        return Err(SimError::GridTooLarge {
            cells,
            limit: MAX_CELLS,
        });
    }
    let cells = cells as usize;
    if cells < MIN_CELLS {
        return Err(SimError::GridTooSmall { cells });
    }
    Ok(cells)
}
