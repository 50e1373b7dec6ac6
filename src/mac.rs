use crate::{Grid2, Vec2};
use rayon::prelude::*;
use std::sync::OnceLock;

const PAR_THRESHOLD_DEFAULT: usize = 262_144;
const PAR_MIN_WORK_PER_THREAD: usize = 4096;

fn parallel_threshold() -> usize {
    static THRESHOLD: OnceLock<usize> = OnceLock::new();
    *THRESHOLD.get_or_init(|| {
        std::env::var("SIM_PAR_THRESHOLD")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(PAR_THRESHOLD_DEFAULT)
    })
}

fn should_parallel(len: usize) -> bool {
    if len < parallel_threshold() {
        return false;
    }
    let threads = rayon::current_num_threads().max(1);
    len / threads >= PAR_MIN_WORK_PER_THREAD
}

/// Staggered (MAC) layout: `u` on vertical faces, `v` on horizontal faces.
///
/// Coordinates are `(x, y)` = (column, row). A `u` sample `(x, y)` sits on the face
/// between cells `(x - 1, y)` and `(x, y)`; a `v` sample `(x, y)` sits on the face
/// between cells `(x, y - 1)` and `(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MacGrid2 {
    width: usize,
    height: usize,
    dx: f32,
}

impl MacGrid2 {
    pub fn new(width: usize, height: usize, dx: f32) -> Self {
        assert!(width > 0, "width must be > 0");
        assert!(height > 0, "height must be > 0");
        assert!(dx > 0.0, "dx must be > 0");
        Self { width, height, dx }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_grid(&self) -> Grid2 {
        Grid2::new(self.width, self.height, self.dx)
    }

    pub fn u_grid(&self) -> StaggeredGrid2 {
        StaggeredGrid2::new(
            self.width + 1,
            self.height,
            self.dx,
            (0.0, 0.5 * self.dx),
        )
    }

    pub fn v_grid(&self) -> StaggeredGrid2 {
        StaggeredGrid2::new(
            self.width,
            self.height + 1,
            self.dx,
            (0.5 * self.dx, 0.0),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StaggeredGrid2 {
    width: usize,
    height: usize,
    dx: f32,
    origin: (f32, f32),
}

impl StaggeredGrid2 {
    pub fn new(width: usize, height: usize, dx: f32, origin: (f32, f32)) -> Self {
        assert!(width > 0, "width must be > 0");
        assert!(height > 0, "height must be > 0");
        assert!(dx > 0.0, "dx must be > 0");
        Self {
            width,
            height,
            dx,
            origin,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dx(&self) -> f32 {
        self.dx
    }

    pub fn origin(&self) -> (f32, f32) {
        self.origin
    }

    pub fn size(&self) -> usize {
        self.width * self.height
    }

    pub fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    pub fn clamp_coord(&self, x: i32, y: i32) -> (usize, usize) {
        let max_x = (self.width - 1) as i32;
        let max_y = (self.height - 1) as i32;
        let cx = x.clamp(0, max_x) as usize;
        let cy = y.clamp(0, max_y) as usize;
        (cx, cy)
    }

    /// Physical position of sample `(x, y)` in domain units.
    pub fn index_position(&self, x: usize, y: usize) -> (f32, f32) {
        (
            self.origin.0 + x as f32 * self.dx,
            self.origin.1 + y as f32 * self.dx,
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StaggeredField2 {
    grid: StaggeredGrid2,
    data: Vec<f32>,
}

impl StaggeredField2 {
    pub fn new(grid: StaggeredGrid2, fill: f32) -> Self {
        let data = vec![fill; grid.size()];
        Self { grid, data }
    }

    pub fn from_fn(grid: StaggeredGrid2, f: impl Fn(usize, usize) -> f32 + Sync) -> Self {
        let mut field = Self::new(grid, 0.0);
        field.fill_with_index(f);
        field
    }

    pub fn grid(&self) -> StaggeredGrid2 {
        self.grid
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.grid.idx(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        let idx = self.grid.idx(x, y);
        self.data[idx] = value;
    }

    pub fn add(&mut self, x: usize, y: usize, value: f32) {
        let idx = self.grid.idx(x, y);
        self.data[idx] += value;
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn sample_clamped(&self, x: i32, y: i32) -> f32 {
        let (cx, cy) = self.grid.clamp_coord(x, y);
        self.get(cx, cy)
    }

    /// Bilinear sample at a physical position; indices outside the field clamp to the edge.
    pub fn sample_linear(&self, pos: (f32, f32)) -> f32 {
        let dx = self.grid.dx();
        let origin = self.grid.origin();
        let max_x = (self.grid.width() - 1) as f32;
        let max_y = (self.grid.height() - 1) as f32;
        let gx = ((pos.0 - origin.0) / dx).clamp(0.0, max_x);
        let gy = ((pos.1 - origin.1) / dx).clamp(0.0, max_y);
        let x0 = gx.floor() as i32;
        let y0 = gy.floor() as i32;
        let x1 = x0 + 1;
        let y1 = y0 + 1;
        let sx = gx - x0 as f32;
        let sy = gy - y0 as f32;
        let v00 = self.sample_clamped(x0, y0);
        let v10 = self.sample_clamped(x1, y0);
        let v01 = self.sample_clamped(x0, y1);
        let v11 = self.sample_clamped(x1, y1);
        let vx0 = v00 + (v10 - v00) * sx;
        let vx1 = v01 + (v11 - v01) * sx;
        vx0 + (vx1 - vx0) * sy
    }

    pub fn fill_with_index(&mut self, f: impl Fn(usize, usize) -> f32 + Sync) {
        let width = self.grid.width();
        if should_parallel(self.data.len()) {
            self.data.par_iter_mut().enumerate().for_each(|(i, value)| {
                let x = i % width;
                let y = i / width;
                *value = f(x, y);
            });
        } else {
            for (i, value) in self.data.iter_mut().enumerate() {
                let x = i % width;
                let y = i / width;
                *value = f(x, y);
            }
        }
    }

    pub fn update_with_index(&mut self, f: impl Fn(usize, usize, f32) -> f32 + Sync) {
        let width = self.grid.width();
        if should_parallel(self.data.len()) {
            self.data.par_iter_mut().enumerate().for_each(|(i, value)| {
                let x = i % width;
                let y = i / width;
                *value = f(x, y, *value);
            });
        } else {
            for (i, value) in self.data.iter_mut().enumerate() {
                let x = i % width;
                let y = i / width;
                *value = f(x, y, *value);
            }
        }
    }

    pub fn max_abs(&self) -> f32 {
        if should_parallel(self.data.len()) {
            self.data
                .par_iter()
                .map(|value| value.abs())
                .reduce(|| 0.0_f32, f32::max)
        } else {
            self.data
                .iter()
                .map(|value| value.abs())
                .fold(0.0_f32, f32::max)
        }
    }

    pub fn sum_squares(&self) -> f32 {
        if should_parallel(self.data.len()) {
            self.data.par_iter().map(|value| value * value).sum()
        } else {
            self.data.iter().map(|value| value * value).sum()
        }
    }

    pub fn is_finite(&self) -> bool {
        if should_parallel(self.data.len()) {
            self.data.par_iter().all(|value| value.is_finite())
        } else {
            self.data.iter().all(|value| value.is_finite())
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CellType {
    Fluid,
    Solid,
}

/// Wall mask: one flag per cell. Open cells weigh 1, solid cells 0.
#[derive(Clone, Debug, PartialEq)]
pub struct CellFlags {
    grid: Grid2,
    data: Vec<CellType>,
}

impl CellFlags {
    pub fn new(grid: Grid2, fill: CellType) -> Self {
        let data = vec![fill; grid.size()];
        Self { grid, data }
    }

    pub fn from_fn(grid: Grid2, f: impl Fn(usize, usize) -> CellType) -> Self {
        let width = grid.width();
        let data = (0..grid.size())
            .map(|i| {
                let x = i % width;
                let y = i / width;
                f(x, y)
            })
            .collect();
        Self { grid, data }
    }

    pub fn grid(&self) -> Grid2 {
        self.grid
    }

    pub fn get(&self, x: usize, y: usize) -> CellType {
        self.data[self.grid.idx(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: CellType) {
        let idx = self.grid.idx(x, y);
        self.data[idx] = value;
    }

    pub fn is_open(&self, x: usize, y: usize) -> bool {
        self.get(x, y) == CellType::Fluid
    }

    /// Openness weight of a possibly out-of-range cell; anything outside the grid is solid.
    pub fn openness(&self, x: i64, y: i64) -> f32 {
        match self.grid.checked_idx(x, y) {
            Some(idx) if self.data[idx] == CellType::Fluid => 1.0,
            _ => 0.0,
        }
    }

    pub fn count(&self, cell_type: CellType) -> usize {
        self.data.iter().filter(|value| **value == cell_type).count()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MacVelocity2 {
    grid: MacGrid2,
    u: StaggeredField2,
    v: StaggeredField2,
}

impl MacVelocity2 {
    pub fn new(grid: MacGrid2, fill: Vec2) -> Self {
        let u = StaggeredField2::new(grid.u_grid(), fill.x);
        let v = StaggeredField2::new(grid.v_grid(), fill.y);
        Self { grid, u, v }
    }

    pub fn from_components(grid: MacGrid2, u: StaggeredField2, v: StaggeredField2) -> Self {
        assert_eq!(u.grid(), grid.u_grid(), "u grid mismatch");
        assert_eq!(v.grid(), grid.v_grid(), "v grid mismatch");
        Self { grid, u, v }
    }

    pub fn grid(&self) -> MacGrid2 {
        self.grid
    }

    pub fn u(&self) -> &StaggeredField2 {
        &self.u
    }

    pub fn v(&self) -> &StaggeredField2 {
        &self.v
    }

    pub fn u_mut(&mut self) -> &mut StaggeredField2 {
        &mut self.u
    }

    pub fn v_mut(&mut self) -> &mut StaggeredField2 {
        &mut self.v
    }

    /// Both components mutably at once, for sweeps that touch `u` and `v` together.
    pub fn components_mut(&mut self) -> (&mut StaggeredField2, &mut StaggeredField2) {
        (&mut self.u, &mut self.v)
    }

    pub fn max_abs(&self) -> f32 {
        self.u.max_abs().max(self.v.max_abs())
    }

    pub fn energy(&self) -> f32 {
        0.5 * (self.u.sum_squares() + self.v.sum_squares())
    }

    pub fn is_finite(&self) -> bool {
        self.u.is_finite() && self.v.is_finite()
    }
}
