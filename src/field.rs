use crate::grid::Grid2;

/// Cell-centred scalar field, one value per cell in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct Field2 {
    grid: Grid2,
    data: Vec<f32>,
}

impl Field2 {
    pub fn new(grid: Grid2, fill: f32) -> Self {
        let data = vec![fill; grid.size()];
        Self { grid, data }
    }

    pub fn from_fn(grid: Grid2, f: impl Fn(usize, usize) -> f32) -> Self {
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

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.grid.idx(x, y)]
    }

    pub fn add(&mut self, x: usize, y: usize, value: f32) {
        let idx = self.grid.idx(x, y);
        self.data[idx] += value;
    }

    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        let data = self.data.iter().map(|value| f(*value)).collect();
        Self {
            grid: self.grid,
            data,
        }
    }

    pub fn max_abs(&self) -> f32 {
        self.data
            .iter()
            .map(|value| value.abs())
            .fold(0.0_f32, f32::max)
    }

    pub fn min_max(&self) -> (f32, f32) {
        let mut iter = self.data.iter().filter(|value| value.is_finite());
        let Some(first) = iter.next() else {
            return (0.0, 0.0);
        };
        let mut min_value = *first;
        let mut max_value = *first;
        for value in iter {
            if *value < min_value {
                min_value = *value;
            }
            if *value > max_value {
                max_value = *value;
            }
        }
        (min_value, max_value)
    }

    /// Linear rescale onto `[0, 1]` between the current min and max.
    ///
    /// A field with no spread (all values equal, or no finite values) maps to all zeros.
    /// Non-finite samples map to zero as well.
    pub fn normalized(&self) -> Self {
        let (min_value, max_value) = self.min_max();
        let range = max_value - min_value;
        if range <= 0.0 || !range.is_finite() {
            return Self::new(self.grid, 0.0);
        }
        self.map(|value| {
            if value.is_finite() {
                ((value - min_value) / range).clamp(0.0, 1.0)
            } else {
                0.0
            }
        })
    }
}
