#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid2 {
    width: usize,
    height: usize,
    dx: f32,
}

impl Grid2 {
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

    pub fn size(&self) -> usize {
        self.width * self.height
    }

    pub fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    /// Returns the linear index for a signed coordinate, or `None` outside the grid.
    pub fn checked_idx(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(self.idx(x as usize, y as usize))
    }

    /// Cell centre in domain units, x along columns and y along rows.
    pub fn cell_center(&self, x: usize, y: usize) -> (f32, f32) {
        (
            (x as f32 + 0.5) * self.dx,
            (y as f32 + 0.5) * self.dx,
        )
    }
}
