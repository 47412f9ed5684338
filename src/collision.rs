//! Grid-based screen-space collision detection for labels.

use glam::Vec2;

use crate::element::ElementKey;

/// Axis-aligned screen rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl ScreenRect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Rectangle of the given size centred on `center`.
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn is_empty(&self) -> bool {
        !(self.min.x < self.max.x && self.min.y < self.max.y)
    }

    /// Strict overlap: rectangles sharing only an edge do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &ScreenRect) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &ScreenRect) -> ScreenRect {
        ScreenRect {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Clip to `[0, width] x [0, height]`. May return an empty rectangle.
    pub fn clip(&self, width: f32, height: f32) -> ScreenRect {
        ScreenRect {
            min: self.min.max(Vec2::ZERO),
            max: self.max.min(Vec2::new(width, height)),
        }
    }
}

/// Index of screen rectangles claimed during the current frame.
pub trait CollisionIndex {
    /// Drop all claims and adopt the new screen size.
    fn reset(&mut self, width: u32, height: u32);

    /// Whether `rect` overlaps any claimed rectangle.
    fn intersects(&self, rect: &ScreenRect) -> bool;

    /// Claim `rect` for `id` if it is on screen and overlaps nothing.
    /// Returns true if the rectangle was claimed.
    fn allocate(&mut self, rect: ScreenRect, id: ElementKey) -> bool;

    /// Owner of the claim containing `point`, if any.
    fn owner_at(&self, point: Vec2) -> Option<ElementKey>;

    /// Number of claims this frame.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Uniform bucket grid. Each cell lists the claims touching it, so a query only
/// inspects rectangles sharing a cell with the probe.
pub struct ScreenCollisionGrid {
    width: f32,
    height: f32,
    cell_size: f32,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<usize>>,
    claims: Vec<(ScreenRect, ElementKey)>,
}

impl ScreenCollisionGrid {
    /// Create a new collision grid.
    ///
    /// # Arguments
    /// * `width` - Screen width in pixels
    /// * `height` - Screen height in pixels
    /// * `cell_size` - Bucket size in pixels, roughly a typical label extent
    pub fn new(width: u32, height: u32, cell_size: u32) -> Self {
        let mut grid = Self {
            width: 0.0,
            height: 0.0,
            cell_size: cell_size.max(1) as f32,
            cols: 0,
            rows: 0,
            cells: Vec::new(),
            claims: Vec::new(),
        };
        grid.reset(width, height);
        grid
    }

    fn cell_range(&self, rect: &ScreenRect) -> (usize, usize, usize, usize) {
        let col0 = (rect.min.x / self.cell_size).floor().max(0.0) as usize;
        let row0 = (rect.min.y / self.cell_size).floor().max(0.0) as usize;
        let col1 = ((rect.max.x / self.cell_size).ceil() as usize).min(self.cols);
        let row1 = ((rect.max.y / self.cell_size).ceil() as usize).min(self.rows);
        (col0.min(self.cols.saturating_sub(1)), col1, row0.min(self.rows.saturating_sub(1)), row1)
    }

    fn intersects_clipped(&self, rect: &ScreenRect) -> bool {
        let (col0, col1, row0, row1) = self.cell_range(rect);
        for row in row0..row1 {
            for col in col0..col1 {
                let cell = &self.cells[row * self.cols + col];
                if cell.iter().any(|&i| self.claims[i].0.overlaps(rect)) {
                    return true;
                }
            }
        }
        false
    }
}

impl CollisionIndex for ScreenCollisionGrid {
    fn reset(&mut self, width: u32, height: u32) {
        let (w, h) = (width as f32, height as f32);
        if w != self.width || h != self.height {
            let cell = self.cell_size as u32;
            self.cols = width.div_ceil(cell).max(1) as usize;
            self.rows = height.div_ceil(cell).max(1) as usize;
            self.cells = vec![Vec::new(); self.cols * self.rows];
            self.width = w;
            self.height = h;
        } else {
            for cell in &mut self.cells {
                cell.clear();
            }
        }
        self.claims.clear();
    }

    fn intersects(&self, rect: &ScreenRect) -> bool {
        let clipped = rect.clip(self.width, self.height);
        if clipped.is_empty() {
            return false;
        }
        self.intersects_clipped(&clipped)
    }

    fn allocate(&mut self, rect: ScreenRect, id: ElementKey) -> bool {
        let clipped = rect.clip(self.width, self.height);
        if clipped.is_empty() || self.intersects_clipped(&clipped) {
            return false;
        }

        let index = self.claims.len();
        self.claims.push((clipped, id));
        let (col0, col1, row0, row1) = self.cell_range(&clipped);
        for row in row0..row1 {
            for col in col0..col1 {
                self.cells[row * self.cols + col].push(index);
            }
        }
        true
    }

    fn owner_at(&self, point: Vec2) -> Option<ElementKey> {
        if point.x < 0.0 || point.y < 0.0 || point.x > self.width || point.y > self.height {
            return None;
        }
        let col = ((point.x / self.cell_size) as usize).min(self.cols - 1);
        let row = ((point.y / self.cell_size) as usize).min(self.rows - 1);
        self.cells[row * self.cols + col]
            .iter()
            .map(|&i| self.claims[i])
            .find(|(rect, _)| rect.contains(point))
            .map(|(_, id)| id)
    }

    fn len(&self) -> usize {
        self.claims.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> ScreenRect {
        ScreenRect::new(Vec2::new(x0, y0), Vec2::new(x1, y1))
    }

    #[test]
    fn test_no_collision() {
        let mut grid = ScreenCollisionGrid::new(100, 100, 10);
        assert!(grid.allocate(rect(0.0, 0.0, 10.0, 10.0), ElementKey(1)));
        assert!(grid.allocate(rect(50.0, 50.0, 60.0, 60.0), ElementKey(2)));
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn test_collision() {
        let mut grid = ScreenCollisionGrid::new(100, 100, 10);
        assert!(grid.allocate(rect(0.0, 0.0, 20.0, 20.0), ElementKey(1)));
        assert!(grid.intersects(&rect(10.0, 10.0, 30.0, 30.0)));
        assert!(!grid.allocate(rect(10.0, 10.0, 30.0, 30.0), ElementKey(2)));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_touching_edges_do_not_collide() {
        let mut grid = ScreenCollisionGrid::new(100, 100, 10);
        assert!(grid.allocate(rect(0.0, 0.0, 20.0, 20.0), ElementKey(1)));
        assert!(grid.allocate(rect(20.0, 0.0, 40.0, 20.0), ElementKey(2)));
    }

    #[test]
    fn test_large_rect_spanning_many_cells() {
        let mut grid = ScreenCollisionGrid::new(200, 200, 16);
        assert!(grid.allocate(rect(5.0, 5.0, 190.0, 12.0), ElementKey(1)));
        assert!(grid.intersects(&rect(150.0, 0.0, 151.0, 6.0)));
        assert!(!grid.intersects(&rect(150.0, 12.0, 151.0, 20.0)));
    }

    #[test]
    fn test_reset() {
        let mut grid = ScreenCollisionGrid::new(100, 100, 10);
        assert!(grid.allocate(rect(0.0, 0.0, 50.0, 50.0), ElementKey(1)));
        grid.reset(100, 100);
        assert!(grid.is_empty());
        assert!(grid.allocate(rect(0.0, 0.0, 50.0, 50.0), ElementKey(2)));
    }

    #[test]
    fn test_reset_resizes() {
        let mut grid = ScreenCollisionGrid::new(100, 100, 10);
        grid.reset(300, 50);
        assert!(grid.allocate(rect(250.0, 10.0, 290.0, 40.0), ElementKey(1)));
        assert!(!grid.allocate(rect(0.0, 60.0, 10.0, 70.0), ElementKey(2)));
    }

    #[test]
    fn test_off_screen_cannot_allocate() {
        let mut grid = ScreenCollisionGrid::new(100, 100, 10);
        assert!(!grid.allocate(rect(-30.0, -30.0, -10.0, -10.0), ElementKey(1)));
        assert!(!grid.intersects(&rect(-30.0, -30.0, -10.0, -10.0)));
    }

    #[test]
    fn test_owner_at() {
        let mut grid = ScreenCollisionGrid::new(100, 100, 10);
        grid.allocate(rect(10.0, 10.0, 30.0, 20.0), ElementKey(7));
        assert_eq!(grid.owner_at(Vec2::new(25.0, 15.0)), Some(ElementKey(7)));
        assert_eq!(grid.owner_at(Vec2::new(50.0, 50.0)), None);
    }
}
