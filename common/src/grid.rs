use crate::config::GameConfig;
use itertools::iproduct;

/// A slot on the board, addressed by column and row (row 0 is the top).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point {
    pub col: usize,
    pub row: usize,
}

impl Point {
    pub fn new(col: usize, row: usize) -> Self {
        Point { col, row }
    }

    /// Four-directional neighbours only: Manhattan distance of exactly 1.
    pub fn is_adjacent(self, other: Point) -> bool {
        self.col.abs_diff(other.col) + self.row.abs_diff(other.row) == 1
    }
}

/// A position in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    pub fn lerp(self, to: Vec2, t: f32) -> Vec2 {
        Vec2 {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }
}

/// A single piece. Its slot is implied by where it sits in the [`Grid`];
/// `display` is where it is drawn right now, which differs from its slot
/// while it is being swapped or is falling.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Index into the configured palette.
    pub color: usize,
    pub display: Vec2,
    pub target: Vec2,
    pub falling: bool,
    /// 0..=1 while the piece flashes before removal.
    pub flash: f32,
    pub scale: f32,
    pub opacity: f32,
}

impl Cell {
    /// A settled piece drawn at its slot.
    pub fn new(color: usize, at: Vec2) -> Self {
        Cell {
            color,
            display: at,
            target: at,
            falling: false,
            flash: 0.0,
            scale: 1.0,
            opacity: 1.0,
        }
    }

    /// Puts the piece back at `slot` with no animation state left over.
    pub fn settle(&mut self, slot: Vec2) {
        self.display = slot;
        self.target = slot;
        self.falling = false;
        self.flash = 0.0;
        self.scale = 1.0;
        self.opacity = 1.0;
    }
}

/// Maps grid slots to canvas pixels. Computed once per canvas size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub offset: Vec2,
    pub cell_size: f32,
    pub padding: f32,
    pub width: usize,
    pub height: usize,
}

impl Layout {
    /// Centers the grid horizontally and in the area below the header.
    pub fn new(config: &GameConfig, canvas_width: f32, canvas_height: f32) -> Self {
        let spacing = config.cell_size + config.padding;
        let grid_width = config.width as f32 * spacing - config.padding;
        let grid_height = config.height as f32 * spacing - config.padding;
        let free_height = canvas_height - config.header_height;
        Layout {
            offset: Vec2 {
                x: (canvas_width - grid_width) / 2.0,
                y: config.header_height + (free_height - grid_height) / 2.0,
            },
            cell_size: config.cell_size,
            padding: config.padding,
            width: config.width,
            height: config.height,
        }
    }

    pub fn spacing(&self) -> f32 {
        self.cell_size + self.padding
    }

    /// Top-left pixel of a slot.
    pub fn slot_origin(&self, point: Point) -> Vec2 {
        Vec2 {
            x: self.offset.x + point.col as f32 * self.spacing(),
            y: self.offset.y + point.row as f32 * self.spacing(),
        }
    }

    /// The y a slot in `row` is drawn at; rows above the grid are negative offsets.
    pub fn row_y(&self, row: isize) -> f32 {
        self.offset.y + row as f32 * self.spacing()
    }

    /// Pixel size of the whole grid; no gap trails the last column or row.
    pub fn grid_size(&self) -> Vec2 {
        Vec2 {
            x: self.width as f32 * self.spacing() - self.padding,
            y: self.height as f32 * self.spacing() - self.padding,
        }
    }

    /// Translates a canvas pixel to the slot under it, or `None` when it lies
    /// outside the grid. A gap between two slots belongs to the one before it.
    pub fn pixel_to_cell(&self, x: f32, y: f32) -> Option<Point> {
        let local_x = x - self.offset.x;
        let local_y = y - self.offset.y;
        let size = self.grid_size();
        if !(0.0..size.x).contains(&local_x) || !(0.0..size.y).contains(&local_y) {
            return None;
        }
        let col = ((local_x / self.spacing()) as usize).min(self.width - 1);
        let row = ((local_y / self.spacing()) as usize).min(self.height - 1);
        Some(Point::new(col, row))
    }
}

/// The authoritative board: `cells[row][col]`, `None` for a slot emptied by a match.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<Vec<Option<Cell>>>,
}

impl Grid {
    /// An empty board.
    pub fn new(width: usize, height: usize) -> Self {
        Grid {
            width,
            height,
            cells: vec![vec![None; width]; height],
        }
    }

    /// Builds a settled board from rows of palette indices, mostly for tests
    /// and snapshots.
    pub fn from_colors(rows: &[Vec<usize>], layout: &Layout) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut grid = Grid::new(width, height);
        for (row, colors) in rows.iter().enumerate() {
            for (col, &color) in colors.iter().enumerate().take(width) {
                let point = Point::new(col, row);
                grid.put(point, Cell::new(color, layout.slot_origin(point)));
            }
        }
        grid
    }

    pub fn contains(&self, point: Point) -> bool {
        point.col < self.width && point.row < self.height
    }

    /// Bounds-checked lookup that also accepts coordinates left of/above the board.
    pub fn cell_at(&self, col: isize, row: isize) -> Option<&Cell> {
        if col < 0 || row < 0 {
            return None;
        }
        self.get(Point::new(col as usize, row as usize))
    }

    pub fn get(&self, point: Point) -> Option<&Cell> {
        self.cells.get(point.row)?.get(point.col)?.as_ref()
    }

    pub fn get_mut(&mut self, point: Point) -> Option<&mut Cell> {
        self.cells.get_mut(point.row)?.get_mut(point.col)?.as_mut()
    }

    pub fn color_at(&self, point: Point) -> Option<usize> {
        self.get(point).map(|cell| cell.color)
    }

    /// Recolors an occupied slot. Empty or out-of-range slots are left alone.
    pub fn set_color(&mut self, point: Point, color: usize) {
        if let Some(cell) = self.get_mut(point) {
            cell.color = color;
        }
    }

    pub fn take(&mut self, point: Point) -> Option<Cell> {
        self.cells.get_mut(point.row)?.get_mut(point.col)?.take()
    }

    pub fn put(&mut self, point: Point, cell: Cell) {
        if self.contains(point) {
            self.cells[point.row][point.col] = Some(cell);
        }
    }

    /// Exchanges the pieces in two slots; the piece objects themselves move.
    pub fn swap(&mut self, a: Point, b: Point) {
        if a == b || !self.contains(a) || !self.contains(b) {
            return;
        }
        let first = self.cells[a.row][a.col].take();
        let second = std::mem::replace(&mut self.cells[b.row][b.col], first);
        self.cells[a.row][a.col] = second;
    }

    /// Exchanges only the colors of two occupied slots.
    pub fn swap_colors(&mut self, a: Point, b: Point) {
        if let (Some(ca), Some(cb)) = (self.color_at(a), self.color_at(b)) {
            self.set_color(a, cb);
            self.set_color(b, ca);
        }
    }

    /// Every slot in row-major order.
    pub fn points(&self) -> impl Iterator<Item = Point> + use<> {
        iproduct!(0..self.height, 0..self.width).map(|(row, col)| Point::new(col, row))
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| cell.is_some()).count()
    }

    /// Row-major colors of every slot.
    pub fn colors(&self) -> Vec<Option<usize>> {
        self.cells
            .iter()
            .flatten()
            .map(|cell| cell.as_ref().map(|c| c.color))
            .collect()
    }

    /// Snaps every piece back to its slot, dropping animation state.
    pub fn settle_all(&mut self, layout: &Layout) {
        for point in self.points() {
            let origin = layout.slot_origin(point);
            if let Some(cell) = self.get_mut(point) {
                cell.settle(origin);
            }
        }
    }

    pub fn any_falling(&self) -> bool {
        self.cells.iter().flatten().flatten().any(|cell| cell.falling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Layout {
        Layout::new(&GameConfig::default(), 480.0, 640.0)
    }

    #[test]
    fn test_adjacency_is_four_directional() {
        let center = Point::new(2, 2);
        assert!(center.is_adjacent(Point::new(3, 2)));
        assert!(center.is_adjacent(Point::new(2, 1)));
        assert!(!center.is_adjacent(Point::new(3, 3)));
        assert!(!center.is_adjacent(center));
        assert!(!center.is_adjacent(Point::new(4, 2)));
    }

    #[test]
    fn test_layout_centers_grid_below_header() {
        // Default: 8 slots of 56px with 4px gaps = 476px wide and tall
        let layout = layout();
        assert!((layout.offset.x - 2.0).abs() < 1e-3);
        assert!((layout.offset.y - (96.0 + (544.0 - 476.0) / 2.0)).abs() < 1e-3);

        let origin = layout.slot_origin(Point::new(1, 2));
        assert!((origin.x - (layout.offset.x + 60.0)).abs() < 1e-3);
        assert!((origin.y - (layout.offset.y + 120.0)).abs() < 1e-3);
    }

    #[test]
    fn test_pixel_to_cell() {
        let layout = layout();
        let origin = layout.slot_origin(Point::new(3, 5));
        assert_eq!(
            layout.pixel_to_cell(origin.x + 10.0, origin.y + 10.0),
            Some(Point::new(3, 5))
        );
        // Header area and off to the side are outside the grid
        assert_eq!(layout.pixel_to_cell(100.0, 20.0), None);
        assert_eq!(layout.pixel_to_cell(-5.0, 300.0), None);
        assert_eq!(layout.pixel_to_cell(490.0, 300.0), None);
        assert_eq!(layout.pixel_to_cell(f32::NAN, 300.0), None);
    }

    #[test]
    fn test_trailing_padding_is_outside_grid() {
        // Default grid spans x and y in [offset, offset + 476)
        let layout = layout();
        let size = layout.grid_size();
        assert!((size.x - 476.0).abs() < 1e-3);
        let last = layout.slot_origin(Point::new(7, 7));
        let (right, bottom) = (layout.offset.x + size.x, layout.offset.y + size.y);

        assert_eq!(
            layout.pixel_to_cell(right - 1.0, bottom - 1.0),
            Some(Point::new(7, 7))
        );
        assert_eq!(layout.pixel_to_cell(right + 1.0, last.y + 10.0), None);
        assert_eq!(layout.pixel_to_cell(last.x + 10.0, bottom + 1.0), None);
        // The gap between two slots still picks the earlier one
        let gap = layout.slot_origin(Point::new(2, 0)).x + layout.cell_size + 1.0;
        assert_eq!(
            layout.pixel_to_cell(gap, last.y + 10.0),
            Some(Point::new(2, 7))
        );
    }

    #[test]
    fn test_cell_at_bounds() {
        let grid = Grid::from_colors(&[vec![0, 1], vec![2, 3]], &layout());
        assert_eq!(grid.cell_at(1, 1).map(|c| c.color), Some(3));
        assert!(grid.cell_at(-1, 0).is_none());
        assert!(grid.cell_at(0, 2).is_none());
        assert!(grid.cell_at(2, 0).is_none());
    }

    #[test]
    fn test_empty_slot_reads_as_none() {
        let mut grid = Grid::from_colors(&[vec![0, 1], vec![2, 3]], &layout());
        let removed = grid.take(Point::new(0, 0));
        assert_eq!(removed.map(|c| c.color), Some(0));
        assert!(grid.cell_at(0, 0).is_none());
        assert_eq!(grid.occupied_count(), 3);
    }

    #[test]
    fn test_swap_moves_pieces() {
        let layout = layout();
        let mut grid = Grid::from_colors(&[vec![0, 1]], &layout);
        let a = Point::new(0, 0);
        let b = Point::new(1, 0);
        grid.swap(a, b);
        assert_eq!(grid.color_at(a), Some(1));
        assert_eq!(grid.color_at(b), Some(0));
        // The moved piece still remembers where it was drawn
        assert_eq!(grid.get(a).unwrap().display, layout.slot_origin(b));

        grid.swap_colors(a, b);
        assert_eq!(grid.colors(), vec![Some(0), Some(1)]);
    }
}
