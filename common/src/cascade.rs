use crate::grid::{Cell, Grid, Layout, Point, Vec2};
use rand::Rng;

/// Compacts every column after a removal and refills the gaps from above.
///
/// Surviving pieces keep their relative order and slide down; each one that
/// moves is marked falling toward its new slot while still being drawn where
/// it was. New pieces get a random color and start above the grid, the
/// topmost new piece starting highest, so every column drops as one block.
/// Returns how many pieces were spawned.
pub fn apply_gravity<R: Rng>(
    grid: &mut Grid,
    layout: &Layout,
    palette_len: usize,
    rng: &mut R,
) -> usize {
    let mut spawned = 0;

    for col in 0..grid.width {
        // Next free slot from the bottom.
        let mut write = grid.height;
        for row in (0..grid.height).rev() {
            let from = Point::new(col, row);
            let Some(mut cell) = grid.take(from) else {
                continue;
            };
            write -= 1;
            let to = Point::new(col, write);
            if to != from {
                cell.target = layout.slot_origin(to);
                cell.falling = true;
            }
            grid.put(to, cell);
        }

        let missing = write;
        for row in 0..missing {
            let slot = layout.slot_origin(Point::new(col, row));
            let start = Vec2::new(slot.x, layout.row_y(row as isize - missing as isize));
            let mut cell = Cell::new(rng.random_range(0..palette_len), start);
            cell.target = slot;
            cell.falling = true;
            grid.put(Point::new(col, row), cell);
        }
        spawned += missing;
    }

    spawned
}

/// Moves every falling piece `speed * dt` pixels toward its slot, stopping
/// exactly on it. Returns whether anything is still falling.
pub fn advance_falling(grid: &mut Grid, speed: f32, dt: f32) -> bool {
    let step = speed * dt;
    let mut still_falling = false;
    for cell in grid.cells.iter_mut().flatten().flatten() {
        if !cell.falling {
            continue;
        }
        cell.display.y += step;
        if cell.display.y >= cell.target.y {
            cell.display = cell.target;
            cell.falling = false;
        } else {
            still_falling = true;
        }
    }
    still_falling
}
