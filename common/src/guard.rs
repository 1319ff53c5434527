use crate::grid::{Cell, Grid, Layout, Point};
use crate::matcher::{find_matches, swap_creates_match};
use rand::Rng;
use rand::seq::SliceRandom;

/// Shuffles of the existing colors tried before falling back to fresh colors.
pub const MAX_SHUFFLE_ATTEMPTS: usize = 2;
/// Fresh fills tried before the board is accepted as it is.
pub const MAX_REFILL_ATTEMPTS: usize = 8;

/// What [`ensure_playable`] had to do to leave a usable board behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reshuffle {
    /// The board already had a move and no standing match.
    NotNeeded,
    /// The existing colors were shuffled into a usable board.
    Shuffled,
    /// Shuffling failed; every piece was recolored from scratch.
    Refilled,
    /// Every bounded attempt failed and the last board was kept.
    Imperfect,
}

/// The first swap, scanning row-major, that would produce a match.
///
/// Only the right and lower neighbours are tried: every adjacent pair is the
/// right or lower neighbour of exactly one of its two slots, and the swap
/// test does not depend on argument order.
pub fn find_legal_move(grid: &mut Grid, match_size: usize) -> Option<(Point, Point)> {
    for point in grid.points() {
        for other in right_and_down(grid, point) {
            if swap_creates_match(grid, point, other, match_size) {
                return Some((point, other));
            }
        }
    }
    None
}

pub fn has_legal_move(grid: &mut Grid, match_size: usize) -> bool {
    find_legal_move(grid, match_size).is_some()
}

/// Every swap that would produce a match, each pair listed once.
pub fn legal_moves(grid: &mut Grid, match_size: usize) -> Vec<(Point, Point)> {
    let mut moves = Vec::new();
    for point in grid.points() {
        for other in right_and_down(grid, point) {
            if swap_creates_match(grid, point, other, match_size) {
                moves.push((point, other));
            }
        }
    }
    moves
}

fn right_and_down(grid: &Grid, point: Point) -> impl Iterator<Item = Point> + use<> {
    let right = Point::new(point.col + 1, point.row);
    let down = Point::new(point.col, point.row + 1);
    let (width, height) = (grid.width, grid.height);
    [right, down]
        .into_iter()
        .filter(move |p| p.col < width && p.row < height)
}

/// Colors every slot so that no run of `match_size` exists, by excluding
/// colors that would extend the run to the left or above. Slots that are
/// already occupied are recolored in place.
pub fn fill_without_matches<R: Rng>(
    grid: &mut Grid,
    layout: &Layout,
    palette_len: usize,
    match_size: usize,
    rng: &mut R,
) {
    for point in grid.points() {
        let forbidden = [
            run_color(grid, point, -1, 0, match_size),
            run_color(grid, point, 0, -1, match_size),
        ];
        let allowed: Vec<usize> = (0..palette_len)
            .filter(|color| !forbidden.contains(&Some(*color)))
            .collect();
        let color = if allowed.is_empty() {
            rng.random_range(0..palette_len)
        } else {
            allowed[rng.random_range(0..allowed.len())]
        };

        match grid.get_mut(point) {
            Some(cell) => cell.color = color,
            None => grid.put(point, Cell::new(color, layout.slot_origin(point))),
        }
    }
}

/// The color shared by the `match_size - 1` slots before `point` in direction
/// `(dc, dr)`, if they all have one.
fn run_color(grid: &Grid, point: Point, dc: isize, dr: isize, match_size: usize) -> Option<usize> {
    let mut color = None;
    for step in 1..match_size as isize {
        let cell = grid.cell_at(point.col as isize + dc * step, point.row as isize + dr * step)?;
        match color {
            None => color = Some(cell.color),
            Some(c) if c == cell.color => {}
            Some(_) => return None,
        }
    }
    color
}

fn is_playable(grid: &mut Grid, match_size: usize) -> bool {
    find_matches(grid, match_size).is_empty() && has_legal_move(grid, match_size)
}

/// Leaves the board free of standing matches and with at least one legal
/// move, changing it as little as needed.
///
/// First the existing colors are Fisher-Yates shuffled and reassigned slot by
/// slot, up to [`MAX_SHUFFLE_ATTEMPTS`] times. If that does not produce a
/// usable board every piece is recolored from scratch, up to
/// [`MAX_REFILL_ATTEMPTS`] times. After that the board is kept as it is and
/// [`Reshuffle::Imperfect`] is returned.
pub fn ensure_playable<R: Rng>(
    grid: &mut Grid,
    layout: &Layout,
    palette_len: usize,
    match_size: usize,
    rng: &mut R,
) -> Reshuffle {
    if is_playable(grid, match_size) {
        return Reshuffle::NotNeeded;
    }

    let points: Vec<Point> = grid.points().filter(|&p| grid.get(p).is_some()).collect();
    for attempt in 1..=MAX_SHUFFLE_ATTEMPTS {
        let mut colors: Vec<usize> = points.iter().filter_map(|&p| grid.color_at(p)).collect();
        colors.shuffle(rng);
        for (&point, color) in points.iter().zip(colors) {
            grid.set_color(point, color);
        }
        if is_playable(grid, match_size) {
            log::info!("board reshuffled after {attempt} attempt(s)");
            return Reshuffle::Shuffled;
        }
    }

    for attempt in 1..=MAX_REFILL_ATTEMPTS {
        fill_without_matches(grid, layout, palette_len, match_size, rng);
        if is_playable(grid, match_size) {
            log::info!("board refilled after {attempt} attempt(s)");
            return Reshuffle::Refilled;
        }
    }

    log::warn!("no playable board after bounded retries; keeping the current one");
    Reshuffle::Imperfect
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use rand::{SeedableRng, rngs::StdRng};

    fn layout() -> Layout {
        Layout::new(&GameConfig::default(), 480.0, 640.0)
    }

    /// Four colors in a pattern where no swap lines up three of a kind.
    fn deadlocked_rows() -> Vec<Vec<usize>> {
        vec![
            vec![0, 1, 2, 3],
            vec![2, 3, 0, 1],
            vec![0, 1, 2, 3],
            vec![2, 3, 0, 1],
        ]
    }

    /// Every swap in all four directions, counted from both ends.
    fn all_direction_moves(grid: &mut Grid, match_size: usize) -> Vec<(Point, Point)> {
        let mut moves = Vec::new();
        for point in grid.points() {
            let neighbours = [(-1isize, 0isize), (1, 0), (0, -1), (0, 1)];
            for (dc, dr) in neighbours {
                let col = point.col as isize + dc;
                let row = point.row as isize + dr;
                if col < 0 || row < 0 {
                    continue;
                }
                let other = Point::new(col as usize, row as usize);
                if grid.contains(other) && swap_creates_match(grid, point, other, match_size) {
                    moves.push((point.min(other), point.max(other)));
                }
            }
        }
        moves.sort();
        moves.dedup();
        moves
    }

    #[test]
    fn test_deadlocked_board_has_no_moves() {
        let mut grid = Grid::from_colors(&deadlocked_rows(), &layout());
        assert!(find_matches(&grid, 3).is_empty());
        assert!(!has_legal_move(&mut grid, 3));
        assert!(all_direction_moves(&mut grid, 3).is_empty());
    }

    #[test]
    fn test_single_legal_move_is_found_without_reshuffle() {
        // Only pulling the 0 at (2,1) up completes the top row
        let mut rows = deadlocked_rows();
        rows[0][1] = 0;
        let mut grid = Grid::from_colors(&rows, &layout());
        let before = grid.clone();
        assert_eq!(
            legal_moves(&mut grid, 3),
            vec![(Point::new(2, 0), Point::new(2, 1))]
        );

        let mut rng = StdRng::seed_from_u64(9);
        assert!(has_legal_move(&mut grid, 3));
        assert_eq!(
            ensure_playable(&mut grid, &layout(), 4, 3, &mut rng),
            Reshuffle::NotNeeded
        );
        assert_eq!(grid, before);
    }

    #[test]
    fn test_right_and_down_scan_matches_full_scan() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let mut grid = Grid::new(6, 6);
            fill_without_matches(&mut grid, &layout(), 4, 3, &mut rng);
            let mut scanned = legal_moves(&mut grid, 3);
            scanned.sort();
            assert_eq!(scanned, all_direction_moves(&mut grid, 3));
            assert_eq!(find_legal_move(&mut grid, 3), legal_moves(&mut grid, 3).first().copied());
        }
    }

    #[test]
    fn test_fill_without_matches_leaves_no_runs() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let mut grid = Grid::new(8, 8);
            fill_without_matches(&mut grid, &layout(), 3, 3, &mut rng);
            assert_eq!(grid.occupied_count(), 64);
            assert!(find_matches(&grid, 3).is_empty());
        }
    }

    #[test]
    fn test_deadlock_is_reshuffled_into_playable_board() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut grid = Grid::from_colors(&deadlocked_rows(), &layout());
        let outcome = ensure_playable(&mut grid, &layout(), 4, 3, &mut rng);

        assert!(matches!(outcome, Reshuffle::Shuffled | Reshuffle::Refilled));
        assert_eq!(grid.occupied_count(), 16);
        assert!(find_matches(&grid, 3).is_empty());
        assert!(has_legal_move(&mut grid, 3));
    }

    #[test]
    fn test_standing_match_is_reshuffled_away() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut grid = Grid::new(8, 8);
        fill_without_matches(&mut grid, &layout(), 6, 3, &mut rng);
        for col in 0..3 {
            grid.set_color(Point::new(col, 0), 0);
        }
        assert!(!find_matches(&grid, 3).is_empty());

        let outcome = ensure_playable(&mut grid, &layout(), 6, 3, &mut rng);
        assert_ne!(outcome, Reshuffle::NotNeeded);
        assert!(find_matches(&grid, 3).is_empty());
        assert!(has_legal_move(&mut grid, 3));
    }

    #[test]
    fn test_hopeless_board_is_accepted_after_bounded_retries() {
        // Three slots in a row: a legal move needs three equal colors, which
        // is already a match, so no board of this shape is ever playable
        let mut rng = StdRng::seed_from_u64(1);
        let mut grid = Grid::from_colors(&[vec![0, 1, 2]], &layout());
        let outcome = ensure_playable(&mut grid, &layout(), 3, 3, &mut rng);
        assert_eq!(outcome, Reshuffle::Imperfect);
        assert_eq!(grid.occupied_count(), 3);
    }
}
