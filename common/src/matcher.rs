use crate::grid::{Grid, Point};
use itertools::Itertools;
use std::collections::BTreeSet;

/// Slots that belong to at least one qualifying run in a single scan.
pub type MatchSet = BTreeSet<Point>;

/// Scans every row and every column for maximal runs of one color that are
/// at least `match_size` long. A piece can qualify horizontally and
/// vertically at once; it appears in the set once. Empty slots break runs.
pub fn find_matches(grid: &Grid, match_size: usize) -> MatchSet {
    let mut matches = MatchSet::new();

    let rows = (0..grid.height).map(|row| {
        (0..grid.width)
            .map(|col| Point::new(col, row))
            .collect::<Vec<_>>()
    });
    let columns = (0..grid.width).map(|col| {
        (0..grid.height)
            .map(|row| Point::new(col, row))
            .collect::<Vec<_>>()
    });

    for line in rows.chain(columns) {
        collect_runs(grid, &line, match_size, &mut matches);
    }

    matches
}

/// Run-length scan of a single line of slots.
fn collect_runs(grid: &Grid, line: &[Point], match_size: usize, matches: &mut MatchSet) {
    for (color, run) in &line.iter().chunk_by(|&&point| grid.color_at(point)) {
        if color.is_none() {
            continue;
        }
        let run: Vec<Point> = run.copied().collect();
        if run.len() >= match_size {
            matches.extend(run);
        }
    }
}

/// Whether exchanging the colors of `a` and `b` would produce any match.
///
/// The colors are swapped in place, the whole board is rescanned, and the
/// colors are put back before returning, so the grid is unchanged afterwards.
/// Swapping a piece with itself, with an empty slot, or with a piece of the
/// same color is never a valid move.
pub fn swap_creates_match(grid: &mut Grid, a: Point, b: Point, match_size: usize) -> bool {
    if a == b {
        return false;
    }
    let (Some(color_a), Some(color_b)) = (grid.color_at(a), grid.color_at(b)) else {
        return false;
    };
    if color_a == color_b {
        return false;
    }

    grid.swap_colors(a, b);
    let found = !find_matches(grid, match_size).is_empty();
    grid.swap_colors(a, b);

    found
}
