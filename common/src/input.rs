use crate::grid::{Layout, Point};

/// A pointer event after translation into grid space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tap {
    Cell(Point),
    Outside,
}

/// Holds the tap produced by the host between two ticks and the piece the
/// player picked on an earlier tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Input {
    pending: Option<Tap>,
    selected: Option<Point>,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a tap at canvas pixel `(x, y)`. A later tap before the next
    /// tick replaces this one.
    pub fn press(&mut self, layout: &Layout, x: f32, y: f32) {
        let tap = match layout.pixel_to_cell(x, y) {
            Some(point) => Tap::Cell(point),
            None => Tap::Outside,
        };
        log::trace!("tap at ({x}, {y}) -> {tap:?}");
        self.pending = Some(tap);
    }

    /// Records a tap on a known slot, skipping pixel translation.
    pub fn press_cell(&mut self, point: Point) {
        self.pending = Some(Tap::Cell(point));
    }

    /// Hands out the pending tap once.
    pub fn take_pending(&mut self) -> Option<Tap> {
        self.pending.take()
    }

    pub fn selected(&self) -> Option<Point> {
        self.selected
    }

    pub fn select(&mut self, point: Point) {
        self.selected = Some(point);
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn clear(&mut self) {
        self.pending = None;
        self.selected = None;
    }
}
