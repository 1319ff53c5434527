use crate::cascade::{advance_falling, apply_gravity};
use crate::config::GameConfig;
use crate::grid::{Cell, Grid, Layout, Point, Vec2};
use crate::guard::{Reshuffle, ensure_playable, fill_without_matches, find_legal_move, legal_moves};
use crate::input::{Input, Tap};
use crate::matcher::{MatchSet, find_matches, swap_creates_match};
use crate::render::{Canvas, Sprite};
use crate::snapshot::BoardSnapshot;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

/// Extra scale at the peak of a matched piece's flash.
const FLASH_PULSE: f32 = 0.25;

/// Bound on instant match clearing when a board is restored.
const MAX_SILENT_ROUNDS: usize = 32;

/// Where the board is in resolving a move.
///
/// Removal has no phase of its own: when a flash finishes the matched pieces
/// are removed and gravity is applied in the same tick, going straight to
/// [`Phase::Falling`].
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// Waiting for the player.
    Idle,
    /// Two pieces are trading places. `valid` was decided before the tween started.
    Swapping {
        a: Point,
        b: Point,
        elapsed: f32,
        valid: bool,
    },
    /// An illegal swap is being played backwards. Nothing was committed.
    SwapBack { a: Point, b: Point, elapsed: f32 },
    /// Matched pieces are flashing before removal.
    Matching { cells: MatchSet, elapsed: f32 },
    /// Pieces are dropping into the gaps.
    Falling,
}

/// What happened during a tick, for the host's score and sound handling.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Selected(Point),
    Deselected,
    /// The attempted swap made no match and is being undone.
    SwapRejected { a: Point, b: Point },
    /// One resolution step removed `cells` pieces. `chain` counts steps since
    /// the player's move, starting at 1.
    Matched { cells: usize, chain: u32 },
    /// The board settled after a chain of `steps` resolution steps.
    ChainEnded { steps: u32 },
    /// The board had to be rearranged to stay playable.
    Reshuffled(Reshuffle),
}

/// A single match-3 board and the state machine that plays it.
///
/// Everything lives on the instance; a host can run as many boards side by
/// side as it likes. The engine is advanced only by [`Engine::update`].
pub struct Engine {
    config: GameConfig,
    layout: Layout,
    grid: Grid,
    input: Input,
    phase: Phase,
    chain: u32,
    rng: StdRng,
}

impl Engine {
    pub fn new(config: GameConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::rng().random()),
        };
        let layout = Layout::new(&config, config.canvas_width, config.canvas_height);
        let mut engine = Engine {
            grid: Grid::new(config.width, config.height),
            input: Input::new(),
            phase: Phase::Idle,
            chain: 0,
            layout,
            config,
            rng,
        };
        engine.fill_board();
        Ok(engine)
    }

    /// Starts a fresh board. A seeded configuration reproduces the board it
    /// started with; otherwise a new random board is dealt.
    pub fn reset(&mut self) {
        if let Some(seed) = self.config.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.grid = Grid::new(self.config.width, self.config.height);
        self.input.clear();
        self.phase = Phase::Idle;
        self.chain = 0;
        self.fill_board();
    }

    fn fill_board(&mut self) {
        let palette_len = self.config.palette.len();
        let match_size = self.config.match_size;
        fill_without_matches(&mut self.grid, &self.layout, palette_len, match_size, &mut self.rng);
        let outcome = ensure_playable(
            &mut self.grid,
            &self.layout,
            palette_len,
            match_size,
            &mut self.rng,
        );
        log::debug!(
            "dealt {}x{} board ({outcome:?})",
            self.config.width,
            self.config.height
        );
    }

    /// Recenters the board on a resized canvas. Falling pieces keep the
    /// distance they still have to fall.
    pub fn resize(&mut self, canvas_width: f32, canvas_height: f32) {
        self.config.canvas_width = canvas_width;
        self.config.canvas_height = canvas_height;
        let layout = Layout::new(&self.config, canvas_width, canvas_height);
        let dy = layout.offset.y - self.layout.offset.y;
        for point in self.grid.points() {
            let slot = layout.slot_origin(point);
            if let Some(cell) = self.grid.get_mut(point) {
                cell.target = slot;
                cell.display = if cell.falling {
                    Vec2::new(slot.x, cell.display.y + dy)
                } else {
                    slot
                };
            }
        }
        self.layout = layout;
    }

    /// A pointer press at canvas pixel `(x, y)`, picked up by the next tick.
    pub fn press(&mut self, x: f32, y: f32) {
        self.input.press(&self.layout, x, y);
    }

    pub fn press_cell(&mut self, point: Point) {
        self.input.press_cell(point);
    }

    /// Advances the board by `dt` seconds. A press recorded since the last
    /// tick is consumed here; it only has an effect if the board is idle.
    pub fn update(&mut self, dt: f32) -> Vec<Event> {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let mut events = Vec::new();
        let tap = self.input.take_pending();
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        self.phase = match phase {
            Phase::Idle => self.handle_tap(tap, &mut events),
            Phase::Swapping {
                a,
                b,
                elapsed,
                valid,
            } => self.step_swap(a, b, elapsed + dt, valid, &mut events),
            Phase::SwapBack { a, b, elapsed } => self.step_swap_back(a, b, elapsed + dt, &mut events),
            Phase::Matching { cells, elapsed } => self.step_flash(cells, elapsed + dt, &mut events),
            Phase::Falling => self.step_fall(dt, &mut events),
        };
        events
    }

    fn handle_tap(&mut self, tap: Option<Tap>, events: &mut Vec<Event>) -> Phase {
        let Some(tap) = tap else {
            return Phase::Idle;
        };
        let point = match tap {
            Tap::Cell(point) => point,
            Tap::Outside => {
                if self.input.selected().is_some() {
                    self.input.clear_selection();
                    events.push(Event::Deselected);
                }
                return Phase::Idle;
            }
        };

        match self.input.selected() {
            Some(selected) if selected == point => {
                self.input.clear_selection();
                events.push(Event::Deselected);
                Phase::Idle
            }
            Some(selected) if selected.is_adjacent(point) => {
                self.input.clear_selection();
                let valid =
                    swap_creates_match(&mut self.grid, selected, point, self.config.match_size);
                log::debug!("swap {selected:?} <-> {point:?} (valid: {valid})");
                Phase::Swapping {
                    a: selected,
                    b: point,
                    elapsed: 0.0,
                    valid,
                }
            }
            _ => {
                self.input.select(point);
                events.push(Event::Selected(point));
                Phase::Idle
            }
        }
    }

    /// Draws the pieces in `a` and `b` a fraction `t` of the way to each other's slot.
    fn tween(&mut self, a: Point, b: Point, t: f32) {
        let origin_a = self.layout.slot_origin(a);
        let origin_b = self.layout.slot_origin(b);
        if let Some(cell) = self.grid.get_mut(a) {
            cell.display = origin_a.lerp(origin_b, t);
        }
        if let Some(cell) = self.grid.get_mut(b) {
            cell.display = origin_b.lerp(origin_a, t);
        }
    }

    fn snap(&mut self, points: &[Point]) {
        for &point in points {
            let origin = self.layout.slot_origin(point);
            if let Some(cell) = self.grid.get_mut(point) {
                cell.settle(origin);
            }
        }
    }

    fn step_swap(
        &mut self,
        a: Point,
        b: Point,
        elapsed: f32,
        valid: bool,
        events: &mut Vec<Event>,
    ) -> Phase {
        let t = (elapsed / self.config.swap_duration).min(1.0);
        self.tween(a, b, ease_out_quad(t));
        if t < 1.0 {
            return Phase::Swapping {
                a,
                b,
                elapsed,
                valid,
            };
        }

        if !valid {
            events.push(Event::SwapRejected { a, b });
            return Phase::SwapBack {
                a,
                b,
                elapsed: 0.0,
            };
        }

        self.grid.swap(a, b);
        self.snap(&[a, b]);
        let cells = find_matches(&self.grid, self.config.match_size);
        self.chain = 1;
        Phase::Matching {
            cells,
            elapsed: 0.0,
        }
    }

    fn step_swap_back(&mut self, a: Point, b: Point, elapsed: f32, events: &mut Vec<Event>) -> Phase {
        let t = (elapsed / self.config.swap_duration).min(1.0);
        self.tween(a, b, 1.0 - ease_out_quad(t));
        if t < 1.0 {
            return Phase::SwapBack { a, b, elapsed };
        }
        self.snap(&[a, b]);
        self.enter_idle(events)
    }

    fn step_flash(&mut self, cells: MatchSet, elapsed: f32, events: &mut Vec<Event>) -> Phase {
        let progress = (elapsed / self.config.flash_duration).min(1.0);
        for point in &cells {
            if let Some(cell) = self.grid.get_mut(*point) {
                cell.flash = progress;
                cell.scale = 1.0 + FLASH_PULSE * (PI * progress).sin();
                cell.opacity = 1.0 - progress;
            }
        }
        if progress < 1.0 {
            return Phase::Matching { cells, elapsed };
        }

        events.push(Event::Matched {
            cells: cells.len(),
            chain: self.chain,
        });
        for point in &cells {
            self.grid.take(*point);
        }
        let spawned = apply_gravity(
            &mut self.grid,
            &self.layout,
            self.config.palette.len(),
            &mut self.rng,
        );
        log::debug!(
            "chain step {}: removed {}, spawned {spawned}",
            self.chain,
            cells.len()
        );
        Phase::Falling
    }

    fn step_fall(&mut self, dt: f32, events: &mut Vec<Event>) -> Phase {
        if advance_falling(&mut self.grid, self.config.fall_speed(), dt) {
            return Phase::Falling;
        }
        let cells = find_matches(&self.grid, self.config.match_size);
        if cells.is_empty() {
            return self.enter_idle(events);
        }
        self.chain += 1;
        Phase::Matching {
            cells,
            elapsed: 0.0,
        }
    }

    fn enter_idle(&mut self, events: &mut Vec<Event>) -> Phase {
        if self.chain > 0 {
            events.push(Event::ChainEnded { steps: self.chain });
            self.chain = 0;
        }
        let outcome = ensure_playable(
            &mut self.grid,
            &self.layout,
            self.config.palette.len(),
            self.config.match_size,
            &mut self.rng,
        );
        if outcome != Reshuffle::NotNeeded {
            events.push(Event::Reshuffled(outcome));
        }
        Phase::Idle
    }

    /// Hands every live piece to `canvas` at its current position, plus the
    /// selection highlight while the board is waiting for input.
    pub fn draw<C: Canvas>(&self, canvas: &mut C) {
        canvas.begin_frame(&self.layout);
        for point in self.grid.points() {
            let Some(cell) = self.grid.get(point) else {
                continue;
            };
            canvas.draw_piece(&Sprite {
                point,
                color: cell.color,
                x: cell.display.x,
                y: cell.display.y,
                size: self.layout.cell_size,
                scale: cell.scale,
                opacity: cell.opacity,
                style: self.config.piece_style,
            });
        }
        if let (Phase::Idle, Some(selected)) = (&self.phase, self.input.selected()) {
            canvas.draw_selection(
                selected,
                self.layout.slot_origin(selected),
                self.layout.cell_size,
            );
        }
    }

    /// A swap that would score, if the board is waiting for input.
    pub fn hint(&mut self) -> Option<(Point, Point)> {
        if !self.is_idle() {
            return None;
        }
        find_legal_move(&mut self.grid, self.config.match_size)
    }

    /// Every scoring swap on an idle board.
    pub fn legal_moves(&mut self) -> Vec<(Point, Point)> {
        if !self.is_idle() {
            return Vec::new();
        }
        legal_moves(&mut self.grid, self.config.match_size)
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    pub fn selected(&self) -> Option<Point> {
        self.input.selected()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Resolution steps so far in the running chain; 0 while idle.
    pub fn chain(&self) -> u32 {
        self.chain
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            width: self.grid.width as u32,
            height: self.grid.height as u32,
            colors: self
                .grid
                .colors()
                .into_iter()
                .map(|color| color.map(|c| c as u8))
                .collect(),
        }
    }

    /// Rebuilds a board from a snapshot. Empty slots are refilled by falling
    /// pieces, so the engine starts out falling and reaches idle after a few
    /// ticks. Matches already standing in the snapshot are cleared up front
    /// without any [`Event::Matched`], since the player did not make them.
    pub fn from_snapshot(config: GameConfig, snapshot: &BoardSnapshot) -> anyhow::Result<Self> {
        let mut engine = Engine::new(config)?;
        let (width, height) = (engine.config.width, engine.config.height);
        if snapshot.width as usize != width || snapshot.height as usize != height {
            anyhow::bail!(
                "snapshot is {}x{} but the board is {width}x{height}",
                snapshot.width,
                snapshot.height
            );
        }
        if snapshot.colors.len() != width * height {
            anyhow::bail!(
                "snapshot holds {} slots, expected {}",
                snapshot.colors.len(),
                width * height
            );
        }
        let palette_len = engine.config.palette.len();
        if let Some(bad) = snapshot.colors.iter().flatten().find(|&&c| c as usize >= palette_len) {
            anyhow::bail!("snapshot color {bad} is outside the {palette_len}-color palette");
        }

        let mut grid = Grid::new(width, height);
        for (point, color) in grid.points().zip(&snapshot.colors) {
            if let Some(color) = color {
                grid.put(
                    point,
                    Cell::new(*color as usize, engine.layout.slot_origin(point)),
                );
            }
        }
        apply_gravity(&mut grid, &engine.layout, palette_len, &mut engine.rng);
        engine.grid = grid;
        engine.clear_standing_matches();
        engine.phase = Phase::Falling;
        Ok(engine)
    }

    /// Removes and refills runs instantly until none remain.
    fn clear_standing_matches(&mut self) {
        let (palette_len, match_size) = (self.config.palette.len(), self.config.match_size);
        for _ in 0..MAX_SILENT_ROUNDS {
            let cells = find_matches(&self.grid, match_size);
            if cells.is_empty() {
                return;
            }
            log::debug!("restored board had {} matched pieces", cells.len());
            self.grid.settle_all(&self.layout);
            for point in &cells {
                self.grid.take(*point);
            }
            apply_gravity(&mut self.grid, &self.layout, palette_len, &mut self.rng);
            self.grid.settle_all(&self.layout);
        }
        if !find_matches(&self.grid, match_size).is_empty() {
            fill_without_matches(&mut self.grid, &self.layout, palette_len, match_size, &mut self.rng);
        }
    }
}

fn ease_out_quad(t: f32) -> f32 {
    t * (2.0 - t)
}
