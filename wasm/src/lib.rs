use match3 as m3;
use wasm_bindgen::prelude::*;

/// Floats per sprite in [`Match3::draw_list`]:
/// col, row, color, x, y, size, scale, opacity.
pub const SPRITE_STRIDE: usize = 8;

#[derive(Default)]
struct DrawList {
    sprites: Vec<f32>,
}

impl m3::Canvas for DrawList {
    fn draw_piece(&mut self, sprite: &m3::Sprite) {
        self.sprites.extend_from_slice(&[
            sprite.point.col as f32,
            sprite.point.row as f32,
            sprite.color as f32,
            sprite.x,
            sprite.y,
            sprite.size,
            sprite.scale,
            sprite.opacity,
        ]);
    }

    // Read through `Match3::selection` instead.
    fn draw_selection(&mut self, _point: m3::Point, _origin: m3::Vec2, _size: f32) {}
}

#[wasm_bindgen]
pub struct Match3 {
    engine: m3::Engine,
    score: m3::ScoreBoard,
}

#[wasm_bindgen]
impl Match3 {
    /// `config_json` may be empty for the default board.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<Match3, String> {
        console_error_panic_hook::set_once();

        let config = if config_json.trim().is_empty() {
            m3::GameConfig::default()
        } else {
            m3::GameConfig::from_json_str(config_json).map_err(|e| format!("{e:#}"))?
        };
        let score = m3::ScoreBoard::new(config.points_per_cell);
        let engine = m3::Engine::new(config).map_err(|e| e.to_string())?;
        Ok(Match3 { engine, score })
    }

    /// Advances by `dt` seconds and returns the points scored this tick.
    pub fn update(&mut self, dt: f32) -> f64 {
        let events = self.engine.update(dt);
        self.score.apply_all(&events) as f64
    }

    pub fn press(&mut self, x: f32, y: f32) {
        self.engine.press(x, y);
    }

    pub fn reset(&mut self) {
        self.engine.reset();
        self.score.reset();
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.engine.resize(width, height);
    }

    pub fn score(&self) -> f64 {
        self.score.score as f64
    }

    pub fn combo(&self) -> u32 {
        self.score.combo
    }

    pub fn is_idle(&self) -> bool {
        self.engine.is_idle()
    }

    /// The piece style name, for the JS renderer to pick its drawing routine.
    pub fn piece_style(&self) -> String {
        match self.engine.config().piece_style {
            m3::PieceStyle::Geometric => "geometric",
            m3::PieceStyle::Circle => "circle",
            m3::PieceStyle::Pixel => "pixel",
        }
        .to_string()
    }

    pub fn palette(&self) -> Vec<String> {
        self.engine.config().palette.clone()
    }

    /// Every live piece, [`SPRITE_STRIDE`] floats each.
    pub fn draw_list(&self) -> Vec<f32> {
        let mut list = DrawList::default();
        self.engine.draw(&mut list);
        list.sprites
    }

    /// `[col, row]` of the highlighted piece, empty when nothing is highlighted.
    pub fn selection(&self) -> Vec<i32> {
        self.engine
            .selected()
            .filter(|_| self.engine.is_idle())
            .map(|p| vec![p.col as i32, p.row as i32])
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> Result<Vec<u8>, String> {
        self.engine.snapshot().to_bytes().map_err(|e| e.to_string())
    }

    /// Replaces the board with a saved one; the score starts over.
    pub fn restore(&mut self, bts: Vec<u8>) -> Result<(), String> {
        let snapshot = m3::BoardSnapshot::from_bytes(&bts).map_err(|e| e.to_string())?;
        let config = self.engine.config().clone();
        self.engine = m3::Engine::from_snapshot(config, &snapshot).map_err(|e| e.to_string())?;
        self.score.reset();
        Ok(())
    }
}
