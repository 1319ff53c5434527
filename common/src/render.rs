use crate::grid::{Layout, Point, Vec2};

/// How pieces are drawn. The engine passes this through untouched; only
/// canvases look at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceStyle {
    #[default]
    Geometric,
    Circle,
    Pixel,
}

impl std::str::FromStr for PieceStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "geometric" => Ok(PieceStyle::Geometric),
            "circle" => Ok(PieceStyle::Circle),
            "pixel" => Ok(PieceStyle::Pixel),
            other => anyhow::bail!("unknown piece style '{other}'"),
        }
    }
}

/// One live piece as it should appear this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub point: Point,
    pub color: usize,
    /// Top-left corner in canvas pixels, mid-animation if the piece is moving.
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub scale: f32,
    pub opacity: f32,
    pub style: PieceStyle,
}

/// The drawing context a host hands to [`crate::Engine::draw`].
pub trait Canvas {
    fn begin_frame(&mut self, _layout: &Layout) {}

    fn draw_piece(&mut self, sprite: &Sprite);

    /// Highlight around the selected slot; only drawn while the board is idle.
    fn draw_selection(&mut self, point: Point, origin: Vec2, size: f32);
}

/// Renders a frame as text, one glyph per slot. Pieces are placed by the
/// slot their pixel position currently falls in, so pieces in flight show up
/// where they are drawn rather than where they belong.
#[derive(Debug, Clone)]
pub struct TextCanvas {
    layout: Option<Layout>,
    glyphs: Vec<Vec<String>>,
    selected: Option<Point>,
}

const LETTERS: &[u8] = b"RBGYPOCMWK";

impl TextCanvas {
    pub fn new() -> Self {
        TextCanvas {
            layout: None,
            glyphs: Vec::new(),
            selected: None,
        }
    }

    fn glyph(sprite: &Sprite) -> String {
        let letter = LETTERS
            .get(sprite.color)
            .map(|&b| b as char)
            .unwrap_or('?');
        if sprite.opacity < 0.5 {
            return " . ".to_string();
        }
        match sprite.style {
            PieceStyle::Geometric => format!("[{letter}]"),
            PieceStyle::Circle => format!("({letter})"),
            PieceStyle::Pixel => format!(":{letter}:"),
        }
    }

    /// The finished frame, with a column header and row labels.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let width = self.glyphs.first().map_or(0, Vec::len);
        out.push_str("   ");
        for col in 0..width {
            out.push_str(&format!("{col:^3}"));
        }
        out.push_str(&format!("\n  +{}\n", "---".repeat(width)));
        for (row, cells) in self.glyphs.iter().enumerate() {
            out.push_str(&format!("{row:^2}|"));
            for (col, glyph) in cells.iter().enumerate() {
                if self.selected == Some(Point::new(col, row)) {
                    out.push_str(&format!(">{}<", &glyph[1..2]));
                } else {
                    out.push_str(glyph);
                }
            }
            out.push('\n');
        }
        out
    }
}

impl Default for TextCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas for TextCanvas {
    fn begin_frame(&mut self, layout: &Layout) {
        self.layout = Some(*layout);
        self.glyphs = vec![vec!["   ".to_string(); layout.width]; layout.height];
        self.selected = None;
    }

    fn draw_piece(&mut self, sprite: &Sprite) {
        let Some(layout) = self.layout else {
            return;
        };
        let center = sprite.size / 2.0;
        if let Some(point) = layout.pixel_to_cell(sprite.x + center, sprite.y + center) {
            self.glyphs[point.row][point.col] = Self::glyph(sprite);
        }
    }

    fn draw_selection(&mut self, point: Point, _origin: Vec2, _size: f32) {
        self.selected = Some(point);
    }
}
