use crate::render::PieceStyle;
use anyhow::Context;
use std::path::Path;

/// Longer runs leave random boards without any scoring swap too often for the
/// reshuffle to recover.
pub const MAX_MATCH_SIZE: usize = 4;

/// Everything the host supplies to a board: dimensions, layout, timing and palette.
///
/// Missing keys in a JSON document fall back to the defaults below, so a
/// generated config only has to mention the values it wants to change.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    pub width: usize,
    pub height: usize,
    /// Edge length of a piece in canvas pixels.
    pub cell_size: f32,
    /// Gap between neighbouring slots in canvas pixels.
    pub padding: f32,
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Space kept free above the grid for the score UI.
    pub header_height: f32,
    /// Minimum run length that counts as a match.
    pub match_size: usize,
    /// Seconds for a swap (or swap-back) tween.
    pub swap_duration: f32,
    /// Seconds a piece takes to fall one cell.
    pub fall_duration: f32,
    /// Seconds matched pieces flash before they are removed.
    pub flash_duration: f32,
    pub palette: Vec<String>,
    pub piece_style: PieceStyle,
    pub points_per_cell: u32,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            width: 8,
            height: 8,
            cell_size: 56.0,
            padding: 4.0,
            canvas_width: 480.0,
            canvas_height: 640.0,
            header_height: 96.0,
            match_size: 3,
            swap_duration: 0.2,
            fall_duration: 0.12,
            flash_duration: 0.3,
            palette: ["#e74c3c", "#3498db", "#2ecc71", "#f1c40f", "#9b59b6", "#e67e22"]
                .into_iter()
                .map(String::from)
                .collect(),
            piece_style: PieceStyle::Geometric,
            points_per_cell: 10,
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: GameConfig = serde_json::from_str(json).context("invalid game config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("loading config {}", path.display()))
    }

    /// Rejects configurations the engine cannot run without degenerate behaviour.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(2..=MAX_MATCH_SIZE).contains(&self.match_size) {
            anyhow::bail!(
                "match_size must be between 2 and {MAX_MATCH_SIZE}, got {}",
                self.match_size
            );
        }
        // A run plus one slot to swap a piece in from, in either direction
        if self.width.min(self.height) <= self.match_size {
            anyhow::bail!(
                "a {}x{} grid has no room to swap into a run of {}",
                self.width,
                self.height,
                self.match_size
            );
        }
        if self.palette.len() < 3 {
            anyhow::bail!("palette needs at least 3 colors, got {}", self.palette.len());
        }
        if self.palette.len() > u8::MAX as usize {
            anyhow::bail!("palette is limited to {} colors", u8::MAX);
        }
        for (name, value) in [
            ("cell_size", self.cell_size),
            ("swap_duration", self.swap_duration),
            ("fall_duration", self.fall_duration),
            ("flash_duration", self.flash_duration),
        ] {
            if !value.is_finite() || value <= 0.0 {
                anyhow::bail!("{name} must be a positive number, got {value}");
            }
        }
        if !self.padding.is_finite() || self.padding < 0.0 {
            anyhow::bail!("padding must not be negative, got {}", self.padding);
        }
        Ok(())
    }

    /// Pixels per second shared by every falling piece.
    pub fn fall_speed(&self) -> f32 {
        self.cell_size / self.fall_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.match_size, 3);
        assert_eq!(config.palette.len(), 6);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        // Only the keys present in the document are overridden
        let config =
            GameConfig::from_json_str(r#"{ "width": 6, "piece_style": "circle", "seed": 7 }"#)
                .unwrap();
        assert_eq!(config.width, 6);
        assert_eq!(config.height, 8);
        assert_eq!(config.piece_style, PieceStyle::Circle);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(GameConfig::from_json_str(r#"{ "gravity": 9.8 }"#).is_err());
    }

    #[test]
    fn test_validation_failures() {
        let small_palette = GameConfig {
            palette: vec!["red".into(), "blue".into()],
            ..GameConfig::default()
        };
        assert!(small_palette.validate().is_err());

        let narrow = GameConfig {
            width: 2,
            ..GameConfig::default()
        };
        assert!(narrow.validate().is_err());

        let frozen = GameConfig {
            fall_duration: 0.0,
            ..GameConfig::default()
        };
        assert!(frozen.validate().is_err());

        let err = GameConfig::from_json_str(r#"{ "match_size": 1 }"#).unwrap_err();
        assert!(format!("{err:#}").contains("match_size"));
    }

    #[test]
    fn test_match_size_must_leave_room_for_a_move() {
        let long_runs = GameConfig {
            match_size: 6,
            ..GameConfig::default()
        };
        let err = long_runs.validate().unwrap_err();
        assert!(err.to_string().contains("match_size"));

        let tight = GameConfig {
            width: 3,
            height: 8,
            ..GameConfig::default()
        };
        assert!(tight.validate().is_err());

        let smallest = GameConfig {
            width: 4,
            height: 4,
            ..GameConfig::default()
        };
        assert!(smallest.validate().is_ok());

        let fours = GameConfig {
            match_size: MAX_MATCH_SIZE,
            ..GameConfig::default()
        };
        assert!(fours.validate().is_ok());
    }

    #[test]
    fn test_fall_speed() {
        let config = GameConfig {
            cell_size: 50.0,
            fall_duration: 0.1,
            ..GameConfig::default()
        };
        assert!((config.fall_speed() - 500.0).abs() < 1e-3);
    }
}
