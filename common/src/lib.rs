//! A match-3 puzzle board: pieces on a grid, swaps that must line up three
//! or more of a color, cascades that refill the board, and a guard that
//! reshuffles boards with no moves left.
//!
//! The [`Engine`] is a tick-driven state machine. The host feeds it presses
//! and elapsed time, draws it through a [`Canvas`], and scores the
//! [`Event`]s it returns.

pub mod cascade;
pub mod config;
pub mod engine;
pub mod grid;
pub mod guard;
pub mod input;
pub mod matcher;
pub mod render;
pub mod score;
pub mod snapshot;

pub use config::GameConfig;
pub use engine::{Engine, Event, Phase};
pub use grid::{Cell, Grid, Layout, Point, Vec2};
pub use guard::Reshuffle;
pub use input::Tap;
pub use matcher::{MatchSet, find_matches, swap_creates_match};
pub use render::{Canvas, PieceStyle, Sprite, TextCanvas};
pub use score::ScoreBoard;
pub use snapshot::BoardSnapshot;
