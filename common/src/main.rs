use clap::Parser;
use log::{info, warn};
use match3::*;
use rand::prelude::IndexedRandom;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

/// Plays a match-3 board on its own and prints every settled board.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON game config; missing keys use the built-in defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for a reproducible game (overrides the config)
    #[arg(long)]
    seed: Option<u64>,
    /// Number of moves to play
    #[arg(long, default_value_t = 20)]
    moves: u32,
    /// Simulated frame rate
    #[arg(long, default_value_t = 60.0)]
    fps: f32,
    /// Pause between moves so the game is watchable
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,
    /// Piece style: geometric, circle or pixel (overrides the config)
    #[arg(long)]
    style: Option<PieceStyle>,
}

/// Upper bound on frames spent resolving one move.
const MAX_FRAMES_PER_MOVE: u32 = 100_000;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    // --- 1. Initialization ---
    let mut config = match &args.config {
        Some(path) => GameConfig::from_path(path)?,
        None => GameConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(style) = args.style {
        config.piece_style = style;
    }
    if !args.fps.is_finite() || args.fps <= 0.0 {
        anyhow::bail!("--fps must be positive, got {}", args.fps);
    }
    let dt = 1.0 / args.fps;

    let mut engine = Engine::new(config.clone())?;
    let mut score = ScoreBoard::new(config.points_per_cell);
    let mut rng = rand::rng();

    println!("--- Autonomous Match-3 Bot ---");
    println!("Strategy: play a random scoring swap every turn.");
    println!("Initial Board:");
    print_board(&engine);
    thread::sleep(Duration::from_millis(args.delay_ms));

    // --- 2. Game Loop ---
    for move_count in 1..=args.moves {
        println!("\n--- Move #{move_count} ---");

        let moves = engine.legal_moves();
        let Some(&(a, b)) = moves.choose(&mut rng) else {
            warn!("no scoring swap on the board, stopping");
            break;
        };
        println!(
            "Bot swaps ({}, {}) with ({}, {}) out of {} options...",
            a.col,
            a.row,
            b.col,
            b.row,
            moves.len()
        );

        // --- 3. Play the move frame by frame ---
        for point in [a, b] {
            engine.press_cell(point);
            score.apply_all(&engine.update(dt));
        }
        let mut frames = 0;
        while !engine.is_idle() {
            for event in engine.update(dt) {
                let points = score.apply(&event);
                match event {
                    Event::Matched { cells, chain } => {
                        info!("chain step {chain}: {cells} pieces for {points} points")
                    }
                    Event::Reshuffled(kind) => info!("board had no moves left: {kind:?}"),
                    _ => {}
                }
            }
            frames += 1;
            if frames > MAX_FRAMES_PER_MOVE {
                anyhow::bail!("board did not settle after {frames} frames");
            }
        }

        println!(
            "Score: {} (best combo x{}, {:.1}s of animation)",
            score.score,
            score.best_combo,
            frames as f32 * dt
        );
        print_board(&engine);

        thread::sleep(Duration::from_millis(args.delay_ms));
    }

    // --- 4. Final Result ---
    println!("\n--- Game Over ---");
    println!("Final score: {}", score.score);
    Ok(())
}

fn print_board(engine: &Engine) {
    let mut canvas = TextCanvas::new();
    engine.draw(&mut canvas);
    println!("{}", canvas.render());
}
