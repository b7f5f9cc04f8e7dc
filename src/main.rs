//! match3tui: match-3 tile-swapping puzzle in the terminal.

mod app;
mod input;
mod theme;
mod ui;

use anyhow::{Context, Result, anyhow};
use app::App;
use clap::{Parser, ValueEnum};
use match3tui::GameConfig;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;
    let config = args.game_config();
    config.validate()?;
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    info!(?config, seed = ?args.seed, "starting match3tui");
    let mut app = App::new(args, config, rng)?;
    app.run()?;
    Ok(())
}

/// Log to a file; the terminal belongs to the UI.
fn init_logging(path: &Path) -> Result<()> {
    let log_file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow!("cannot initialise logging: {err}"))
}

/// Match-3 puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "match3tui",
    version,
    about = "Match-3 tile-swapping puzzle in the terminal. Swap neighbouring tiles to line up three or more.",
    long_about = "match3tui is a terminal match-3 game.\n\n\
        Swap two neighbouring tiles to form a row or column of three or more identical tiles. \
        Matched tiles disappear, the tiles above fall, and new tiles drop in from the top; \
        chains score combos. The game ends when the clock runs out or no swap can make a match.\n\n\
        CONTROLS:\n  Arrows / hjkl      Move cursor      Space / Enter   Select tile\n  \
        Shift+Arrows / HJKL  Swap toward     ?               Hint\n  \
        r                  Restart          q / Esc         Quit menu\n\n\
        MOUSE:\n  Click a tile, then a neighbour; or drag a tile toward a neighbour."
)]
pub struct Args {
    /// Game mode: endless (no clock) or timed (score within the time limit).
    #[arg(short, long, default_value = "timed")]
    pub mode: GameMode,

    /// Difficulty: easy (4 tile kinds), medium (5) or hard (6).
    #[arg(short, long, default_value = "medium")]
    pub difficulty: Difficulty,

    /// Number of tile kinds (1-9). Overrides --difficulty.
    #[arg(short, long, value_name = "N")]
    pub palette: Option<u8>,

    /// Board height in tiles.
    #[arg(long, default_value = "8", value_name = "ROWS")]
    pub rows: usize,

    /// Board width in tiles.
    #[arg(long, default_value = "8", value_name = "COLS")]
    pub cols: usize,

    /// In mode 'timed': time limit in seconds.
    #[arg(long, default_value = "60", value_name = "SECS")]
    pub time_limit: u32,

    /// Terminal columns per tile.
    #[arg(long, default_value = "4", value_name = "COLS")]
    pub tile_width: u16,

    /// RNG seed for a reproducible game.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Disable animations (every board change shows at once).
    #[arg(long)]
    pub no_animation: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Log file (filter with RUST_LOG).
    #[arg(long, default_value = "match3tui.log", value_name = "FILE")]
    pub log_file: PathBuf,
}

impl Args {
    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            rows: self.rows,
            cols: self.cols,
            palette: self.palette.unwrap_or_else(|| self.difficulty.palette_size()),
            tile_width: self.tile_width,
            countdown_secs: match self.mode {
                GameMode::Endless => 0,
                GameMode::Timed => self.time_limit,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum GameMode {
    Endless,
    #[default]
    Timed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn palette_size(self) -> u8 {
        match self {
            Self::Easy => 4,
            Self::Medium => 5,
            Self::Hard => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["match3tui"]);
        let config = args.game_config();
        assert_eq!((config.rows, config.cols, config.palette), (8, 8, 5));
        assert_eq!(config.countdown_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_second_logging_init_fails() {
        let path = std::env::temp_dir().join(format!("match3tui-{}.log", std::process::id()));
        let first = init_logging(&path);
        let second = init_logging(&path);
        let _ = std::fs::remove_file(&path);
        assert!(first.is_ok());
        assert!(second.unwrap_err().to_string().contains("logging"));
    }

    #[test]
    fn test_endless_is_untimed() {
        let args = Args::parse_from(["match3tui", "--mode", "endless", "--time-limit", "90"]);
        assert_eq!(args.game_config().countdown_secs, 0);
    }

    #[test]
    fn test_palette_overrides_difficulty() {
        let args = Args::parse_from(["match3tui", "-d", "hard", "--palette", "7"]);
        assert_eq!(args.game_config().palette, 7);
        let args = Args::parse_from(["match3tui", "-d", "easy"]);
        assert_eq!(args.game_config().palette, 4);
    }
}
