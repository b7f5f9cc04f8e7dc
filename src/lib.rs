//! match3tui engine: board generation, swap validation, run detection,
//! cascades, scoring, countdown and dead-board detection.
//!
//! The engine never reads a clock or a global RNG. The host passes
//! `Instant`s into every timed command and injects the RNG at construction.

pub mod animation;
pub mod board;
pub mod cascade;
pub mod countdown;
pub mod deadlock;
pub mod error;
pub mod events;
pub mod game;
pub mod matcher;
pub mod palette;

pub use animation::Animation;
pub use board::{Board, Direction, Pos, TileId};
pub use error::EngineError;
pub use events::{EventSink, RemovalRecord, RemovalSummary, TimeLeft};
pub use game::{GameState, Phase};
pub use palette::{Palette, Tile};

/// Construction-time configuration supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    /// Number of tile kinds, `1..=9`.
    pub palette: u8,
    /// Terminal columns per tile. Presentation only; the engine ignores it.
    pub tile_width: u16,
    /// Countdown length in seconds; 0 means untimed.
    pub countdown_secs: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: 8,
            cols: 8,
            palette: 6,
            tile_width: 4,
            countdown_secs: 60,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(EngineError::InvalidConfig(format!(
                "board must be at least 1x1, got {}x{}",
                self.rows, self.cols
            )));
        }
        if self.tile_width == 0 {
            return Err(EngineError::InvalidConfig("tile width must be at least 1".into()));
        }
        Palette::new(self.palette)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let base = GameConfig::default();
        for bad in [
            GameConfig { rows: 0, ..base },
            GameConfig { cols: 0, ..base },
            GameConfig { palette: 0, ..base },
            GameConfig { palette: 10, ..base },
            GameConfig { tile_width: 0, ..base },
        ] {
            assert!(
                matches!(bad.validate(), Err(EngineError::InvalidConfig(_))),
                "{bad:?}"
            );
        }
    }
}
