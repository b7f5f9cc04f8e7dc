//! Animation requests published to the presentation layer.
//!
//! The engine holds at most one request at a time and makes no further
//! progress until the host calls `GameState::animation_finished`. Timing,
//! easing and looks are entirely the host's business.

use crate::board::{Fall, Pos, RemovedTile, Spawn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Animation {
    /// Opening deal: every tile appears at its resting position.
    Deal { tiles: Vec<Spawn> },
    /// Tiles at `a` and `b` trade places; when `reverted` they slide back
    /// and the board is unchanged.
    Swap { a: Pos, b: Pos, reverted: bool },
    /// Matched tiles disappear. Their cells are already empty on the board.
    Remove { tiles: Vec<RemovedTile> },
    /// Tiles drop by `shift` rows to `to`.
    Fall { falls: Vec<Fall> },
    /// New tiles drop in from above to `pos`.
    Refill { tiles: Vec<Spawn> },
}

impl Animation {
    /// Short label for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Deal { .. } => "deal",
            Self::Swap { reverted: false, .. } => "swap",
            Self::Swap { reverted: true, .. } => "swap-revert",
            Self::Remove { .. } => "remove",
            Self::Fall { .. } => "fall",
            Self::Refill { .. } => "refill",
        }
    }
}
