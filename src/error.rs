//! Engine errors.

use crate::board::Pos;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("cell ({}, {}) is outside the {rows}x{cols} board", pos.row, pos.col)]
    OutOfBounds { pos: Pos, rows: usize, cols: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid board layout: {0}")]
    InvalidLayout(String),

    /// Redraw cap hit while avoiding an immediate triple (palette too small for the board).
    #[error(
        "cannot fill a {rows}x{cols} board from {palette} tiles without a run of three ({attempts} redraws)"
    )]
    Unsatisfiable {
        rows: usize,
        cols: usize,
        palette: u8,
        attempts: u32,
    },

    /// Every generated board was already stuck.
    #[error("no playable board after {attempts} deals")]
    NoPlayableDeal { attempts: u32 },
}
