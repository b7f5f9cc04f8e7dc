//! Host-facing events and the records they carry.

use crate::board::Pos;
use crate::palette::Tile;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// One removed tile: value, where it was, and when (time since the session started).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalRecord {
    pub tile: Tile,
    pub pos: Pos,
    pub at: Duration,
}

impl fmt::Display for RemovalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{},{}+{}ms",
            self.tile,
            self.pos.row,
            self.pos.col,
            self.at.as_millis()
        )
    }
}

/// Cumulative removed count per tile value.
pub type RemovalSummary = BTreeMap<Tile, u32>;

/// Remaining countdown time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLeft {
    Seconds(u32),
    /// Configured duration was 0.
    Unlimited,
}

impl fmt::Display for TimeLeft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds(s) => write!(f, "{:02}:{:02}", s / 60, s % 60),
            Self::Unlimited => write!(f, "∞"),
        }
    }
}

/// Optional host callbacks. Every method defaults to doing nothing, so a
/// host implements only what it displays. `()` is the empty sink.
///
/// Events fire when the value changes, never continuously.
pub trait EventSink {
    fn score_changed(&mut self, _score: u32) {}
    fn combo_changed(&mut self, _combo: u32) {}
    fn max_combo_changed(&mut self, _max_combo: u32) {}
    fn time_changed(&mut self, _left: TimeLeft) {}
    fn history_changed(&mut self, _history: &[RemovalRecord]) {}
    fn summary_changed(&mut self, _summary: &RemovalSummary) {}
    /// Selection highlight moved, or was cleared.
    fn selection_changed(&mut self, _selected: Option<Pos>) {}
    fn game_over(&mut self, _final_score: u32) {}
}

impl EventSink for () {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_display() {
        let r = RemovalRecord {
            tile: Tile(4),
            pos: Pos::new(2, 7),
            at: Duration::from_millis(1530),
        };
        assert_eq!(r.to_string(), "4@2,7+1530ms");
    }

    #[test]
    fn test_time_left_display() {
        assert_eq!(TimeLeft::Seconds(75).to_string(), "01:15");
        assert_eq!(TimeLeft::Unlimited.to_string(), "∞");
    }
}
