//! Cascade resolver: remove → compact → refill → detect, until nothing matches.
//!
//! Each [`Cascade::step`] performs one mutation and reports it, so the caller
//! can publish an animation and wait before asking for the next one. Long
//! chains are a loop over `step`, never recursion.

use crate::board::{Board, Fall, Pos, RemovedTile, Spawn};
use crate::matcher;
use crate::palette::Palette;
use rand::Rng;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeState {
    Removing(BTreeSet<Pos>),
    Compacting,
    Refilling,
    Detecting,
    Idle,
}

/// What one step did to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeStep {
    /// Cycle `cycle` (from 1) emptied these cells; each cell appears once.
    Removed { cycle: u32, tiles: Vec<RemovedTile> },
    /// Gravity moved these tiles; may be empty when only the top row cleared.
    Compacted { falls: Vec<Fall> },
    Refilled { spawned: Vec<Spawn> },
    /// Detection found no new run.
    Settled,
}

#[derive(Debug, Clone)]
pub struct Cascade {
    state: CascadeState,
    cycle: u32,
    /// Cells moved or created this cycle; the only anchors worth scanning.
    touched: Vec<Pos>,
}

impl Cascade {
    /// Start from an already detected, deduplicated set of matched cells.
    pub fn new(matched: BTreeSet<Pos>) -> Self {
        Self {
            state: CascadeState::Removing(matched),
            cycle: 0,
            touched: Vec::new(),
        }
    }

    pub fn state(&self) -> &CascadeState {
        &self.state
    }

    /// Removal cycles performed so far.
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    pub fn is_settled(&self) -> bool {
        self.state == CascadeState::Idle
    }

    pub fn step<R: Rng + ?Sized>(
        &mut self,
        board: &mut Board,
        palette: Palette,
        rng: &mut R,
    ) -> CascadeStep {
        match std::mem::replace(&mut self.state, CascadeState::Idle) {
            CascadeState::Removing(cells) => self.remove(board, cells),
            CascadeState::Compacting => {
                let falls = board.compact();
                debug!(cycle = self.cycle, falls = falls.len(), "compacted");
                self.touched = falls.iter().map(|f| f.to).collect();
                self.state = CascadeState::Refilling;
                CascadeStep::Compacted { falls }
            }
            CascadeState::Refilling => {
                let spawned = board.refill(palette, rng);
                debug!(cycle = self.cycle, spawned = spawned.len(), "refilled");
                self.touched.extend(spawned.iter().map(|s| s.pos));
                self.state = CascadeState::Detecting;
                CascadeStep::Refilled { spawned }
            }
            CascadeState::Detecting => {
                let anchors = std::mem::take(&mut self.touched);
                let matched = matcher::matches_for_any(board, anchors);
                if matched.is_empty() {
                    debug!(cycles = self.cycle, "cascade settled");
                    CascadeStep::Settled
                } else {
                    self.remove(board, matched)
                }
            }
            CascadeState::Idle => CascadeStep::Settled,
        }
    }

    fn remove(&mut self, board: &mut Board, cells: BTreeSet<Pos>) -> CascadeStep {
        self.cycle += 1;
        let tiles = board.clear_cells(cells);
        debug!(cycle = self.cycle, removed = tiles.len(), "removed matches");
        self.state = CascadeState::Compacting;
        CascadeStep::Removed {
            cycle: self.cycle,
            tiles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Tile;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn bottom_row_board() -> Board {
        Board::from_rows(&[
            vec![1, 2, 1, 2, 1],
            vec![2, 1, 2, 1, 2],
            vec![1, 2, 1, 2, 1],
            vec![2, 1, 2, 1, 2],
            vec![3, 3, 4, 3, 3],
        ])
        .unwrap()
    }

    #[test]
    fn test_first_cycle_sequence() {
        let mut board = bottom_row_board();
        let mut rng = StdRng::seed_from_u64(11);
        let palette = Palette::new(5).unwrap();
        let (a, b) = (Pos::new(4, 2), Pos::new(4, 3));
        board.swap(a, b);
        let matched = matcher::matches_for_any(&board, [a, b]);
        assert_eq!(matched.len(), 3);

        let id_above = board.piece(Pos::new(3, 0)).unwrap().id;
        let mut cascade = Cascade::new(matched);

        let CascadeStep::Removed { cycle, tiles } = cascade.step(&mut board, palette, &mut rng) else {
            panic!("expected removal first");
        };
        assert_eq!(cycle, 1);
        assert_eq!(tiles.len(), 3);
        assert!(tiles.iter().all(|t| t.tile == Tile(3) && t.pos.row == 4));
        assert_eq!(cascade.state(), &CascadeState::Compacting);

        let CascadeStep::Compacted { falls } = cascade.step(&mut board, palette, &mut rng) else {
            panic!("expected compaction");
        };
        assert_eq!(falls.len(), 12);
        assert!(falls.iter().all(|f| f.shift == 1 && f.to.col < 3));
        assert_eq!(board.piece(Pos::new(4, 0)).unwrap().id, id_above);

        let CascadeStep::Refilled { spawned } = cascade.step(&mut board, palette, &mut rng) else {
            panic!("expected refill");
        };
        let mut refilled: Vec<_> = spawned.iter().map(|s| s.pos).collect();
        refilled.sort();
        assert_eq!(refilled, vec![Pos::new(0, 0), Pos::new(0, 1), Pos::new(0, 2)]);
        assert!(board.is_full());
    }

    #[test]
    fn test_top_row_clear_has_no_falls() {
        let mut board = Board::from_rows(&[vec![3, 3, 3, 4], vec![1, 2, 1, 2]]).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let palette = Palette::new(6).unwrap();
        let matched = matcher::matches_for_any(&board, [Pos::new(0, 0)]);
        let mut cascade = Cascade::new(matched);
        assert!(matches!(
            cascade.step(&mut board, palette, &mut rng),
            CascadeStep::Removed { .. }
        ));
        assert_eq!(
            cascade.step(&mut board, palette, &mut rng),
            CascadeStep::Compacted { falls: Vec::new() }
        );
    }

    #[test]
    fn test_runs_to_a_settled_board() {
        let palette = Palette::new(4).unwrap();
        for seed in 0..50 {
            let mut board = bottom_row_board();
            let mut rng = StdRng::seed_from_u64(seed);
            let (a, b) = (Pos::new(4, 2), Pos::new(4, 3));
            board.swap(a, b);
            let mut cascade = Cascade::new(matcher::matches_for_any(&board, [a, b]));
            let mut steps = 0;
            while cascade.step(&mut board, palette, &mut rng) != CascadeStep::Settled {
                steps += 1;
                assert!(steps < 10_000, "cascade did not terminate");
            }
            assert!(cascade.is_settled());
            assert!(cascade.cycle() >= 1);
            assert!(board.is_full());
            let anywhere = matcher::matches_for_any(&board, board.positions());
            assert!(anywhere.is_empty(), "seed {seed} left a run:\n{board}");
        }
    }
}
