//! Run detection anchored at changed cells.
//!
//! Only a cell whose value just changed can start a new run, so detection
//! scans the row and column through each anchor instead of the whole board.

use crate::board::{Board, Pos};
use crate::palette::Tile;
use std::collections::BTreeSet;

/// Minimum run length that clears.
pub const MIN_RUN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Contiguous collinear run of one tile value, at least [`MIN_RUN`] long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub axis: Axis,
    pub tile: Tile,
    /// Sorted top-to-bottom / left-to-right.
    pub cells: Vec<Pos>,
}

/// Runs through `pos` on the board: zero, one, or two (horizontal and vertical).
pub fn matches_through(board: &Board, pos: Pos) -> Vec<Match> {
    scan(board.rows(), board.cols(), pos, |p| board.tile(p))
}

/// Union of the runs through every anchor, deduplicated by coordinate.
pub fn matches_for_any(board: &Board, anchors: impl IntoIterator<Item = Pos>) -> BTreeSet<Pos> {
    anchors
        .into_iter()
        .flat_map(|pos| matches_through(board, pos))
        .flat_map(|m| m.cells)
        .collect()
}

/// Scan through `pos` over any tile lookup; off-board and empty cells read as `None`.
pub(crate) fn scan<F>(rows: usize, cols: usize, pos: Pos, tile_at: F) -> Vec<Match>
where
    F: Fn(Pos) -> Option<Tile>,
{
    let Some(tile) = (pos.row < rows && pos.col < cols)
        .then(|| tile_at(pos))
        .flatten()
    else {
        return Vec::new();
    };
    let same = |p: Pos| tile_at(p) == Some(tile);

    let mut found = Vec::with_capacity(2);

    let mut left = pos.col;
    while left > 0 && same(Pos::new(pos.row, left - 1)) {
        left -= 1;
    }
    let mut right = pos.col;
    while right + 1 < cols && same(Pos::new(pos.row, right + 1)) {
        right += 1;
    }
    if right - left + 1 >= MIN_RUN {
        found.push(Match {
            axis: Axis::Horizontal,
            tile,
            cells: (left..=right).map(|c| Pos::new(pos.row, c)).collect(),
        });
    }

    let mut top = pos.row;
    while top > 0 && same(Pos::new(top - 1, pos.col)) {
        top -= 1;
    }
    let mut bottom = pos.row;
    while bottom + 1 < rows && same(Pos::new(bottom + 1, pos.col)) {
        bottom += 1;
    }
    if bottom - top + 1 >= MIN_RUN {
        found.push(Match {
            axis: Axis::Vertical,
            tile,
            cells: (top..=bottom).map(|r| Pos::new(r, pos.col)).collect(),
        });
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_run_from_any_member() {
        let board = Board::from_rows(&[vec![1, 2, 2, 2, 3], vec![3, 1, 4, 1, 2]]).unwrap();
        for col in 1..=3 {
            let found = matches_through(&board, Pos::new(0, col));
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].axis, Axis::Horizontal);
            assert_eq!(found[0].tile, Tile(2));
            assert_eq!(found[0].cells, vec![Pos::new(0, 1), Pos::new(0, 2), Pos::new(0, 3)]);
        }
        assert!(matches_through(&board, Pos::new(0, 0)).is_empty());
    }

    #[test]
    fn test_pair_is_not_a_match() {
        let board = Board::from_rows(&[vec![2, 1, 1, 2, 1]]).unwrap();
        assert!(matches_through(&board, Pos::new(0, 1)).is_empty());
        assert!(matches_through(&board, Pos::new(0, 2)).is_empty());
    }

    #[test]
    fn test_vertical_run_of_four() {
        let board = Board::from_rows(&[vec![5], vec![5], vec![5], vec![5], vec![1]]).unwrap();
        let found = matches_through(&board, Pos::new(0, 0));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].axis, Axis::Vertical);
        assert_eq!(found[0].cells.len(), 4);
    }

    #[test]
    fn test_anchor_on_both_axes() {
        // Plus shape centred at (1, 1).
        let board = Board::from_rows(&[vec![1, 3, 2], vec![3, 3, 3], vec![2, 3, 1]]).unwrap();
        let found = matches_through(&board, Pos::new(1, 1));
        assert_eq!(found.len(), 2);
        let cells = matches_for_any(&board, [Pos::new(1, 1)]);
        assert_eq!(cells.len(), 5, "centre counted once");
    }

    #[test]
    fn test_union_dedups_overlapping_anchors() {
        let board = Board::from_rows(&[vec![4, 4, 4], vec![1, 2, 1]]).unwrap();
        let cells = matches_for_any(&board, [Pos::new(0, 0), Pos::new(0, 2), Pos::new(1, 1)]);
        assert_eq!(cells.into_iter().collect::<Vec<_>>(), vec![
            Pos::new(0, 0),
            Pos::new(0, 1),
            Pos::new(0, 2)
        ]);
    }

    #[test]
    fn test_empty_and_offboard_anchors() {
        let mut board = Board::from_rows(&[vec![1, 1, 1]]).unwrap();
        assert!(matches_through(&board, Pos::new(5, 5)).is_empty());
        board.clear_cells([Pos::new(0, 1)]);
        assert!(matches_through(&board, Pos::new(0, 1)).is_empty());
        assert!(matches_through(&board, Pos::new(0, 0)).is_empty());
    }
}
