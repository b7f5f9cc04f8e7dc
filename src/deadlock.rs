//! Dead-board detection by exhaustive swap simulation.
//!
//! Every orthogonally adjacent pair is tried as a hypothetical swap and the
//! two swapped cells are scanned for a run. The board itself is never
//! mutated: the scan reads through a lookup that exchanges the pair.

use crate::board::{Board, Direction, Pos};
use crate::matcher;

/// True iff some adjacent swap would produce a match at either swapped cell.
pub fn has_any_legal_move(board: &Board) -> bool {
    find_legal_move(board).is_some()
}

/// First legal move in row-major order (right neighbour before down neighbour).
pub fn find_legal_move(board: &Board) -> Option<(Pos, Pos)> {
    candidate_pairs(board).find(|&(a, b)| swap_would_match(board, a, b))
}

/// All legal moves.
pub fn legal_moves(board: &Board) -> Vec<(Pos, Pos)> {
    candidate_pairs(board)
        .filter(|&(a, b)| swap_would_match(board, a, b))
        .collect()
}

fn candidate_pairs(board: &Board) -> impl Iterator<Item = (Pos, Pos)> + '_ {
    let (rows, cols) = (board.rows(), board.cols());
    board.positions().flat_map(move |pos| {
        [Direction::Right, Direction::Down]
            .into_iter()
            .filter_map(move |dir| pos.step(dir, rows, cols).map(|n| (pos, n)))
    })
}

/// Would swapping `a` and `b` form a run through either of them?
pub fn swap_would_match(board: &Board, a: Pos, b: Pos) -> bool {
    let (ta, tb) = (board.tile(a), board.tile(b));
    let swapped = |p: Pos| {
        if p == a {
            tb
        } else if p == b {
            ta
        } else {
            board.tile(p)
        }
    };
    let (rows, cols) = (board.rows(), board.cols());
    !matcher::scan(rows, cols, a, swapped).is_empty()
        || !matcher::scan(rows, cols, b, swapped).is_empty()
}
