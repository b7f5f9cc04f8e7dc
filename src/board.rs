//! Board: grid of tiles, generation, swap, gravity and refill.

use crate::deadlock;
use crate::error::EngineError;
use crate::palette::{Palette, Tile};
use rand::Rng;
use std::fmt;
use tracing::warn;

/// Cap on redraws per cell during generation, and on whole deals when a
/// fresh board turns out to have no legal move.
pub const MAX_ATTEMPTS: u32 = 100;

/// Grid coordinate. Row 0 is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Orthogonal neighbours only: distance exactly 1 along exactly one axis.
    pub fn is_adjacent(self, other: Self) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }

    /// Neighbour in `dir`, if it lies on a `rows` x `cols` board.
    pub fn step(self, dir: Direction, rows: usize, cols: usize) -> Option<Self> {
        let (row, col) = match dir {
            Direction::Up => (self.row.checked_sub(1)?, self.col),
            Direction::Down => (self.row + 1, self.col),
            Direction::Left => (self.row, self.col.checked_sub(1)?),
            Direction::Right => (self.row, self.col + 1),
        };
        (row < rows && col < cols).then_some(Self { row, col })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Identity token that follows a tile across swaps and gravity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileId(pub u64);

/// Tile sitting in a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub tile: Tile,
    pub id: TileId,
}

/// A tile taken off the board by a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovedTile {
    pub pos: Pos,
    pub tile: Tile,
    pub id: TileId,
}

/// A tile moved down by gravity: now at `to`, having fallen `shift` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fall {
    pub to: Pos,
    pub shift: usize,
    pub id: TileId,
}

impl Fall {
    pub fn from(&self) -> Pos {
        Pos::new(self.to.row - self.shift, self.to.col)
    }
}

/// A tile created by the deal or a refill, resting at `pos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spawn {
    pub pos: Pos,
    pub tile: Tile,
    pub id: TileId,
}

/// `rows x cols` grid. `None` cells only exist mid-cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    cols: usize,
    /// Row-major.
    cells: Vec<Option<Piece>>,
    last_id: u64,
}

impl Board {
    fn empty(rows: usize, cols: usize) -> Result<Self, EngineError> {
        if rows == 0 || cols == 0 {
            return Err(EngineError::InvalidConfig(format!(
                "board must be at least 1x1, got {rows}x{cols}"
            )));
        }
        Ok(Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
            last_id: 0,
        })
    }

    /// Random fill with no run of three in any row or column.
    pub fn generate<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        palette: Palette,
        rng: &mut R,
    ) -> Result<Self, EngineError> {
        let mut board = Self::empty(rows, cols)?;
        for pos in board.positions().collect::<Vec<_>>() {
            let mut tile = palette.draw(rng);
            let mut redraws = 0;
            // Both axes are re-checked after every redraw.
            while board.completes_run(pos, tile) {
                if redraws == MAX_ATTEMPTS {
                    return Err(EngineError::Unsatisfiable {
                        rows,
                        cols,
                        palette: palette.size(),
                        attempts: MAX_ATTEMPTS,
                    });
                }
                tile = palette.draw(rng);
                redraws += 1;
            }
            board.place(pos, tile);
        }
        Ok(board)
    }

    /// Generate until the board has at least one legal move.
    pub fn deal<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        palette: Palette,
        rng: &mut R,
    ) -> Result<Self, EngineError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let board = Self::generate(rows, cols, palette, rng)?;
            if deadlock::has_any_legal_move(&board) {
                return Ok(board);
            }
            warn!(attempt, rows, cols, "dealt a board with no legal move, regenerating");
        }
        Err(EngineError::NoPlayableDeal {
            attempts: MAX_ATTEMPTS,
        })
    }

    /// Prepared layout, one `Vec` per row, tile values from 1.
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self, EngineError> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut board = Self::empty(rows.len(), cols)?;
        for (r, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(EngineError::InvalidLayout(format!(
                    "row {r} has {} cells, expected {cols}",
                    row.len()
                )));
            }
            for (c, &value) in row.iter().enumerate() {
                if value == 0 {
                    return Err(EngineError::InvalidLayout(format!(
                        "cell ({r}, {c}) has tile value 0"
                    )));
                }
                board.place(Pos::new(r, c), Tile(value));
            }
        }
        Ok(board)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn contains(&self, pos: Pos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    #[inline]
    fn index(&self, pos: Pos) -> Option<usize> {
        self.contains(pos).then(|| pos.row * self.cols + pos.col)
    }

    /// Piece at `pos`; `None` when empty or off the board.
    #[inline]
    pub fn piece(&self, pos: Pos) -> Option<Piece> {
        self.index(pos).and_then(|i| self.cells[i])
    }

    #[inline]
    pub fn tile(&self, pos: Pos) -> Option<Tile> {
        self.piece(pos).map(|p| p.tile)
    }

    /// All positions, row-major.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + use<> {
        let cols = self.cols;
        (0..self.rows * self.cols).map(move |i| Pos::new(i / cols, i % cols))
    }

    /// True when no cell is empty.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Tile values by row; `None` for empty cells.
    pub fn tiles_by_row(&self) -> Vec<Vec<Option<Tile>>> {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(|c| c.map(|p| p.tile)).collect())
            .collect()
    }

    fn fresh_id(&mut self) -> TileId {
        self.last_id += 1;
        TileId(self.last_id)
    }

    fn place(&mut self, pos: Pos, tile: Tile) -> TileId {
        let id = self.fresh_id();
        if let Some(i) = self.index(pos) {
            self.cells[i] = Some(Piece { tile, id });
        }
        id
    }

    /// Would `tile` at `pos` complete a triple with the two cells to its left or above?
    fn completes_run(&self, pos: Pos, tile: Tile) -> bool {
        let left = pos.col >= 2
            && self.tile(Pos::new(pos.row, pos.col - 1)) == Some(tile)
            && self.tile(Pos::new(pos.row, pos.col - 2)) == Some(tile);
        let up = pos.row >= 2
            && self.tile(Pos::new(pos.row - 1, pos.col)) == Some(tile)
            && self.tile(Pos::new(pos.row - 2, pos.col)) == Some(tile);
        left || up
    }

    /// Exchange two cells, identity included. No validation; off-board positions are ignored.
    pub fn swap(&mut self, a: Pos, b: Pos) {
        if let (Some(i), Some(j)) = (self.index(a), self.index(b)) {
            self.cells.swap(i, j);
        }
    }

    /// Empty the given cells, reporting what was there.
    pub fn clear_cells(&mut self, cells: impl IntoIterator<Item = Pos>) -> Vec<RemovedTile> {
        let mut removed = Vec::new();
        for pos in cells {
            let Some(i) = self.index(pos) else { continue };
            if let Some(piece) = self.cells[i].take() {
                removed.push(RemovedTile {
                    pos,
                    tile: piece.tile,
                    id: piece.id,
                });
            }
        }
        removed
    }

    /// Gravity: per column, bottom-to-top, each tile drops by the number of
    /// empty cells seen below it. Vacated cells end up at the top.
    pub fn compact(&mut self) -> Vec<Fall> {
        let mut falls = Vec::new();
        for col in (0..self.cols).rev() {
            let mut empty = 0;
            for row in (0..self.rows).rev() {
                let from = row * self.cols + col;
                match self.cells[from] {
                    None => empty += 1,
                    Some(piece) if empty > 0 => {
                        let to = Pos::new(row + empty, col);
                        self.cells[to.row * self.cols + col] = Some(piece);
                        self.cells[from] = None;
                        falls.push(Fall {
                            to,
                            shift: empty,
                            id: piece.id,
                        });
                    }
                    Some(_) => {}
                }
            }
        }
        falls
    }

    /// Fill every empty cell with a fresh draw. Runs are allowed here; the
    /// next detection pass picks them up.
    pub fn refill<R: Rng + ?Sized>(&mut self, palette: Palette, rng: &mut R) -> Vec<Spawn> {
        let mut spawned = Vec::new();
        for pos in self.positions().collect::<Vec<_>>() {
            if self.piece(pos).is_none() {
                let tile = palette.draw(rng);
                let id = self.place(pos, tile);
                spawned.push(Spawn { pos, tile, id });
            }
        }
        spawned
    }

    /// Every cell as a spawn, for the opening deal animation.
    pub fn spawns(&self) -> Vec<Spawn> {
        self.positions()
            .filter_map(|pos| {
                self.piece(pos).map(|p| Spawn {
                    pos,
                    tile: p.tile,
                    id: p.id,
                })
            })
            .collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.tiles_by_row() {
            let line: String = row
                .iter()
                .map(|t| t.map_or('.', |t| char::from(b'0' + t.0)))
                .collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
