//! Session controller: selection, swap attempts, cascades, score, countdown.
//!
//! Every command takes the host's `now`. Board mutations that the player
//! should see are published as a single pending [`Animation`]; the session
//! stays busy until the host calls [`GameState::animation_finished`].

use crate::GameConfig;
use crate::animation::Animation;
use crate::board::{Board, Pos, RemovedTile};
use crate::cascade::{Cascade, CascadeStep};
use crate::countdown::Countdown;
use crate::deadlock;
use crate::error::EngineError;
use crate::events::{EventSink, RemovalRecord, RemovalSummary, TimeLeft};
use crate::matcher;
use crate::palette::Palette;
use rand::Rng;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Board dealt, waiting for `start`.
    Ready,
    /// Deal animation outstanding.
    Dealing,
    AwaitingSelection,
    /// A swap attempt or cascade is in flight; input is ignored.
    Resolving,
    Over,
}

/// One play session.
#[derive(Debug)]
pub struct GameState<R, S = ()> {
    config: GameConfig,
    palette: Palette,
    /// `None` between `reset` and the next `start`.
    board: Option<Board>,
    rng: R,
    sink: S,
    phase: Phase,
    selected: Option<Pos>,
    score: u32,
    combo: u32,
    max_combo: u32,
    history: Vec<RemovalRecord>,
    summary: RemovalSummary,
    countdown: Countdown,
    pending: Option<Animation>,
    cascade: Option<Cascade>,
    started_at: Option<Instant>,
}

impl<R: Rng, S: EventSink> GameState<R, S> {
    /// Validate `config` and deal a playable board.
    pub fn new(config: GameConfig, mut rng: R, sink: S) -> Result<Self, EngineError> {
        config.validate()?;
        let palette = Palette::new(config.palette)?;
        let board = Board::deal(config.rows, config.cols, palette, &mut rng)?;
        info!(rows = config.rows, cols = config.cols, palette = config.palette, "board dealt");
        Ok(Self::with_board(config, palette, board, rng, sink))
    }

    /// Start from a prepared layout. The board's dimensions replace the
    /// configured ones; later deals after `reset` use them too.
    ///
    /// The layout must be settled: every tile within the palette and no run
    /// already on the board.
    pub fn from_board(config: GameConfig, board: Board, rng: R, sink: S) -> Result<Self, EngineError> {
        let config = GameConfig {
            rows: board.rows(),
            cols: board.cols(),
            ..config
        };
        config.validate()?;
        let palette = Palette::new(config.palette)?;
        if let Some(pos) = board
            .positions()
            .find(|&p| board.tile(p).is_some_and(|t| t.0 > config.palette))
        {
            return Err(EngineError::InvalidLayout(format!(
                "cell ({}, {}) is outside a palette of {}",
                pos.row, pos.col, config.palette
            )));
        }
        let runs = matcher::matches_for_any(&board, board.positions());
        if let Some(pos) = runs.first() {
            return Err(EngineError::InvalidLayout(format!(
                "layout already holds a run through ({}, {})",
                pos.row, pos.col
            )));
        }
        Ok(Self::with_board(config, palette, board, rng, sink))
    }

    fn with_board(config: GameConfig, palette: Palette, board: Board, rng: R, sink: S) -> Self {
        Self {
            countdown: Countdown::new(config.countdown_secs),
            config,
            palette,
            board: Some(board),
            rng,
            sink,
            phase: Phase::Ready,
            selected: None,
            score: 0,
            combo: 0,
            max_combo: 0,
            history: Vec::new(),
            summary: RemovalSummary::new(),
            pending: None,
            cascade: None,
            started_at: None,
        }
    }

    // --- ACCESSORS ---

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn selected(&self) -> Option<Pos> {
        self.selected
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn history(&self) -> &[RemovalRecord] {
        &self.history
    }

    pub fn summary(&self) -> &RemovalSummary {
        &self.summary
    }

    pub fn time_left(&self) -> TimeLeft {
        self.countdown.time_left()
    }

    /// The animation the host must play and acknowledge, if any.
    pub fn pending_animation(&self) -> Option<&Animation> {
        self.pending.as_ref()
    }

    /// True while a deal, swap or cascade is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Dealing | Phase::Resolving)
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::Over
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// A legal swap, when the player could act on it.
    pub fn hint(&self) -> Option<(Pos, Pos)> {
        if self.phase != Phase::AwaitingSelection {
            return None;
        }
        self.board.as_ref().and_then(deadlock::find_legal_move)
    }

    // --- COMMANDS ---

    /// Begin play. Only honoured from `Ready`; re-deals when `reset` dropped the board.
    pub fn start(&mut self, now: Instant) -> Result<(), EngineError> {
        if self.phase != Phase::Ready {
            debug!(phase = ?self.phase, "start ignored");
            return Ok(());
        }
        let board = match self.board.take() {
            Some(board) => board,
            None => {
                let board = Board::deal(self.config.rows, self.config.cols, self.palette, &mut self.rng)?;
                info!(rows = self.config.rows, cols = self.config.cols, "board re-dealt");
                board
            }
        };
        self.pending = Some(Animation::Deal { tiles: board.spawns() });
        self.board = Some(board);
        self.started_at = Some(now);
        self.phase = Phase::Dealing;
        info!("game started");
        Ok(())
    }

    /// Click or drag-resolved selection at `pos`.
    ///
    /// Off-board positions are rejected without touching state. Anything else
    /// is ignored unless the session is waiting for the player.
    pub fn select_cell(&mut self, pos: Pos, _now: Instant) -> Result<(), EngineError> {
        let (rows, cols) = self
            .board
            .as_ref()
            .map_or((self.config.rows, self.config.cols), |b| (b.rows(), b.cols()));
        if pos.row >= rows || pos.col >= cols {
            return Err(EngineError::OutOfBounds { pos, rows, cols });
        }
        if self.phase != Phase::AwaitingSelection {
            debug!(?pos, phase = ?self.phase, "selection ignored");
            return Ok(());
        }
        match self.selected {
            Some(current) if current == pos => self.set_selected(None),
            Some(current) if current.is_adjacent(pos) => self.attempt_swap(current, pos),
            _ => self.set_selected(Some(pos)),
        }
        Ok(())
    }

    /// The host finished playing the pending animation.
    pub fn animation_finished(&mut self, now: Instant) {
        let Some(done) = self.pending.take() else {
            return;
        };
        debug!(animation = done.name(), "animation acknowledged");
        match done {
            Animation::Deal { .. } => {
                self.phase = Phase::AwaitingSelection;
                self.countdown.start(now);
                self.sink.time_changed(self.countdown.time_left());
                self.check_playable();
            }
            Animation::Swap { reverted: true, .. } => self.settle(),
            Animation::Swap { reverted: false, .. }
            | Animation::Remove { .. }
            | Animation::Fall { .. }
            | Animation::Refill { .. } => self.advance_cascade(now),
        }
    }

    /// Drive the countdown. Expiry ends the game at once, or when the running
    /// episode settles.
    pub fn tick(&mut self, now: Instant) {
        let changes = self.countdown.tick(now);
        if changes.is_empty() {
            return;
        }
        for remaining in changes {
            self.sink.time_changed(TimeLeft::Seconds(remaining));
        }
        if self.countdown.is_expired() {
            if self.phase == Phase::AwaitingSelection {
                self.finish("time up");
            } else {
                debug!(phase = ?self.phase, "time up, game over deferred until settle");
            }
        }
    }

    /// Hold the countdown while the host shows something over the board.
    pub fn pause(&mut self, now: Instant) {
        self.countdown.pause(now);
        debug!(time_left = %self.countdown.time_left(), "paused");
    }

    /// Continue the countdown from `now`; the paused span is not charged.
    pub fn resume(&mut self, now: Instant) {
        self.countdown.resume(now);
        debug!(time_left = %self.countdown.time_left(), "resumed");
    }

    /// Drop the session back to `Ready`. Allowed at any point; an in-flight
    /// cascade is discarded with its pending animation.
    pub fn reset(&mut self) {
        let time_before = self.countdown.time_left();
        self.countdown.cancel();
        self.pending = None;
        self.cascade = None;
        self.board = None;
        self.started_at = None;
        self.set_selected(None);
        if self.score != 0 {
            self.score = 0;
            self.sink.score_changed(0);
        }
        self.set_combo(0);
        if self.max_combo != 0 {
            self.max_combo = 0;
            self.sink.max_combo_changed(0);
        }
        if !self.history.is_empty() {
            self.history.clear();
            self.sink.history_changed(&self.history);
        }
        if !self.summary.is_empty() {
            self.summary.clear();
            self.sink.summary_changed(&self.summary);
        }
        if self.countdown.time_left() != time_before {
            self.sink.time_changed(self.countdown.time_left());
        }
        self.phase = Phase::Ready;
        info!("game reset");
    }

    // --- EPISODE ---

    fn attempt_swap(&mut self, a: Pos, b: Pos) {
        let Some(board) = self.board.as_mut() else {
            return;
        };
        self.phase = Phase::Resolving;
        board.swap(a, b);
        let matched = matcher::matches_for_any(board, [a, b]);
        if matched.is_empty() {
            board.swap(a, b);
            debug!(?a, ?b, "swap reverted");
            self.set_combo(0);
            self.pending = Some(Animation::Swap { a, b, reverted: true });
        } else {
            debug!(?a, ?b, matched = matched.len(), "swap matched");
            self.cascade = Some(Cascade::new(matched));
            self.pending = Some(Animation::Swap { a, b, reverted: false });
        }
    }

    /// Step the cascade until it produces something to show, or settles.
    fn advance_cascade(&mut self, now: Instant) {
        loop {
            let step = match (self.cascade.as_mut(), self.board.as_mut()) {
                (Some(cascade), Some(board)) => cascade.step(board, self.palette, &mut self.rng),
                _ => CascadeStep::Settled,
            };
            match step {
                CascadeStep::Removed { tiles, .. } => {
                    self.record_removal(&tiles, now);
                    self.pending = Some(Animation::Remove { tiles });
                }
                CascadeStep::Compacted { falls } if falls.is_empty() => continue,
                CascadeStep::Compacted { falls } => self.pending = Some(Animation::Fall { falls }),
                CascadeStep::Refilled { spawned } if spawned.is_empty() => continue,
                CascadeStep::Refilled { spawned } => {
                    self.pending = Some(Animation::Refill { tiles: spawned });
                }
                CascadeStep::Settled => {
                    self.cascade = None;
                    self.settle();
                }
            }
            return;
        }
    }

    fn record_removal(&mut self, tiles: &[RemovedTile], now: Instant) {
        self.set_combo(self.combo + 1);
        let at = self
            .started_at
            .map_or_else(Default::default, |t| now.saturating_duration_since(t));
        for removed in tiles {
            self.history.push(RemovalRecord {
                tile: removed.tile,
                pos: removed.pos,
                at,
            });
            *self.summary.entry(removed.tile).or_insert(0) += 1;
        }
        self.score += tiles.len() as u32;
        self.sink.score_changed(self.score);
        self.sink.history_changed(&self.history);
        self.sink.summary_changed(&self.summary);
    }

    /// Episode over: release input, then look for reasons to end the game.
    fn settle(&mut self) {
        self.set_selected(None);
        self.set_combo(0);
        self.phase = Phase::AwaitingSelection;
        info!(score = self.score, max_combo = self.max_combo, "settled");
        if self.check_playable() && self.countdown.is_expired() {
            self.finish("time up");
        }
    }

    /// Ends the game when no swap can match. Returns whether play continues.
    fn check_playable(&mut self) -> bool {
        let playable = self.board.as_ref().is_some_and(deadlock::has_any_legal_move);
        if !playable {
            self.finish("no legal move");
        }
        playable
    }

    fn finish(&mut self, reason: &str) {
        if self.phase == Phase::Over {
            return;
        }
        self.countdown.stop();
        self.set_selected(None);
        self.phase = Phase::Over;
        info!(score = self.score, max_combo = self.max_combo, reason, "game over");
        self.sink.game_over(self.score);
    }

    fn set_selected(&mut self, selected: Option<Pos>) {
        if self.selected != selected {
            self.selected = selected;
            self.sink.selection_changed(selected);
        }
    }

    fn set_combo(&mut self, combo: u32) {
        if self.combo != combo {
            self.combo = combo;
            self.sink.combo_changed(combo);
        }
        if combo > self.max_combo {
            self.max_combo = combo;
            self.sink.max_combo_changed(combo);
        }
    }
}
