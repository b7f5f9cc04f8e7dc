//! App: terminal init, main loop, animation playback, key and mouse handling.

use crate::Args;
use crate::input::{Action, drag_direction, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, Playback, TILE_HEIGHT, View};
use anyhow::Result;
use crossterm::event::{
    self, Event, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use match3tui::{Direction, EventSink, GameConfig, GameState, Pos, RemovalRecord, TimeLeft};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use rand::rngs::StdRng;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How long a hint stays highlighted.
const HINT_MS: u64 = 1500;
/// Score popups float for this long.
const POPUP_MS: u32 = 1200;

pub type Game = GameState<StdRng, HudFeed>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    Restart,
    Exit,
}

impl QuitOption {
    fn next(self) -> Self {
        match self {
            Self::Resume => Self::Restart,
            Self::Restart => Self::Exit,
            Self::Exit => Self::Resume,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Resume => Self::Exit,
            Self::Restart => Self::Resume,
            Self::Exit => Self::Restart,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScorePopup {
    /// First removed cell of the cycle.
    pub pos: Pos,
    pub amount: u32,
    pub combo: u32,
    pub age_ms: u32,
}

/// Event sink behind the HUD: turns removal cycles into score popups.
#[derive(Debug, Default)]
pub struct HudFeed {
    pub popups: Vec<ScorePopup>,
    /// History length already turned into popups.
    seen: usize,
    combo: u32,
}

impl HudFeed {
    pub fn tick_popups(&mut self, delta_ms: u32) {
        self.popups.retain_mut(|p| {
            p.age_ms += delta_ms;
            p.age_ms < POPUP_MS
        });
    }
}

impl EventSink for HudFeed {
    fn combo_changed(&mut self, combo: u32) {
        self.combo = combo;
    }

    fn time_changed(&mut self, left: TimeLeft) {
        debug!(%left, "time");
    }

    fn history_changed(&mut self, history: &[RemovalRecord]) {
        if history.len() <= self.seen {
            self.seen = history.len();
            self.popups.clear();
            return;
        }
        let fresh = &history[self.seen..];
        self.popups.push(ScorePopup {
            pos: fresh[0].pos,
            amount: fresh.len() as u32,
            combo: self.combo,
            age_ms: 0,
        });
        self.seen = history.len();
    }

    fn game_over(&mut self, final_score: u32) {
        info!(final_score, "final score");
    }
}

pub struct App {
    args: Args,
    theme: Theme,
    state: Game,
    screen: Screen,
    /// Keyboard cursor.
    cursor: Pos,
    hint: Option<((Pos, Pos), Instant)>,
    playback: Option<Playback>,
    /// Terminal cell where the left button went down.
    drag_origin: Option<(u16, u16)>,
    quit_selected: QuitOption,
    /// When the quit menu opened; the clock and playback hold meanwhile.
    paused_at: Option<Instant>,
    /// Frame area from the last draw, for mouse hit-testing.
    area: Rect,
    last_frame: Instant,
}

impl App {
    pub fn new(args: Args, config: GameConfig, rng: StdRng) -> Result<Self> {
        let mut state = GameState::new(config, rng, HudFeed::default())?;
        let now = Instant::now();
        state.start(now)?;
        Ok(Self {
            args,
            theme: Theme::default(),
            state,
            screen: Screen::Playing,
            cursor: Pos::new(0, 0),
            hint: None,
            playback: None,
            drag_origin: None,
            quit_selected: QuitOption::Resume,
            paused_at: None,
            area: Rect::default(),
            last_frame: now,
        })
    }

    fn restart(&mut self, now: Instant) -> Result<()> {
        self.state.reset();
        self.state.start(now)?;
        self.screen = Screen::Playing;
        self.playback = None;
        self.hint = None;
        self.drag_origin = None;
        self.paused_at = None;
        info!("restarted");
        Ok(())
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.args.frame_rate.max(1.0));
        loop {
            let now = Instant::now();
            let delta = now.saturating_duration_since(self.last_frame);
            self.last_frame = now;
            if self.screen == Screen::Playing {
                self.state.tick(now);
                self.sync_playback(now);
                self.state
                    .sink_mut()
                    .tick_popups(delta.as_millis().min(u128::from(u32::MAX)) as u32);
            }
            if self
                .hint
                .is_some_and(|(_, at)| now.saturating_duration_since(at) >= Duration::from_millis(HINT_MS))
            {
                self.hint = None;
            }
            if self.state.is_over() && self.screen == Screen::Playing {
                self.screen = Screen::GameOver;
                self.playback = None;
            }

            let view = View {
                screen: self.screen,
                state: &self.state,
                theme: &self.theme,
                cursor: self.cursor,
                hint: self.hint.map(|(pair, _)| pair),
                quit_selected: self.quit_selected,
                now: self.paused_at.unwrap_or(now),
            };
            let playback = self.playback.as_mut();
            let completed = terminal.draw(|f| ui::draw(f, &view, playback))?;
            self.area = completed.area;

            if self.screen == Screen::Playing && self.playback.as_ref().is_some_and(|p| p.is_done(now)) {
                self.playback = None;
                self.state.animation_finished(Instant::now());
            }

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let exit = match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            self.handle_key(key, Instant::now())?
                        }
                        Event::Mouse(mouse) => {
                            self.handle_mouse(mouse, Instant::now());
                            false
                        }
                        _ => false,
                    };
                    if exit {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Start playing the engine's pending animation, or acknowledge
    /// everything at once when animations are off.
    fn sync_playback(&mut self, now: Instant) {
        if self.args.no_animation {
            while self.state.pending_animation().is_some() {
                self.state.animation_finished(now);
            }
            return;
        }
        if self.playback.is_some() {
            return;
        }
        if let Some(animation) = self.state.pending_animation() {
            debug!(animation = animation.name(), "playing");
            self.playback = Some(Playback::new(animation.clone(), now));
        }
    }

    fn open_quit_menu(&mut self, now: Instant) {
        self.screen = Screen::QuitMenu;
        self.quit_selected = QuitOption::Resume;
        self.paused_at = Some(now);
        self.state.pause(now);
    }

    fn resume(&mut self, now: Instant) {
        self.screen = Screen::Playing;
        self.state.resume(now);
        if let Some(at) = self.paused_at.take() {
            let held = now.saturating_duration_since(at);
            if let Some(playback) = self.playback.as_mut() {
                playback.delay(held);
            }
            debug!(held_ms = held.as_millis() as u64, "resumed");
        }
    }

    fn select(&mut self, pos: Pos, now: Instant) {
        if let Err(err) = self.state.select_cell(pos, now) {
            warn!(%err, "selection rejected");
        }
    }

    /// Select `from`, then its neighbour in `dir`: a swap attempt.
    fn swap_toward(&mut self, from: Pos, dir: Direction, now: Instant) {
        let config = self.state.config();
        let Some(to) = from.step(dir, config.rows, config.cols) else {
            return;
        };
        // Toggle off any other selection so selecting `from` cannot swap with it.
        if let Some(current) = self.state.selected().filter(|&p| p != from) {
            self.select(current, now);
        }
        if self.state.selected() != Some(from) {
            self.select(from, now);
        }
        self.select(to, now);
    }

    /// Returns true when the app should exit.
    fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Result<bool> {
        let action = key_to_action(key);
        match self.screen {
            Screen::Playing => match action {
                Action::Quit => self.open_quit_menu(now),
                Action::Cursor(dir) => {
                    let config = self.state.config();
                    self.cursor = self.cursor.step(dir, config.rows, config.cols).unwrap_or(self.cursor);
                }
                Action::Select => self.select(self.cursor, now),
                Action::Swap(dir) => {
                    self.swap_toward(self.cursor, dir, now);
                    let config = self.state.config();
                    self.cursor = self.cursor.step(dir, config.rows, config.cols).unwrap_or(self.cursor);
                }
                Action::Hint => {
                    self.hint = self.state.hint().map(|pair| (pair, now));
                    debug!(hint = ?self.hint.map(|(pair, _)| pair), "hint");
                }
                Action::Restart => self.restart(now)?,
                Action::None => {}
            },
            Screen::QuitMenu => match action {
                Action::Cursor(Direction::Up | Direction::Left) => {
                    self.quit_selected = self.quit_selected.prev();
                }
                Action::Cursor(Direction::Down | Direction::Right) => {
                    self.quit_selected = self.quit_selected.next();
                }
                Action::Select => match self.quit_selected {
                    QuitOption::Resume => self.resume(now),
                    QuitOption::Restart => self.restart(now)?,
                    QuitOption::Exit => return Ok(true),
                },
                Action::Quit => self.resume(now),
                _ => {}
            },
            Screen::GameOver => match action {
                Action::Quit => return Ok(true),
                Action::Restart | Action::Select => self.restart(now)?,
                _ => {}
            },
        }
        Ok(false)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        if self.screen != Screen::Playing {
            return;
        }
        let config = *self.state.config();
        let board_rect = ui::playfield_board_rect(self.area, config.rows, config.cols, config.tile_width);
        let at = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(pos) = ui::cell_at(board_rect, config.tile_width, at.0, at.1) {
                    self.cursor = pos;
                    self.drag_origin = Some(at);
                    self.select(pos, now);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let Some(origin) = self.drag_origin.take() else {
                    return;
                };
                let from = ui::cell_at(board_rect, config.tile_width, origin.0, origin.1);
                let dir = drag_direction(origin, at, config.tile_width, TILE_HEIGHT);
                if let (Some(from), Some(dir)) = (from, dir) {
                    debug!(?from, ?dir, "drag");
                    self.swap_toward(from, dir, now);
                }
            }
            _ => {}
        }
    }
}
