//! Layout and drawing: board, animation playback, sidebar, quit menu, game over.

use crate::app::{Game, QuitOption, ScorePopup, Screen};
use crate::theme::{Theme, shade};
use match3tui::animation::Animation;
use match3tui::{Pos, TimeLeft, Tile};
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal rows per tile.
pub const TILE_HEIGHT: u16 = 2;
const SIDEBAR_WIDTH: u16 = 28;
/// Records shown in the sidebar history, newest first.
const HISTORY_TAIL: usize = 6;

// --- ANIMATION TIMING ---
const DEAL_MS: u64 = 550;
const SWAP_MS: u64 = 170;
/// Removal fade (TachyonFX) in ms.
const REMOVE_FADE_MS: u32 = 300;
const FALL_MS_PER_ROW: u64 = 80;
const REFILL_MS: u64 = 280;

/// Host-side playback of one engine animation request.
pub struct Playback {
    pub animation: Animation,
    started: Instant,
    duration: Duration,
    /// Removal fade, created on first draw once the board rect is known.
    effect: Option<Effect>,
    last_process: Option<Instant>,
}

impl Playback {
    pub fn new(animation: Animation, now: Instant) -> Self {
        let duration = match &animation {
            Animation::Deal { .. } => Duration::from_millis(DEAL_MS),
            Animation::Swap { reverted: false, .. } => Duration::from_millis(SWAP_MS),
            Animation::Swap { reverted: true, .. } => Duration::from_millis(SWAP_MS * 2),
            Animation::Remove { .. } => Duration::from_millis(u64::from(REMOVE_FADE_MS)),
            Animation::Fall { falls } => {
                let rows = falls.iter().map(|f| f.shift).max().unwrap_or(1) as u64;
                Duration::from_millis(FALL_MS_PER_ROW * rows)
            }
            Animation::Refill { .. } => Duration::from_millis(REFILL_MS),
        };
        Self {
            animation,
            started: now,
            duration,
            effect: None,
            last_process: None,
        }
    }

    /// Eased progress in `0.0..=1.0` (ease-out cubic).
    fn progress(&self, now: Instant) -> f32 {
        let t = now.saturating_duration_since(self.started).as_secs_f32()
            / self.duration.as_secs_f32().max(f32::EPSILON);
        let t = t.min(1.0);
        1.0 - (1.0 - t).powi(3)
    }

    /// Push the clock back by a span the host spent paused.
    pub fn delay(&mut self, by: Duration) {
        self.started += by;
        self.last_process = self.last_process.map(|t| t + by);
    }

    /// Removal waits on its fade; everything else on the clock.
    pub fn is_done(&self, now: Instant) -> bool {
        match &self.effect {
            Some(effect) => effect.done(),
            None => now.saturating_duration_since(self.started) >= self.duration,
        }
    }
}

/// Everything a frame needs besides the playback.
pub struct View<'a> {
    pub screen: Screen,
    pub state: &'a Game,
    pub theme: &'a Theme,
    pub cursor: Pos,
    pub hint: Option<(Pos, Pos)>,
    pub quit_selected: QuitOption,
    pub now: Instant,
}

// --- GEOMETRY ---

/// Terminal cells covered by `count` tiles of `unit` cells, saturating.
fn span(count: usize, unit: u16) -> u16 {
    u16::try_from(count).unwrap_or(u16::MAX).saturating_mul(unit)
}

/// Playfield size in terminal cells (border + tiles).
pub fn playfield_size(rows: usize, cols: usize, tile_width: u16) -> (u16, u16) {
    (
        span(cols, tile_width).saturating_add(2),
        span(rows, TILE_HEIGHT).saturating_add(2),
    )
}

/// Playfield and sidebar, centred together in `area`.
fn game_areas(area: Rect, rows: usize, cols: usize, tile_width: u16) -> (Rect, Rect) {
    let (pw, ph) = playfield_size(rows, cols, tile_width);
    let total_w = pw.saturating_add(SIDEBAR_WIDTH);
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(ph) / 2;
    let playfield = Rect {
        x,
        y,
        width: pw,
        height: ph,
    }
    .intersection(area);
    let sidebar = Rect {
        x: x.saturating_add(pw),
        y: area.y,
        width: SIDEBAR_WIDTH,
        height: area.height,
    }
    .intersection(area);
    (playfield, sidebar)
}

/// Board rect inside the playfield border; matches `draw_game` layout.
pub fn playfield_board_rect(area: Rect, rows: usize, cols: usize, tile_width: u16) -> Rect {
    let (playfield, _) = game_areas(area, rows, cols, tile_width);
    Rect {
        x: playfield.x + 1,
        y: playfield.y + 1,
        width: span(cols, tile_width).min(playfield.width.saturating_sub(2)),
        height: span(rows, TILE_HEIGHT).min(playfield.height.saturating_sub(2)),
    }
}

/// Tile under terminal cell `(x, y)`.
pub fn cell_at(board_rect: Rect, tile_width: u16, x: u16, y: u16) -> Option<Pos> {
    board_rect.contains(Position { x, y }).then(|| {
        Pos::new(
            usize::from((y - board_rect.y) / TILE_HEIGHT),
            usize::from((x - board_rect.x) / tile_width.max(1)),
        )
    })
}

/// Per-tile drawing offset in tiles `(rows, cols)` at eased progress `t`,
/// keyed by the tile's resting position on the board.
fn motion_offsets(animation: &Animation, t: f32, rows: usize) -> HashMap<Pos, (f32, f32)> {
    let delta = |from: Pos, to: Pos| {
        (
            from.row as f32 - to.row as f32,
            from.col as f32 - to.col as f32,
        )
    };
    let mut offsets = HashMap::new();
    match animation {
        Animation::Deal { tiles } => {
            for spawn in tiles {
                offsets.insert(spawn.pos, (-(rows as f32) * (1.0 - t), 0.0));
            }
        }
        Animation::Swap { a, b, reverted } => {
            // Forward: the tile now at `a` slides in from `b`. Revert: out and back.
            let k = if *reverted { 1.0 - (2.0 * t - 1.0).abs() } else { 1.0 - t };
            let (ar, ac) = delta(*b, *a);
            let (br, bc) = delta(*a, *b);
            offsets.insert(*a, (ar * k, ac * k));
            offsets.insert(*b, (br * k, bc * k));
        }
        Animation::Remove { .. } => {}
        Animation::Fall { falls } => {
            for fall in falls {
                offsets.insert(fall.to, (-(fall.shift as f32) * (1.0 - t), 0.0));
            }
        }
        Animation::Refill { tiles } => {
            let mut per_col: HashMap<usize, usize> = HashMap::new();
            for spawn in tiles {
                *per_col.entry(spawn.pos.col).or_default() += 1;
            }
            for spawn in tiles {
                let n = per_col.get(&spawn.pos.col).copied().unwrap_or(1);
                offsets.insert(spawn.pos, (-(n as f32) * (1.0 - t), 0.0));
            }
        }
    }
    offsets
}

// --- DRAWING ---

/// Draw the current screen. While a removal plays, applies the TachyonFX
/// fade and keeps its state in `playback`.
pub fn draw(frame: &mut Frame, view: &View, playback: Option<&mut Playback>) {
    let area = frame.area();
    match view.screen {
        Screen::Playing => {
            draw_game(frame, view, area, playback.as_deref());
            if let Some(playback) = playback {
                apply_remove_effect(frame, view, area, playback);
            }
        }
        Screen::QuitMenu => {
            draw_game(frame, view, area, playback.as_deref());
            draw_quit_menu(frame, view.theme, view.quit_selected);
        }
        Screen::GameOver => {
            draw_game(frame, view, area, None);
            draw_game_over(frame, view, area);
        }
    }
}

fn draw_game(frame: &mut Frame, view: &View, area: Rect, playback: Option<&Playback>) {
    let config = view.state.config();
    let (playfield_area, sidebar_area) = game_areas(area, config.rows, config.cols, config.tile_width);
    draw_playfield(frame, view, playfield_area, playback);
    draw_sidebar(frame, view, sidebar_area);
}

/// Tile decorations.
#[derive(Debug, Clone, Copy, Default)]
struct Look {
    selected: bool,
    cursor: bool,
    hinted: bool,
    flash: bool,
}

fn draw_playfield(frame: &mut Frame, view: &View, area: Rect, playback: Option<&Playback>) {
    let theme = view.theme;
    let state = view.state;
    let title = format!(" match3tui  | {} ", state.time_left());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .style(Style::default().bg(theme.bg))
        .title(Span::styled(title, Style::default().fg(theme.title)));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let Some(board) = state.board() else {
        return;
    };
    let tile_width = state.config().tile_width;
    let board_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: span(board.cols(), tile_width).min(inner.width),
        height: span(board.rows(), TILE_HEIGHT).min(inner.height),
    };

    let offsets = playback
        .map(|p| motion_offsets(&p.animation, p.progress(view.now), board.rows()))
        .unwrap_or_default();
    let show_cursor = view.screen == Screen::Playing;

    let buf = frame.buffer_mut();
    for pos in board.positions() {
        let Some(tile) = board.tile(pos) else {
            continue;
        };
        let look = Look {
            selected: state.selected() == Some(pos),
            cursor: show_cursor && view.cursor == pos,
            hinted: view.hint.is_some_and(|(a, b)| a == pos || b == pos),
            flash: false,
        };
        let offset = offsets.get(&pos).copied().unwrap_or((0.0, 0.0));
        draw_tile(buf, board_rect, tile_width, pos, offset, tile, look, theme);
    }

    // Removed cells are already empty; draw them lit until the fade covers them.
    if let Some(Animation::Remove { tiles }) = playback.map(|p| &p.animation) {
        for removed in tiles {
            let look = Look {
                flash: true,
                ..Look::default()
            };
            draw_tile(buf, board_rect, tile_width, removed.pos, (0.0, 0.0), removed.tile, look, theme);
        }
    }

    draw_popups(buf, board_rect, tile_width, &state.sink().popups, theme);
}

/// Paint one `tile_width x TILE_HEIGHT` tile, offset by a fraction of a tile, clipped to `clip`.
fn draw_tile(
    buf: &mut Buffer,
    clip: Rect,
    tile_width: u16,
    pos: Pos,
    offset: (f32, f32),
    tile: Tile,
    look: Look,
    theme: &Theme,
) {
    let top = clip.y as f32 + (pos.row as f32 + offset.0) * f32::from(TILE_HEIGHT);
    let left = clip.x as f32 + (pos.col as f32 + offset.1) * f32::from(tile_width);
    let (top, left) = (top.round() as i32, left.round() as i32);

    let base = if look.flash {
        Color::White
    } else {
        theme.tile_color(tile)
    };
    let lift = if look.selected || look.hinted { 1.3 } else { 1.0 };
    let glyph_fg = if look.selected { theme.bg } else { shade(base, 0.45) };

    for line in 0..TILE_HEIGHT {
        let y = top + i32::from(line);
        // Bevel: lighter top row, darker bottom row.
        let bg = shade(base, lift * if line == 0 { 1.08 } else { 0.86 });
        for dx in 0..tile_width {
            let x = left + i32::from(dx);
            let (Ok(x), Ok(y)) = (u16::try_from(x), u16::try_from(y)) else {
                continue;
            };
            if !clip.contains(Position { x, y }) {
                continue;
            }
            let edge = dx == 0 || dx + 1 == tile_width;
            let (symbol, fg) = if look.cursor && edge && tile_width >= 3 {
                (if dx == 0 { "[" } else { "]" }, theme.cursor)
            } else if line == 0 && dx == tile_width / 2 && !look.flash {
                (Theme::glyph(tile), glyph_fg)
            } else {
                (" ", glyph_fg)
            };
            let mut style = Style::default().fg(fg).bg(bg);
            if look.cursor && edge {
                style = style.add_modifier(Modifier::BOLD);
            }
            buf[(x, y)].set_symbol(symbol).set_style(style);
        }
    }
}

fn draw_popups(buf: &mut Buffer, board_rect: Rect, tile_width: u16, popups: &[ScorePopup], theme: &Theme) {
    for popup in popups {
        let rise = (popup.age_ms / 200) as u16;
        let x = board_rect.x.saturating_add(span(popup.pos.col, tile_width));
        let Some(y) = board_rect
            .y
            .saturating_add(span(popup.pos.row, TILE_HEIGHT))
            .checked_sub(rise)
        else {
            continue;
        };
        if y < board_rect.y || !board_rect.contains(Position { x, y }) {
            continue;
        }
        let label = if popup.combo > 1 {
            format!("+{} x{}", popup.amount, popup.combo)
        } else {
            format!("+{}", popup.amount)
        };
        let style = Style::default()
            .fg(Color::Yellow)
            .bg(theme.bg)
            .add_modifier(Modifier::BOLD);
        buf.set_string(x, y, label, style);
    }
}

/// Create or advance the removal fade (TachyonFX: removed cells fade to bg).
fn apply_remove_effect(frame: &mut Frame, view: &View, area: Rect, playback: &mut Playback) {
    let Animation::Remove { tiles } = &playback.animation else {
        return;
    };
    let config = view.state.config();
    let board_rect = playfield_board_rect(area, config.rows, config.cols, config.tile_width);
    let delta = playback
        .last_process
        .map(|t| view.now.saturating_duration_since(t))
        .unwrap_or(Duration::ZERO);
    let tfx_delta = TfxDuration::from_millis(delta.as_millis().min(u128::from(u32::MAX)) as u32);
    playback.last_process = Some(view.now);

    if playback.effect.is_none() {
        let mut cells = HashSet::new();
        for removed in tiles {
            let x0 = board_rect.x.saturating_add(span(removed.pos.col, config.tile_width));
            let y0 = board_rect.y.saturating_add(span(removed.pos.row, TILE_HEIGHT));
            for x in x0..x0.saturating_add(config.tile_width) {
                for y in y0..y0.saturating_add(TILE_HEIGHT) {
                    cells.insert((x, y));
                }
            }
        }
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            cells.contains(&(pos.x, pos.y))
        }));
        let bg = view.theme.bg;
        let effect = fx::fade_to(bg, bg, (REMOVE_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board_rect);
        playback.effect = Some(effect);
    }

    if let Some(effect) = playback.effect.as_mut() {
        frame.render_effect(effect, board_rect, tfx_delta);
    }
}

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let state = view.state;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let dim_style = Style::default().fg(theme.inactive_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);
    let palette = state.config().palette;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),                      // Score, combo, best, removed
            Constraint::Length(4),                      // Time label + gauge
            Constraint::Length(u16::from(palette) + 2), // Summary per tile kind
            Constraint::Length(HISTORY_TAIL as u16 + 2),
            Constraint::Length(3), // Keys
            Constraint::Fill(1),
        ])
        .split(area);
    let section = |name: &'static str| {
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(name, title_style))
    };

    // --- Stats ---
    let stat = |label: &'static str, value: String| {
        Line::from(vec![Span::styled(label, title_style), Span::styled(value, fg_style)])
    };
    let stats = vec![
        stat("Score: ", state.score().to_string()),
        stat("Combo: ", format!("x{}", state.combo())),
        stat("Best combo: ", format!("x{}", state.max_combo())),
        stat("Removed: ", state.history().len().to_string()),
    ];
    Paragraph::new(Text::from(stats))
        .block(section(" Stats "))
        .render(chunks[0], frame.buffer_mut());

    // --- Time ---
    let time_block = section(" Time ");
    let time_inner = time_block.inner(chunks[1]);
    time_block.render(chunks[1], frame.buffer_mut());
    let time_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(time_inner);
    let left = state.time_left();
    Paragraph::new(Line::from(Span::styled(left.to_string(), fg_style)))
        .render(time_rows[0], frame.buffer_mut());
    let ratio = match left {
        TimeLeft::Seconds(s) => f64::from(s) / f64::from(state.config().countdown_secs.max(1)),
        TimeLeft::Unlimited => 1.0,
    };
    let bar_color = if ratio > 0.5 {
        Color::Green
    } else if ratio > 0.2 {
        Color::Yellow
    } else {
        Color::Red
    };
    Gauge::default()
        .ratio(ratio.clamp(0.0, 1.0))
        .label("")
        .gauge_style(Style::default().fg(bar_color))
        .render(time_rows[1], frame.buffer_mut());

    // --- Summary ---
    let summary: Vec<Line> = (1..=palette)
        .map(Tile)
        .map(|tile| {
            let count = state.summary().get(&tile).copied().unwrap_or(0);
            Line::from(vec![
                Span::styled(
                    format!(" {} ", Theme::glyph(tile)),
                    Style::default().fg(theme.tile_color(tile)),
                ),
                Span::styled(count.to_string(), fg_style),
            ])
        })
        .collect();
    Paragraph::new(Text::from(summary))
        .block(section(" Removed "))
        .render(chunks[2], frame.buffer_mut());

    // --- History ---
    let history: Vec<Line> = state
        .history()
        .iter()
        .rev()
        .take(HISTORY_TAIL)
        .map(|record| Line::from(Span::styled(record.to_string(), dim_style)))
        .collect();
    Paragraph::new(Text::from(history))
        .block(section(" History "))
        .render(chunks[3], frame.buffer_mut());

    Paragraph::new(vec![
        Line::from(Span::styled("Space select  ⇧+dir swap", dim_style)),
        Line::from(Span::styled("? hint  r restart  q quit", dim_style)),
    ])
    .block(Block::default().borders(Borders::TOP).border_style(border_style))
    .render(chunks[4], frame.buffer_mut());
}

fn clear_rect(buf: &mut Buffer, rect: Rect, bg: Color) {
    let rect = rect.intersection(buf.area);
    for y in rect.y..rect.y + rect.height {
        for x in rect.x..rect.x + rect.width {
            buf[(x, y)].set_symbol(" ").set_style(Style::default().bg(bg));
        }
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_game_over(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let state = view.state;
    let popup = centered(area, 30, 10);
    let title = if state.time_left() == TimeLeft::Seconds(0) {
        " Time's up! "
    } else {
        " No moves left "
    };
    let fg_style = Style::default().fg(theme.main_fg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(title, Style::default().fg(Color::White).bg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", state.score()), fg_style)),
        Line::from(Span::styled(format!(" Best combo: x{} ", state.max_combo()), fg_style)),
        Line::from(Span::styled(format!(" Tiles removed: {} ", state.history().len()), fg_style)),
        Line::from(""),
        Line::from(Span::styled(" R — Restart    Q — Quit ", fg_style)),
    ];
    clear_rect(frame.buffer_mut(), popup, theme.bg);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .title(Span::styled(" match3tui ", Style::default().fg(theme.title))),
        )
        .render(popup, frame.buffer_mut());
}

pub fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let quit_rect = centered(frame.area(), 24, 8);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(" Quit? ");

    clear_rect(frame.buffer_mut(), quit_rect, theme.bg);
    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::Restart, " Restart "),
        (QuitOption::Exit, " Exit "),
    ];
    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            Style::default()
                .fg(theme.bg)
                .bg(theme.title)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.title)
        };
        let rx = inner.x + inner.width.saturating_sub(label.chars().count() as u16) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if ry < inner.y + inner.height {
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use match3tui::board::{Fall, Spawn, TileId};

    #[test]
    fn test_cell_at_maps_tiles() {
        let rect = Rect::new(10, 5, 16, 8);
        assert_eq!(cell_at(rect, 4, 10, 5), Some(Pos::new(0, 0)));
        assert_eq!(cell_at(rect, 4, 13, 6), Some(Pos::new(0, 0)));
        assert_eq!(cell_at(rect, 4, 14, 7), Some(Pos::new(1, 1)));
        assert_eq!(cell_at(rect, 4, 25, 12), Some(Pos::new(3, 3)));
        assert_eq!(cell_at(rect, 4, 26, 12), None);
        assert_eq!(cell_at(rect, 4, 9, 5), None);
    }

    #[test]
    fn test_board_rect_inside_area() {
        let area = Rect::new(0, 0, 120, 40);
        let rect = playfield_board_rect(area, 8, 8, 4);
        assert_eq!((rect.width, rect.height), (32, 16));
        assert!(area.contains(Position { x: rect.x, y: rect.y }));
    }

    #[test]
    fn test_swap_offsets_meet_at_rest() {
        let anim = Animation::Swap {
            a: Pos::new(0, 0),
            b: Pos::new(0, 1),
            reverted: false,
        };
        let start = motion_offsets(&anim, 0.0, 4);
        assert_eq!(start[&Pos::new(0, 0)], (0.0, 1.0));
        assert_eq!(start[&Pos::new(0, 1)], (0.0, -1.0));
        let end = motion_offsets(&anim, 1.0, 4);
        assert_eq!(end[&Pos::new(0, 0)], (0.0, 0.0));

        let revert = Animation::Swap {
            a: Pos::new(0, 0),
            b: Pos::new(1, 0),
            reverted: true,
        };
        let mid = motion_offsets(&revert, 0.5, 4);
        assert_eq!(mid[&Pos::new(0, 0)], (1.0, 0.0));
        assert_eq!(motion_offsets(&revert, 1.0, 4)[&Pos::new(0, 0)], (0.0, 0.0));
    }

    #[test]
    fn test_fall_and_refill_start_above() {
        let falls = Animation::Fall {
            falls: vec![Fall {
                to: Pos::new(3, 0),
                shift: 2,
                id: TileId(1),
            }],
        };
        assert_eq!(motion_offsets(&falls, 0.0, 4)[&Pos::new(3, 0)], (-2.0, 0.0));

        let spawn = |row| Spawn {
            pos: Pos::new(row, 2),
            tile: Tile(1),
            id: TileId(10 + row as u64),
        };
        let refill = Animation::Refill {
            tiles: vec![spawn(0), spawn(1)],
        };
        let offsets = motion_offsets(&refill, 0.0, 4);
        assert_eq!(offsets[&Pos::new(0, 2)], (-2.0, 0.0));
        assert_eq!(offsets[&Pos::new(1, 2)], (-2.0, 0.0));
    }

    #[test]
    fn test_oversized_board_saturates() {
        assert_eq!(playfield_size(40_000, 70_000, 200), (u16::MAX, u16::MAX));
        let area = Rect::new(0, 0, 120, 40);
        let rect = playfield_board_rect(area, 40_000, 70_000, 200);
        assert!(rect.width <= area.width && rect.height <= area.height);
    }

    #[test]
    fn test_delay_holds_playback() {
        let t0 = Instant::now();
        let mut playback = Playback::new(Animation::Refill { tiles: Vec::new() }, t0);
        playback.delay(Duration::from_secs(10));
        assert!(!playback.is_done(t0 + Duration::from_millis(REFILL_MS)));
        assert!(playback.is_done(t0 + Duration::from_secs(10) + Duration::from_millis(REFILL_MS)));
    }

    #[test]
    fn test_playback_finishes_on_clock() {
        let t0 = Instant::now();
        let playback = Playback::new(
            Animation::Swap {
                a: Pos::new(0, 0),
                b: Pos::new(0, 1),
                reverted: false,
            },
            t0,
        );
        assert!(!playback.is_done(t0));
        assert!(playback.is_done(t0 + Duration::from_millis(SWAP_MS)));
        assert!((playback.progress(t0 + Duration::from_secs(5)) - 1.0).abs() < f32::EPSILON);
    }
}
