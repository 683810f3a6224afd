/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Every board cell is two terminal columns wide so the grid looks square.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use pushbox::config::SoundConfig;
use pushbox::domain::geometry::Coord;
use pushbox::domain::rules::{StarThresholds, MAX_STARS};
use pushbox::sim::step::PuzzleEngine;

use crate::ui::app::{App, Field, FormKind, Leaderboard, Screen, SubmitState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for every cell, so terminals that paint the
    /// inter-row gap with the default background show no seams.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Differs from any real cell; forces a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let len = s.chars().count();
        let x = self.width.saturating_sub(len) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Palette ──

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const GOLD: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const ACCENT: Color = Color::Rgb { r: 100, g: 200, b: 255 };
const DIM: Color = Color::Rgb { r: 140, g: 140, b: 140 };
const FLOOR_BG: Color = Color::Rgb { r: 45, g: 40, b: 35 };
const WALL_FG: Color = Color::Rgb { r: 120, g: 110, b: 100 };
const GOAL_FG: Color = Color::Rgb { r: 230, g: 80, b: 80 };
const BOX_FG: Color = Color::Rgb { r: 210, g: 150, b: 60 };
const BOX_DONE_FG: Color = Color::Rgb { r: 80, g: 230, b: 80 };

// ── Renderer ──

const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 3;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<Screen>,
    key_release: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_screen: None,
            key_release: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);

        // Key release events make held-key tracking exact where supported.
        if matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
            self.key_release = execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )
            .is_ok();
        }

        Ok(())
    }

    /// Does the terminal report key releases?
    pub fn key_release(&self) -> bool {
        self.key_release
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.key_release {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, app: &App) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.invalidate()?;
        }

        if self.last_screen != Some(app.screen()) {
            self.invalidate()?;
            self.last_screen = Some(app.screen());
        }

        self.front.clear();
        match app.screen() {
            Screen::Title => self.compose_title(app),
            Screen::Form => self.compose_form(app),
            Screen::Playing => self.compose_game(app),
            Screen::LevelComplete => {
                self.compose_game(app);
                self.compose_level_complete(app);
            }
            Screen::GameComplete => self.compose_game_complete(app),
            Screen::Leaderboard => self.compose_leaderboard(app),
        }
        self.compose_message(app);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn invalidate(&mut self) -> io::Result<()> {
        self.back.cells.fill(Cell::INVALID);
        queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Never ResetColor here: the terminal default may differ from BASE_BG.
        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_title(&mut self, app: &App) {
        let art = [
            "╔══════════════════════════╗",
            "║       P U S H B O X      ║",
            "╚══════════════════════════╝",
        ];
        for (i, line) in art.iter().enumerate() {
            self.front.put_centered(3 + i, line, GOLD, Color::Reset);
        }

        let who = app.session().auth().to_string();
        self.front.put_centered(7, &format!("({who})"), DIM, Color::Reset);

        let levels = format!("{} levels", app.session().catalog().len());
        self.front.put_centered(8, &levels, DIM, Color::Reset);

        for (i, item) in app.menu_items().iter().enumerate() {
            let selected = i == app.menu_cursor();
            let (text, fg) = if selected {
                (format!("▸ {} ◂", item.label()), ACCENT)
            } else {
                (format!("  {}  ", item.label()), Color::White)
            };
            self.front.put_centered(11 + i * 2, &text, fg, Color::Reset);
        }

        let help = "↑/↓ select   Enter confirm   M sound   +/- volume   Esc quit";
        self.front.put_centered(self.term_h.saturating_sub(2), help, DIM, Color::Reset);
    }

    fn compose_form(&mut self, app: &App) {
        let form = app.form();
        let title = match form.kind {
            FormKind::SignIn => "SIGN IN",
            FormKind::Register => "REGISTER",
        };
        self.front.put_centered(4, title, GOLD, Color::Reset);

        let masked: String = "*".repeat(form.password.chars().count());
        let rows = [
            (Field::Username, "Username", form.username.as_str()),
            (Field::Password, "Password", masked.as_str()),
        ];
        let x = self.term_w.saturating_sub(40) / 2;
        for (i, (field, label, value)) in rows.iter().enumerate() {
            let active = *field == form.field;
            let fg = if active { ACCENT } else { Color::White };
            let caret = if active && !form.busy { "_" } else { "" };
            let line = format!("{label:>9}: {value}{caret}");
            self.front.put_str(x, 8 + i * 2, &line, fg, Color::Reset);
        }

        let status = if form.busy { "Contacting server..." } else { "" };
        self.front.put_centered(13, status, DIM, Color::Reset);

        let help = "Tab switch field   Enter submit   Esc back";
        self.front.put_centered(self.term_h.saturating_sub(2), help, DIM, Color::Reset);
    }

    fn compose_game(&mut self, app: &App) {
        let session = app.session();
        let Ok(engine) = session.engine() else {
            return;
        };

        // ── HUD ──
        let thresholds = engine.thresholds();
        let hud = format!(
            " Level {}/{}  {}   Moves: {}   Time: {}   {}",
            session.current_level() + 1,
            session.catalog().len(),
            session.current_level_name(),
            engine.moves(),
            format_time(engine.elapsed()),
            stars_text(thresholds.stars_for(engine.moves())),
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        let goals = format!(
            " Boxes: {}/{}   {}",
            engine.boxes_on_goals(),
            engine.board().goal_count(),
            thresholds_text(thresholds),
        );
        self.front.fill_row(HUD_ROW + 1, HUD_BG);
        self.front.put_str(0, HUD_ROW + 1, &goals, DIM, HUD_BG);

        // ── Board ──
        let board_cols = engine.board().width() * CELL_W;
        let origin_x = self.term_w.saturating_sub(board_cols) / 2;
        self.compose_board(engine, origin_x, MAP_ROW + 1);

        if session.is_paused() {
            self.compose_pause_overlay(app.sound_settings());
        }

        // ── Help bar ──
        let help_row = self.term_h.saturating_sub(1);
        let skip = if engine.skip_offered() { "   N:Skip level" } else { "" };
        let help = format!(" Arrows/WASD:Move  R:Restart  P:Pause  Esc:Menu{skip}");
        self.front.put_str(0, help_row, &help, DIM, Color::Reset);
    }

    fn compose_board(&mut self, engine: &PuzzleEngine, x0: usize, y0: usize) {
        let board = engine.board();
        for row in 0..board.height() {
            for col in 0..board.width() {
                let at = Coord::new(row as i32, col as i32);
                let (glyph, fg, bg) = cell_glyph(engine, at);
                let x = x0 + col * CELL_W;
                let y = y0 + row;
                let mut chars = glyph.chars();
                for dx in 0..CELL_W {
                    let ch = chars.next().unwrap_or(' ');
                    self.front.set(x + dx, y, Cell::new(ch, fg, bg));
                }
            }
        }
    }

    fn compose_pause_overlay(&mut self, sound: &SoundConfig) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let box_w = 30.min(self.term_w);
        let box_h = 9.min(self.term_h);
        let box_x = self.term_w.saturating_sub(box_w) / 2;
        let box_y = self.term_h.saturating_sub(box_h) / 2;

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell::new(' ', Color::White, dim));
            }
        }
        self.front.put_str(box_x + 11, box_y + 1, "PAUSED", GOLD, dim);
        self.front.put_str(box_x + 3, box_y + 3, "P / Enter  Resume", ACCENT, dim);
        self.front.put_str(box_x + 3, box_y + 4, "Esc        Save & menu", ACCENT, dim);
        self.front.put_str(box_x + 3, box_y + 5, &format!("M          {}", sound_text(sound)), ACCENT, dim);
        self.front.put_str(box_x + 3, box_y + 6, "+ / -      Volume", ACCENT, dim);
    }

    fn compose_level_complete(&mut self, app: &App) {
        let Some(stats) = app.last_win() else {
            return;
        };
        let box_w = 34.min(self.term_w);
        let box_x = self.term_w.saturating_sub(box_w) / 2;
        let box_y = self.term_h.saturating_sub(8) / 2;
        let bg = Color::Rgb { r: 30, g: 50, b: 30 };
        for y in box_y..box_y + 8 {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell::new(' ', Color::White, bg));
            }
        }
        self.front.put_str(box_x + 2, box_y + 1, "LEVEL COMPLETE", GOLD, bg);
        self.front.put_str(box_x + 2, box_y + 3, &format!("Moves  {}", stats.moves), Color::White, bg);
        self.front.put_str(box_x + 2, box_y + 4, &format!("Time   {}", format_time(stats.time)), Color::White, bg);
        self.front.put_str(box_x + 2, box_y + 5, &format!("Stars  {}", stars_text(stats.stars)), GOLD, bg);
        self.front.put_str(box_x + 2, box_y + 6, "Enter: next   Esc: menu", ACCENT, bg);
    }

    fn compose_game_complete(&mut self, app: &App) {
        let art = [
            "╔════════════════════════════╗",
            "║    ★  ALL LEVELS DONE  ★   ║",
            "╚════════════════════════════╝",
        ];
        for (i, line) in art.iter().enumerate() {
            self.front.put_centered(3 + i, line, GOLD, Color::Reset);
        }
        if let Some(t) = app.final_totals() {
            let stars = format!("Stars  {} / {}", t.stars, app.session().max_stars());
            let moves = format!("Moves  {}", t.moves);
            let time = format!("Time   {}", format_time(t.time));
            self.front.put_centered(8, &stars, GOLD, Color::Reset);
            self.front.put_centered(9, &moves, Color::White, Color::Reset);
            self.front.put_centered(10, &time, Color::White, Color::Reset);
        }

        let status = match app.submit_state() {
            SubmitState::Skipped => "Playing as guest: result kept local.".to_string(),
            SubmitState::Pending => "Submitting result...".to_string(),
            SubmitState::Done => "Result submitted to the leaderboard.".to_string(),
            SubmitState::Failed(e) => format!("Submission failed: {e}"),
        };
        self.front.put_centered(12, &status, DIM, Color::Reset);
        self.front.put_centered(15, "Enter: leaderboard   Esc: menu", ACCENT, Color::Reset);
    }

    fn compose_leaderboard(&mut self, app: &App) {
        self.front.put_centered(2, "LEADERBOARD", GOLD, Color::Reset);
        let x = self.term_w.saturating_sub(52) / 2;
        match app.leaderboard() {
            Leaderboard::Loading => self.front.put_centered(5, "Loading...", DIM, Color::Reset),
            Leaderboard::Failed(e) => self.front.put_centered(5, e, GOAL_FG, Color::Reset),
            Leaderboard::Loaded(rows) if rows.is_empty() => {
                self.front.put_centered(5, "No results yet.", DIM, Color::Reset)
            }
            Leaderboard::Loaded(rows) => {
                let header = format!("{:>3}  {:<20} {:>6} {:>7} {:>9}", "#", "Player", "Stars", "Moves", "Time");
                self.front.put_str(x, 4, &header, ACCENT, Color::Reset);
                let visible = self.term_h.saturating_sub(8);
                let me = app.session().auth().username();
                for (i, row) in rows.iter().take(visible).enumerate() {
                    let line = format!(
                        "{:>3}  {:<20} {:>6} {:>7} {:>9}",
                        i + 1,
                        truncate(&row.username, 20),
                        row.total_stars,
                        row.total_moves,
                        format_time(row.total_time as f64),
                    );
                    let fg = if Some(row.username.as_str()) == me { GOLD } else { Color::White };
                    self.front.put_str(x, 5 + i, &line, fg, Color::Reset);
                }
            }
        }
        self.front.put_centered(self.term_h.saturating_sub(2), "Enter / Esc: back", DIM, Color::Reset);
    }

    fn compose_message(&mut self, app: &App) {
        let msg = app.message();
        if msg.is_empty() {
            return;
        }
        let row = self.term_h.saturating_sub(3);
        self.front.fill_row(row, MSG_BG);
        self.front.put_str(0, row, &format!(" ◈ {msg} "), Color::Black, MSG_BG);
    }
}

// ── Glyphs and formatting ──

fn cell_glyph(engine: &PuzzleEngine, at: Coord) -> (&'static str, Color, Color) {
    let board = engine.board();
    if board.is_wall(at) {
        return ("██", WALL_FG, Color::Reset);
    }
    if !board.is_floor(at) {
        return ("  ", Color::White, Color::Reset);
    }
    let goal = board.is_goal(at);
    if board.player() == at {
        return ("@ ", ACCENT, if goal { Color::Rgb { r: 90, g: 40, b: 40 } } else { FLOOR_BG });
    }
    if board.has_box(at) {
        let fg = if goal { BOX_DONE_FG } else { BOX_FG };
        return ("[]", fg, FLOOR_BG);
    }
    if goal {
        return ("()", GOAL_FG, FLOOR_BG);
    }
    ("  ", Color::White, FLOOR_BG)
}

/// `mm:ss`, or `h:mm:ss` past an hour.
pub fn format_time(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 { secs as u64 } else { 0 };
    let (h, m, s) = (total / 3600, (total / 60) % 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

pub fn stars_text(stars: u8) -> String {
    let earned = stars.min(MAX_STARS) as usize;
    let mut out = "★".repeat(earned);
    out.push_str(&"☆".repeat(MAX_STARS as usize - earned));
    out
}

fn thresholds_text(t: StarThresholds) -> String {
    if t == StarThresholds::UNATTAINABLE {
        return "★★★ any moves".to_string();
    }
    format!("★★★ ≤{}   ★★ ≤{}", limit_text(t.three_star_max), limit_text(t.two_star_max))
}

fn limit_text(limit: i32) -> String {
    if limit == i32::MAX {
        "any".to_string()
    } else {
        limit.to_string()
    }
}

fn sound_text(sound: &SoundConfig) -> String {
    if sound.enabled {
        format!("Sound on {}%", sound.volume_percent())
    } else {
        "Sound off".to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_is_minutes_and_seconds() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(65.9), "01:05");
        assert_eq!(format_time(3725.0), "1:02:05");
        assert_eq!(format_time(f64::NAN), "00:00");
    }

    #[test]
    fn stars_fill_from_the_left() {
        assert_eq!(stars_text(0), "☆☆☆");
        assert_eq!(stars_text(2), "★★☆");
        assert_eq!(stars_text(3), "★★★");
    }

    #[test]
    fn default_thresholds_read_as_any() {
        assert_eq!(thresholds_text(StarThresholds::default()), "★★★ any moves");
        assert_eq!(thresholds_text(StarThresholds::new(4, 6)), "★★★ ≤4   ★★ ≤6");
    }

    #[test]
    fn sound_line_shows_volume_only_when_on() {
        assert_eq!(sound_text(&SoundConfig { enabled: true, volume: 0.8 }), "Sound on 80%");
        assert_eq!(sound_text(&SoundConfig { enabled: false, volume: 0.8 }), "Sound off");
    }

    #[test]
    fn frame_buffer_clips_writes() {
        let mut fb = FrameBuffer::new(4, 1);
        fb.put_str(2, 0, "abc", Color::White, Color::Reset);
        assert_eq!(fb.get(3, 0).ch, 'b');
        assert_eq!(fb.get(9, 9).ch, ' ');
    }
}
