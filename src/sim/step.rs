/// The puzzle engine: resolves one move intent at a time.
///
/// Resolution order for `attempt_move`:
///   1. Pause / finished gate
///   2. Target cell: wall or off-floor → blocked
///   3. Plain move, or push (box must have an open, box-free cell beyond)
///   4. Move counter
///   5. Win check (after pushes only; plain moves cannot change coverage)
///
/// Time is advanced separately by `tick`, gated by the same pause flag.

use crate::domain::geometry::Direction;
use crate::domain::rules::{self, StarThresholds};
use crate::sim::event::GameEvent;
use crate::sim::level::Level;
use crate::sim::world::Board;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    InProgress,
    Won { stars: u8 },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rejection {
    /// Wall, edge of the floor, or a second box in the way.
    Blocked,
    /// Engine is paused, or the level is already won.
    Paused,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveOutcome {
    Moved,
    Rejected(Rejection),
}

pub struct PuzzleEngine {
    /// Board as loaded. Never mutated; used by `restart`.
    initial: Board,
    board: Board,
    thresholds: StarThresholds,
    phase: Phase,
    moves: u32,
    elapsed: f64,
    paused: bool,
    events: Vec<GameEvent>,
}

// ══════════════════════════════════════════════════════════════
// Construction
// ══════════════════════════════════════════════════════════════

impl PuzzleEngine {
    pub fn new(level: Level) -> Self {
        PuzzleEngine {
            initial: level.board.clone(),
            board: level.board,
            thresholds: level.thresholds,
            phase: Phase::InProgress,
            moves: 0,
            elapsed: 0.0,
            paused: false,
            events: vec![],
        }
    }

    /// Put the level back the way it was loaded.
    pub fn restart(&mut self) {
        self.board = self.initial.clone();
        self.phase = Phase::InProgress;
        self.moves = 0;
        self.elapsed = 0.0;
        self.paused = false;
        self.events.clear();
    }
}

// ══════════════════════════════════════════════════════════════
// Move resolution
// ══════════════════════════════════════════════════════════════

impl PuzzleEngine {
    pub fn attempt_move(&mut self, dir: Direction) -> MoveOutcome {
        if self.paused || self.is_won() {
            return MoveOutcome::Rejected(Rejection::Paused);
        }

        let from = self.board.player();
        let target = from.step(dir);
        if !self.board.is_open(target) {
            return self.blocked(dir);
        }

        let pushed = if self.board.has_box(target) {
            let beyond = target.step(dir);
            if !self.board.is_open(beyond) || self.board.has_box(beyond) {
                return self.blocked(dir);
            }
            self.board.move_box(target, beyond);
            self.events.push(GameEvent::BoxPushed { from: target, to: beyond });
            true
        } else {
            false
        };

        self.board.set_player(target);
        self.moves += 1;
        self.events.push(GameEvent::PlayerMoved { from, to: target });
        tracing::debug!(?dir, moves = self.moves, pushed, "player moved");

        if pushed {
            self.check_win();
        }
        MoveOutcome::Moved
    }

    fn blocked(&mut self, dir: Direction) -> MoveOutcome {
        self.events.push(GameEvent::MoveBlocked { direction: dir });
        MoveOutcome::Rejected(Rejection::Blocked)
    }

    fn check_win(&mut self) {
        if !rules::is_solved(self.board.boxes_on_goals(), self.board.goal_count()) {
            return;
        }
        let stars = self.thresholds.stars_for(self.moves);
        self.phase = Phase::Won { stars };
        self.events.push(GameEvent::LevelWon {
            moves: self.moves,
            elapsed: self.elapsed,
            stars,
        });
        tracing::info!(moves = self.moves, elapsed = self.elapsed, stars, "level won");
    }
}

// ══════════════════════════════════════════════════════════════
// Time / pause
// ══════════════════════════════════════════════════════════════

impl PuzzleEngine {
    /// Advance the level clock by `dt` seconds.
    pub fn tick(&mut self, dt: f64) {
        if self.paused || self.is_won() {
            return;
        }
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

// ══════════════════════════════════════════════════════════════
// Queries
// ══════════════════════════════════════════════════════════════

impl PuzzleEngine {
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn thresholds(&self) -> StarThresholds {
        self.thresholds
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_won(&self) -> bool {
        matches!(self.phase, Phase::Won { .. })
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn boxes_on_goals(&self) -> usize {
        self.board.boxes_on_goals()
    }

    /// Offer to skip once the player is well past the 2-star budget.
    pub fn skip_offered(&self) -> bool {
        !self.is_won() && self.thresholds.skip_offered_after(self.moves)
    }

    /// Take the events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
