/// Session: the one context object a front end owns for a whole run.
///
/// Holds the level catalog, the engine for the level in play, the
/// progression ledger and who is signed in. Constructed once at startup
/// and passed by reference; nothing here is global.
///
/// Win and skip results flow into the ledger from here, so a front end
/// only forwards intents and reads state back.

use thiserror::Error;

use crate::domain::geometry::Direction;
use crate::domain::rules::{MAX_STARS, SKIP_STARS};
use crate::net::auth::AuthState;
use crate::sim::event::GameEvent;
use crate::sim::level::{parse_level, LevelCatalog, LevelError};
use crate::sim::progress::{LevelStats, ProgressionLedger, TotalStats};
use crate::sim::save::SaveData;
use crate::sim::step::{MoveOutcome, PuzzleEngine, Rejection};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("level {index} does not exist ({count} levels)")]
    NoSuchLevel { index: usize, count: usize },

    #[error("level {index} ({name}) is invalid: {source}")]
    InvalidLevel {
        index: usize,
        name: String,
        #[source]
        source: LevelError,
    },

    #[error("no level is loaded")]
    NoActiveLevel,

    #[error("level {index} is not solved yet")]
    NotWon { index: usize },

    #[error("level {index} is already solved")]
    AlreadyWon { index: usize },
}

/// What happened after leaving a level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Advance {
    Loaded(usize),
    Finished(TotalStats),
}

pub struct Session {
    catalog: LevelCatalog,
    current: usize,
    engine: Option<PuzzleEngine>,
    ledger: ProgressionLedger,
    auth: AuthState,
    events: Vec<GameEvent>,
}

impl Session {
    pub fn new(catalog: LevelCatalog) -> Self {
        Session {
            catalog,
            current: 0,
            engine: None,
            ledger: ProgressionLedger::new(),
            auth: AuthState::SignedOut,
            events: vec![],
        }
    }

    // ── Playthrough ──

    /// Fresh playthrough from the first level.
    pub fn start_new_game(&mut self) -> Result<(), SessionError> {
        self.ledger.reset();
        self.load_level(0)
    }

    /// Continue a saved playthrough.
    pub fn resume(&mut self, save: SaveData) -> Result<(), SessionError> {
        self.ledger = save.ledger;
        self.load_level(save.level)
    }

    pub fn load_level(&mut self, index: usize) -> Result<(), SessionError> {
        let def = self.catalog.get(index).ok_or(SessionError::NoSuchLevel {
            index,
            count: self.catalog.len(),
        })?;
        let level = parse_level(&def.text).map_err(|source| SessionError::InvalidLevel {
            index,
            name: def.name.clone(),
            source,
        })?;
        tracing::info!(level = index + 1, name = %def.name, "level loaded");

        self.current = index;
        self.engine = Some(PuzzleEngine::new(level));
        self.events.clear();
        Ok(())
    }

    pub fn restart_level(&mut self) -> Result<(), SessionError> {
        self.engine_mut()?.restart();
        self.events.clear();
        tracing::debug!(level = self.current + 1, "level restarted");
        Ok(())
    }

    /// Move on after a win. An unsolved level must be skipped instead, so
    /// every level left behind has a ledger entry.
    pub fn next_level(&mut self) -> Result<Advance, SessionError> {
        if !self.engine()?.is_won() {
            return Err(SessionError::NotWon { index: self.current });
        }
        self.advance()
    }

    /// Give up on the current level: record a 0-star result and advance.
    /// A solved level keeps its stars; use `next_level` there.
    pub fn skip_level(&mut self) -> Result<Advance, SessionError> {
        let engine = self.engine()?;
        if engine.is_won() {
            return Err(SessionError::AlreadyWon { index: self.current });
        }
        let stats = LevelStats::new(engine.moves(), engine.elapsed(), SKIP_STARS);
        self.ledger.record_attempt(self.current, stats);
        tracing::info!(level = self.current + 1, moves = stats.moves, "level skipped");
        self.advance()
    }

    fn advance(&mut self) -> Result<Advance, SessionError> {
        let next = self.current + 1;
        if next >= self.catalog.len() {
            self.engine = None;
            let totals = self.ledger.total_stats();
            tracing::info!(
                moves = totals.moves,
                time = totals.time,
                stars = totals.stars,
                "playthrough finished"
            );
            return Ok(Advance::Finished(totals));
        }
        self.load_level(next)?;
        Ok(Advance::Loaded(next))
    }

    /// Is the level in play the last one in the catalog?
    pub fn on_last_level(&self) -> bool {
        self.current + 1 >= self.catalog.len()
    }

    // ── Play ──

    pub fn attempt_move(&mut self, dir: Direction) -> MoveOutcome {
        let Some(engine) = self.engine.as_mut() else {
            return MoveOutcome::Rejected(Rejection::Paused);
        };
        let outcome = engine.attempt_move(dir);
        for event in engine.drain_events() {
            if let GameEvent::LevelWon { moves, elapsed, stars } = event {
                self.ledger
                    .record_attempt(self.current, LevelStats::new(moves, elapsed, stars));
            }
            self.events.push(event);
        }
        outcome
    }

    pub fn tick(&mut self, dt: f64) {
        if let Some(engine) = self.engine.as_mut() {
            engine.tick(dt);
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        if let Some(engine) = self.engine.as_mut() {
            engine.set_paused(paused);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.engine.as_ref().map_or(false, |e| e.is_paused())
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // ── Queries ──

    pub fn engine(&self) -> Result<&PuzzleEngine, SessionError> {
        self.engine.as_ref().ok_or(SessionError::NoActiveLevel)
    }

    fn engine_mut(&mut self) -> Result<&mut PuzzleEngine, SessionError> {
        self.engine.as_mut().ok_or(SessionError::NoActiveLevel)
    }

    pub fn current_level(&self) -> usize {
        self.current
    }

    pub fn current_level_name(&self) -> &str {
        self.catalog.get(self.current).map_or("", |d| d.name.as_str())
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &ProgressionLedger {
        &self.ledger
    }

    pub fn totals(&self) -> TotalStats {
        self.ledger.total_stats()
    }

    pub fn max_stars(&self) -> u32 {
        self.catalog.len() as u32 * u32::from(MAX_STARS)
    }

    /// Where to resume if the program quits now.
    pub fn save_data(&self) -> SaveData {
        let won = self.engine.as_ref().map_or(false, |e| e.is_won());
        SaveData {
            level: if won { self.current + 1 } else { self.current },
            ledger: self.ledger.clone(),
        }
    }

    // ── Auth ──

    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    pub fn set_auth(&mut self, auth: AuthState) {
        tracing::info!(auth = %auth, "auth state changed");
        self.auth = auth;
    }

    pub fn sign_out(&mut self) {
        self.set_auth(AuthState::SignedOut);
    }
}
