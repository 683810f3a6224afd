/// Progression ledger: the best result per level over one playthrough.
///
/// Update policy (`record_attempt`):
///   - a skip (0 stars) always overwrites
///   - a first result for a level is always written
///   - otherwise only strictly more stars replaces the entry;
///     equal stars with fewer moves or less time do NOT
///
/// The ledger lives in the session and is reset once per new game.

use std::collections::BTreeMap;

use crate::domain::rules::{MAX_STARS, SKIP_STARS};

/// Result of one finished (won or skipped) level attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelStats {
    pub moves: u32,
    /// Seconds.
    pub time: f64,
    /// 0 for a skip, 1..=3 for a win.
    pub stars: u8,
}

impl LevelStats {
    pub fn new(moves: u32, time: f64, stars: u8) -> Self {
        debug_assert!(stars <= MAX_STARS);
        LevelStats { moves, time, stars }
    }

    pub fn is_skip(&self) -> bool {
        self.stars == SKIP_STARS
    }
}

/// Sums across every ledger entry.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TotalStats {
    pub moves: u64,
    pub time: f64,
    pub stars: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgressionLedger {
    entries: BTreeMap<usize, LevelStats>,
}

impl ProgressionLedger {
    pub fn new() -> Self {
        ProgressionLedger::default()
    }

    /// Merge an attempt into the ledger. Returns whether the entry changed.
    pub fn record_attempt(&mut self, level: usize, stats: LevelStats) -> bool {
        let replace = match self.entries.get(&level) {
            _ if stats.is_skip() => true,
            None => true,
            Some(existing) => stats.stars > existing.stars,
        };

        if replace {
            self.entries.insert(level, stats);
            tracing::debug!(
                level = level + 1,
                moves = stats.moves,
                time = stats.time,
                stars = stats.stars,
                "level result recorded"
            );
        } else {
            tracing::debug!(level = level + 1, stars = stats.stars, "existing level result kept");
        }
        replace
    }

    pub fn total_stats(&self) -> TotalStats {
        self.entries.values().fold(TotalStats::default(), |acc, s| TotalStats {
            moves: acc.moves + u64::from(s.moves),
            time: acc.time + s.time,
            stars: acc.stars + u32::from(s.stars),
        })
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        tracing::debug!("progression reset");
    }

    pub fn get(&self, level: usize) -> Option<&LevelStats> {
        self.entries.get(&level)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in level order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &LevelStats)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v))
    }
}
