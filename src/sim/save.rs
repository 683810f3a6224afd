/// Save and load playthrough progress.
///
/// Progress is saved between levels only: the level to resume from plus the
/// ledger so far. A level in play is never snapshotted; resuming starts the
/// saved level fresh.
///
/// ## File format:
///   Key-value lines.
///   ```text
///   level=2
///   stats=0,3,4.25,3
///   stats=1,12,30.5,1
///   ```
///   `stats=` is `<level>,<moves>,<seconds>,<stars>`.
///
/// Stored as `progress.dat` in the save directory.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::rules::MAX_STARS;
use crate::sim::progress::{LevelStats, ProgressionLedger};

const PROGRESS_FILE: &str = "progress.dat";

#[derive(Clone, Debug, PartialEq)]
pub struct SaveData {
    /// Level to load on resume.
    pub level: usize,
    pub ledger: ProgressionLedger,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

/// Directory for progress and log files.
pub fn save_dir() -> PathBuf {
    // 1. Exe directory (local/portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // System installs like /usr/games/ won't be writable
            let test_path = parent.join(".write_test_pushbox");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/pushbox");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

pub fn progress_path() -> PathBuf {
    save_dir().join(PROGRESS_FILE)
}

// ══════════════════════════════════════════════════════════════
// File operations
// ══════════════════════════════════════════════════════════════

pub fn save_progress(path: &Path, data: &SaveData) -> Result<(), SaveError> {
    std::fs::write(path, serialize(data)).map_err(|source| SaveError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), level = data.level, "progress saved");
    Ok(())
}

/// `None` when the file is missing or has no `level=` line.
pub fn load_progress(path: &Path) -> Option<SaveData> {
    let content = std::fs::read_to_string(path).ok()?;
    let data = parse_save(&content);
    if data.is_none() {
        tracing::warn!(path = %path.display(), "ignoring unreadable progress file");
    }
    data
}

pub fn delete_progress(path: &Path) {
    let _ = std::fs::remove_file(path);
}

// ══════════════════════════════════════════════════════════════
// Serialization
// ══════════════════════════════════════════════════════════════

fn serialize(data: &SaveData) -> String {
    let mut out = String::with_capacity(256);
    out.push_str(&format!("level={}\n", data.level));
    for (level, s) in data.ledger.iter() {
        out.push_str(&format!("stats={},{},{},{}\n", level, s.moves, s.time, s.stars));
    }
    out
}

fn parse_save(content: &str) -> Option<SaveData> {
    let mut level = None;
    let mut ledger = ProgressionLedger::new();

    for line in content.lines() {
        let line = line.trim();
        if let Some(val) = line.strip_prefix("level=") {
            level = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("stats=") {
            if let Some((idx, stats)) = parse_stats(val) {
                ledger.record_attempt(idx, stats);
            }
        }
    }

    Some(SaveData { level: level?, ledger })
}

fn parse_stats(val: &str) -> Option<(usize, LevelStats)> {
    let p: Vec<&str> = val.split(',').collect();
    if p.len() != 4 { return None; }
    let stars: u8 = p[3].trim().parse().ok()?;
    if stars > MAX_STARS { return None; }
    let time: f64 = p[2].trim().parse().ok()?;
    if !time.is_finite() || time < 0.0 { return None; }
    Some((
        p[0].trim().parse().ok()?,
        LevelStats::new(p[1].trim().parse().ok()?, time, stars),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SaveData {
        let mut ledger = ProgressionLedger::new();
        ledger.record_attempt(0, LevelStats::new(3, 4.25, 3));
        ledger.record_attempt(1, LevelStats::new(12, 30.5, 0));
        SaveData { level: 2, ledger }
    }

    #[test]
    fn file_format_is_key_value_lines() {
        assert_eq!(
            serialize(&sample()),
            "level=2\nstats=0,3,4.25,3\nstats=1,12,30.5,0\n"
        );
    }

    #[test]
    fn saved_progress_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROGRESS_FILE);
        assert!(!path.exists());
        save_progress(&path, &sample()).unwrap();
        assert!(path.exists());
        assert_eq!(load_progress(&path), Some(sample()));

        delete_progress(&path);
        assert!(!path.exists());
        assert_eq!(load_progress(&path), None);
    }

    #[test]
    fn malformed_stats_lines_are_skipped() {
        let data = parse_save("level=1\nstats=0,3,x,3\nstats=1,2,1.0,9\nstats=2,5,2.0,2\nnoise\n").unwrap();
        assert_eq!(data.ledger.len(), 1);
        assert_eq!(data.ledger.get(2), Some(&LevelStats::new(5, 2.0, 2)));
    }

    #[test]
    fn missing_level_line_is_unreadable() {
        assert_eq!(parse_save("stats=0,3,4.0,3\n"), None);
    }

    #[test]
    fn write_errors_name_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join(PROGRESS_FILE);
        let err = save_progress(&path, &sample()).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
