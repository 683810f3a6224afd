/// Level parser and level catalog.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, ordered by filename)
///   2. Built-in embedded levels
///
/// ## Level format:
///   ```text
///   #######
///   #@-$-*#
///   #######
///   ---
///   3,5
///   ```
///
/// Rows above the optional `---` line are the grid. The line right after it
/// holds `threeStarMax,twoStarMax`. A malformed threshold line is not fatal:
/// the level loads with default thresholds and carries a warning.
///
/// ## Tile legend:
///   '#' = Wall          '$' = Box
///   '*' = Goal          '@' = Player
///   '-' / '_' = Floor   ' ' = Nothing (no floor)
///
/// Floor is placed under every non-blank cell. A blank cell is outside the
/// playable area even when it is surrounded by walls.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::geometry::{Coord, Layout};
use crate::domain::rules::StarThresholds;
use crate::domain::tile::Tile;
use crate::sim::world::Board;

const SEPARATOR: &str = "---";

/// Raw level text plus a display name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelDef {
    pub name: String,
    pub text: String,
}

/// A parsed, validated level ready to hand to the engine.
#[derive(Clone, Debug)]
pub struct Level {
    pub board: Board,
    pub thresholds: StarThresholds,
    pub warnings: Vec<LevelWarning>,
}

/// Conditions that make a level unplayable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("level has no grid rows")]
    EmptyGrid,

    #[error("unknown tile marker {marker:?} at row {row}, column {col}")]
    UnknownMarker { row: usize, col: usize, marker: char },

    #[error("level has no player marker '@'")]
    MissingPlayer,

    #[error("level has {count} player markers, expected exactly one")]
    MultiplePlayers { count: usize },
}

/// Recoverable problems found while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelWarning {
    #[error("malformed star thresholds {line:?}, expected 'threeStarMax,twoStarMax'")]
    MalformedThresholds { line: String },
}

// ══════════════════════════════════════════════════════════════
// Parsing
// ══════════════════════════════════════════════════════════════

/// Parse level text into a board and star thresholds.
pub fn parse_level(text: &str) -> Result<Level, LevelError> {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect();

    let separator = lines.iter().position(|l| l.trim() == SEPARATOR);
    let mut rows: Vec<&str> = match separator {
        Some(idx) => lines[..idx].to_vec(),
        None => lines.clone(),
    };
    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }
    if rows.is_empty() {
        return Err(LevelError::EmptyGrid);
    }

    let mut warnings = vec![];
    let thresholds = match separator.and_then(|idx| lines.get(idx + 1)) {
        Some(line) => match parse_thresholds(line) {
            Some(t) => t,
            None => {
                tracing::warn!(line = %line, "star thresholds unreadable, using defaults");
                warnings.push(LevelWarning::MalformedThresholds { line: line.to_string() });
                StarThresholds::default()
            }
        },
        None => StarThresholds::default(),
    };
    if !thresholds.is_ordered() {
        tracing::warn!(
            three = thresholds.three_star_max,
            two = thresholds.two_star_max,
            "three-star ceiling is above the two-star ceiling"
        );
    }

    let height = rows.len();
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let layout = Layout::new(width, height);

    let mut walls = BTreeSet::new();
    let mut floor = BTreeSet::new();
    let mut goals = BTreeSet::new();
    let mut boxes = BTreeSet::new();
    let mut players = vec![];

    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            let tile = Tile::from_marker(ch)
                .ok_or(LevelError::UnknownMarker { row: y, col: x, marker: ch })?;
            if !tile.has_floor() {
                continue;
            }
            let at = Coord::new(y as i32, x as i32);
            floor.insert(at);
            match tile {
                Tile::Wall => { walls.insert(at); }
                Tile::Box => { boxes.insert(at); }
                Tile::Goal => { goals.insert(at); }
                Tile::Player => players.push(at),
                Tile::Floor | Tile::Empty => {}
            }
        }
    }

    let player = match players.as_slice() {
        [] => return Err(LevelError::MissingPlayer),
        [p] => *p,
        many => return Err(LevelError::MultiplePlayers { count: many.len() }),
    };

    if goals.is_empty() {
        tracing::debug!("level has no goals and can never be won");
    } else if boxes.len() < goals.len() {
        tracing::debug!(boxes = boxes.len(), goals = goals.len(), "fewer boxes than goals");
    }

    Ok(Level {
        board: Board::from_layers(layout, walls, floor, goals, boxes, player),
        thresholds,
        warnings,
    })
}

/// `"3,5"` → thresholds. Both parts must be integers; nothing else allowed.
fn parse_thresholds(line: &str) -> Option<StarThresholds> {
    let parts: Vec<&str> = line.trim().split(',').collect();
    if parts.len() != 2 {
        return None;
    }
    let three = parts[0].trim().parse::<i32>().ok()?;
    let two = parts[1].trim().parse::<i32>().ok()?;
    Some(StarThresholds::new(three, two))
}

// ══════════════════════════════════════════════════════════════
// Catalog
// ══════════════════════════════════════════════════════════════

/// Where the current playthrough's levels came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LevelSource {
    Embedded,
    Directory(PathBuf),
}

/// The ordered levels of one playthrough.
#[derive(Clone, Debug)]
pub struct LevelCatalog {
    levels: Vec<LevelDef>,
    source: LevelSource,
}

impl LevelCatalog {
    /// Use `.txt` files from `dir` when it has any, else the built-in set.
    pub fn load(dir: &Path) -> Self {
        if dir.is_dir() {
            let levels = load_from_directory(dir);
            if !levels.is_empty() {
                tracing::info!(count = levels.len(), dir = %dir.display(), "loaded level directory");
                return LevelCatalog { levels, source: LevelSource::Directory(dir.to_path_buf()) };
            }
        }
        let catalog = Self::embedded();
        tracing::info!(count = catalog.len(), "using built-in levels");
        catalog
    }

    pub fn embedded() -> Self {
        LevelCatalog { levels: embedded_levels(), source: LevelSource::Embedded }
    }

    pub fn from_defs(levels: Vec<LevelDef>) -> Self {
        LevelCatalog { levels, source: LevelSource::Embedded }
    }

    pub fn source(&self) -> &LevelSource {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LevelDef> {
        self.levels.get(index)
    }

}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .txt files)
// ══════════════════════════════════════════════════════════════

fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot read level directory");
            return vec![];
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |e| e == "txt"))
        .collect();
    paths.sort();

    let mut results = vec![];
    for path in paths {
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let name = path.file_stem()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string();
                results.push(LevelDef { name, text });
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable level file");
            }
        }
    }
    results
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

fn embedded_levels() -> Vec<LevelDef> {
    vec![
        make_embedded("Warm Up", &[
            "#####",
            "#-*-#",
            "#-$-#",
            "#-@-#",
            "#####",
        ], (1, 3)),
        make_embedded("First Push", &[
            "#######",
            "#@-$-*#",
            "#######",
        ], (3, 5)),
        make_embedded("Detour", &[
            " #####",
            "##---#",
            "#@$--#",
            "###*-#",
            "  ####",
        ], (4, 6)),
        make_embedded("Corner", &[
            "######",
            "#----#",
            "#-$@-#",
            "#--*-#",
            "######",
        ], (6, 9)),
        make_embedded("Two Crates", &[
            "#########",
            "#-------#",
            "#@$-$-**#",
            "#-------#",
            "#########",
        ], (18, 24)),
    ]
}

fn make_embedded(name: &str, map: &[&str], thresholds: (i32, i32)) -> LevelDef {
    let mut text = map.join("\n");
    text.push_str(&format!("\n{}\n{},{}\n", SEPARATOR, thresholds.0, thresholds.1));
    LevelDef { name: name.to_string(), text }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_grid_and_thresholds() {
        let level = parse_level("#####\n#@$*#\n#####\n---\n3,5").unwrap();
        assert_eq!(level.thresholds, StarThresholds::new(3, 5));
        assert!(level.warnings.is_empty());
        assert_eq!(level.board.width(), 5);
        assert_eq!(level.board.height(), 3);
        assert_eq!(level.board.player(), Coord::new(1, 1));
        assert_eq!(level.board.box_count(), 1);
        assert_eq!(level.board.goal_count(), 1);
    }

    #[test]
    fn missing_separator_uses_default_thresholds() {
        let level = parse_level("#####\n#@$*#\n#####\n").unwrap();
        assert_eq!(level.thresholds, StarThresholds::default());
        assert!(level.warnings.is_empty());
        // trailing newline does not add a row
        assert_eq!(level.board.height(), 3);
    }

    #[test]
    fn malformed_thresholds_are_a_warning() {
        for bad in ["three,five", "3", "3,5,7", "3;5", ""] {
            let text = format!("#####\n#@$*#\n#####\n---\n{bad}");
            let level = parse_level(&text).unwrap();
            assert_eq!(level.thresholds, StarThresholds::default(), "input {bad:?}");
            assert_eq!(
                level.warnings,
                vec![LevelWarning::MalformedThresholds { line: bad.to_string() }]
            );
        }
    }

    #[test]
    fn separator_without_threshold_line_is_silent() {
        let level = parse_level("#####\n#@$*#\n#####\n---").unwrap();
        assert_eq!(level.thresholds, StarThresholds::default());
        assert!(level.warnings.is_empty());
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let level = parse_level("#####\r\n#@$*#\r\n#####\r\n---\r\n 2 , 4 \r\n").unwrap();
        assert_eq!(level.board.width(), 5);
        assert_eq!(level.thresholds, StarThresholds::new(2, 4));
    }

    #[test]
    fn width_is_longest_row() {
        let level = parse_level("###\n#@#\n#$*####\n#######").unwrap();
        assert_eq!(level.board.width(), 7);
        assert_eq!(level.board.height(), 4);
    }

    #[test]
    fn unknown_markers_fail_fast() {
        let err = parse_level("#####\n#@$.#\n#####").unwrap_err();
        assert_eq!(err, LevelError::UnknownMarker { row: 1, col: 3, marker: '.' });
    }

    #[test]
    fn exactly_one_player_is_required() {
        assert_eq!(parse_level("#####\n#-$*#\n#####").unwrap_err(), LevelError::MissingPlayer);
        assert_eq!(
            parse_level("#####\n#@$@#\n#####").unwrap_err(),
            LevelError::MultiplePlayers { count: 2 }
        );
    }

    #[test]
    fn empty_text_is_rejected() {
        assert_eq!(parse_level("").unwrap_err(), LevelError::EmptyGrid);
        assert_eq!(parse_level("\n\n---\n1,2").unwrap_err(), LevelError::EmptyGrid);
    }

    #[test]
    fn zero_goal_levels_parse() {
        let level = parse_level("####\n#@$#\n####").unwrap();
        assert_eq!(level.board.goal_count(), 0);
    }

    #[test]
    fn embedded_levels_are_all_valid() {
        let catalog = LevelCatalog::embedded();
        assert_eq!(catalog.len(), 5);
        for i in 0..catalog.len() {
            let def = catalog.get(i).unwrap();
            let level = parse_level(&def.text)
                .unwrap_or_else(|e| panic!("{} failed: {e}", def.name));
            assert!(level.warnings.is_empty(), "{}", def.name);
            assert!(level.board.box_count() >= level.board.goal_count(), "{}", def.name);
            assert!(level.thresholds.is_ordered(), "{}", def.name);
        }
    }

    #[test]
    fn directory_levels_are_sorted_by_filename() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("02_second.txt"), "###\n#@#\n###").unwrap();
        std::fs::write(dir.path().join("01_first.txt"), "####\n#@*#\n####").unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let catalog = LevelCatalog::load(dir.path());
        assert_eq!(catalog.source(), &LevelSource::Directory(dir.path().to_path_buf()));
        let names: Vec<&str> = (0..catalog.len())
            .filter_map(|i| catalog.get(i))
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, ["01_first", "02_second"]);
    }

    #[test]
    fn empty_or_missing_directory_falls_back_to_embedded() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(LevelCatalog::load(dir.path()).source(), &LevelSource::Embedded);
        assert_eq!(
            LevelCatalog::load(&dir.path().join("missing")).source(),
            &LevelSource::Embedded
        );
    }
}
