/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing or incomplete. Problems
/// found while loading are kept in `GameConfig::warnings` so the caller can
/// log them once logging is up (the log settings live in this same file).
///
/// The `[sound]` section is also written back at runtime when the player
/// changes it in game; every other key is left as found.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config.toml parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("config.toml write error: {0}")]
    Write(#[from] std::io::Error),

    #[error("config.toml encode error: {0}")]
    Encode(#[from] toml::ser::Error),
}

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub levels_dir: PathBuf,
    pub save_progress: bool,
    pub input: InputConfig,
    pub server: ServerConfig,
    pub sound: SoundConfig,
    pub log: LogConfig,
    pub gamepad: GamepadConfig,
    /// The `config.toml` that was read, if any.
    pub source: Option<PathBuf>,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InputConfig {
    /// Minimum gap between two accepted moves.
    pub move_cooldown: Duration,
    pub frame: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SoundConfig {
    pub enabled: bool,
    pub volume: f32,
}

impl SoundConfig {
    /// Move the volume by `steps` tenths, clamped to 0.0..=1.0.
    pub fn adjust_volume(&mut self, steps: i32) {
        let tenths = (self.volume * 10.0).round() as i32 + steps;
        self.volume = tenths.clamp(0, 10) as f32 / 10.0;
    }

    /// Whole percent, for display.
    pub fn volume_percent(&self) -> u32 {
        (self.volume * 100.0).round() as u32
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        SoundConfig { enabled: true, volume: default_volume() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins over it.
    pub level: String,
    pub file: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
    pub skip: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    input: TomlInput,
    #[serde(default)]
    server: TomlServer,
    #[serde(default)]
    sound: TomlSound,
    #[serde(default)]
    log: TomlLog,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_true")]
    save_progress: bool,
}

#[derive(Deserialize, Debug)]
struct TomlInput {
    #[serde(default = "default_move_cooldown")]
    move_cooldown_ms: u64,
    #[serde(default = "default_frame")]
    frame_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlServer {
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default = "default_timeout")]
    timeout_secs: u64,
}

#[derive(Deserialize, Debug)]
struct TomlSound {
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_volume")]
    volume: f32,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default = "default_log_level")]
    level: String,
    #[serde(default = "default_log_file")]
    file: String,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
    #[serde(default = "default_skip")]
    skip: Vec<String>,
}

// ── Defaults ──

fn default_levels_dir() -> String { "levels".into() }
fn default_true() -> bool { true }
fn default_move_cooldown() -> u64 { 100 }
fn default_frame() -> u64 { 16 }
fn default_base_url() -> String { "https://sokoban.1zq.ru".into() }
fn default_timeout() -> u64 { 10 }
fn default_volume() -> f32 { 0.5 }
fn default_log_level() -> String { "info".into() }
fn default_log_file() -> String { "pushbox.log".into() }

fn default_confirm() -> Vec<String> { vec!["A".into(), "Start".into()] }
fn default_cancel() -> Vec<String> { vec!["B".into(), "Select".into()] }
fn default_restart() -> Vec<String> { vec!["Y".into()] }
fn default_skip() -> Vec<String> { vec!["X".into()] }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { levels_dir: default_levels_dir(), save_progress: true }
    }
}

impl Default for TomlInput {
    fn default() -> Self {
        TomlInput { move_cooldown_ms: default_move_cooldown(), frame_ms: default_frame() }
    }
}

impl Default for TomlServer {
    fn default() -> Self {
        TomlServer { base_url: default_base_url(), timeout_secs: default_timeout() }
    }
}

impl Default for TomlSound {
    fn default() -> Self {
        TomlSound { enabled: true, volume: default_volume() }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog { level: default_log_level(), file: default_log_file() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            restart: default_restart(),
            skip: default_skip(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_schema(TomlConfig::default(), &[])
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: exe directory, current working directory, then the
    /// XDG and system data directories.
    /// Missing file or missing keys fall back to defaults.
    pub fn load() -> Self {
        Self::load_from(&candidate_dirs())
    }

    /// Load from the first `config.toml` found in `search_dirs`.
    pub fn load_from(search_dirs: &[PathBuf]) -> Self {
        let mut warnings = Vec::new();
        let (toml_cfg, source) = load_toml(search_dirs, &mut warnings);
        let mut cfg = Self::from_schema(toml_cfg, search_dirs);
        if let Err(e) = cfg.validate() {
            warnings.push(format!("{e}; using default settings"));
            cfg = Self::from_schema(TomlConfig::default(), search_dirs);
        }
        cfg.source = source;
        cfg.warnings = warnings;
        cfg
    }

    /// Where in-game settings changes are written: the file that was read,
    /// else a new `config.toml` in the save directory.
    pub fn settings_path(&self) -> PathBuf {
        self.source
            .clone()
            .unwrap_or_else(|| crate::sim::save::save_dir().join("config.toml"))
    }

    /// Parse config text. Relative `levels_dir` is kept as written.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let toml_cfg: TomlConfig = toml::from_str(text)?;
        let cfg = Self::from_schema(toml_cfg, &[]);
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_schema(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        GameConfig {
            levels_dir: resolve_levels_dir(&toml_cfg.general.levels_dir, search_dirs),
            save_progress: toml_cfg.general.save_progress,
            input: InputConfig {
                move_cooldown: Duration::from_millis(toml_cfg.input.move_cooldown_ms),
                frame: Duration::from_millis(toml_cfg.input.frame_ms),
            },
            server: ServerConfig {
                base_url: toml_cfg.server.base_url,
                timeout: Duration::from_secs(toml_cfg.server.timeout_secs),
            },
            sound: SoundConfig {
                enabled: toml_cfg.sound.enabled,
                volume: toml_cfg.sound.volume,
            },
            log: LogConfig { level: toml_cfg.log.level, file: toml_cfg.log.file },
            gamepad: GamepadConfig {
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
                restart: toml_cfg.gamepad.restart,
                skip: toml_cfg.gamepad.skip,
            },
            source: None,
            warnings: Vec::new(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.input.frame.is_zero() {
            return Err(ConfigError::Invalid {
                key: "input.frame_ms",
                reason: "must be at least 1".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.sound.volume) {
            return Err(ConfigError::Invalid {
                key: "sound.volume",
                reason: format!("{} is outside 0.0..=1.0", self.sound.volume),
            });
        }
        if self.server.timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: "server.timeout_secs",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

// ── Saving ──

/// Write `sound` into the `[sound]` section of `path`, creating the file if
/// needed. Other sections and keys survive; comments do not.
pub fn save_sound_settings(path: &Path, sound: &SoundConfig) -> Result<(), ConfigError> {
    let mut table = match std::fs::read_to_string(path) {
        Ok(text) => toml::from_str::<toml::Table>(&text)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => toml::Table::new(),
        Err(e) => return Err(e.into()),
    };

    let section = table
        .entry("sound")
        .or_insert(toml::Value::Table(toml::Table::new()));
    let Some(section) = section.as_table_mut() else {
        return Err(ConfigError::Invalid { key: "sound", reason: "not a table".into() });
    };
    section.insert("enabled".into(), toml::Value::Boolean(sound.enabled));
    // f32 → f64 widening would write 0.6000000238418579
    let volume = (f64::from(sound.volume) * 100.0).round() / 100.0;
    section.insert("volume".into(), toml::Value::Float(volume));

    std::fs::write(path, toml::to_string(&table)?)?;
    tracing::info!(path = %path.display(), enabled = sound.enabled, volume, "sound settings saved");
    Ok(())
}

/// Absolute paths are used as-is; relative ones resolve against the first
/// search dir that has them, else against CWD.
fn resolve_levels_dir(levels_dir: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(levels_dir);
    if path.is_absolute() {
        return path;
    }
    search_dirs
        .iter()
        .map(|d| d.join(levels_dir))
        .find(|p| p.is_dir())
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD + data paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Follow symlinks so an installed link still finds data next to the
        // real binary.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        push_unique(&mut dirs, cwd);
    }

    // 3. XDG data home
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/pushbox");
        if xdg.is_dir() {
            push_unique(&mut dirs, xdg);
        }
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share/pushbox");
    if sys.is_dir() {
        push_unique(&mut dirs, sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn push_unique(dirs: &mut Vec<PathBuf>, dir: PathBuf) {
    if !dirs.iter().any(|d| d == &dir) {
        dirs.push(dir);
    }
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> (TomlConfig, Option<PathBuf>) {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => return (parse_or_default(&path, &text, warnings), Some(path)),
            Err(e) => warnings.push(format!("could not read {}: {e}", path.display())),
        }
    }
    (TomlConfig::default(), None)
}

fn parse_or_default(path: &Path, text: &str, warnings: &mut Vec<String>) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warnings.push(format!("{}: {e}; using default settings", path.display()));
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.levels_dir, PathBuf::from("levels"));
        assert!(cfg.save_progress);
        assert_eq!(cfg.input.move_cooldown, Duration::from_millis(100));
        assert_eq!(cfg.server.base_url, "https://sokoban.1zq.ru");
        assert_eq!(cfg.server.timeout, Duration::from_secs(10));
        assert_eq!(cfg.log.file, "pushbox.log");
        assert_eq!(cfg.gamepad.skip, vec!["X".to_string()]);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[server]\nbase_url = \"http://localhost:5000\"\n[input]\nmove_cooldown_ms = 50\n",
        )
        .unwrap();
        assert_eq!(cfg.server.base_url, "http://localhost:5000");
        assert_eq!(cfg.server.timeout, Duration::from_secs(10));
        assert_eq!(cfg.input.move_cooldown, Duration::from_millis(50));
        assert_eq!(cfg.input.frame, Duration::from_millis(16));
    }

    #[test]
    fn out_of_range_volume_is_rejected() {
        let err = GameConfig::from_toml_str("[sound]\nvolume = 3.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "sound.volume", .. }));
    }

    #[test]
    fn syntax_error_is_a_parse_error() {
        assert!(matches!(
            GameConfig::from_toml_str("[server\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_from_reads_the_first_config_found() {
        let empty = tempfile::tempdir().unwrap();
        let with_cfg = tempfile::tempdir().unwrap();
        std::fs::write(with_cfg.path().join("config.toml"), "[general]\nsave_progress = false\n")
            .unwrap();
        std::fs::create_dir(with_cfg.path().join("levels")).unwrap();

        let dirs = vec![empty.path().to_path_buf(), with_cfg.path().to_path_buf()];
        let cfg = GameConfig::load_from(&dirs);
        assert!(!cfg.save_progress);
        assert_eq!(cfg.levels_dir, with_cfg.path().join("levels"));
        assert!(cfg.warnings.is_empty());
    }

    #[test]
    fn broken_file_warns_and_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "save_progress = = true").unwrap();
        let cfg = GameConfig::load_from(&[dir.path().to_path_buf()]);
        assert!(cfg.save_progress);
        assert_eq!(cfg.warnings.len(), 1);
    }

    #[test]
    fn invalid_values_warn_and_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[input]\nframe_ms = 0\n").unwrap();
        let cfg = GameConfig::load_from(&[dir.path().to_path_buf()]);
        assert_eq!(cfg.input.frame, Duration::from_millis(16));
        assert_eq!(cfg.warnings.len(), 1);
    }

    #[test]
    fn volume_steps_in_tenths_and_clamps() {
        let mut sound = SoundConfig::default();
        sound.adjust_volume(1);
        assert_eq!(sound.volume_percent(), 60);
        sound.adjust_volume(10);
        assert_eq!(sound.volume, 1.0);
        sound.adjust_volume(-15);
        assert_eq!(sound.volume, 0.0);
    }

    #[test]
    fn sound_settings_are_written_back_without_losing_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[server]\nbase_url = \"http://localhost:5000\"\n[sound]\nvolume = 0.5\n",
        )
        .unwrap();
        let cfg = GameConfig::load_from(&[dir.path().to_path_buf()]);
        assert_eq!(cfg.settings_path(), dir.path().join("config.toml"));

        let sound = SoundConfig { enabled: false, volume: 0.7 };
        save_sound_settings(&cfg.settings_path(), &sound).unwrap();

        let reloaded = GameConfig::load_from(&[dir.path().to_path_buf()]);
        assert_eq!(reloaded.sound, sound);
        assert_eq!(reloaded.server.base_url, "http://localhost:5000");
        assert!(reloaded.warnings.is_empty());
    }

    #[test]
    fn sound_settings_create_a_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        save_sound_settings(&path, &SoundConfig { enabled: true, volume: 0.3 }).unwrap();

        let cfg = GameConfig::load_from(&[dir.path().to_path_buf()]);
        assert_eq!(cfg.sound.volume, 0.3);
        assert_eq!(cfg.source, Some(path));
    }
}
