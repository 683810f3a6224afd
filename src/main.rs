/// Entry point and game loop.

mod ui;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use pushbox::config::GameConfig;
use pushbox::domain::geometry::Direction;
use pushbox::net::{Dispatcher, HttpGateway};
use pushbox::sim::level::LevelCatalog;
use pushbox::sim::save;
use pushbox::sim::session::Session;
use ui::app::{App, Intent, Screen};
use ui::gamepad::GamepadState;
use ui::input::{self, InputState, MoveGate};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

fn main() {
    let config = GameConfig::load();
    let _log_guard = setup_logging(&config);
    for warning in &config.warnings {
        tracing::warn!("{warning}");
    }

    let catalog = LevelCatalog::load(&config.levels_dir);

    let gateway = match HttpGateway::new(&config.server.base_url, config.server.timeout) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Cannot set up the leaderboard client: {e}");
            return;
        }
    };
    let net = match Dispatcher::new(Arc::new(gateway)) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Cannot start the network runtime: {e}");
            return;
        }
    };

    let progress_path = config.save_progress.then(save::progress_path);
    let mut app = App::new(Session::new(catalog), net, progress_path)
        .with_sound_settings(config.sound.clone(), Some(config.settings_path()));

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    // Opened even when sound starts off, so it can be switched on in game.
    let mut sound = SoundEngine::new(config.sound.volume);

    let result = game_loop(&mut app, &mut renderer, sound.as_mut(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        tracing::error!(error = %e, "game loop failed");
        eprintln!("Game error: {e}");
    }

    let totals = app.session().totals();
    println!();
    println!("Thanks for playing Pushbox!");
    println!(
        "Stars: {}/{}  Moves: {}",
        totals.stars,
        app.session().max_stars(),
        totals.moves
    );
}

/// File logging only: the terminal belongs to the renderer.
/// `RUST_LOG` overrides the configured level.
fn setup_logging(config: &GameConfig) -> Option<WorkerGuard> {
    let log_path = log_file_path(&config.log.file, &save::save_dir());
    let dir = log_path.parent()?.to_path_buf();
    let file_name = log_path.file_name()?.to_os_string();
    std::fs::create_dir_all(&dir).ok()?;

    let file_appender = tracing_appender::rolling::never(&dir, file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .ok()?;

    tracing::info!(path = %log_path.display(), "logging initialized");
    Some(guard)
}

fn log_file_path(file: &str, save_dir: &Path) -> PathBuf {
    let path = PathBuf::from(file);
    if path.is_absolute() {
        path
    } else {
        save_dir.join(path)
    }
}

fn game_loop(
    app: &mut App,
    renderer: &mut Renderer,
    mut sound: Option<&mut SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.key_release();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut move_gate = MoveGate::new(config.input.move_cooldown);
    let mut last_frame = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }

        if app.wants_text() {
            for key in &kb.raw_events {
                if let Some(edit) = input::text_edit(key) {
                    app.edit_text(edit);
                }
            }
        } else {
            for intent in detect_intents(app.screen(), &kb, &gp) {
                app.handle(intent);
            }
            if app.screen() == Screen::Playing {
                match held_direction(&kb, &gp) {
                    Some(dir) if move_gate.try_pass(Instant::now()) => {
                        app.handle(Intent::Move(dir))
                    }
                    Some(_) => {}
                    None => move_gate.reset(),
                }
            }
        }

        if app.should_quit() {
            break;
        }

        let now = Instant::now();
        app.update(now.duration_since(last_frame).as_secs_f64());
        last_frame = now;

        let sounds = app.take_sounds();
        if let Some(sfx) = sound.as_deref_mut() {
            sfx.set_volume(app.sound_settings().volume);
            for s in sounds {
                sfx.play(s);
            }
        }

        renderer.render(app)?;
        std::thread::sleep(config.input.frame);
    }

    Ok(())
}

/// Edge-triggered intents for this frame. Movement while playing goes
/// through `held_direction` instead, so it can repeat.
fn detect_intents(screen: Screen, kb: &InputState, gp: &GamepadState) -> Vec<Intent> {
    let mut intents = Vec::new();

    if screen != Screen::Playing {
        let dir = if kb.any_pressed(input::KEYS_UP) {
            Some(Direction::Up)
        } else if kb.any_pressed(input::KEYS_DOWN) {
            Some(Direction::Down)
        } else {
            gp.pressed_direction()
        };
        intents.extend(dir.map(Intent::Move));
    }

    if kb.any_pressed(input::KEYS_CONFIRM) || gp.confirm_pressed() {
        intents.push(Intent::Confirm);
    }
    if kb.any_pressed(input::KEYS_CANCEL) || gp.cancel_pressed() {
        intents.push(Intent::Cancel);
    }
    if kb.any_pressed(input::KEYS_PAUSE) {
        intents.push(Intent::Pause);
    }
    if kb.any_pressed(input::KEYS_RESTART) || gp.restart_pressed() {
        intents.push(Intent::Restart);
    }
    if kb.any_pressed(input::KEYS_SKIP) || gp.skip_pressed() {
        intents.push(Intent::Skip);
    }
    if kb.any_pressed(input::KEYS_SOUND) {
        intents.push(Intent::ToggleSound);
    }
    if kb.any_pressed(input::KEYS_VOLUME_UP) {
        intents.push(Intent::VolumeUp);
    }
    if kb.any_pressed(input::KEYS_VOLUME_DOWN) {
        intents.push(Intent::VolumeDown);
    }
    // 'q' quits from the title like Esc does.
    if screen == Screen::Title && kb.any_pressed(&[KeyCode::Char('q'), KeyCode::Char('Q')]) {
        intents.push(Intent::Cancel);
    }
    intents
}

fn held_direction(kb: &InputState, gp: &GamepadState) -> Option<Direction> {
    let keys = [
        (input::KEYS_UP, Direction::Up),
        (input::KEYS_DOWN, Direction::Down),
        (input::KEYS_LEFT, Direction::Left),
        (input::KEYS_RIGHT, Direction::Right),
    ];
    keys.iter()
        .find(|(codes, _)| kb.any_held(codes) || kb.any_pressed(codes))
        .map(|&(_, dir)| dir)
        .or_else(|| gp.held_direction())
}
