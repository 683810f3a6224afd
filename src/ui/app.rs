/// Screen flow for the terminal front end.
///
/// `App` owns the [`Session`] and the network [`Dispatcher`] and turns
/// frame-level intents (move, confirm, cancel, ...) into session calls.
/// It never touches the terminal; `main` feeds it input and the renderer
/// reads it back.
///
/// Screens:
///   Title  →  Playing  →  LevelComplete  →  Playing ...  →  GameComplete
///   Title  →  Form (sign in / register)  →  Title
///   Title / GameComplete  →  Leaderboard  →  Title

use std::path::PathBuf;

use pushbox::config::{self, SoundConfig};
use pushbox::domain::geometry::Direction;
use pushbox::net::{AuthState, Credentials, Dispatcher, LeaderboardEntry, NetEvent};
use pushbox::sim::event::GameEvent;
use pushbox::sim::progress::{LevelStats, TotalStats};
use pushbox::sim::save::{self, SaveData};
use pushbox::sim::session::{Advance, Session, SessionError};
use pushbox::sim::step::MoveOutcome;

use crate::ui::input::TextEdit;
use crate::ui::sound::Sfx;

/// Seconds a transient message stays on screen.
const MESSAGE_SECS: f64 = 2.5;
const MAX_FIELD_LEN: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Title,
    Form,
    Playing,
    LevelComplete,
    GameComplete,
    Leaderboard,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuItem {
    Continue,
    NewGame,
    SignIn,
    Register,
    SignOut,
    Leaderboard,
    Quit,
}

impl MenuItem {
    pub fn label(self) -> &'static str {
        match self {
            MenuItem::Continue => "Continue",
            MenuItem::NewGame => "New Game",
            MenuItem::SignIn => "Sign In",
            MenuItem::Register => "Register",
            MenuItem::SignOut => "Sign Out",
            MenuItem::Leaderboard => "Leaderboard",
            MenuItem::Quit => "Quit",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormKind {
    SignIn,
    Register,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Username,
    Password,
}

#[derive(Clone, Debug)]
pub struct Form {
    pub kind: FormKind,
    pub username: String,
    pub password: String,
    pub field: Field,
    /// Request in flight; input is ignored until it answers.
    pub busy: bool,
}

impl Form {
    fn new(kind: FormKind) -> Self {
        Form {
            kind,
            username: String::new(),
            password: String::new(),
            field: Field::Username,
            busy: false,
        }
    }

    fn active_field(&mut self) -> &mut String {
        match self.field {
            Field::Username => &mut self.username,
            Field::Password => &mut self.password,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmitState {
    /// Guest or signed-out playthrough.
    Skipped,
    Pending,
    Done,
    Failed(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Leaderboard {
    Loading,
    Loaded(Vec<LeaderboardEntry>),
    Failed(String),
}

/// One frame-level player intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    Move(Direction),
    Confirm,
    Cancel,
    Restart,
    Skip,
    Pause,
    ToggleSound,
    VolumeUp,
    VolumeDown,
}

pub struct App {
    session: Session,
    net: Dispatcher,
    screen: Screen,
    menu_cursor: usize,
    form: Form,
    /// Progress file; `None` disables saving.
    progress_path: Option<PathBuf>,
    saved: Option<SaveData>,
    last_win: Option<LevelStats>,
    final_totals: Option<TotalStats>,
    submit: SubmitState,
    leaderboard: Leaderboard,
    message: String,
    message_timer: f64,
    sounds: Vec<Sfx>,
    sound: SoundConfig,
    /// Where sound changes are persisted; `None` keeps them in memory.
    settings_path: Option<PathBuf>,
    quit: bool,
}

impl App {
    pub fn new(session: Session, net: Dispatcher, progress_path: Option<PathBuf>) -> Self {
        let saved = progress_path.as_deref().and_then(save::load_progress);
        App {
            session,
            net,
            screen: Screen::Title,
            menu_cursor: 0,
            form: Form::new(FormKind::SignIn),
            progress_path,
            saved,
            last_win: None,
            final_totals: None,
            submit: SubmitState::Skipped,
            leaderboard: Leaderboard::Loading,
            message: String::new(),
            message_timer: 0.0,
            sounds: Vec::new(),
            sound: SoundConfig::default(),
            settings_path: None,
            quit: false,
        }
    }

    pub fn with_sound_settings(mut self, sound: SoundConfig, settings_path: Option<PathBuf>) -> Self {
        self.sound = sound;
        self.settings_path = settings_path;
        self
    }

    // ── Queries for the renderer ──

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn menu_items(&self) -> Vec<MenuItem> {
        let mut items = Vec::with_capacity(7);
        if self.can_continue() {
            items.push(MenuItem::Continue);
        }
        items.push(MenuItem::NewGame);
        match self.session.auth() {
            AuthState::SignedIn { .. } => items.push(MenuItem::SignOut),
            AuthState::SignedOut | AuthState::Guest => {
                items.push(MenuItem::SignIn);
                items.push(MenuItem::Register);
            }
        }
        items.push(MenuItem::Leaderboard);
        items.push(MenuItem::Quit);
        items
    }

    pub fn menu_cursor(&self) -> usize {
        self.menu_cursor
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn last_win(&self) -> Option<LevelStats> {
        self.last_win
    }

    pub fn final_totals(&self) -> Option<TotalStats> {
        self.final_totals
    }

    pub fn submit_state(&self) -> &SubmitState {
        &self.submit
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// The form takes raw text instead of intents.
    pub fn wants_text(&self) -> bool {
        self.screen == Screen::Form
    }

    pub fn sound_settings(&self) -> &SoundConfig {
        &self.sound
    }

    /// Sounds queued since the last call; empty while sound is off.
    pub fn take_sounds(&mut self) -> Vec<Sfx> {
        let sounds = std::mem::take(&mut self.sounds);
        if self.sound.enabled {
            sounds
        } else {
            Vec::new()
        }
    }

    /// Sound can be changed from the title and the pause overlay.
    pub fn settings_open(&self) -> bool {
        match self.screen {
            Screen::Title => true,
            Screen::Playing => self.session.is_paused(),
            _ => false,
        }
    }

    fn can_continue(&self) -> bool {
        self.saved
            .as_ref()
            .map_or(false, |s| s.level < self.session.catalog().len())
    }

    // ── Per-frame ──

    pub fn update(&mut self, dt: f64) {
        if self.screen == Screen::Playing {
            self.session.tick(dt);
        }
        if self.message_timer > 0.0 {
            self.message_timer -= dt;
            if self.message_timer <= 0.0 {
                self.message.clear();
            }
        }
        for event in self.net.poll() {
            self.on_net_event(event);
        }
    }

    pub fn handle(&mut self, intent: Intent) {
        if self.settings_open() {
            match intent {
                Intent::ToggleSound => return self.change_sound(|s| s.enabled = !s.enabled),
                Intent::VolumeUp => return self.change_sound(|s| s.adjust_volume(1)),
                Intent::VolumeDown => return self.change_sound(|s| s.adjust_volume(-1)),
                _ => {}
            }
        }
        match self.screen {
            Screen::Title => self.handle_title(intent),
            Screen::Form => {}
            Screen::Playing => self.handle_playing(intent),
            Screen::LevelComplete => match intent {
                Intent::Confirm => self.advance(),
                // Nothing left to resume after the last level.
                Intent::Cancel if self.session.on_last_level() => self.advance(),
                Intent::Cancel => self.to_title(),
                _ => {}
            },
            Screen::GameComplete => match intent {
                Intent::Confirm => self.open_leaderboard(),
                Intent::Cancel => self.to_title(),
                _ => {}
            },
            Screen::Leaderboard => {
                if matches!(intent, Intent::Confirm | Intent::Cancel) {
                    self.to_title();
                }
            }
        }
    }

    pub fn edit_text(&mut self, edit: TextEdit) {
        if self.screen != Screen::Form || self.form.busy {
            return;
        }
        match edit {
            TextEdit::Insert(c) => {
                let field = self.form.active_field();
                if field.chars().count() < MAX_FIELD_LEN && !c.is_control() {
                    field.push(c);
                }
            }
            TextEdit::Backspace => {
                self.form.active_field().pop();
            }
            TextEdit::NextField => {
                self.form.field = match self.form.field {
                    Field::Username => Field::Password,
                    Field::Password => Field::Username,
                };
            }
            TextEdit::Submit => self.submit_form(),
            TextEdit::Cancel => self.to_title(),
        }
    }

    // ── Title ──

    fn handle_title(&mut self, intent: Intent) {
        let items = self.menu_items();
        match intent {
            Intent::Move(Direction::Up) => {
                self.menu_cursor = self.menu_cursor.checked_sub(1).unwrap_or(items.len() - 1);
            }
            Intent::Move(Direction::Down) => {
                self.menu_cursor = (self.menu_cursor + 1) % items.len();
            }
            Intent::Confirm => {
                if let Some(&item) = items.get(self.menu_cursor) {
                    self.choose(item);
                }
            }
            Intent::Cancel => self.quit = true,
            _ => {}
        }
    }

    fn choose(&mut self, item: MenuItem) {
        match item {
            MenuItem::Continue => {
                let Some(saved) = self.saved.clone() else {
                    return;
                };
                let result = self.session.resume(saved);
                self.enter_level(result);
            }
            MenuItem::NewGame => {
                if *self.session.auth() == AuthState::SignedOut {
                    self.session.set_auth(AuthState::Guest);
                }
                let result = self.session.start_new_game();
                self.enter_level(result);
            }
            MenuItem::SignIn => self.open_form(FormKind::SignIn),
            MenuItem::Register => self.open_form(FormKind::Register),
            MenuItem::SignOut => {
                self.session.sign_out();
                self.flash("Signed out.");
                self.menu_cursor = 0;
            }
            MenuItem::Leaderboard => self.open_leaderboard(),
            MenuItem::Quit => self.quit = true,
        }
    }

    fn open_form(&mut self, kind: FormKind) {
        let username = std::mem::take(&mut self.form.username);
        self.form = Form::new(kind);
        self.form.username = username;
        self.screen = Screen::Form;
    }

    fn submit_form(&mut self) {
        if self.form.username.trim().is_empty() || self.form.password.is_empty() {
            self.flash("Enter a username and a password.");
            return;
        }
        let credentials = Credentials {
            username: self.form.username.trim().to_string(),
            password: self.form.password.clone(),
        };
        self.form.busy = true;
        match self.form.kind {
            FormKind::SignIn => self.net.login(credentials),
            FormKind::Register => self.net.register(credentials),
        }
    }

    fn open_leaderboard(&mut self) {
        self.leaderboard = Leaderboard::Loading;
        self.screen = Screen::Leaderboard;
        self.net.fetch_leaderboard();
    }

    fn to_title(&mut self) {
        if self.screen == Screen::Playing {
            self.session.set_paused(false);
        }
        self.saved = self.progress_path.as_deref().and_then(save::load_progress);
        self.menu_cursor = 0;
        self.form.busy = false;
        self.form.password.clear();
        self.screen = Screen::Title;
    }

    // ── Playing ──

    fn handle_playing(&mut self, intent: Intent) {
        let paused = self.session.is_paused();
        match intent {
            Intent::Move(dir) if !paused => {
                let outcome = self.session.attempt_move(dir);
                self.collect_events();
                if outcome == MoveOutcome::Moved && self.last_win.is_some() {
                    self.screen = Screen::LevelComplete;
                    self.save_progress();
                }
            }
            Intent::Restart if !paused => {
                if self.session.restart_level().is_ok() {
                    self.flash("Level restarted.");
                }
            }
            Intent::Skip if !paused => {
                let offered = self.session.engine().map_or(false, |e| e.skip_offered());
                if offered {
                    let advance = self.session.skip_level();
                    self.after_advance(advance);
                }
            }
            Intent::Pause => self.session.set_paused(!paused),
            Intent::Confirm if paused => self.session.set_paused(false),
            Intent::Cancel if paused => {
                self.save_progress();
                self.to_title();
            }
            Intent::Cancel => self.session.set_paused(true),
            _ => {}
        }
    }

    fn collect_events(&mut self) {
        for event in self.session.drain_events() {
            if let GameEvent::LevelWon { moves, elapsed, stars } = event {
                self.last_win = Some(LevelStats::new(moves, elapsed, stars));
            }
            self.sounds.extend(Sfx::for_event(&event));
        }
    }

    fn enter_level(&mut self, result: Result<(), SessionError>) {
        match result {
            Ok(()) => {
                self.last_win = None;
                self.screen = Screen::Playing;
                self.save_progress();
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot start level");
                self.flash(&e.to_string());
                self.to_title();
            }
        }
    }

    fn advance(&mut self) {
        let advance = self.session.next_level();
        self.after_advance(advance);
    }

    fn after_advance(&mut self, advance: Result<Advance, SessionError>) {
        match advance {
            Ok(Advance::Loaded(_)) => self.enter_level(Ok(())),
            Ok(Advance::Finished(totals)) => self.finish(totals),
            Err(e) => self.enter_level(Err(e)),
        }
    }

    fn finish(&mut self, totals: TotalStats) {
        self.final_totals = Some(totals);
        self.screen = Screen::GameComplete;
        self.sounds.push(Sfx::Fanfare);
        if let Some(path) = &self.progress_path {
            save::delete_progress(path);
        }
        self.saved = None;
        self.submit = if self.net.submit(self.session.auth(), totals) {
            SubmitState::Pending
        } else {
            SubmitState::Skipped
        };
    }

    fn save_progress(&mut self) {
        let Some(path) = &self.progress_path else {
            return;
        };
        let data = self.session.save_data();
        if let Err(e) = save::save_progress(path, &data) {
            tracing::warn!(error = %e, "could not save progress");
        }
    }

    // ── Network ──

    fn on_net_event(&mut self, event: NetEvent) {
        let status = event.status_text();
        match event {
            event @ NetEvent::LoggedIn { result: Ok(_), .. } => {
                if let Some(auth) = event.into_auth() {
                    self.session.set_auth(auth);
                }
                if self.screen == Screen::Form {
                    self.to_title();
                }
            }
            NetEvent::Registered { result: Ok(()), .. } => {
                if self.screen == Screen::Form {
                    self.form.kind = FormKind::SignIn;
                    self.form.field = Field::Password;
                    self.form.password.clear();
                }
            }
            NetEvent::LoggedIn { .. } | NetEvent::Registered { .. } => {
                self.form.password.clear();
                self.form.field = Field::Password;
            }
            NetEvent::Submitted(Ok(())) => self.submit = SubmitState::Done,
            NetEvent::Submitted(Err(e)) => self.submit = SubmitState::Failed(e.to_string()),
            NetEvent::Leaderboard(Ok(rows)) => self.leaderboard = Leaderboard::Loaded(rows),
            NetEvent::Leaderboard(Err(e)) => self.leaderboard = Leaderboard::Failed(e.to_string()),
        }
        self.form.busy = false;
        if !status.is_empty() {
            self.flash(&status);
        }
    }

    // ── Settings ──

    fn change_sound(&mut self, change: impl FnOnce(&mut SoundConfig)) {
        change(&mut self.sound);
        let text = if self.sound.enabled {
            format!("Sound on, volume {}%", self.sound.volume_percent())
        } else {
            "Sound off".to_string()
        };
        self.flash(&text);
        if let Some(path) = &self.settings_path {
            if let Err(e) = config::save_sound_settings(path, &self.sound) {
                tracing::warn!(error = %e, "could not save sound settings");
            }
        }
    }

    fn flash(&mut self, text: &str) {
        self.message = text.to_string();
        self.message_timer = MESSAGE_SECS;
    }
}
