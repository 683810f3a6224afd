/// Keyboard input.
///
/// `InputState` tracks which keys are currently held down, enabling:
///   - Repeated movement while a direction key is held
///   - Edge-triggered actions (restart, skip, confirm) on the initial press
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't
/// support it.
///
/// Text entry (sign-in form) bypasses the tracker and reads `raw_events`
/// through `text_edit`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Key Constants ──

pub const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
pub const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
pub const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
pub const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
pub const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R'), KeyCode::F(2)];
pub const KEYS_SKIP: &[KeyCode] = &[KeyCode::Char('n'), KeyCode::Char('N')];
pub const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P'), KeyCode::F(1)];
pub const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
pub const KEYS_CANCEL: &[KeyCode] = &[KeyCode::Esc];
pub const KEYS_SOUND: &[KeyCode] = &[KeyCode::Char('m'), KeyCode::Char('M')];
pub const KEYS_VOLUME_UP: &[KeyCode] = &[KeyCode::Char('+'), KeyCode::Char('=')];
pub const KEYS_VOLUME_DOWN: &[KeyCode] = &[KeyCode::Char('-'), KeyCode::Char('_')];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the most recent
    /// `drain_events()` call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for text entry.
    pub raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.apply(key, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn apply(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            // Without enhancement, rely on timeout-based expiry instead.
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held_at(key.code, now);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.is_held_at(code, Instant::now())
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    // ── Internal ──

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active
            .get(&code)
            .map_or(false, |t| now.duration_since(*t) < HOLD_TIMEOUT)
    }
}

// ── Text entry ──

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextEdit {
    Insert(char),
    Backspace,
    NextField,
    Submit,
    Cancel,
}

pub fn text_edit(key: &KeyEvent) -> Option<TextEdit> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(TextEdit::Insert(c))
        }
        KeyCode::Backspace => Some(TextEdit::Backspace),
        KeyCode::Tab | KeyCode::Down | KeyCode::Up | KeyCode::BackTab => {
            Some(TextEdit::NextField)
        }
        KeyCode::Enter => Some(TextEdit::Submit),
        KeyCode::Esc => Some(TextEdit::Cancel),
        _ => None,
    }
}

// ── Move repeat ──

/// Lets a held direction through at most once per `cooldown`.
#[derive(Clone, Debug)]
pub struct MoveGate {
    cooldown: Duration,
    last: Option<Instant>,
}

impl MoveGate {
    pub fn new(cooldown: Duration) -> Self {
        MoveGate { cooldown, last: None }
    }

    pub fn try_pass(&mut self, now: Instant) -> bool {
        let ready = self
            .last
            .map_or(true, |t| now.saturating_duration_since(t) >= self.cooldown);
        if ready {
            self.last = Some(now);
        }
        ready
    }

    /// Next press goes through immediately.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
