/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Move
///   A / Start             →  Confirm
///   B / Select            →  Cancel / Pause
///   Y                     →  Restart level
///   X                     →  Skip level

use pushbox::domain::geometry::Direction;

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use pushbox::config::GamepadConfig;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.35;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER" => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

/// Action-to-button mapping (loaded from config).
#[derive(Debug, PartialEq)]
struct ActionMap {
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    restart: Vec<Btn>,
    skip: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            confirm: vec![Btn::A, Btn::Start],
            cancel: vec![Btn::B, Btn::Select],
            restart: vec![Btn::Y],
            skip: vec![Btn::X],
        }
    }
}

impl ActionMap {
    /// Lists with no recognizable button names keep their default.
    fn from_config(cfg: &GamepadConfig) -> Self {
        fn parse_list(names: &[String], fallback: Vec<Btn>) -> Vec<Btn> {
            let parsed: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if parsed.is_empty() { fallback } else { parsed }
        }
        let d = ActionMap::default();
        ActionMap {
            confirm: parse_list(&cfg.confirm, d.confirm),
            cancel: parse_list(&cfg.cancel, d.cancel),
            restart: parse_list(&cfg.restart, d.restart),
            skip: parse_list(&cfg.skip, d.skip),
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; BTN_COUNT],

    /// D-pad, indexed like `dir_index`.
    dpad: [BtnState; 4],
    /// Left stick, thresholded into four digital directions.
    stick: [BtnState; 4],
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

fn dir_index(dir: Direction) -> usize {
    match dir {
        Direction::Up => 0,
        Direction::Down => 1,
        Direction::Left => 2,
        Direction::Right => 3,
    }
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        {
            let mut state = Self::detached();
            match Gilrs::new() {
                Ok(g) => {
                    state.connected = g.gamepads().next().is_some();
                    state.gilrs = Some(g);
                }
                Err(e) => tracing::debug!(error = %e, "gamepad support unavailable"),
            }
            state
        }
        #[cfg(not(feature = "gamepad"))]
        Self::detached()
    }

    /// No backend attached; never reports input.
    fn detached() -> Self {
        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: None,
            buttons: [BtnState::default(); BTN_COUNT],
            dpad: [BtnState::default(); 4],
            stick: [BtnState::default(); 4],
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected: false,
        }
    }

    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        self.action_map = ActionMap::from_config(cfg);
    }

    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let Some(gilrs) = self.gilrs.as_mut() else {
            return;
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    tracing::info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    tracing::info!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        self.update_stick();
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn update_stick(&mut self) {
        let now = [
            self.stick_y > STICK_DEADZONE,
            self.stick_y < -STICK_DEADZONE,
            self.stick_x < -STICK_DEADZONE,
            self.stick_x > STICK_DEADZONE,
        ];
        for (state, held) in self.stick.iter_mut().zip(now) {
            if held && !state.held {
                state.just_pressed = true;
            }
            state.held = held;
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        let dpad = match gilrs_btn {
            Button::DPadUp => Some(Direction::Up),
            Button::DPadDown => Some(Direction::Down),
            Button::DPadLeft => Some(Direction::Left),
            Button::DPadRight => Some(Direction::Right),
            _ => None,
        };
        let state = match dpad {
            Some(dir) => &mut self.dpad[dir_index(dir)],
            None => match Btn::from_gilrs(gilrs_btn) {
                Some(btn) => &mut self.buttons[btn as usize],
                None => return,
            },
        };
        state.held = held;
        if held {
            state.just_pressed = true;
        }
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].just_pressed)
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }
    pub fn restart_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.restart)
    }
    pub fn skip_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.skip)
    }

    /// Direction currently held on the D-pad or stick, if any.
    pub fn held_direction(&self) -> Option<Direction> {
        Direction::ALL.into_iter().find(|&d| {
            let i = dir_index(d);
            self.dpad[i].held || self.stick[i].held
        })
    }

    /// Direction pressed this frame (menu navigation).
    pub fn pressed_direction(&self) -> Option<Direction> {
        Direction::ALL.into_iter().find(|&d| {
            let i = dir_index(d);
            self.dpad[i].just_pressed || self.stick[i].just_pressed
        })
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for b in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            b.just_pressed = false;
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for b in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            *b = BtnState::default();
        }
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}
