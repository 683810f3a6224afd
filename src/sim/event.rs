/// Events emitted while resolving move intents.
/// The presentation layer consumes these for animation/sound.

use crate::domain::geometry::{Coord, Direction};

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    PlayerMoved { from: Coord, to: Coord },
    BoxPushed { from: Coord, to: Coord },
    MoveBlocked { direction: Direction },
    LevelWon { moves: u32, elapsed: f64, stars: u8 },
}
