/// Board: the complete state of a level in play.
///
/// ## Layers
///
/// Static layers, fixed at parse time and never mutated afterwards:
///   - `walls`: impassable cells
///   - `floor`: every non-blank cell (walls, goals, boxes, player included)
///   - `goals`: target cells
///
/// Dynamic layers, mutated only by the engine:
///   - `boxes`: one entry per box, never two on the same cell
///   - `player`: exactly one, never on a wall
///
/// All lookups are coordinate-keyed set queries; there is no tile array to
/// keep in sync.

use std::collections::BTreeSet;

use crate::domain::geometry::{Coord, Layout};
use crate::domain::tile::Tile;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    layout: Layout,
    walls: BTreeSet<Coord>,
    floor: BTreeSet<Coord>,
    goals: BTreeSet<Coord>,
    boxes: BTreeSet<Coord>,
    player: Coord,
}

// ── Construction ──

impl Board {
    /// Assemble a board from already-validated layers.
    /// The level parser is the only production caller.
    pub(crate) fn from_layers(
        layout: Layout,
        walls: BTreeSet<Coord>,
        floor: BTreeSet<Coord>,
        goals: BTreeSet<Coord>,
        boxes: BTreeSet<Coord>,
        player: Coord,
    ) -> Self {
        Board { layout, walls, floor, goals, boxes, player }
    }
}

// ── Static queries ──

impl Board {
    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn width(&self) -> usize {
        self.layout.width
    }

    pub fn height(&self) -> usize {
        self.layout.height
    }

    #[inline]
    pub fn is_wall(&self, at: Coord) -> bool {
        self.walls.contains(&at)
    }

    #[inline]
    pub fn is_floor(&self, at: Coord) -> bool {
        self.floor.contains(&at)
    }

    #[inline]
    pub fn is_goal(&self, at: Coord) -> bool {
        self.goals.contains(&at)
    }

    /// Can a player or a box stand here, ignoring other boxes?
    #[inline]
    pub fn is_open(&self, at: Coord) -> bool {
        self.is_floor(at) && !self.is_wall(at)
    }

    pub fn goals(&self) -> impl Iterator<Item = Coord> + '_ {
        self.goals.iter().copied()
    }

    pub fn goal_count(&self) -> usize {
        self.goals.len()
    }
}

// ── Dynamic queries / mutation ──

impl Board {
    pub fn player(&self) -> Coord {
        self.player
    }

    #[inline]
    pub fn has_box(&self, at: Coord) -> bool {
        self.boxes.contains(&at)
    }

    pub fn boxes(&self) -> impl Iterator<Item = Coord> + '_ {
        self.boxes.iter().copied()
    }

    pub fn box_count(&self) -> usize {
        self.boxes.len()
    }

    pub fn boxes_on_goals(&self) -> usize {
        self.boxes.intersection(&self.goals).count()
    }

    /// Move the player. Caller has already checked `is_open`.
    pub(crate) fn set_player(&mut self, to: Coord) {
        debug_assert!(!self.is_wall(to));
        self.player = to;
    }

    /// Relocate one box. Caller has already checked the destination.
    pub(crate) fn move_box(&mut self, from: Coord, to: Coord) {
        debug_assert!(!self.has_box(to));
        if self.boxes.remove(&from) {
            self.boxes.insert(to);
        }
    }

    /// What a renderer should draw at `at`: dynamic layers first,
    /// then walls, goals and floor.
    pub fn tile_at(&self, at: Coord) -> Tile {
        if self.player == at {
            Tile::Player
        } else if self.has_box(at) {
            Tile::Box
        } else if self.is_wall(at) {
            Tile::Wall
        } else if self.is_goal(at) {
            Tile::Goal
        } else if self.is_floor(at) {
            Tile::Floor
        } else {
            Tile::Empty
        }
    }
}
