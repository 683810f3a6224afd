/// Grid coordinates and movement directions.
///
/// Coordinates are `(row, col)` with row 0 at the top of the level text,
/// matching how levels are written. World-space placement (centered, y up)
/// is handled separately by `Layout`.

use std::ops::Add;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct Coord {
    pub row: i32,
    pub col: i32,
}

impl Coord {
    pub const fn new(row: i32, col: i32) -> Self {
        Coord { row, col }
    }

    /// The neighbouring cell one step in `dir`.
    #[inline]
    pub fn step(self, dir: Direction) -> Coord {
        self + dir.delta()
    }
}

impl Add for Coord {
    type Output = Coord;

    fn add(self, rhs: Coord) -> Coord {
        Coord::new(self.row + rhs.row, self.col + rhs.col)
    }
}

/// A discrete move intent. Exactly one cell per move, never diagonal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit delta in `(row, col)`. Up decreases the row index.
    pub fn delta(self) -> Coord {
        match self {
            Direction::Up => Coord::new(-1, 0),
            Direction::Down => Coord::new(1, 0),
            Direction::Left => Coord::new(0, -1),
            Direction::Right => Coord::new(0, 1),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// World-space placement of a parsed grid.
///
/// The grid's geometric centre sits at the origin; x grows with the column,
/// y grows upward while the row index grows downward.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Layout {
    pub width: usize,
    pub height: usize,
}

impl Layout {
    pub fn new(width: usize, height: usize) -> Self {
        Layout { width, height }
    }

    /// Offset applied to `(col, -row)` to centre the grid.
    pub fn offset(&self) -> (f32, f32) {
        (
            -(self.width as f32 / 2.0) + 0.5,
            (self.height as f32 / 2.0) - 0.5,
        )
    }

    /// World position of the centre of a cell.
    pub fn world_position(&self, at: Coord) -> (f32, f32) {
        let (ox, oy) = self.offset();
        (at.col as f32 + ox, -(at.row as f32) + oy)
    }

    /// Is `at` inside the parsed width/height?
    pub fn contains(&self, at: Coord) -> bool {
        at.row >= 0
            && at.col >= 0
            && (at.row as usize) < self.height
            && (at.col as usize) < self.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_are_unit_steps() {
        let origin = Coord::new(3, 3);
        assert_eq!(origin.step(Direction::Up), Coord::new(2, 3));
        assert_eq!(origin.step(Direction::Down), Coord::new(4, 3));
        assert_eq!(origin.step(Direction::Left), Coord::new(3, 2));
        assert_eq!(origin.step(Direction::Right), Coord::new(3, 4));
        for dir in Direction::ALL {
            assert_eq!(origin.step(dir).step(dir.opposite()), origin);
        }
    }

    #[test]
    fn layout_centres_the_grid() {
        let layout = Layout::new(5, 3);
        // middle cell of a 5x3 grid sits on the origin
        assert_eq!(layout.world_position(Coord::new(1, 2)), (0.0, 0.0));
        // top-left is left of and above the origin
        assert_eq!(layout.world_position(Coord::new(0, 0)), (-2.0, 1.0));
        assert_eq!(layout.world_position(Coord::new(2, 4)), (2.0, -1.0));
    }

    #[test]
    fn layout_even_sizes_straddle_the_origin() {
        let layout = Layout::new(4, 2);
        assert_eq!(layout.world_position(Coord::new(0, 0)), (-1.5, 0.5));
        assert_eq!(layout.world_position(Coord::new(1, 3)), (1.5, -0.5));
    }

    #[test]
    fn layout_bounds() {
        let layout = Layout::new(2, 2);
        assert!(layout.contains(Coord::new(1, 1)));
        assert!(!layout.contains(Coord::new(-1, 0)));
        assert!(!layout.contains(Coord::new(0, 2)));
    }
}
