/// Tile types and their level-file markers.
/// Marker semantics are centralized here so the parser, the renderer and
/// the tests agree on one legend.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Empty,  // ' ' (no floor underneath)
    Floor,  // '-' or '_', also implied under every other marker
    Wall,   // '#'
    Box,    // '$'
    Goal,   // '*'
    Player, // '@'
}

impl Tile {
    /// Map a level-file character to a tile.
    /// Returns `None` for characters that are not part of the legend.
    pub fn from_marker(ch: char) -> Option<Tile> {
        match ch {
            ' ' => Some(Tile::Empty),
            '-' | '_' => Some(Tile::Floor),
            '#' => Some(Tile::Wall),
            '$' => Some(Tile::Box),
            '*' => Some(Tile::Goal),
            '@' => Some(Tile::Player),
            _ => None,
        }
    }

    /// The character this tile is written as in a level file.
    pub fn marker(self) -> char {
        match self {
            Tile::Empty => ' ',
            Tile::Floor => '-',
            Tile::Wall => '#',
            Tile::Box => '$',
            Tile::Goal => '*',
            Tile::Player => '@',
        }
    }

    /// Does this tile put floor underneath itself?
    pub fn has_floor(self) -> bool {
        !matches!(self, Tile::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legend_round_trips_for_markers() {
        for ch in ['#', '$', '*', '@', ' ', '-'] {
            let tile = Tile::from_marker(ch).unwrap();
            assert_eq!(tile.marker(), ch);
        }
    }

    #[test]
    fn unknown_characters_are_not_tiles() {
        assert_eq!(Tile::from_marker('.'), None);
        assert_eq!(Tile::from_marker('+'), None);
        assert_eq!(Tile::from_marker('\r'), None);
        assert_eq!(Tile::from_marker('_'), Some(Tile::Floor));
    }

    #[test]
    fn only_blank_cells_lack_floor() {
        assert!(!Tile::Empty.has_floor());
        assert!(Tile::Wall.has_floor());
        assert!(Tile::Player.has_floor());
    }
}
