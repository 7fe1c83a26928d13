use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn chebyshev(self, other: GridPos) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl From<[i32; 2]> for GridPos {
    fn from(value: [i32; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<GridPos> for [i32; 2] {
    fn from(value: GridPos) -> Self {
        [value.x, value.y]
    }
}

impl From<(i32, i32)> for GridPos {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

pub type OccupiedSet = HashSet<GridPos>;

pub fn in_bounds(pos: GridPos, grid_size: i32) -> bool {
    (0..grid_size).contains(&pos.x) && (0..grid_size).contains(&pos.y)
}

pub fn is_occupied(pos: GridPos, occupied: &OccupiedSet) -> bool {
    occupied.contains(&pos)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn parse_move(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "w" | "up" => Some(Self::Up),
            "s" | "down" => Some(Self::Down),
            "a" | "left" => Some(Self::Left),
            "d" | "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];
}

pub const EIGHT_WAY: [(i32, i32); 8] = [
    (0, -1),
    (0, 1),
    (-1, 0),
    (1, 0),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

pub fn is_edge(pos: GridPos, grid_size: i32) -> bool {
    in_bounds(pos, grid_size)
        && (pos.x == 0 || pos.y == 0 || pos.x == grid_size - 1 || pos.y == grid_size - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_bounds_matches_half_open_range_on_both_axes() {
        for x in -3..13 {
            for y in -3..13 {
                let expected = (0..10).contains(&x) && (0..10).contains(&y);
                assert_eq!(in_bounds(GridPos::new(x, y), 10), expected, "({x}, {y})");
            }
        }
    }

    #[test]
    fn occupancy_is_set_membership() {
        let occupied: OccupiedSet = [GridPos::new(1, 1), GridPos::new(2, 3)].into_iter().collect();
        assert!(is_occupied(GridPos::new(2, 3), &occupied));
        assert!(!is_occupied(GridPos::new(3, 2), &occupied));
    }

    #[test]
    fn grid_pos_serializes_as_pair() {
        let text = serde_json::to_string(&GridPos::new(4, 7)).expect("serialize");
        assert_eq!(text, "[4,7]");
        let back: GridPos = serde_json::from_str("[4,7]").expect("deserialize");
        assert_eq!(back, GridPos::new(4, 7));
    }

    #[test]
    fn parse_move_accepts_keys_and_words() {
        assert_eq!(Direction::parse_move("w"), Some(Direction::Up));
        assert_eq!(Direction::parse_move(" Right "), Some(Direction::Right));
        assert_eq!(Direction::parse_move("x"), None);
    }

    #[test]
    fn edge_cells_are_detected() {
        assert!(is_edge(GridPos::new(0, 5), 10));
        assert!(is_edge(GridPos::new(9, 9), 10));
        assert!(!is_edge(GridPos::new(4, 4), 10));
        assert!(!is_edge(GridPos::new(10, 4), 10));
    }
}
