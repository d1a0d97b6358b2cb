//! # Grid Module
//!
//! The spatial data model: plot coordinates, the direction model, plot and
//! area records, and the per-area plot repository.
//!
//! This module contains the fundamental building blocks of plotgrid:
//! - Plot coordinates and facing vectors
//! - The nine-direction model used for adjacency and merging
//! - Plot and area records, including merge pricing
//! - The `PlotGrid` repository owning all plot state for one area

pub mod map;
pub mod plot;

pub use map::*;
pub use plot::*;

use serde::{Deserialize, Serialize};

/// Represents a plot coordinate on the area grid.
///
/// # Examples
///
/// ```
/// use plotgrid::PlotId;
///
/// let id = PlotId::new(10, 5);
/// assert_eq!(id.x, 10);
/// assert_eq!(id.y, 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlotId {
    pub x: i32,
    pub y: i32,
}

impl PlotId {
    /// Creates a new plot id with the given grid coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the origin plot id (0, 0).
    pub fn origin() -> Self {
        Self::new(0, 0)
    }
}

impl std::ops::Add for PlotId {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for PlotId {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl std::fmt::Display for PlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{};{}", self.x, self.y)
    }
}

/// A 3D vector used for actor facing and direction projection.
///
/// The grid lives in the xz-plane: grid x maps to vector x, grid y maps to
/// vector z, and y is vertical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Creates a new vector.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Dot product with another vector.
    pub fn dot(self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }
}

/// Directions for adjacency and merging.
///
/// `All` is the symbolic "every direction" request used by auto-merge; it is
/// never stored as a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    All,
    North,
    East,
    South,
    West,
    Northeast,
    Southeast,
    Southwest,
    Northwest,
}

/// Name/alias table for direction token parsing. Static data, not
/// per-variant code.
const DIRECTION_TOKENS: [(Direction, &str, &str); 9] = [
    (Direction::All, "all", "a"),
    (Direction::North, "north", "n"),
    (Direction::East, "east", "e"),
    (Direction::South, "south", "s"),
    (Direction::West, "west", "w"),
    (Direction::Northeast, "northeast", "ne"),
    (Direction::Southeast, "southeast", "se"),
    (Direction::Southwest, "southwest", "sw"),
    (Direction::Northwest, "northwest", "nw"),
];

impl Direction {
    /// The eight compass directions in canonical iteration order.
    pub const COMPASS: [Direction; 8] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::Northeast,
        Direction::Southeast,
        Direction::Southwest,
        Direction::Northwest,
    ];

    /// Parses a direction token, matching the full name or the short alias.
    ///
    /// Matching is case-insensitive and ignores non-alphanumeric characters.
    /// Unknown tokens yield `None`, never an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use plotgrid::Direction;
    ///
    /// assert_eq!(Direction::parse("NorthEast"), Some(Direction::Northeast));
    /// assert_eq!(Direction::parse("n-e"), Some(Direction::Northeast));
    /// assert_eq!(Direction::parse("upwards"), None);
    /// ```
    pub fn parse(token: &str) -> Option<Direction> {
        let test: String = token
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        DIRECTION_TOKENS
            .iter()
            .find(|(_, name, alias)| *name == test || *alias == test)
            .map(|(d, _, _)| *d)
    }

    /// Returns the full lowercase name of this direction.
    pub fn name(self) -> &'static str {
        DIRECTION_TOKENS
            .iter()
            .find(|(d, _, _)| *d == self)
            .map(|(_, name, _)| *name)
            .unwrap_or("all")
    }

    /// Returns the short alias of this direction (e.g. `"ne"`).
    pub fn alias(self) -> &'static str {
        DIRECTION_TOKENS
            .iter()
            .find(|(d, _, _)| *d == self)
            .map(|(_, _, alias)| *alias)
            .unwrap_or("a")
    }

    /// Returns the opposite direction.
    ///
    /// Involutive; `All` maps to itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use plotgrid::Direction;
    ///
    /// assert_eq!(Direction::Northeast.opposite(), Direction::Southwest);
    /// assert_eq!(Direction::All.opposite(), Direction::All);
    /// ```
    pub fn opposite(self) -> Direction {
        match self {
            Direction::All => Direction::All,
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::Northeast => Direction::Southwest,
            Direction::Southeast => Direction::Northwest,
            Direction::Southwest => Direction::Northeast,
            Direction::Northwest => Direction::Southeast,
        }
    }

    /// Converts a compass direction to a unit grid delta.
    ///
    /// North is negative y. Returns `None` for `All`, which has no single
    /// offset.
    pub fn offset(self) -> Option<PlotId> {
        match self {
            Direction::All => None,
            Direction::North => Some(PlotId::new(0, -1)),
            Direction::East => Some(PlotId::new(1, 0)),
            Direction::South => Some(PlotId::new(0, 1)),
            Direction::West => Some(PlotId::new(-1, 0)),
            Direction::Northeast => Some(PlotId::new(1, -1)),
            Direction::Southeast => Some(PlotId::new(1, 1)),
            Direction::Southwest => Some(PlotId::new(-1, 1)),
            Direction::Northwest => Some(PlotId::new(-1, -1)),
        }
    }

    /// Converts a unit grid delta back to a compass direction.
    ///
    /// Returns `None` if the delta is not a unit neighbor offset.
    pub fn from_offset(delta: PlotId) -> Option<Direction> {
        Direction::COMPASS
            .iter()
            .copied()
            .find(|d| d.offset() == Some(delta))
    }

    /// Projects this direction into the xz-plane as a facing vector.
    ///
    /// `All` projects to the zero vector and never wins a facing
    /// comparison.
    pub fn to_vector(self) -> Vec3 {
        match self.offset() {
            Some(delta) => Vec3::new(delta.x as f64, 0.0, delta.y as f64),
            None => Vec3::ZERO,
        }
    }

    /// Picks the candidate direction best aligned with a facing vector.
    ///
    /// Compares dot products against the running best with `>=`, so among
    /// equally-scored candidates the *last* one listed wins. `All`
    /// candidates are skipped. Returns `None` when no compass candidate is
    /// present.
    pub fn resolve_facing(candidates: &[Direction], facing: Vec3) -> Option<Direction> {
        let mut closest = None;
        let mut closest_dot = -2.0;
        for direction in candidates {
            if *direction == Direction::All {
                continue;
            }
            let dot = direction.to_vector().dot(facing);
            if dot >= closest_dot {
                closest = Some(*direction);
                closest_dot = dot;
            }
        }
        closest
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
