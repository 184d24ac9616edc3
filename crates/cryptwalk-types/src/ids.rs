//! Identity types and small enums shared across the room graph.

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity newtypes
// ---------------------------------------------------------------------------

/// Stable identifier of a room node, e.g. `castle_hall`.
///
/// A newtype over `String` so a room id can't be passed where a template id
/// is expected. `#[serde(transparent)]` keeps it a bare string in records.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Creates a room id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to an entity template (enemy, item, or hazard), e.g. `ACG_A`.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TemplateId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for TemplateId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A tile coordinate inside a room.
///
/// Integer coordinates so that [`Identity`] can hash and compare positions
/// exactly. Offsets (arrival offsets, spawn nudges) use the same type and
/// combine with `+`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// The room origin, `(0, 0)`.
    pub const ORIGIN: Position = Position { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Offsets a position. Each axis saturates at the `i32` bounds.
impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// The stable identity of a spawn declaration: `(room, template, position)`.
///
/// The persistence tracker keys its "already collected" / "already killed"
/// facts on this tuple. Two declarations with the same tuple are the same
/// fact; there is no way to tell them apart, so they're never tracked twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity {
    pub room: RoomId,
    pub template: TemplateId,
    pub position: Position,
}

impl Identity {
    pub fn new(
        room: impl Into<RoomId>,
        template: impl Into<TemplateId>,
        position: impl Into<Position>,
    ) -> Self {
        Self {
            room: room.into(),
            template: template.into(),
            position: position.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.room, self.template, self.position)
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// A cardinal wall of a room. Door slots are keyed by direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// All four directions in slot order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// The wall on the far side. Leaving through `East` arrives through
    /// the destination's `West` wall.
    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::North => write!(f, "north"),
            Self::South => write!(f, "south"),
            Self::East => write!(f, "east"),
            Self::West => write!(f, "west"),
        }
    }
}

// ---------------------------------------------------------------------------
// Gate vocabularies
// ---------------------------------------------------------------------------

/// Colour of a door key. Keys are fungible within a colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyColor {
    Red,
    Blue,
    Green,
    Yellow,
}

impl fmt::Display for KeyColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Red => write!(f, "red"),
            Self::Blue => write!(f, "blue"),
            Self::Green => write!(f, "green"),
            Self::Yellow => write!(f, "yellow"),
        }
    }
}

/// The disguise of a secret passage. A traveler is assigned exactly one
/// passage type they can operate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassageType {
    Bookcase,
    Clock,
    Barrel,
}

impl fmt::Display for PassageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bookcase => write!(f, "bookcase"),
            Self::Clock => write!(f, "clock"),
            Self::Barrel => write!(f, "barrel"),
        }
    }
}

/// The three vertical connections a room may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloorKind {
    StairsUp,
    StairsDown,
    Trapdoor,
}

impl FloorKind {
    pub const ALL: [FloorKind; 3] =
        [FloorKind::StairsUp, FloorKind::StairsDown, FloorKind::Trapdoor];

    /// The floor edge a traveler would expect to find on arrival.
    ///
    /// Going up arrives at the destination's stairs down and vice versa.
    /// A trapdoor has no way back, so it maps to `None`.
    pub fn counterpart(self) -> Option<FloorKind> {
        match self {
            Self::StairsUp => Some(Self::StairsDown),
            Self::StairsDown => Some(Self::StairsUp),
            Self::Trapdoor => None,
        }
    }
}

impl fmt::Display for FloorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StairsUp => write!(f, "stairs up"),
            Self::StairsDown => write!(f, "stairs down"),
            Self::Trapdoor => write!(f, "trapdoor"),
        }
    }
}
