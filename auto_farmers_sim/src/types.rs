// Core types shared across the simulation.
//
// Spatial types (`GridCoord` for integer cells, `PlanePos` for continuous
// agent positions on the x/z plane, `CellKey` for the hashed cell index),
// the two tagged enumerations that replace the overlapping numeric codes of
// the farm (`ResourceCode` for what a cell holds, `Intent` for what an agent
// is doing), the agent task tag, and the compact `AgentId`.
//
// Grid cells use `(x, y)`; the agent plane uses `(x, z)` because y is the
// world's vertical axis. A cell `(x, y)` covers plane positions
// `[x, x+1) x [y, y+1)`, and its centre is at `+0.5` on both axes.
//
// See also: `grid.rs` for the sparse index keyed by `CellKey`,
// `assignment.rs` for the table joining `Intent` to `ResourceCode`.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// An integer cell coordinate on the square farm grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    /// Host-facing encoding of "nothing found".
    pub const NOT_FOUND: GridCoord = GridCoord { x: -1, y: -1 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Encode a search result with the `(-1, -1)` sentinel used at the host
    /// boundary.
    pub fn encode(found: Option<GridCoord>) -> GridCoord {
        found.unwrap_or(Self::NOT_FOUND)
    }

    /// The cell containing a plane position.
    pub fn containing(pos: PlanePos) -> Self {
        Self::new(pos.x.floor() as i32, pos.z.floor() as i32)
    }

    /// Plane position of the cell centre.
    pub fn center(self) -> PlanePos {
        PlanePos::new(self.x as f32 + 0.5, self.y as f32 + 0.5)
    }

    /// Ring index of `other` around `self` (Chebyshev distance).
    pub fn ring_distance(self, other: Self) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.y - other.y).unsigned_abs())
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Hashed cell index, `x * width + y`. Only meaningful for the grid width it
/// was produced with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellKey(pub i32);

/// A continuous position on the x/z plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanePos {
    pub x: f32,
    pub z: f32,
}

impl PlanePos {
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    pub fn along(self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Z => self.z,
        }
    }

    pub fn with(self, axis: Axis, value: f32) -> Self {
        match axis {
            Axis::X => Self::new(value, self.z),
            Axis::Z => Self::new(self.x, value),
        }
    }
}

/// A movement axis on the plane. `Z` corresponds to the grid's `y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Z,
}

impl Axis {
    pub fn other(self) -> Self {
        match self {
            Axis::X => Axis::Z,
            Axis::Z => Axis::X,
        }
    }
}

// ---------------------------------------------------------------------------
// Cell contents and agent intents
// ---------------------------------------------------------------------------

/// What a grid cell holds. `Empty` is never stored: it is the absence of an
/// entry, and searching for it means searching for untouched ground.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ResourceCode {
    Empty = 0,
    Rock = 1,
    TilledSoil = 2,
    Plant = 3,
    Storage = 4,
}

impl ResourceCode {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Empty),
            1 => Some(Self::Rock),
            2 => Some(Self::TilledSoil),
            3 => Some(Self::Plant),
            4 => Some(Self::Storage),
            _ => None,
        }
    }
}

/// An agent's current task or phase label. The numeric codes are the ones
/// the host side reads; sim logic only matches on variants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Intent {
    #[default]
    None = 0,
    Rock = 1,
    Till = 2,
    Plant = 3,
    Store = 4,
    MoveToRock = 5,
    PerformRock = 6,
    MoveToTill = 7,
    PerformTill = 8,
    MoveToPlant = 9,
    PerformPlanting = 10,
    MovingToStore = 11,
}

impl Intent {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        const ALL: [Intent; 12] = [
            Intent::None,
            Intent::Rock,
            Intent::Till,
            Intent::Plant,
            Intent::Store,
            Intent::MoveToRock,
            Intent::PerformRock,
            Intent::MoveToTill,
            Intent::PerformTill,
            Intent::MoveToPlant,
            Intent::PerformPlanting,
            Intent::MovingToStore,
        ];
        ALL.get(code as usize).copied()
    }

    /// The label an agent carries once it has done the work for this intent.
    pub fn performed(self) -> Self {
        match self {
            Intent::Rock | Intent::MoveToRock => Intent::PerformRock,
            Intent::Till | Intent::MoveToTill => Intent::PerformTill,
            Intent::Plant | Intent::MoveToPlant => Intent::PerformPlanting,
            other => other,
        }
    }
}

/// Which scheduling pool an agent is in. A single field, so an agent can
/// never be both waiting for a task and moving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskTag {
    NeedsTask,
    Moving,
    None,
}

/// A tag change requested by the assignment or movement logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagTransition {
    /// Assignment succeeded: `NeedsTask` -> `Moving`.
    StartMoving,
    /// Arrival: `Moving` -> `NeedsTask`.
    Arrived,
}

impl TagTransition {
    pub fn apply(self, tag: TaskTag) -> TaskTag {
        match (self, tag) {
            (TagTransition::StartMoving, TaskTag::NeedsTask) => TaskTag::Moving,
            (TagTransition::Arrived, TaskTag::Moving) => TaskTag::NeedsTask,
            (_, unchanged) => unchanged,
        }
    }
}

// ---------------------------------------------------------------------------
// Agent IDs: compact integers handed out by the sim in spawn order.
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AgentId({})", self.0)
    }
}
