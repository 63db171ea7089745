/// Cube faces, their stored indices and the quarter-turn ring
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a stored face key falls outside 1..=6
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("face index {0} is outside 1..=6")]
pub struct FaceIndexError(pub u8);

/// 1-based face index as it appears in the binding collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FaceIndex(u8);

impl FaceIndex {
    pub const ALL: [FaceIndex; 6] = [
        FaceIndex(1),
        FaceIndex(2),
        FaceIndex(3),
        FaceIndex(4),
        FaceIndex(5),
        FaceIndex(6),
    ];

    pub fn new(value: u8) -> Result<Self, FaceIndexError> {
        if (1..=6).contains(&value) {
            Ok(Self(value))
        } else {
            Err(FaceIndexError(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Face owning a mesh triangle. Every face is two consecutive triangles.
    pub fn from_triangle(triangle_index: usize) -> Option<Self> {
        let value = u8::try_from(triangle_index / 2 + 1).ok()?;
        Self::new(value).ok()
    }
}

impl TryFrom<u8> for FaceIndex {
    type Error = FaceIndexError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FaceIndex> for u8 {
    fn from(index: FaceIndex) -> Self {
        index.0
    }
}

impl fmt::Display for FaceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Step direction shared by face rotation and cube switching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Backward,
    Forward,
}

impl Direction {
    pub fn sign(self) -> i32 {
        match self {
            Direction::Backward => -1,
            Direction::Forward => 1,
        }
    }

    /// Maps any non-negative value to `Forward`
    pub fn from_sign(sign: i32) -> Self {
        if sign < 0 {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Direction::Backward => Direction::Forward,
            Direction::Forward => Direction::Backward,
        }
    }
}

/// A named cube face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Face {
    #[default]
    Top,
    Front,
    Bottom,
    Back,
    Left,
    Right,
}

/// Faces reachable by quarter turns, in forward rotation order
pub const RING: [Face; 4] = [Face::Top, Face::Front, Face::Bottom, Face::Back];

impl Face {
    pub const ALL: [Face; 6] = [
        Face::Top,
        Face::Front,
        Face::Bottom,
        Face::Back,
        Face::Left,
        Face::Right,
    ];

    pub fn index(self) -> FaceIndex {
        FaceIndex(match self {
            Face::Left => 1,
            Face::Front => 2,
            Face::Back => 3,
            Face::Top => 4,
            Face::Bottom => 5,
            Face::Right => 6,
        })
    }

    pub fn from_index(index: FaceIndex) -> Self {
        match index.0 {
            1 => Face::Left,
            2 => Face::Front,
            3 => Face::Back,
            4 => Face::Top,
            5 => Face::Bottom,
            _ => Face::Right,
        }
    }

    pub fn is_ring(self) -> bool {
        self.ring_neighbours().is_some()
    }

    /// (backward, forward) neighbours on the ring; `None` for Left/Right
    fn ring_neighbours(self) -> Option<(Face, Face)> {
        match self {
            Face::Top => Some((Face::Back, Face::Front)),
            Face::Front => Some((Face::Top, Face::Bottom)),
            Face::Bottom => Some((Face::Front, Face::Back)),
            Face::Back => Some((Face::Bottom, Face::Top)),
            Face::Left | Face::Right => None,
        }
    }

    /// Face that becomes active after one quarter turn.
    ///
    /// Left and Right are never reached this way. From either of them a
    /// forward turn enters the ring at Top and a backward turn at Bottom.
    pub fn rotated(self, direction: Direction) -> Face {
        match (self.ring_neighbours(), direction) {
            (Some((backward, _)), Direction::Backward) => backward,
            (Some((_, forward)), Direction::Forward) => forward,
            (None, Direction::Forward) => Face::Top,
            (None, Direction::Backward) => Face::Bottom,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Face::Top => "top",
            Face::Front => "front",
            Face::Bottom => "bottom",
            Face::Back => "back",
            Face::Left => "left",
            Face::Right => "right",
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
