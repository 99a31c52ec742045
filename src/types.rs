//! Core value types shared by the overlay components

use serde::{Deserialize, Serialize};

/// Screen boundary the overlay docks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    #[default]
    Bottom,
    Top,
    Left,
    Right,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Bottom, Edge::Top, Edge::Left, Edge::Right];

    /// True when the tangent axis is horizontal (the overlay slides along x)
    pub fn is_horizontal(self) -> bool {
        matches!(self, Edge::Bottom | Edge::Top)
    }

    /// Rotation applied to the character so it faces away from the edge
    pub fn rotation(self) -> Rotation {
        match self {
            Edge::Bottom => Rotation(0),
            Edge::Top => Rotation(180),
            Edge::Left => Rotation(90),
            Edge::Right => Rotation(-90),
        }
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Edge::Bottom => "bottom",
            Edge::Top => "top",
            Edge::Left => "left",
            Edge::Right => "right",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Edge {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bottom" => Ok(Edge::Bottom),
            "top" => Ok(Edge::Top),
            "left" => Ok(Edge::Left),
            "right" => Ok(Edge::Right),
            other => anyhow::bail!("Unknown edge '{other}' (expected bottom, top, left or right)"),
        }
    }
}

/// Character rotation in degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rotation(pub i16);

/// Absolute screen position in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Screen rectangle (display bounds or work area)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn center(&self) -> Position {
        Position::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn contains(&self, point: Position) -> bool {
        point.x >= self.left() && point.x < self.right() && point.y >= self.top() && point.y < self.bottom()
    }

    /// Squared distance from a point to the nearest point of the rectangle
    pub fn distance_sq(&self, point: Position) -> i64 {
        let dx = (self.left() - point.x).max(0).max(point.x - self.right()) as i64;
        let dy = (self.top() - point.y).max(0).max(point.y - self.bottom()) as i64;
        dx * dx + dy * dy
    }

    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        (right > left && bottom > top).then(|| Rect::new(left, top, right - left, bottom - top))
    }
}

/// Window position plus the character rotation for that edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub position: Position,
    pub rotation: Rotation,
}

/// Character playback direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayDirection {
    Forward,
    Reverse,
}

/// Visibility phase of the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Hidden,
    Appearing,
    Visible,
    Hiding,
}

impl Phase {
    pub fn is_animating(self) -> bool {
        matches!(self, Phase::Appearing | Phase::Hiding)
    }

    pub fn is_visible(self) -> bool {
        self == Phase::Visible
    }
}
