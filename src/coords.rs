//! Coordinates and geometry for the layered chunk world.
//!
//! World space is measured in world units (one unit = one generated pixel).
//! Each layer is partitioned into fixed-size square chunks addressed by
//! integer chunk coordinates.

use serde::{Deserialize, Serialize};

/// Identifies one chunk of one layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    /// Layer index (0 = surface, increasing with depth).
    pub layer: u8,
    /// Chunk column.
    pub cx: i32,
    /// Chunk row.
    pub cy: i32,
}

impl ChunkCoord {
    pub fn new(layer: u8, cx: i32, cy: i32) -> Self {
        Self { layer, cx, cy }
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}:({},{})", self.layer, self.cx, self.cy)
    }
}

/// 2D vector in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or zero for a (near-)zero vector.
    pub fn normalized(self) -> Vec2 {
        let len = self.length();
        if len < 1e-6 {
            Vec2::ZERO
        } else {
            Vec2::new(self.x / len, self.y / len)
        }
    }

    pub fn scaled(self, factor: f32) -> Vec2 {
        Vec2::new(self.x * factor, self.y * factor)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Cardinal facing of an entrance. Screen convention: +y points down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// All directions in index order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Direction for an index; wraps modulo 4.
    pub fn from_index(index: u32) -> Self {
        Self::ALL[(index % 4) as usize]
    }

    pub fn index(self) -> u32 {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    /// Unit vector of the facing.
    pub fn unit(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Right => Vec2::new(1.0, 0.0),
            Direction::Down => Vec2::new(0.0, 1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
        }
    }

    /// Unit vector perpendicular to the facing (facing rotated a quarter
    /// turn clockwise in screen coordinates).
    pub fn perpendicular(self) -> Vec2 {
        let u = self.unit();
        Vec2::new(-u.y, u.x)
    }

    /// Rotation angle in radians, clockwise from Up.
    pub fn angle(self) -> f32 {
        self.index() as f32 * std::f32::consts::FRAC_PI_2
    }

    /// Opposite facing (rotated two quarter-turns).
    pub fn mirrored(self) -> Self {
        Self::from_index(self.index() + 2)
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Up => "Up",
            Direction::Right => "Right",
            Direction::Down => "Down",
            Direction::Left => "Left",
        }
    }
}

/// Camera-relative view rectangle in world units (top-left anchored).
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Viewport of the given size centered on a point.
    pub fn centered_on(center: Vec2, width: f32, height: f32) -> Self {
        Self::new(center.x - width * 0.5, center.y - height * 0.5, width, height)
    }
}

/// Inclusive rectangle of chunk coordinates on one layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkRange {
    pub min_cx: i32,
    pub min_cy: i32,
    pub max_cx: i32,
    pub max_cy: i32,
}

impl ChunkRange {
    pub fn contains(&self, cx: i32, cy: i32) -> bool {
        cx >= self.min_cx && cx <= self.max_cx && cy >= self.min_cy && cy <= self.max_cy
    }

    pub fn count(&self) -> usize {
        let w = (self.max_cx - self.min_cx + 1).max(0) as usize;
        let h = (self.max_cy - self.min_cy + 1).max(0) as usize;
        w * h
    }

    /// Iterate chunk coordinates in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let range = *self;
        (range.min_cy..=range.max_cy)
            .flat_map(move |cy| (range.min_cx..=range.max_cx).map(move |cx| (cx, cy)))
    }
}
