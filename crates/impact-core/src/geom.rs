//! World-space positions and tile units.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// World distance units per tile edge.
pub const TILE_SIZE: f32 = 8.0;

/// A point or offset in world units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Center of the tile at `(tx, ty)`.
    pub fn from_tile(tx: i32, ty: i32) -> Self {
        Self::new(tx as f32 * TILE_SIZE, ty as f32 * TILE_SIZE)
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_to_world() {
        assert_eq!(Vec2::from_tile(3, -2), Vec2::new(24.0, -16.0));
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(4.0, 6.0);
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(b.distance(a), 5.0);
    }
}
