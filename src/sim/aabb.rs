//! Axis-aligned rectangle math
//!
//! Every collidable thing in the simulation is an axis-aligned box:
//! - position is the top-left corner, size extends right/down
//! - the box covers the half-open region `[pos, pos + size)`, so two
//!   boxes that merely share an edge do not overlap

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Top-left corner
    pub pos: Vec2,
    /// Width/height (non-negative)
    pub size: Vec2,
}

/// Where the null rectangle lives, far outside any playable world
const NULL_POS: Vec2 = Vec2::new(-1000.0, -1000.0);

impl Aabb {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    /// The sentinel stand-in for "no tile here": a 1x1 box far outside the
    /// world, safe to run any collision test against without branching.
    pub fn null() -> Self {
        Self {
            pos: NULL_POS,
            size: Vec2::ONE,
        }
    }

    /// True if this is the sentinel rectangle
    pub fn is_null(&self) -> bool {
        self.pos == NULL_POS && self.size == Vec2::ONE
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    /// Move the box so its right edge sits at `x`
    pub fn set_right(&mut self, x: f32) {
        self.pos.x = x - self.size.x;
    }

    /// Move the box so its left edge sits at `x`
    pub fn set_left(&mut self, x: f32) {
        self.pos.x = x;
    }

    /// Move the box so its bottom edge sits at `y`
    pub fn set_bottom(&mut self, y: f32) {
        self.pos.y = y - self.size.y;
    }

    /// Move the box so its top edge sits at `y`
    pub fn set_top(&mut self, y: f32) {
        self.pos.y = y;
    }

    /// Overlap test, exclusive at the far edges
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap() {
        let a = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(16.0, 16.0));
        let b = Aabb::new(Vec2::new(8.0, 8.0), Vec2::new(16.0, 16.0));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_shared_edge_does_not_overlap() {
        let a = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(16.0, 16.0));
        let b = Aabb::new(Vec2::new(16.0, 0.0), Vec2::new(16.0, 16.0));
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
    }

    #[test]
    fn test_edge_setters() {
        let mut r = Aabb::new(Vec2::new(5.0, 5.0), Vec2::new(10.0, 10.0));
        r.set_right(32.0);
        assert_eq!(r.left(), 22.0);
        r.set_bottom(48.0);
        assert_eq!(r.top(), 38.0);
    }

    #[test]
    fn test_null_rect_never_touches_world() {
        let null = Aabb::null();
        assert!(null.is_null());
        // A huge box covering any plausible playable area
        let world = Aabb::new(Vec2::new(-500.0, -500.0), Vec2::new(10_000.0, 10_000.0));
        assert!(!null.intersects(&world));
    }
}
