//! 2D math types for UI geometry.
//!
//! Positions are in screen units with the origin at the top-left corner and
//! the Y axis pointing down.

use bytemuck::{Pod, Zeroable};

/// 2D Vector - positions, sizes, scale factors
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vec2 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
}

impl Vec2 {
    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Unit vector (identity scale)
    pub const ONE: Self = Self::new(1.0, 1.0);

    /// Creates a new Vec2
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Component-wise product
    #[must_use]
    pub fn mul_elem(self, other: Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y)
    }

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 2] {
        [self.x, self.y]
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// A rectangle in screen coordinates.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Rect {
    /// X position (left edge).
    pub x: f32,
    /// Y position (top edge).
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// A zero-sized rect at the origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a new rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Creates a rectangle from position and size.
    #[must_use]
    pub const fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos.x, pos.y, size.x, size.y)
    }

    /// Returns the top-left corner.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Returns the size.
    #[must_use]
    pub const fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Returns the right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Returns the bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Returns the center point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Returns true if the point is inside the rectangle.
    ///
    /// The left/top edges are inclusive, the right/bottom edges exclusive, so
    /// two rects sharing an edge never both contain a point on it.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Returns true if two rectangles intersect.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Returns the intersection of two rectangles, or None if they don't intersect.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }

        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        Some(Self::new(x, y, right - x, bottom - y))
    }

    /// Scales the rectangle about a pivot given in local coordinates
    /// (relative to the top-left corner).
    ///
    /// The pivot point stays fixed in place.
    #[must_use]
    pub fn scaled_about(&self, scale: Vec2, pivot: Vec2) -> Self {
        Self::new(
            self.x + pivot.x * (1.0 - scale.x),
            self.y + pivot.y * (1.0 - scale.y),
            self.width * scale.x,
            self.height * scale.y,
        )
    }

    /// Maps a rectangle expressed in this rectangle's local space into the
    /// parent space, given the accumulated parent scale.
    #[must_use]
    pub fn local_to_parent(&self, local: &Self, scale: Vec2) -> Self {
        Self::new(
            self.x + local.x * scale.x,
            self.y + local.y * scale.y,
            local.width * scale.x,
            local.height * scale.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_half_open() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Vec2::new(0.0, 0.0)));
        assert!(r.contains(Vec2::new(9.99, 9.99)));
        assert!(!r.contains(Vec2::new(10.0, 5.0)));
        assert!(!r.contains(Vec2::new(-0.1, 5.0)));
    }

    #[test]
    fn test_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersection(&b), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));
        assert_eq!(a.intersection(&Rect::new(20.0, 20.0, 1.0, 1.0)), None);
    }

    #[test]
    fn test_scaled_about_center_keeps_center() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        let scaled = r.scaled_about(Vec2::new(2.0, 2.0), Vec2::new(10.0, 10.0));
        assert_eq!(scaled, Rect::new(0.0, 0.0, 40.0, 40.0));
        assert_eq!(scaled.center(), r.center());
    }

    #[test]
    fn test_local_to_parent() {
        let parent = Rect::new(100.0, 50.0, 200.0, 200.0);
        let local = Rect::new(10.0, 20.0, 30.0, 40.0);
        let mapped = parent.local_to_parent(&local, Vec2::new(2.0, 0.5));
        assert_eq!(mapped, Rect::new(120.0, 60.0, 60.0, 20.0));
    }
}
