//! Axis-aligned bounding boxes.

use std::fmt;

use tandem_core::{Fixed, Vec2};

/// An axis-aligned box with inclusive `min` and `max` corners.
///
/// Two boxes overlap only if their interiors intersect: boxes that merely
/// share an edge do not collide, so a body resting exactly on a platform
/// produces no contact.
///
/// # Examples
///
/// ```
/// use tandem_core::Vec2;
/// use tandem_space::Aabb;
///
/// let a = Aabb::new(Vec2::from_ints(0, 0), Vec2::from_ints(2, 2));
/// let b = Aabb::new(Vec2::from_ints(1, 1), Vec2::from_ints(3, 3));
/// let c = Aabb::new(Vec2::from_ints(2, 0), Vec2::from_ints(4, 2));
/// assert!(a.overlaps(&b));
/// assert!(!a.overlaps(&c)); // touching edges only
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Aabb {
    /// Top-left corner (smallest coordinates).
    pub min: Vec2,
    /// Bottom-right corner (largest coordinates).
    pub max: Vec2,
}

impl Aabb {
    /// Construct from two corners, in any order.
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Construct from a center point and half extents.
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Construct from a top-left corner and a size.
    pub fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self::new(origin, origin + size)
    }

    /// Horizontal extent.
    pub fn width(&self) -> Fixed {
        self.max.x - self.min.x
    }

    /// Vertical extent.
    pub fn height(&self) -> Fixed {
        self.max.y - self.min.y
    }

    /// Center point (rounded towards negative infinity).
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.min.x + self.width().halve(),
            self.min.y + self.height().halve(),
        )
    }

    /// Half of the width and height.
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width().halve(), self.height().halve())
    }

    /// Whether the interiors of the two boxes intersect.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Whether `point` lies inside or on the boundary.
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Whether `other` lies entirely inside this box.
    pub fn contains(&self, other: &Aabb) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// The overlapping region, if the boxes overlap.
    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Aabb {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        })
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Shift by `delta`.
    pub fn translate(&self, delta: Vec2) -> Aabb {
        Aabb {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Grow outward by `margin` on every side.
    pub fn expand(&self, margin: Fixed) -> Aabb {
        let m = Vec2::new(margin, margin);
        Aabb::new(self.min - m, self.max + m)
    }

    /// Minimum translation that moves `self` out of `other`.
    ///
    /// The push is along the axis of least overlap; on a tie the vertical
    /// axis wins, so a body landing on a corner is lifted rather than
    /// shoved sideways. The direction points away from `other`'s center;
    /// coincident centers push towards negative coordinates.
    ///
    /// Returns `None` when the boxes do not overlap.
    pub fn penetration(&self, other: &Aabb) -> Option<Vec2> {
        let overlap = self.intersection(other)?;
        let (dx, dy) = (overlap.width(), overlap.height());

        // Sum of corners compares centers without halving.
        let self_cx = self.min.x + self.max.x;
        let other_cx = other.min.x + other.max.x;
        let self_cy = self.min.y + self.max.y;
        let other_cy = other.min.y + other.max.y;

        if dx < dy {
            let x = if self_cx > other_cx { dx } else { -dx };
            Some(Vec2::new(x, Fixed::ZERO))
        } else {
            let y = if self_cy > other_cy { dy } else { -dy };
            Some(Vec2::new(Fixed::ZERO, y))
        }
    }
}

impl fmt::Display for Aabb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxi(x0: i32, y0: i32, x1: i32, y1: i32) -> Aabb {
        Aabb::new(Vec2::from_ints(x0, y0), Vec2::from_ints(x1, y1))
    }

    #[test]
    fn new_normalises_corners() {
        let a = boxi(4, 5, 1, 2);
        assert_eq!(a.min, Vec2::from_ints(1, 2));
        assert_eq!(a.max, Vec2::from_ints(4, 5));
    }

    #[test]
    fn center_and_extents() {
        let a = Aabb::from_center(Vec2::from_ints(10, 10), Vec2::from_ints(2, 3));
        assert_eq!(a, boxi(8, 7, 12, 13));
        assert_eq!(a.center(), Vec2::from_ints(10, 10));
        assert_eq!(a.half_extents(), Vec2::from_ints(2, 3));
    }

    #[test]
    fn overlap_is_strict() {
        let a = boxi(0, 0, 2, 2);
        assert!(a.overlaps(&boxi(1, 1, 3, 3)));
        assert!(!a.overlaps(&boxi(2, 0, 4, 2)));
        assert!(!a.overlaps(&boxi(0, 2, 2, 4)));
        assert!(a.overlaps(&boxi(-1, -1, 5, 5)));
    }

    #[test]
    fn intersection_and_union() {
        let a = boxi(0, 0, 4, 4);
        let b = boxi(2, 3, 6, 8);
        assert_eq!(a.intersection(&b), Some(boxi(2, 3, 4, 4)));
        assert_eq!(a.union(&b), boxi(0, 0, 6, 8));
        assert_eq!(a.intersection(&boxi(10, 10, 11, 11)), None);
    }

    #[test]
    fn penetration_picks_shallow_axis() {
        // Body sinking 1 unit into a wide floor: pushed up.
        let body = boxi(0, 0, 2, 2);
        let floor = boxi(-10, 1, 10, 5);
        assert_eq!(body.penetration(&floor), Some(Vec2::from_ints(0, -1)));

        // Body overlapping a wall from the right by 1: pushed right.
        let wall = boxi(-5, -10, 1, 10);
        assert_eq!(body.penetration(&wall), Some(Vec2::from_ints(1, 0)));

        assert_eq!(body.penetration(&boxi(5, 5, 6, 6)), None);
    }

    #[test]
    fn translate_and_contains() {
        let a = boxi(0, 0, 1, 1).translate(Vec2::from_ints(2, 3));
        assert_eq!(a, boxi(2, 3, 3, 4));
        assert!(boxi(0, 0, 10, 10).contains(&a));
        assert!(a.contains_point(Vec2::from_ints(3, 4)));
    }
}
