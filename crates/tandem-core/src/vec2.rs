//! Two-component fixed-point vector used for positions and velocities.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use crate::fixed::Fixed;

/// An immutable `(x, y)` pair of [`Fixed`] values.
///
/// Follows screen conventions: `+x` is right, `+y` is down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: Fixed,
    /// Vertical component.
    pub y: Fixed,
}

impl Vec2 {
    /// `(0, 0)`
    pub const ZERO: Self = Self::new(Fixed::ZERO, Fixed::ZERO);

    /// Construct from components.
    #[inline]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Construct from integer components.
    #[inline]
    pub const fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_int(x), Fixed::from_int(y))
    }

    /// Scale both components.
    #[inline]
    pub fn scale(self, s: Fixed) -> Self {
        Self::new(self.x * s, self.y * s)
    }

    /// Dot product.
    #[inline]
    pub fn dot(self, rhs: Self) -> Fixed {
        self.x * rhs.x + self.y * rhs.y
    }

    /// Z component of the 3D cross product.
    #[inline]
    pub fn cross(self, rhs: Self) -> Fixed {
        self.x * rhs.y - self.y * rhs.x
    }

    /// Squared length. Cheaper than [`length`](Self::length) for comparisons.
    #[inline]
    pub fn length_squared(self) -> Fixed {
        self.dot(self)
    }

    /// Euclidean length via integer square root.
    pub fn length(self) -> Fixed {
        self.length_squared().sqrt()
    }

    /// Distance to another point.
    pub fn distance(self, other: Self) -> Fixed {
        (other - self).length()
    }

    /// Unit vector in the same direction. The zero vector (or one too short
    /// to normalise at Q16.16 resolution) normalises to itself.
    pub fn normalize(self) -> Self {
        let len = self.length();
        match (self.x.try_div(len), self.y.try_div(len)) {
            (Ok(x), Ok(y)) => Self::new(x, y),
            _ => self,
        }
    }

    /// Component-wise absolute value.
    #[inline]
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs())
    }

    /// Component-wise minimum.
    #[inline]
    pub fn min(self, rhs: Self) -> Self {
        Self::new(self.x.min(rhs.x), self.y.min(rhs.y))
    }

    /// Component-wise maximum.
    #[inline]
    pub fn max(self, rhs: Self) -> Self {
        Self::new(self.x.max(rhs.x), self.y.max(rhs.y))
    }

    /// Copy with a replaced `x`.
    #[inline]
    pub fn with_x(self, x: Fixed) -> Self {
        Self::new(x, self.y)
    }

    /// Copy with a replaced `y`.
    #[inline]
    pub fn with_y(self, y: Fixed) -> Self {
        Self::new(self.x, y)
    }
}

impl Add for Vec2 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<Fixed> for Vec2 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Fixed) -> Self {
        self.scale(rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
