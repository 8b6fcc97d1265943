//! Q16.16 fixed-point scalar.
//!
//! Floating-point results can differ across CPU architectures, compilers,
//! and optimisation levels. Every arithmetic operation on [`Fixed`] is pure
//! `i32`/`i64` integer math, so two peers computing the same expression
//! always obtain the same bits.
//!
//! # Overflow
//!
//! The operator impls (`+`, `-`, `*`, unary `-`) wrap on overflow. Wrapping
//! is deterministic, so a wrapped result is still identical on every peer.
//! Call sites that must detect overflow use [`Fixed::checked_mul`] and
//! [`Fixed::try_div`], which return [`ArithmeticError`] instead.
//!
//! There is no `Div` impl. Division goes through [`Fixed::try_div`] so a
//! zero divisor surfaces as an error, not a panic or a clamped value.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::error::ArithmeticError;

/// A Q16.16 fixed-point number: 16 integer bits, 16 fractional bits.
///
/// Range: `-32768.0 ..= 32767.99998`, resolution `1 / 65536`.
///
/// # Examples
///
/// ```
/// use tandem_core::Fixed;
///
/// let a = Fixed::from_int(3);
/// let b = Fixed::from_ratio(1, 2).unwrap();
/// assert_eq!(a * b, Fixed::from_ratio(3, 2).unwrap());
/// assert!(a.try_div(Fixed::ZERO).is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Fixed(i32);

impl Fixed {
    /// Number of fractional bits.
    pub const FRAC_BITS: u32 = 16;
    /// Raw value of `1.0`.
    pub const SCALE: i32 = 1 << Self::FRAC_BITS;

    /// `0.0`
    pub const ZERO: Self = Self(0);
    /// `1.0`
    pub const ONE: Self = Self(Self::SCALE);
    /// `0.5`
    pub const HALF: Self = Self(Self::SCALE / 2);
    /// Largest representable value.
    pub const MAX: Self = Self(i32::MAX);
    /// Smallest representable value.
    pub const MIN: Self = Self(i32::MIN);
    /// Smallest positive value.
    pub const EPSILON: Self = Self(1);

    /// `π`, rounded to the nearest representable value.
    pub const PI: Self = Self(205_887);
    /// `π / 2`
    pub const FRAC_PI_2: Self = Self(102_944);
    /// `2π`
    pub const TAU: Self = Self(411_775);

    /// Construct from an integer. Values outside `-32768..=32767` wrap.
    #[inline]
    pub const fn from_int(n: i32) -> Self {
        Self(n.wrapping_shl(Self::FRAC_BITS))
    }

    /// Construct from the raw Q16.16 bit pattern.
    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// The raw Q16.16 bit pattern. This is what checksums and the wire
    /// format consume.
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Construct `numerator / denominator` exactly as integer math would.
    pub fn from_ratio(numerator: i32, denominator: i32) -> Result<Self, ArithmeticError> {
        if denominator == 0 {
            return Err(ArithmeticError::DivisionByZero);
        }
        let q = ((numerator as i64) << Self::FRAC_BITS) / denominator as i64;
        narrow(q)
    }

    /// Integer part, rounded towards negative infinity.
    #[inline]
    pub const fn floor_int(self) -> i32 {
        self.0 >> Self::FRAC_BITS
    }

    /// Integer part, rounded to nearest (ties away from zero).
    pub fn round_int(self) -> i32 {
        let half = Self::HALF.0 as i64;
        let v = self.0 as i64;
        let rounded = if v >= 0 {
            (v + half) >> Self::FRAC_BITS
        } else {
            -((-v + half) >> Self::FRAC_BITS)
        };
        rounded as i32
    }

    /// Lossy conversion for presentation layers (rendering, debug output).
    ///
    /// Never feed the result back into simulation state.
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / Self::SCALE as f32
    }

    /// Absolute value. `Fixed::MIN.abs()` wraps to itself.
    #[inline]
    pub const fn abs(self) -> Self {
        Self(self.0.wrapping_abs())
    }

    /// `-1`, `0`, or `1` as a [`Fixed`].
    pub const fn signum(self) -> Self {
        Self::from_int(self.0.signum())
    }

    /// Whether the value is strictly negative.
    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Whether the value is zero.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Multiply, reporting results outside the Q16.16 range.
    pub fn checked_mul(self, rhs: Self) -> Result<Self, ArithmeticError> {
        narrow((self.0 as i64 * rhs.0 as i64) >> Self::FRAC_BITS)
    }

    /// Add, reporting results outside the Q16.16 range.
    pub fn checked_add(self, rhs: Self) -> Result<Self, ArithmeticError> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(ArithmeticError::Overflow)
    }

    /// Divide, truncating towards zero.
    ///
    /// # Errors
    ///
    /// [`ArithmeticError::DivisionByZero`] if `rhs` is zero,
    /// [`ArithmeticError::Overflow`] if the quotient is out of range.
    pub fn try_div(self, rhs: Self) -> Result<Self, ArithmeticError> {
        if rhs.0 == 0 {
            return Err(ArithmeticError::DivisionByZero);
        }
        narrow(((self.0 as i64) << Self::FRAC_BITS) / rhs.0 as i64)
    }

    /// Saturating addition.
    #[inline]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    #[inline]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Multiply by an integer, wrapping on overflow.
    #[inline]
    pub const fn mul_int(self, n: i32) -> Self {
        Self(self.0.wrapping_mul(n))
    }

    /// Halve, rounding towards negative infinity.
    #[inline]
    pub const fn halve(self) -> Self {
        Self(self.0 >> 1)
    }

    /// Square root.
    ///
    /// Negative inputs return zero. The result is the floor of the exact
    /// root at Q16.16 resolution, computed with integer operations only.
    pub fn sqrt(self) -> Self {
        if self.0 <= 0 {
            return Self::ZERO;
        }
        let root = isqrt_u64((self.0 as u64) << Self::FRAC_BITS);
        Self(root as i32)
    }

    /// Linear interpolation `self + (other - self) * t`.
    pub fn lerp(self, other: Self, t: Self) -> Self {
        self + (other - self) * t
    }

    /// Clamp to `[lo, hi]`.
    pub fn clamp(self, lo: Self, hi: Self) -> Self {
        Ord::clamp(self, lo, hi)
    }

    /// Compare against zero without constructing a value.
    pub fn cmp_zero(self) -> Ordering {
        self.0.cmp(&0)
    }
}

/// Narrow an `i64` intermediate back into Q16.16, reporting overflow.
#[inline]
fn narrow(v: i64) -> Result<Fixed, ArithmeticError> {
    i32::try_from(v)
        .map(Fixed)
        .map_err(|_| ArithmeticError::Overflow)
}

/// Floor of the square root of `n`, bit-by-bit.
fn isqrt_u64(n: u64) -> u64 {
    let mut rem = n;
    let mut root = 0u64;
    let mut bit = 1u64 << 62;
    while bit > rem {
        bit >>= 2;
    }
    while bit != 0 {
        if rem >= root + bit {
            rem -= root + bit;
            root = (root >> 1) + bit;
        } else {
            root >>= 1;
        }
        bit >>= 2;
    }
    root
}

impl Add for Fixed {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl AddAssign for Fixed {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

impl Sub for Fixed {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl SubAssign for Fixed {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self.0.wrapping_sub(rhs.0);
    }
}

impl Mul for Fixed {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self(((self.0 as i64 * rhs.0 as i64) >> Self::FRAC_BITS) as i32)
    }
}

impl MulAssign for Fixed {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Neg for Fixed {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self(self.0.wrapping_neg())
    }
}

impl From<i16> for Fixed {
    fn from(v: i16) -> Self {
        Self::from_int(v as i32)
    }
}

impl fmt::Display for Fixed {
    /// Decimal rendering with five fractional digits, computed in integers.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw = self.0 as i64;
        let sign = if raw < 0 { "-" } else { "" };
        let abs = raw.abs();
        let int = abs >> Self::FRAC_BITS;
        let frac = ((abs & 0xFFFF) * 100_000) >> Self::FRAC_BITS;
        write!(f, "{sign}{int}.{frac:05}")
    }
}
