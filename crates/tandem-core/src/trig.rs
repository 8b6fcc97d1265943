//! Table-driven trigonometry over [`Fixed`] radians.
//!
//! Hardware and libm transcendental functions are not guaranteed to agree
//! across platforms. These functions use precomputed integer tables and
//! linear interpolation only, so every peer computes the same bits.
//!
//! Accuracy: `sin`/`cos` within `±0.0001`, `atan2` within `±0.0001` rad.

use crate::fixed::Fixed;
use crate::vec2::Vec2;

/// Table segments per quarter turn.
const QUARTER_STEPS: i64 = 256;

/// `SIN_QUARTER[i] = round(sin(i/256 · π/2) · 65536)` for `i in 0..=256`.
const SIN_QUARTER: [i32; 257] = [
    0, 402, 804, 1206, 1608, 2010, 2412, 2814,
    3216, 3617, 4019, 4420, 4821, 5222, 5623, 6023,
    6424, 6824, 7224, 7623, 8022, 8421, 8820, 9218,
    9616, 10014, 10411, 10808, 11204, 11600, 11996, 12391,
    12785, 13180, 13573, 13966, 14359, 14751, 15143, 15534,
    15924, 16314, 16703, 17091, 17479, 17867, 18253, 18639,
    19024, 19409, 19792, 20175, 20557, 20939, 21320, 21699,
    22078, 22457, 22834, 23210, 23586, 23961, 24335, 24708,
    25080, 25451, 25821, 26190, 26558, 26925, 27291, 27656,
    28020, 28383, 28745, 29106, 29466, 29824, 30182, 30538,
    30893, 31248, 31600, 31952, 32303, 32652, 33000, 33347,
    33692, 34037, 34380, 34721, 35062, 35401, 35738, 36075,
    36410, 36744, 37076, 37407, 37736, 38064, 38391, 38716,
    39040, 39362, 39683, 40002, 40320, 40636, 40951, 41264,
    41576, 41886, 42194, 42501, 42806, 43110, 43412, 43713,
    44011, 44308, 44604, 44898, 45190, 45480, 45769, 46056,
    46341, 46624, 46906, 47186, 47464, 47741, 48015, 48288,
    48559, 48828, 49095, 49361, 49624, 49886, 50146, 50404,
    50660, 50914, 51166, 51417, 51665, 51911, 52156, 52398,
    52639, 52878, 53114, 53349, 53581, 53812, 54040, 54267,
    54491, 54714, 54934, 55152, 55368, 55582, 55794, 56004,
    56212, 56418, 56621, 56823, 57022, 57219, 57414, 57607,
    57798, 57986, 58172, 58356, 58538, 58718, 58896, 59071,
    59244, 59415, 59583, 59750, 59914, 60075, 60235, 60392,
    60547, 60700, 60851, 60999, 61145, 61288, 61429, 61568,
    61705, 61839, 61971, 62101, 62228, 62353, 62476, 62596,
    62714, 62830, 62943, 63054, 63162, 63268, 63372, 63473,
    63572, 63668, 63763, 63854, 63944, 64031, 64115, 64197,
    64277, 64354, 64429, 64501, 64571, 64639, 64704, 64766,
    64827, 64884, 64940, 64993, 65043, 65091, 65137, 65180,
    65220, 65259, 65294, 65328, 65358, 65387, 65413, 65436,
    65457, 65476, 65492, 65505, 65516, 65525, 65531, 65535,
    65536,];

/// `ATAN_TABLE[i] = round(atan(i/256) · 65536)` for `i in 0..=256`.
const ATAN_TABLE: [i32; 257] = [
    0, 256, 512, 768, 1024, 1280, 1536, 1792,
    2047, 2303, 2559, 2814, 3070, 3325, 3580, 3836,
    4091, 4346, 4600, 4855, 5110, 5364, 5618, 5872,
    6126, 6380, 6633, 6887, 7140, 7392, 7645, 7898,
    8150, 8402, 8653, 8905, 9156, 9407, 9657, 9908,
    10158, 10408, 10657, 10906, 11155, 11403, 11652, 11899,
    12147, 12394, 12641, 12887, 13133, 13379, 13624, 13869,
    14114, 14358, 14601, 14845, 15088, 15330, 15572, 15814,
    16055, 16296, 16536, 16776, 17015, 17254, 17492, 17730,
    17968, 18205, 18441, 18677, 18913, 19148, 19382, 19616,
    19850, 20083, 20315, 20547, 20779, 21009, 21240, 21469,
    21699, 21927, 22156, 22383, 22610, 22836, 23062, 23288,
    23512, 23737, 23960, 24183, 24406, 24627, 24849, 25069,
    25289, 25509, 25727, 25946, 26163, 26380, 26597, 26813,
    27028, 27242, 27456, 27670, 27882, 28094, 28306, 28517,
    28727, 28936, 29145, 29354, 29561, 29768, 29975, 30180,
    30386, 30590, 30794, 30997, 31200, 31402, 31603, 31803,
    32003, 32203, 32401, 32600, 32797, 32994, 33190, 33385,
    33580, 33774, 33968, 34160, 34353, 34544, 34735, 34925,
    35115, 35304, 35492, 35680, 35867, 36053, 36239, 36424,
    36608, 36792, 36975, 37158, 37340, 37521, 37701, 37881,
    38060, 38239, 38417, 38594, 38771, 38947, 39123, 39297,
    39472, 39645, 39818, 39990, 40162, 40333, 40503, 40673,
    40842, 41010, 41178, 41346, 41512, 41678, 41844, 42008,
    42172, 42336, 42499, 42661, 42823, 42984, 43145, 43304,
    43464, 43622, 43780, 43938, 44095, 44251, 44407, 44562,
    44716, 44870, 45024, 45176, 45328, 45480, 45631, 45781,
    45931, 46080, 46229, 46377, 46525, 46672, 46818, 46964,
    47109, 47254, 47398, 47542, 47685, 47827, 47969, 48111,
    48251, 48392, 48531, 48671, 48809, 48947, 49085, 49222,
    49359, 49495, 49630, 49765, 49899, 50033, 50167, 50299,
    50432, 50563, 50695, 50826, 50956, 51086, 51215, 51344,
    51472,];

/// Sine of an angle in radians.
///
/// # Examples
///
/// ```
/// use tandem_core::{trig, Fixed};
///
/// assert_eq!(trig::sin(Fixed::ZERO), Fixed::ZERO);
/// let peak = trig::sin(Fixed::FRAC_PI_2);
/// assert!((peak - Fixed::ONE).abs() <= Fixed::from_raw(2));
/// ```
pub fn sin(angle: Fixed) -> Fixed {
    sin_raw(angle.raw() as i64)
}

/// Cosine of an angle in radians.
pub fn cos(angle: Fixed) -> Fixed {
    sin_raw(angle.raw() as i64 + Fixed::FRAC_PI_2.raw() as i64)
}

/// `(sin, cos)` of the same angle.
pub fn sin_cos(angle: Fixed) -> (Fixed, Fixed) {
    (sin(angle), cos(angle))
}

fn sin_raw(angle: i64) -> Fixed {
    let tau = Fixed::TAU.raw() as i64;
    let a = angle.rem_euclid(tau);

    // Position along the full circle in Q16.16 table steps.
    let pos = (a * QUARTER_STEPS * 4 * Fixed::SCALE as i64) / tau;
    let step = (pos >> Fixed::FRAC_BITS).min(QUARTER_STEPS * 4 - 1);
    let frac = pos & 0xFFFF;

    let quadrant = step / QUARTER_STEPS;
    let i = (step % QUARTER_STEPS) as usize;
    let (v0, v1) = match quadrant {
        0 => (SIN_QUARTER[i], SIN_QUARTER[i + 1]),
        1 => (SIN_QUARTER[256 - i], SIN_QUARTER[255 - i]),
        2 => (-SIN_QUARTER[i], -SIN_QUARTER[i + 1]),
        _ => (-SIN_QUARTER[256 - i], -SIN_QUARTER[255 - i]),
    };
    Fixed::from_raw(interpolate(v0, v1, frac))
}

/// Angle of the vector `(x, y)` in radians, in `(-π, π]`.
///
/// `atan2(0, 0)` is defined as zero.
pub fn atan2(y: Fixed, x: Fixed) -> Fixed {
    let (xr, yr) = (x.raw() as i64, y.raw() as i64);
    if xr == 0 && yr == 0 {
        return Fixed::ZERO;
    }
    let (ax, ay) = (xr.abs(), yr.abs());

    // Reduce to the first octant, where the ratio is in [0, 1].
    let base = if ay <= ax {
        atan_unit((ay << Fixed::FRAC_BITS) / ax)
    } else {
        Fixed::FRAC_PI_2.raw() - atan_unit((ax << Fixed::FRAC_BITS) / ay)
    };

    let angle = if xr < 0 { Fixed::PI.raw() - base } else { base };
    let angle = if yr < 0 { -angle } else { angle };
    Fixed::from_raw(angle)
}

/// `atan(t)` for `t` in Q16.16 `[0, 1]`.
fn atan_unit(t: i64) -> i32 {
    let scaled = t * QUARTER_STEPS;
    let i = (scaled >> Fixed::FRAC_BITS) as usize;
    if i >= QUARTER_STEPS as usize {
        return ATAN_TABLE[QUARTER_STEPS as usize];
    }
    interpolate(ATAN_TABLE[i], ATAN_TABLE[i + 1], scaled & 0xFFFF)
}

#[inline]
fn interpolate(v0: i32, v1: i32, frac: i64) -> i32 {
    v0 + (((v1 - v0) as i64 * frac) >> Fixed::FRAC_BITS) as i32
}

impl Vec2 {
    /// Unit vector pointing at `angle` radians.
    pub fn from_angle(angle: Fixed) -> Self {
        let (s, c) = sin_cos(angle);
        Self::new(c, s)
    }

    /// Angle of this vector in radians, in `(-π, π]`.
    pub fn angle(self) -> Fixed {
        atan2(self.y, self.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Tolerance in raw units (~0.0002).
    const TOL: i32 = 14;

    fn close(a: Fixed, b: Fixed) -> bool {
        (a.raw() - b.raw()).abs() <= TOL
    }

    #[test]
    fn sin_cardinal_points() {
        assert_eq!(sin(Fixed::ZERO), Fixed::ZERO);
        assert!(close(sin(Fixed::FRAC_PI_2), Fixed::ONE));
        assert!(close(sin(Fixed::PI), Fixed::ZERO));
        assert!(close(sin(-Fixed::FRAC_PI_2), -Fixed::ONE));
        assert!(close(cos(Fixed::ZERO), Fixed::ONE));
        assert!(close(cos(Fixed::PI), -Fixed::ONE));
    }

    #[test]
    fn sin_of_pi_over_six_is_half() {
        let pi_6 = Fixed::from_raw(Fixed::PI.raw() / 6);
        assert!(close(sin(pi_6), Fixed::HALF), "got {}", sin(pi_6));
    }

    #[test]
    fn atan2_quadrants() {
        let one = Fixed::ONE;
        let quarter = Fixed::from_raw(Fixed::PI.raw() / 4);
        assert!(close(atan2(one, one), quarter));
        assert!(close(atan2(one, -one), Fixed::PI - quarter));
        assert!(close(atan2(-one, -one), -(Fixed::PI - quarter)));
        assert!(close(atan2(-one, one), -quarter));
    }

    #[test]
    fn atan2_axes() {
        let one = Fixed::ONE;
        assert_eq!(atan2(Fixed::ZERO, Fixed::ZERO), Fixed::ZERO);
        assert_eq!(atan2(Fixed::ZERO, one), Fixed::ZERO);
        assert_eq!(atan2(one, Fixed::ZERO), Fixed::FRAC_PI_2);
        assert_eq!(atan2(Fixed::ZERO, -one), Fixed::PI);
        assert_eq!(atan2(-one, Fixed::ZERO), -Fixed::FRAC_PI_2);
    }

    #[test]
    fn from_angle_round_trips_through_angle() {
        let v = Vec2::from_angle(Fixed::from_ratio(1, 3).unwrap());
        assert!(close(v.angle(), Fixed::from_ratio(1, 3).unwrap()));
    }

    proptest! {
        #[test]
        fn sin_is_periodic(raw in -2_000_000i32..2_000_000) {
            let a = Fixed::from_raw(raw);
            prop_assert_eq!(sin(a), sin(a + Fixed::TAU));
        }

        #[test]
        fn pythagorean_identity_holds(raw in -500_000i32..500_000) {
            let (s, c) = sin_cos(Fixed::from_raw(raw));
            let sum = s * s + c * c;
            prop_assert!((sum.raw() - Fixed::ONE.raw()).abs() <= 40, "sum = {}", sum);
        }
    }
}
