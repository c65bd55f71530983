//! Fixed-point math utilities for deterministic simulation.
//!
//! All battle simulation uses fixed-point arithmetic so that identical
//! placements driven with identical time steps produce bit-identical
//! results on every platform. Floating-point values only appear at the
//! data-file boundary (see [`fixed_decimal`]).

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Point or direction on the arena ground plane.
///
/// The arena is rendered in 3D, but the simulation only ever looks at the
/// horizontal `x`/`z` axes. Height is purely cosmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate. Negative is the RED half, positive the BLUE half.
    #[serde(with = "fixed_decimal")]
    pub x: Fixed,
    /// Z coordinate (depth across the arena).
    #[serde(with = "fixed_decimal")]
    pub z: Fixed,
}

/// Serde support for fixed-point numbers written by hand.
///
/// Catalog, config and scenario files carry plain decimals such as `1.2` or
/// `0.8`. They are converted once at load time; simulation state itself
/// never touches floats.
pub mod fixed_decimal {
    use super::Fixed;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_num::<f64>().serialize(serializer)
    }

    /// Deserialize a fixed-point number from a decimal.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| D::Error::custom(format!("{value} is not representable as I32F32")))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, z: Fixed) -> Self {
        Self { x, z }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        z: Fixed::ZERO,
    };

    /// Build a vector from integer coordinates.
    #[must_use]
    pub fn from_ints(x: i32, z: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(z))
    }

    /// Calculate squared distance (avoids sqrt for comparisons).
    ///
    /// Saturates at `Fixed::MAX` instead of overflowing.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        (self - other).dot(self - other)
    }

    /// Euclidean distance on the ground plane.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// Dot product of two vectors, saturating.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.z.saturating_mul(other.z))
    }

    /// Length of the vector.
    #[must_use]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.dot(self))
    }

    /// Multiply both components by a scalar, saturating.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x.saturating_mul(factor), self.z.saturating_mul(factor))
    }

    /// Normalize vector using fixed-point math.
    ///
    /// The zero vector normalizes to zero.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.z / len)
    }

    /// Clamp each axis independently into `[-bound, bound]`.
    #[must_use]
    pub fn clamp_axes(self, bound: Fixed) -> Self {
        Self::new(self.x.clamp(-bound, bound), self.z.clamp(-bound, bound))
    }

    /// Whether both axes lie within `[-bound, bound]`.
    #[must_use]
    pub fn within(self, bound: Fixed) -> bool {
        self.x.abs() <= bound && self.z.abs() <= bound
    }
}

/// Computes the square root of a fixed-point number.
///
/// Works on the raw bits: for `I32F32` the result bits `r` are the integer
/// square root of `bits << 32`, found by binary search. Exact for perfect
/// squares, rounded down otherwise. Non-positive input yields zero.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let scaled = u128::from(value.to_bits().unsigned_abs()) << Fixed::FRAC_NBITS;

    // low² <= scaled < high²
    let mut low: u128 = 0;
    let mut high: u128 = 1 << 48;
    while high - low > 1 {
        let mid = low + (high - low) / 2;
        if mid * mid <= scaled {
            low = mid;
        } else {
            high = mid;
        }
    }

    Fixed::from_bits(i64::try_from(low).unwrap_or(i64::MAX))
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_add(rhs.x),
            z: self.z.saturating_add(rhs.z),
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_sub(rhs.x),
            z: self.z.saturating_sub(rhs.z),
        }
    }
}

impl std::ops::AddAssign for Vec2Fixed {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::SubAssign for Vec2Fixed {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}
