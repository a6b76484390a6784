//! Scalar physical quantities used by capacity accounting.
//!
//! These are deliberately minimal: a pocket needs to add, subtract, compare,
//! and print volumes and masses, and nothing else. Both types are signed so
//! that a "remaining capacity" can go negative while an overflow violation is
//! pending resolution.

use core::fmt;
use core::iter::Sum;
use core::ops;

use ordered_float::NotNan;

/// An interior volume, stored in whole milliliters.
///
/// Construct with [`Volume::from_milliliters`] or [`Volume::from_liters`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Volume(i64);

/// A mass, stored in whole grams.
///
/// Construct with [`Mass::from_grams`] or [`Mass::from_kilograms`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Mass(i64);

impl Volume {
    /// Zero volume.
    pub const ZERO: Self = Self(0);

    /// Constructs a volume from a number of milliliters.
    #[inline]
    pub const fn from_milliliters(ml: i64) -> Self {
        Self(ml)
    }

    /// Constructs a volume from a number of liters.
    #[inline]
    pub const fn from_liters(l: i64) -> Self {
        Self(l * 1000)
    }

    /// Returns the volume as a number of milliliters.
    #[inline]
    pub const fn milliliters(self) -> i64 {
        self.0
    }

    /// Returns whether this volume is negative, i.e. a capacity deficit.
    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl Mass {
    /// Zero mass.
    pub const ZERO: Self = Self(0);

    /// Constructs a mass from a number of grams.
    #[inline]
    pub const fn from_grams(g: i64) -> Self {
        Self(g)
    }

    /// Constructs a mass from a number of kilograms.
    #[inline]
    pub const fn from_kilograms(kg: i64) -> Self {
        Self(kg * 1000)
    }

    /// Returns the mass as a number of grams.
    #[inline]
    pub const fn grams(self) -> i64 {
        self.0
    }

    /// Returns whether this mass is negative, i.e. a capacity deficit.
    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Scales this mass by a multiplier, rounding to the nearest gram.
    ///
    /// Used for pockets whose contents weigh more or less than they would
    /// loose (e.g. a compression sack).
    #[inline]
    pub fn scale(self, factor: NotNan<f32>) -> Self {
        // Plain f64 math: the inputs are game data, well inside exact range.
        #[allow(clippy::cast_possible_truncation)]
        Self((self.0 as f64 * f64::from(factor.into_inner())).round() as i64)
    }
}

macro_rules! impl_quantity_ops {
    ($t:ty) => {
        impl ops::Add for $t {
            type Output = Self;
            #[inline]
            fn add(self, rhs: Self) -> Self {
                Self(self.0 + rhs.0)
            }
        }
        impl ops::Sub for $t {
            type Output = Self;
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                Self(self.0 - rhs.0)
            }
        }
        impl ops::AddAssign for $t {
            #[inline]
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }
        impl ops::SubAssign for $t {
            #[inline]
            fn sub_assign(&mut self, rhs: Self) {
                self.0 -= rhs.0;
            }
        }
        impl Sum for $t {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                iter.fold(Self(0), |a, b| a + b)
            }
        }
    };
}
impl_quantity_ops!(Volume);
impl_quantity_ops!(Mass);

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.abs() >= 1000 && self.0 % 250 == 0 {
            write!(f, "{} L", self.0 as f64 / 1000.0)
        } else {
            write!(f, "{} ml", self.0)
        }
    }
}

impl fmt::Display for Mass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.abs() >= 1000 && self.0 % 250 == 0 {
            write!(f, "{} kg", self.0 as f64 / 1000.0)
        } else {
            write!(f, "{} g", self.0)
        }
    }
}
