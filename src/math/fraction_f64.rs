use std::{
    borrow::Borrow,
    cmp::Ordering,
    fmt::Display,
    ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign},
};

use super::{
    fraction_exact::FractionExact,
    traits::{Number, One, Scalar, Signed, Zero},
};

/// Absolute tolerance of approximate arithmetic: zero tests, integrality and rounding.
pub const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionF64(pub f64);

impl FractionF64 {
    /// The nearest integer if self is within tolerance of it.
    fn nearby_integer(&self) -> Option<f64> {
        let rounded = self.0.round();
        if (self.0 - rounded).abs() < EPSILON {
            Some(rounded)
        } else {
            None
        }
    }
}

impl Zero for FractionF64 {
    fn zero() -> Self {
        Self(0.0)
    }

    fn is_zero(&self) -> bool {
        self.0.abs() - &EPSILON < 0.0
    }
}

impl One for FractionF64 {
    fn one() -> Self {
        Self(1.0)
    }

    fn is_one(&self) -> bool {
        (self.0 - 1.0).abs() - &EPSILON < 0.0
    }
}

impl Signed for FractionF64 {
    fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    fn is_positive(&self) -> bool {
        self.0 > EPSILON
    }

    fn is_negative(&self) -> bool {
        self.0 < -EPSILON
    }
}

impl Number for FractionF64 {
    fn floor(&self) -> Self {
        Self(self.nearby_integer().unwrap_or_else(|| self.0.floor()))
    }

    fn ceil(&self) -> Self {
        Self(self.nearby_integer().unwrap_or_else(|| self.0.ceil()))
    }

    fn is_integer(&self) -> bool {
        self.nearby_integer().is_some()
    }

    fn gcd(&self, other: &Self) -> Self {
        //Euclid on reals, stopping once the remainder drops below the tolerance
        let mut a = self.0.abs();
        let mut b = other.0.abs();
        while b > EPSILON {
            let r = a % b;
            a = b;
            b = r;
        }
        Self(a)
    }
}

impl Scalar for FractionF64 {
    fn is_exact() -> bool {
        false
    }

    fn zero_tolerance() -> f64 {
        EPSILON
    }

    fn from_exact(value: &FractionExact) -> Self {
        Self(value.to_f64())
    }

    fn to_exact(&self) -> FractionExact {
        match self.nearby_integer() {
            Some(integer) => FractionExact::from(integer as i128),
            None => FractionExact::from_f64(self.0).unwrap_or_else(|_| FractionExact::zero()),
        }
    }

    fn to_f64(&self) -> f64 {
        self.0
    }

    fn snap_to_zero(&mut self, threshold: f64) {
        if self.0.abs() < threshold {
            self.0 = 0.0;
        }
    }

    fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        let difference = (self.0 - other.0).abs();
        difference <= tolerance || difference <= tolerance * self.0.abs().max(other.0.abs())
    }
}

impl Display for FractionF64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<f64> for FractionF64 {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<i64> for FractionF64 {
    fn from(value: i64) -> Self {
        Self(value as f64)
    }
}

impl From<&FractionF64> for FractionF64 {
    fn from(value: &FractionF64) -> Self {
        *value
    }
}

impl PartialOrd for FractionF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

macro_rules! binary_operator {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:tt) => {
        impl $trait<&FractionF64> for &FractionF64 {
            type Output = FractionF64;

            fn $method(self, rhs: &FractionF64) -> Self::Output {
                FractionF64(self.0 $op rhs.0)
            }
        }

        impl $trait<&FractionF64> for FractionF64 {
            type Output = FractionF64;

            fn $method(self, rhs: &FractionF64) -> Self::Output {
                FractionF64(self.0 $op rhs.0)
            }
        }

        impl $trait for FractionF64 {
            type Output = FractionF64;

            fn $method(self, rhs: FractionF64) -> Self::Output {
                FractionF64(self.0 $op rhs.0)
            }
        }

        impl<T> $assign_trait<T> for FractionF64
        where
            T: Borrow<FractionF64>,
        {
            fn $assign_method(&mut self, rhs: T) {
                self.0 = self.0 $op rhs.borrow().0;
            }
        }
    };
}

binary_operator!(Add, add, AddAssign, add_assign, +);
binary_operator!(Sub, sub, SubAssign, sub_assign, -);
binary_operator!(Mul, mul, MulAssign, mul_assign, *);
binary_operator!(Div, div, DivAssign, div_assign, /);

impl Neg for FractionF64 {
    type Output = FractionF64;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl<'a> Neg for &'a FractionF64 {
    type Output = FractionF64;

    fn neg(self) -> Self::Output {
        FractionF64(-self.0)
    }
}
