use std::{
    cmp::Ordering,
    fmt::{Debug, Display},
    ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign},
};

use super::fraction_exact::FractionExact;

pub trait One: Sized {
    fn one() -> Self;

    fn set_one(&mut self) {
        *self = One::one();
    }

    fn is_one(&self) -> bool;
}

pub trait Zero: Sized {
    fn zero() -> Self;

    fn set_zero(&mut self) {
        *self = Zero::zero();
    }

    fn is_zero(&self) -> bool;
}

pub trait Signed: Sized {
    fn abs(&self) -> Self;

    /// Returns true if the number is positive and false if the number is zero or negative.
    fn is_positive(&self) -> bool;

    /// Returns true if the number is negative and false if the number is zero or positive.
    fn is_negative(&self) -> bool;
}

/**
 * The capabilities every number representation of the tableau offers: field operations, comparison,
 * rounding and gcd. Implemented by the exact and the approximate scalars, and by the infinitesimal
 * extension of either.
 */
pub trait Number:
    Clone
    + Debug
    + Display
    + PartialEq
    + Zero
    + One
    + Signed
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + for<'a> Add<&'a Self, Output = Self>
    + for<'a> Sub<&'a Self, Output = Self>
    + for<'a> Mul<&'a Self, Output = Self>
    + for<'a> Div<&'a Self, Output = Self>
    + for<'a> AddAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
{
    /// Largest integer that is not larger than self.
    fn floor(&self) -> Self;

    /// Smallest integer that is not smaller than self.
    fn ceil(&self) -> Self;

    fn is_integer(&self) -> bool;

    /**
     * Greatest common divisor of two rationals: the largest rational g such that both self/g and other/g are integers.
     * The result is never negative.
     */
    fn gcd(&self, other: &Self) -> Self;

    /// self - floor(self), always in [0, 1).
    fn fract(&self) -> Self {
        self.clone() - self.floor()
    }

    /// Total order that respects the zero tolerance of the representation.
    fn compare(&self, other: &Self) -> Ordering {
        let difference = self.clone() - other;
        if difference.is_zero() {
            Ordering::Equal
        } else if difference.is_negative() {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }
}

/**
 * A base (non-infinitesimal) number representation. Values enter and leave the solver as exact rationals;
 * a scalar converts from and to them.
 */
pub trait Scalar: Number {
    /// Whether arithmetic in this representation is free of rounding.
    fn is_exact() -> bool;

    /// Magnitude below which `is_zero` holds; snapping never uses a smaller threshold.
    fn zero_tolerance() -> f64;

    fn from_exact(value: &FractionExact) -> Self;

    fn to_exact(&self) -> FractionExact;

    fn to_f64(&self) -> f64;

    /// Replaces the value by an exact zero if its magnitude is below the threshold. Exact scalars never change.
    fn snap_to_zero(&mut self, threshold: f64);

    /// Equality up to an absolute or relative tolerance; exact scalars ignore the tolerance.
    fn approx_eq(&self, other: &Self, tolerance: f64) -> bool;
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use crate::math::{
        fraction_exact::FractionExact,
        fraction_f64::FractionF64,
        traits::Number,
    };

    #[test]
    fn compare_respects_tolerance() {
        let a = FractionF64(0.1 + 0.2);
        let b = FractionF64(0.3);
        assert_eq!(a.compare(&b), Ordering::Equal);

        let a = FractionExact::from((1, 3));
        let b = FractionExact::from((1, 2));
        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(b.compare(&a), Ordering::Greater);
    }

    #[test]
    fn fract_is_non_negative() {
        let x = FractionExact::from((-7, 2));
        assert_eq!(x.fract(), FractionExact::from((1, 2)));
        let y = FractionF64(-3.25);
        assert!((y.fract().0 - 0.75).abs() < 1e-12);
    }
}
