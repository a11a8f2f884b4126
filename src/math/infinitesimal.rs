use std::{
    cmp::Ordering,
    fmt::Display,
    ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign},
};

use super::traits::{Number, One, Scalar, Signed, Zero};

/**
 * A value `real + delta·δ`, where δ is a symbolic positive number smaller than any positive magnitude the
 * tableau currently deals with. Values are ordered lexicographically on (real, delta), so that a strict bound
 * `x < c` can be stated as the weak bound `x ≤ c - δ`.
 *
 * Products and quotients are first-order: the δ² term is dropped, which preserves the order of all values
 * for a sufficiently small δ.
 */
#[derive(Debug, Clone)]
pub struct Infinitesimal<F> {
    pub real: F,
    pub delta: F,
}

impl<F: Number> Infinitesimal<F> {
    pub fn new(real: F, delta: F) -> Self {
        Self { real, delta }
    }

    pub fn from_real(real: F) -> Self {
        Self {
            real,
            delta: F::zero(),
        }
    }

    pub fn has_delta(&self) -> bool {
        !self.delta.is_zero()
    }

    /// Multiplication by a scalar.
    pub fn scale(&self, factor: &F) -> Self {
        Self {
            real: self.real.clone() * factor,
            delta: self.delta.clone() * factor,
        }
    }

    /// Division by a scalar.
    pub fn divide(&self, divisor: &F) -> Self {
        Self {
            real: self.real.clone() / divisor,
            delta: self.delta.clone() / divisor,
        }
    }

    /// self += factor · other
    pub fn add_scaled(&mut self, other: &Self, factor: &F) {
        self.real += &(other.real.clone() * factor);
        self.delta += &(other.delta.clone() * factor);
    }

    /// The concrete value of self for a concrete δ.
    pub fn materialise(&self, delta_value: &F) -> F {
        self.real.clone() + self.delta.clone() * delta_value
    }
}

impl<F: Scalar> Infinitesimal<F> {
    pub fn snap_to_zero(&mut self, threshold: f64) {
        self.real.snap_to_zero(threshold);
        self.delta.snap_to_zero(threshold);
    }

    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.real.approx_eq(&other.real, tolerance) && self.delta.approx_eq(&other.delta, tolerance)
    }
}

impl<F: Number> From<F> for Infinitesimal<F> {
    fn from(value: F) -> Self {
        Self::from_real(value)
    }
}

impl<F: Number> Zero for Infinitesimal<F> {
    fn zero() -> Self {
        Self::from_real(F::zero())
    }

    fn is_zero(&self) -> bool {
        self.real.is_zero() && self.delta.is_zero()
    }
}

impl<F: Number> One for Infinitesimal<F> {
    fn one() -> Self {
        Self::from_real(F::one())
    }

    fn is_one(&self) -> bool {
        self.real.is_one() && self.delta.is_zero()
    }
}

impl<F: Number> Signed for Infinitesimal<F> {
    fn abs(&self) -> Self {
        if self.is_negative() {
            -self.clone()
        } else {
            self.clone()
        }
    }

    fn is_positive(&self) -> bool {
        self.real.is_positive() || (self.real.is_zero() && self.delta.is_positive())
    }

    fn is_negative(&self) -> bool {
        self.real.is_negative() || (self.real.is_zero() && self.delta.is_negative())
    }
}

impl<F: Number> Number for Infinitesimal<F> {
    fn floor(&self) -> Self {
        if self.real.is_integer() {
            if self.delta.is_negative() {
                Self::from_real(self.real.floor() - F::one())
            } else {
                Self::from_real(self.real.floor())
            }
        } else {
            Self::from_real(self.real.floor())
        }
    }

    fn ceil(&self) -> Self {
        if self.real.is_integer() {
            if self.delta.is_positive() {
                Self::from_real(self.real.ceil() + F::one())
            } else {
                Self::from_real(self.real.ceil())
            }
        } else {
            Self::from_real(self.real.ceil())
        }
    }

    fn is_integer(&self) -> bool {
        self.real.is_integer() && self.delta.is_zero()
    }

    /// The gcd of the real parts; values carrying a δ-term have no common rational divisor and yield one.
    fn gcd(&self, other: &Self) -> Self {
        if self.has_delta() || other.has_delta() {
            Self::one()
        } else {
            Self::from_real(self.real.gcd(&other.real))
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match self.real.compare(&other.real) {
            Ordering::Equal => self.delta.compare(&other.delta),
            ordering => ordering,
        }
    }
}

impl<F: Number> PartialEq for Infinitesimal<F> {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl<F: Number> PartialOrd for Infinitesimal<F> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl<F: Number> Display for Infinitesimal<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.delta.is_zero() {
            write!(f, "{}", self.real)
        } else if self.delta.is_negative() {
            write!(f, "{} - {}δ", self.real, -self.delta.clone())
        } else {
            write!(f, "{} + {}δ", self.real, self.delta)
        }
    }
}

impl<'a, F: Number> Add<&'a Infinitesimal<F>> for Infinitesimal<F> {
    type Output = Infinitesimal<F>;

    fn add(mut self, rhs: &'a Infinitesimal<F>) -> Self::Output {
        self += rhs;
        self
    }
}

impl<F: Number> Add for Infinitesimal<F> {
    type Output = Infinitesimal<F>;

    fn add(self, rhs: Infinitesimal<F>) -> Self::Output {
        self + &rhs
    }
}

impl<'a, F: Number> AddAssign<&'a Infinitesimal<F>> for Infinitesimal<F> {
    fn add_assign(&mut self, rhs: &'a Infinitesimal<F>) {
        self.real += &rhs.real;
        self.delta += &rhs.delta;
    }
}

impl<'a, F: Number> Sub<&'a Infinitesimal<F>> for Infinitesimal<F> {
    type Output = Infinitesimal<F>;

    fn sub(mut self, rhs: &'a Infinitesimal<F>) -> Self::Output {
        self -= rhs;
        self
    }
}

impl<F: Number> Sub for Infinitesimal<F> {
    type Output = Infinitesimal<F>;

    fn sub(self, rhs: Infinitesimal<F>) -> Self::Output {
        self - &rhs
    }
}

impl<'a, F: Number> SubAssign<&'a Infinitesimal<F>> for Infinitesimal<F> {
    fn sub_assign(&mut self, rhs: &'a Infinitesimal<F>) {
        self.real -= &rhs.real;
        self.delta -= &rhs.delta;
    }
}

impl<'a, F: Number> Mul<&'a Infinitesimal<F>> for Infinitesimal<F> {
    type Output = Infinitesimal<F>;

    fn mul(mut self, rhs: &'a Infinitesimal<F>) -> Self::Output {
        self *= rhs;
        self
    }
}

impl<F: Number> Mul for Infinitesimal<F> {
    type Output = Infinitesimal<F>;

    fn mul(self, rhs: Infinitesimal<F>) -> Self::Output {
        self * &rhs
    }
}

impl<'a, F: Number> MulAssign<&'a Infinitesimal<F>> for Infinitesimal<F> {
    fn mul_assign(&mut self, rhs: &'a Infinitesimal<F>) {
        // (a + bδ)(c + dδ) = ac + (ad + bc)δ
        let delta = self.real.clone() * &rhs.delta + self.delta.clone() * &rhs.real;
        self.real *= &rhs.real;
        self.delta = delta;
    }
}

impl<'a, F: Number> Div<&'a Infinitesimal<F>> for Infinitesimal<F> {
    type Output = Infinitesimal<F>;

    fn div(mut self, rhs: &'a Infinitesimal<F>) -> Self::Output {
        self /= rhs;
        self
    }
}

impl<F: Number> Div for Infinitesimal<F> {
    type Output = Infinitesimal<F>;

    fn div(self, rhs: Infinitesimal<F>) -> Self::Output {
        self / &rhs
    }
}

impl<'a, F: Number> DivAssign<&'a Infinitesimal<F>> for Infinitesimal<F> {
    fn div_assign(&mut self, rhs: &'a Infinitesimal<F>) {
        // (a + bδ)/(c + dδ) = a/c + ((bc - ad)/c²)δ
        let c_squared = rhs.real.clone() * &rhs.real;
        let delta =
            (self.delta.clone() * &rhs.real - self.real.clone() * &rhs.delta) / c_squared;
        self.real /= &rhs.real;
        self.delta = delta;
    }
}

impl<F: Number> Neg for Infinitesimal<F> {
    type Output = Infinitesimal<F>;

    fn neg(self) -> Self::Output {
        Self {
            real: -self.real,
            delta: -self.delta,
        }
    }
}
