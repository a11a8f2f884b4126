use anyhow::{Error, Result, anyhow};
use fraction::{BigFraction, BigUint, GenericFraction, Sign};
use num::{BigInt, BigRational, FromPrimitive, ToPrimitive};
use num_integer::Integer;
use num_rational::Ratio;
use std::{
    borrow::Borrow,
    cmp::Ordering,
    hash::Hash,
    iter::Sum,
    ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use super::{
    fraction::UInt,
    traits::{Number, One, Scalar, Signed, Zero},
};

#[derive(Clone)]
pub struct FractionExact(pub fraction::BigFraction);

impl FractionExact {
    /**
     * Converts into a num-rational value, which carries its sign in the numerator.
     * Fails for the non-finite values of the underlying fraction.
     */
    pub fn to_big_rational(&self) -> Result<BigRational> {
        match (self.0.sign(), self.0.numer(), self.0.denom()) {
            (Some(sign), Some(numer), Some(denom)) => {
                let sign = match sign {
                    Sign::Plus => num_bigint::Sign::Plus,
                    Sign::Minus => num_bigint::Sign::Minus,
                };
                Ok(BigRational::new(
                    BigInt::from_biguint(sign, numer.clone()),
                    BigInt::from(denom.clone()),
                ))
            }
            _ => Err(anyhow!("{} is not a finite rational", self)),
        }
    }

    pub fn from_big_rational(value: &BigRational) -> Self {
        let sign = if value.numer() < &BigInt::from(0) {
            Sign::Minus
        } else {
            Sign::Plus
        };
        Self(GenericFraction::Rational(
            sign,
            Ratio::new(
                value.numer().magnitude().clone(),
                value.denom().magnitude().clone(),
            ),
        ))
    }

    /**
     * The integer value of self, if self is an integer.
     */
    pub fn to_big_int(&self) -> Option<BigInt> {
        let rational = self.to_big_rational().ok()?;
        if rational.is_integer() {
            Some(rational.to_integer())
        } else {
            None
        }
    }

    /**
     * Exact binary value of a finite float.
     */
    pub fn from_f64(value: f64) -> Result<Self> {
        BigRational::from_f64(value)
            .map(|rational| Self::from_big_rational(&rational))
            .ok_or_else(|| anyhow!("cannot represent {} as a rational", value))
    }

    fn with_rational(&self, f: impl FnOnce(BigRational) -> BigRational) -> Self {
        match self.to_big_rational() {
            Ok(rational) => Self::from_big_rational(&f(rational)),
            Err(_) => self.clone(),
        }
    }
}

impl One for FractionExact {
    fn one() -> Self {
        Self(GenericFraction::Rational(Sign::Plus, num::One::one()))
    }

    fn is_one(&self) -> bool {
        fraction::One::is_one(&self.0)
    }
}

impl Zero for FractionExact {
    fn zero() -> Self {
        Self(GenericFraction::Rational(Sign::Plus, num::Zero::zero()))
    }

    fn is_zero(&self) -> bool {
        fraction::Zero::is_zero(&self.0)
    }
}

impl Signed for FractionExact {
    fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    fn is_positive(&self) -> bool {
        !fraction::Zero::is_zero(&self.0) && fraction::Signed::is_positive(&self.0)
    }

    fn is_negative(&self) -> bool {
        !fraction::Zero::is_zero(&self.0) && fraction::Signed::is_negative(&self.0)
    }
}

impl Number for FractionExact {
    fn floor(&self) -> Self {
        self.with_rational(|rational| rational.floor())
    }

    fn ceil(&self) -> Self {
        self.with_rational(|rational| rational.ceil())
    }

    fn is_integer(&self) -> bool {
        self.0.denom().is_some_and(|denom| num::One::is_one(denom))
    }

    fn gcd(&self, other: &Self) -> Self {
        match (
            self.0.numer(),
            self.0.denom(),
            other.0.numer(),
            other.0.denom(),
        ) {
            (Some(n1), Some(d1), Some(n2), Some(d2)) => {
                let numer = n1.gcd(n2);
                let denom = d1.lcm(d2);
                Self(GenericFraction::Rational(Sign::Plus, Ratio::new(numer, denom)))
            }
            _ => Self::one(),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl Scalar for FractionExact {
    fn is_exact() -> bool {
        true
    }

    fn zero_tolerance() -> f64 {
        0.0
    }

    fn from_exact(value: &FractionExact) -> Self {
        value.clone()
    }

    fn to_exact(&self) -> FractionExact {
        self.clone()
    }

    fn to_f64(&self) -> f64 {
        self.to_big_rational()
            .ok()
            .and_then(|rational| rational.to_f64())
            .unwrap_or(f64::NAN)
    }

    fn snap_to_zero(&mut self, _threshold: f64) {}

    fn approx_eq(&self, other: &Self, _tolerance: f64) -> bool {
        self == other
    }
}

impl FromStr for FractionExact {
    type Err = Error;

    fn from_str(s: &str) -> std::prelude::v1::Result<Self, Self::Err> {
        let result = BigFraction::from_str(s)?;
        if result.is_nan() || result.is_infinite() {
            return Err(anyhow!("`{}` is not a finite rational", s));
        }
        Ok(Self(result))
    }
}

impl From<&FractionExact> for FractionExact {
    fn from(value: &FractionExact) -> Self {
        value.clone()
    }
}

impl TryFrom<BigUint> for FractionExact {
    type Error = Error;

    fn try_from(value: BigUint) -> std::prelude::v1::Result<Self, Self::Error> {
        Ok(Self(GenericFraction::Rational(
            Sign::Plus,
            Ratio::new(value, UInt::from(1u32)),
        )))
    }
}

impl From<&BigInt> for FractionExact {
    fn from(value: &BigInt) -> Self {
        Self::from_big_rational(&BigRational::from_integer(value.clone()))
    }
}

impl TryFrom<(BigUint, BigUint)> for FractionExact {
    type Error = Error;

    fn try_from(value: (BigUint, BigUint)) -> std::prelude::v1::Result<Self, Self::Error> {
        if num::Zero::is_zero(&value.1) {
            return Err(anyhow!("denominator of a fraction cannot be zero"));
        }
        Ok(Self(GenericFraction::Rational(
            Sign::Plus,
            Ratio::new(value.0, value.1),
        )))
    }
}

impl std::fmt::Display for FractionExact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::fmt::Debug for FractionExact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<&FractionExact> for &FractionExact {
    type Output = FractionExact;

    fn add(self, rhs: &FractionExact) -> Self::Output {
        match (self, rhs) {
            (FractionExact(x), FractionExact(y)) => FractionExact(x.add(y)),
        }
    }
}

impl Add<&FractionExact> for FractionExact {
    type Output = FractionExact;

    fn add(mut self, rhs: &FractionExact) -> Self::Output {
        self.0.add_assign(&rhs.0);
        self
    }
}

impl Add for FractionExact {
    type Output = FractionExact;

    fn add(self, rhs: FractionExact) -> Self::Output {
        FractionExact(self.0 + rhs.0)
    }
}

impl<T> AddAssign<T> for FractionExact
where
    T: Borrow<FractionExact>,
{
    fn add_assign(&mut self, rhs: T) {
        let rhs = rhs.borrow();
        match (self, rhs) {
            (FractionExact(x), FractionExact(y)) => x.add_assign(y),
        }
    }
}

impl Sub<&FractionExact> for &FractionExact {
    type Output = FractionExact;

    fn sub(self, rhs: &FractionExact) -> Self::Output {
        match (self, rhs) {
            (FractionExact(x), FractionExact(y)) => FractionExact(x.sub(y)),
        }
    }
}

impl Sub<&FractionExact> for FractionExact {
    type Output = FractionExact;

    fn sub(mut self, rhs: &FractionExact) -> Self::Output {
        self.0.sub_assign(&rhs.0);
        self
    }
}

impl Sub for FractionExact {
    type Output = FractionExact;

    fn sub(self, rhs: FractionExact) -> Self::Output {
        FractionExact(self.0 - rhs.0)
    }
}

impl<T> SubAssign<T> for FractionExact
where
    T: Borrow<FractionExact>,
{
    fn sub_assign(&mut self, rhs: T) {
        let rhs = rhs.borrow();
        match (self, rhs) {
            (FractionExact(x), FractionExact(y)) => x.sub_assign(y),
        }
    }
}

impl Mul<&FractionExact> for &FractionExact {
    type Output = FractionExact;

    fn mul(self, rhs: &FractionExact) -> Self::Output {
        match (self, rhs) {
            (FractionExact(x), FractionExact(y)) => FractionExact(x.mul(y)),
        }
    }
}

impl Mul<&FractionExact> for FractionExact {
    type Output = FractionExact;

    fn mul(mut self, rhs: &FractionExact) -> Self::Output {
        self.0.mul_assign(&rhs.0);
        self
    }
}

impl Mul for FractionExact {
    type Output = FractionExact;

    fn mul(self, rhs: FractionExact) -> Self::Output {
        FractionExact(self.0 * rhs.0)
    }
}

impl<T> MulAssign<T> for FractionExact
where
    T: Borrow<FractionExact>,
{
    fn mul_assign(&mut self, rhs: T) {
        let rhs = rhs.borrow();
        match (self, rhs) {
            (FractionExact(x), FractionExact(y)) => x.mul_assign(y),
        }
    }
}

impl Div<&FractionExact> for &FractionExact {
    type Output = FractionExact;

    fn div(self, rhs: &FractionExact) -> Self::Output {
        match (self, rhs) {
            (FractionExact(x), FractionExact(y)) => FractionExact(x.div(y)),
        }
    }
}

impl Div<&FractionExact> for FractionExact {
    type Output = FractionExact;

    fn div(mut self, rhs: &FractionExact) -> Self::Output {
        self.0.div_assign(&rhs.0);
        self
    }
}

impl Div for FractionExact {
    type Output = FractionExact;

    fn div(self, rhs: FractionExact) -> Self::Output {
        FractionExact(self.0 / rhs.0)
    }
}

impl<T> DivAssign<T> for FractionExact
where
    T: Borrow<FractionExact>,
{
    fn div_assign(&mut self, rhs: T) {
        let rhs = rhs.borrow();
        match (self, rhs) {
            (FractionExact(x), FractionExact(y)) => x.div_assign(y),
        }
    }
}

impl Neg for FractionExact {
    type Output = FractionExact;

    fn neg(self) -> Self::Output {
        FractionExact(self.0.neg())
    }
}

impl<'a> Neg for &'a FractionExact {
    type Output = FractionExact;

    fn neg(self) -> Self::Output {
        match self {
            FractionExact(f) => FractionExact(f.neg()),
        }
    }
}

impl PartialEq for FractionExact {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FractionExact(x), FractionExact(y)) => {
                x == y || (fraction::Zero::is_zero(x) && fraction::Zero::is_zero(y))
            }
        }
    }
}

impl Eq for FractionExact {}

impl PartialOrd for FractionExact {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FractionExact {
    fn cmp(&self, other: &Self) -> Ordering {
        if self == other {
            Ordering::Equal
        } else {
            self.0.cmp(&other.0)
        }
    }
}

impl Hash for FractionExact {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            FractionExact(f) => f.hash(state),
        }
    }
}

impl Sum for FractionExact {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |sum, f| &sum + &f)
    }
}

impl<'a> Sum<&'a FractionExact> for FractionExact {
    fn sum<I: Iterator<Item = &'a FractionExact>>(iter: I) -> Self {
        iter.fold(FractionExact::zero(), |sum, f| &sum + f)
    }
}

//======================== primitive types ========================//

macro_rules! from {
    ($t:ident) => {
        impl From<$t> for FractionExact {
            fn from(value: $t) -> Self {
                Self(GenericFraction::Rational(
                    Sign::Plus,
                    Ratio::new(UInt::from(value), UInt::from(1u32)),
                ))
            }
        }
    };
}

macro_rules! from_signed {
    ($t:ident) => {
        impl From<$t> for FractionExact {
            fn from(value: $t) -> Self {
                Self(GenericFraction::Rational(
                    if value < 0 { Sign::Minus } else { Sign::Plus },
                    Ratio::new(UInt::from(value.unsigned_abs()), UInt::from(1u32)),
                ))
            }
        }
    };
}

macro_rules! from_tuple_u_u {
    ($t:ident,$tt:ident) => {
        impl From<($t, $tt)> for FractionExact {
            fn from(value: ($t, $tt)) -> Self {
                FractionExact(GenericFraction::Rational(
                    Sign::Plus,
                    Ratio::new(UInt::from(value.0), UInt::from(value.1)),
                ))
            }
        }
    };
}

macro_rules! from_tuple_i_i {
    ($t:ident,$tt:ident) => {
        impl From<($t, $tt)> for FractionExact {
            fn from(value: ($t, $tt)) -> Self {
                let s0 = if value.0 < 0 { Sign::Minus } else { Sign::Plus };
                let s1 = if value.1 < 0 { Sign::Minus } else { Sign::Plus };
                Self(GenericFraction::Rational(
                    s0 * s1,
                    Ratio::new(
                        UInt::from(value.0.unsigned_abs()),
                        UInt::from(value.1.unsigned_abs()),
                    ),
                ))
            }
        }
    };
}

from!(usize);
from!(u64);
from!(u32);
from_signed!(i128);
from_signed!(i64);
from_signed!(i32);
from_tuple_u_u!(u64, u64);
from_tuple_u_u!(usize, usize);
from_tuple_i_i!(i64, i64);
from_tuple_i_i!(i32, i32);
