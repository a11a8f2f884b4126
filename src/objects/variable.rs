use std::fmt::Display;

use strum_macros::{Display as StrumDisplay, EnumIter, EnumString};

use crate::math::fraction::Fraction;

/**
 * The declared numeric type of a problem variable. Integral kinds require an integral witness value; the
 * bounded integral kinds additionally restrict the value to the range of the type.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, StrumDisplay, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum NumericKind {
    Byte,
    Short,
    Char,
    Int,
    Long,
    /// An integral variable without a type range.
    Integer,
    Float,
    Double,
    /// A rational variable without a type range.
    Real,
}

impl NumericKind {
    pub fn is_integral(&self) -> bool {
        match self {
            NumericKind::Byte
            | NumericKind::Short
            | NumericKind::Char
            | NumericKind::Int
            | NumericKind::Long
            | NumericKind::Integer => true,
            NumericKind::Float | NumericKind::Double | NumericKind::Real => false,
        }
    }

    /**
     * The inclusive value range of a bounded integral kind.
     */
    pub fn range(&self) -> Option<(i128, i128)> {
        match self {
            NumericKind::Byte => Some((i8::MIN as i128, i8::MAX as i128)),
            NumericKind::Short => Some((i16::MIN as i128, i16::MAX as i128)),
            NumericKind::Char => Some((u16::MIN as i128, u16::MAX as i128)),
            NumericKind::Int => Some((i32::MIN as i128, i32::MAX as i128)),
            NumericKind::Long => Some((i64::MIN as i128, i64::MAX as i128)),
            NumericKind::Integer
            | NumericKind::Float
            | NumericKind::Double
            | NumericKind::Real => None,
        }
    }

    pub fn range_as_fractions(&self) -> Option<(Fraction, Fraction)> {
        self.range()
            .map(|(min, max)| (Fraction::from(min), Fraction::from(max)))
    }
}

/**
 * A problem unknown: a name and the numeric type it was declared with.
 */
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    name: String,
    kind: NumericKind,
}

impl Variable {
    pub fn new(name: impl Into<String>, kind: NumericKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, NumericKind::Integer)
    }

    pub fn real(name: impl Into<String>) -> Self {
        Self::new(name, NumericKind::Real)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NumericKind {
        self.kind
    }

    pub fn is_integral(&self) -> bool {
        self.kind.is_integral()
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::{NumericKind, Variable};

    #[test]
    fn kinds_parse() {
        assert_eq!(NumericKind::from_str("int").unwrap(), NumericKind::Int);
        assert_eq!(NumericKind::from_str("double").unwrap(), NumericKind::Double);
        assert!(NumericKind::from_str("quaternion").is_err());
    }

    #[test]
    fn ranges_only_for_bounded_integral_kinds() {
        for kind in NumericKind::iter() {
            if kind.range().is_some() {
                assert!(kind.is_integral(), "{} has a range", kind);
            }
        }
        assert_eq!(NumericKind::Byte.range(), Some((-128, 127)));
        assert_eq!(NumericKind::Char.range(), Some((0, 65535)));
        assert_eq!(NumericKind::Integer.range(), None);
    }

    #[test]
    fn variables() {
        let x = Variable::integer("x");
        assert!(x.is_integral());
        assert_eq!(x.to_string(), "x");
        assert!(!Variable::real("y").is_integral());
    }
}
