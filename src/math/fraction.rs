use strum_macros::{Display, EnumString};

/**
 * The exact rational in which relations are stated and witnesses are reported, regardless of the arithmetic
 * the tableau uses internally.
 */
pub type Fraction = super::fraction_exact::FractionExact;

pub type UInt = fraction::BigUint;

/**
 * The number representation a solver instance computes with. Exact arithmetic cannot be combined with
 * approximate arithmetic inside one tableau; the choice is made once, when the solver is created.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Arithmetic {
    #[default]
    Exact,
    Approximate,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::Arithmetic;

    #[test]
    fn arithmetic_names() {
        assert_eq!(Arithmetic::from_str("exact").unwrap(), Arithmetic::Exact);
        assert_eq!(
            Arithmetic::from_str("approximate").unwrap(),
            Arithmetic::Approximate
        );
        assert_eq!(Arithmetic::Approximate.to_string(), "approximate");
    }
}
