use std::fmt::Display;

use anyhow::{Result, anyhow};
use indexmap::IndexMap;

use crate::{
    math::{
        fraction::Fraction,
        traits::{Signed, Zero},
    },
    objects::{assignment::Assignment, variable::Variable},
};

/**
 * The relational operator of a normalised relation `polynomial ⋈ 0`.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// polynomial = 0
    Equation,
    /// polynomial ≤ 0
    WeakInequality,
    /// polynomial < 0
    StrictInequality,
}

impl RelationKind {
    /// Whether `value ⋈ 0` holds.
    pub fn holds(&self, value: &Fraction) -> bool {
        match self {
            RelationKind::Equation => value.is_zero(),
            RelationKind::WeakInequality => !value.is_positive(),
            RelationKind::StrictInequality => value.is_negative(),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            RelationKind::Equation => "=",
            RelationKind::WeakInequality => "<=",
            RelationKind::StrictInequality => "<",
        }
    }
}

/**
 * A linear relation `Σ aᵢ·xᵢ + constant ⋈ 0` over problem variables with exact rational coefficients.
 * Terms with a zero coefficient are never stored.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRelation {
    coefficients: IndexMap<Variable, Fraction>,
    constant: Fraction,
    kind: RelationKind,
}

impl LinearRelation {
    pub fn new(kind: RelationKind) -> Self {
        Self {
            coefficients: IndexMap::new(),
            constant: Fraction::zero(),
            kind,
        }
    }

    pub fn equation() -> Self {
        Self::new(RelationKind::Equation)
    }

    pub fn weak() -> Self {
        Self::new(RelationKind::WeakInequality)
    }

    pub fn strict() -> Self {
        Self::new(RelationKind::StrictInequality)
    }

    /// Adds coefficient·variable, merging with an existing term of the same variable.
    pub fn add_term(&mut self, variable: Variable, coefficient: Fraction) {
        let entry = self
            .coefficients
            .entry(variable)
            .or_insert_with(Fraction::zero);
        *entry += &coefficient;
        if entry.is_zero() {
            self.coefficients.retain(|_, value| !value.is_zero());
        }
    }

    pub fn add_constant(&mut self, constant: &Fraction) {
        self.constant += constant;
    }

    pub fn with_term(mut self, variable: Variable, coefficient: impl Into<Fraction>) -> Self {
        self.add_term(variable, coefficient.into());
        self
    }

    pub fn with_constant(mut self, constant: impl Into<Fraction>) -> Self {
        let constant: Fraction = constant.into();
        self.constant += &constant;
        self
    }

    /**
     * Multiplies the polynomial by -1 and keeps the operator. Turns `p ≥ 0` (stated as `-p ≤ 0`) into the
     * normalised form and back.
     */
    pub fn negate_polynomial(mut self) -> Self {
        for coefficient in self.coefficients.values_mut() {
            *coefficient = -&*coefficient;
        }
        self.constant = -&self.constant;
        self
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    pub fn constant(&self) -> &Fraction {
        &self.constant
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Variable, &Fraction)> {
        self.coefficients.iter()
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.coefficients.keys()
    }

    pub fn coefficient(&self, variable: &Variable) -> Option<&Fraction> {
        self.coefficients.get(variable)
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    /// A relation without variables, which is either trivially true or trivially false.
    pub fn is_constant(&self) -> bool {
        self.coefficients.is_empty()
    }

    /**
     * Value of the polynomial under the assignment, in exact arithmetic.
     */
    pub fn evaluate(&self, assignment: &Assignment) -> Result<Fraction> {
        let mut sum = self.constant.clone();
        for (variable, coefficient) in &self.coefficients {
            let value = assignment
                .value(variable)
                .ok_or_else(|| anyhow!("variable {} has no value", variable))?;
            sum += &(coefficient * &value);
        }
        Ok(sum)
    }

    pub fn is_satisfied_by(&self, assignment: &Assignment) -> Result<bool> {
        Ok(self.kind.holds(&self.evaluate(assignment)?))
    }
}

impl Display for LinearRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (variable, coefficient) in &self.coefficients {
            if first {
                if coefficient.is_negative() {
                    write!(f, "-")?;
                }
                first = false;
            } else if coefficient.is_negative() {
                write!(f, " - ")?;
            } else {
                write!(f, " + ")?;
            }
            let magnitude = coefficient.abs();
            if magnitude == Fraction::from(1) {
                write!(f, "{}", variable)?;
            } else {
                write!(f, "{}*{}", magnitude, variable)?;
            }
        }
        if first {
            write!(f, "{}", self.constant)?;
        } else if self.constant.is_negative() {
            write!(f, " - {}", self.constant.abs())?;
        } else if self.constant.is_positive() {
            write!(f, " + {}", self.constant)?;
        }
        write!(f, " {} 0", self.kind.symbol())
    }
}
