use std::fmt::Display;

use indexmap::IndexMap;
use num::BigInt;

use crate::{math::fraction::Fraction, objects::variable::Variable};

/**
 * A witness value, typed after the kind of the variable it belongs to.
 */
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Integral(BigInt),
    Real(Fraction),
}

impl Constant {
    pub fn from_integral(value: i64) -> Self {
        Self::Integral(BigInt::from(value))
    }

    pub fn to_fraction(&self) -> Fraction {
        match self {
            Constant::Integral(value) => Fraction::from(value),
            Constant::Real(value) => value.clone(),
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, Constant::Integral(_))
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constant::Integral(value) => write!(f, "{}", value),
            Constant::Real(value) => write!(f, "{}", value),
        }
    }
}

/**
 * A witness: one typed value per problem variable of the pushed relations, in order of first reference.
 */
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment {
    values: IndexMap<Variable, Constant>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, variable: Variable, value: Constant) {
        self.values.insert(variable, value);
    }

    pub fn get(&self, variable: &Variable) -> Option<&Constant> {
        self.values.get(variable)
    }

    /// The value of a variable as an exact rational.
    pub fn value(&self, variable: &Variable) -> Option<Fraction> {
        self.values.get(variable).map(Constant::to_fraction)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Constant> {
        self.values
            .iter()
            .find(|(variable, _)| variable.name() == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Constant)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Display for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (variable, value) in &self.values {
            writeln!(f, "{} = {}", variable, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use num::BigInt;

    use crate::{
        math::fraction::Fraction,
        objects::{
            assignment::{Assignment, Constant},
            variable::Variable,
        },
    };

    #[test]
    fn typed_values() {
        let mut assignment = Assignment::new();
        assignment.insert(Variable::integer("x"), Constant::Integral(BigInt::from(-3)));
        assignment.insert(Variable::real("y"), Constant::Real(Fraction::from((1, 3))));

        assert_eq!(assignment.len(), 2);
        assert!(assignment.get_by_name("x").unwrap().is_integral());
        assert_eq!(
            assignment.value(&Variable::integer("x")),
            Some(Fraction::from(-3))
        );
        assert_eq!(assignment.value(&Variable::integer("y")), None);
        assert_eq!(assignment.to_string(), "x = -3\ny = 1/3\n");
    }
}
