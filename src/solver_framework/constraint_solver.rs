use std::{fmt::Display, time::Duration};

use crate::{
    math::{fraction::Arithmetic, fraction_exact::FractionExact, fraction_f64::FractionF64},
    objects::{assignment::Assignment, linear_relation::LinearRelation},
    optimisation_algorithms::simplex_solver::SimplexSolver,
    solver_framework::{solver_config::SolverConfig, solver_error::SolverError},
};

/**
 * The outcome of deciding the conjunction of all pushed relations.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// A witness covering exactly the problem variables of the pushed relations.
    Satisfiable(Assignment),
    Infeasible,
}

impl Decision {
    pub fn is_satisfiable(&self) -> bool {
        matches!(self, Decision::Satisfiable(_))
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        match self {
            Decision::Satisfiable(assignment) => Some(assignment),
            Decision::Infeasible => None,
        }
    }
}

impl Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Satisfiable(assignment) => write!(f, "sat\n{}", assignment),
            Decision::Infeasible => writeln!(f, "unsat"),
        }
    }
}

/**
 * An incremental decision procedure for conjunctions of linear relations. Relations are pushed and popped
 * in strict stack order; a decision covers all relations currently on the stack.
 */
pub trait ConstraintSolver {
    /// Pushes a relation onto the stack.
    fn add_constraint(&mut self, relation: &LinearRelation) -> Result<(), SolverError>;

    /// Pops the most recently pushed relation.
    fn remove_constraint(&mut self) -> Result<(), SolverError>;

    /// Decides the conjunction of the pushed relations. Repeated calls without an intervening mutation
    /// return the same decision.
    fn get_solution(&mut self) -> Result<Decision, SolverError>;

    fn has_solution(&mut self) -> Result<bool, SolverError> {
        Ok(self.get_solution()?.is_satisfiable())
    }

    /// Discards all relations and all state, including a previous numerical failure.
    fn reset(&mut self);

    fn set_timeout(&mut self, timeout: Option<Duration>);

    /// Number of relations on the stack.
    fn depth(&self) -> usize;
}

/**
 * Creates a solver with the number representation chosen in the configuration.
 */
pub fn new_solver(config: SolverConfig) -> Box<dyn ConstraintSolver> {
    match config.arithmetic {
        Arithmetic::Exact => Box::new(SimplexSolver::<FractionExact>::new(config)),
        Arithmetic::Approximate => Box::new(SimplexSolver::<FractionF64>::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        math::fraction::Arithmetic,
        objects::{linear_relation::LinearRelation, variable::Variable},
        solver_framework::{
            constraint_solver::{Decision, new_solver},
            solver_config::SolverConfig,
        },
    };

    #[test]
    fn factory_selects_arithmetic() {
        for arithmetic in [Arithmetic::Exact, Arithmetic::Approximate] {
            let mut solver = new_solver(SolverConfig::default().with_arithmetic(arithmetic));
            let x = Variable::integer("x");
            solver
                .add_constraint(&LinearRelation::weak().with_term(x.clone(), 1).with_constant(-2))
                .unwrap();
            assert_eq!(solver.depth(), 1);
            let decision = solver.get_solution().unwrap();
            assert!(decision.is_satisfiable());
            assert!(decision.assignment().unwrap().get(&x).unwrap().is_integral());
        }
    }

    #[test]
    fn display() {
        assert_eq!(Decision::Infeasible.to_string(), "unsat\n");
    }
}
