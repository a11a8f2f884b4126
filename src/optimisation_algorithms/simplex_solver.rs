use std::time::Duration;

use log::{debug, warn};

use crate::{
    math::traits::Scalar,
    objects::linear_relation::LinearRelation,
    optimisation_algorithms::{branch_and_cut::BranchAndCut, constraint_stack::ConstraintStack},
    solver_framework::{
        constraint_solver::{ConstraintSolver, Decision},
        deadline::Deadline,
        solver_config::SolverConfig,
        solver_error::SolverError,
    },
};

/**
 * Incremental decision procedure over a bounded-variable simplex tableau in number representation `F`,
 * with branch-and-cut for integral variables.
 *
 * Decisions are cached until the next push or pop. A pop restores the decision that was cached at the
 * matching push. After a numerical failure, the instance refuses to decide until it is reset.
 */
pub struct SimplexSolver<F: Scalar> {
    config: SolverConfig,
    stack: ConstraintStack<F>,
    decision: Option<Decision>,
    failure: Option<SolverError>,
}

impl<F: Scalar> SimplexSolver<F> {
    pub fn new(config: SolverConfig) -> Self {
        let stack = Self::new_stack(&config);
        Self {
            config,
            stack,
            decision: None,
            failure: None,
        }
    }

    fn new_stack(config: &SolverConfig) -> ConstraintStack<F> {
        ConstraintStack::new(
            config.zero_threshold,
            config.consistency_tolerance,
            config.bound_integral_kinds,
        )
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn check_usable(&self) -> Result<(), SolverError> {
        match &self.failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }

    /// Remembers numerical failures, which are fatal for the instance.
    fn record<T>(&mut self, result: Result<T, SolverError>) -> Result<T, SolverError> {
        if let Err(error @ SolverError::Unstable(_)) = &result {
            warn!("solver instance became unusable: {}", error);
            self.failure = Some(error.clone());
        }
        result
    }

    fn verify(&self) -> Result<(), SolverError> {
        if self.config.verify {
            self.stack.tableau.verify()
        } else {
            Ok(())
        }
    }

    fn decide(&mut self) -> Result<Decision, SolverError> {
        if self.stack.is_infeasible() {
            return Ok(Decision::Infeasible);
        }

        let deadline = Deadline::after(self.config.timeout);
        let mut search = BranchAndCut::new(&mut self.stack.tableau, &self.config, deadline);
        let outcome = search.run();
        let cuts = search.into_root_cuts();

        match self.stack.top_mut() {
            Some(frame) => frame.cuts.extend(cuts),
            None => {
                for cut in cuts.into_iter().rev() {
                    self.stack.tableau.remove_row_of(cut)?;
                }
            }
        }

        let decision = match outcome? {
            Some(assignment) => Decision::Satisfiable(assignment),
            None => Decision::Infeasible,
        };
        self.verify()?;
        Ok(decision)
    }
}

impl<F: Scalar> ConstraintSolver for SimplexSolver<F> {
    fn add_constraint(&mut self, relation: &LinearRelation) -> Result<(), SolverError> {
        self.check_usable()?;
        let known_infeasible = self.decision == Some(Decision::Infeasible);
        let result = self.stack.push(relation, self.decision.clone());
        self.record(result)?;

        self.decision = if known_infeasible || self.stack.is_infeasible() {
            Some(Decision::Infeasible)
        } else {
            None
        };
        let result = self.verify();
        self.record(result)
    }

    fn remove_constraint(&mut self) -> Result<(), SolverError> {
        self.check_usable()?;
        let result = self.stack.pop();
        self.decision = self.record(result)?;
        let result = self.verify();
        self.record(result)
    }

    fn get_solution(&mut self) -> Result<Decision, SolverError> {
        self.check_usable()?;
        if let Some(decision) = &self.decision {
            return Ok(decision.clone());
        }

        let result = self.decide();
        let decision = self.record(result)?;
        debug!(
            "decided {} relations: {}",
            self.stack.depth(),
            if decision.is_satisfiable() { "sat" } else { "unsat" }
        );
        self.decision = Some(decision.clone());
        Ok(decision)
    }

    fn reset(&mut self) {
        self.stack = Self::new_stack(&self.config);
        self.decision = None;
        self.failure = None;
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.config.timeout = timeout;
    }

    fn depth(&self) -> usize {
        self.stack.depth()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ntest::timeout;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    use crate::{
        math::{fraction::Fraction, fraction_exact::FractionExact, fraction_f64::FractionF64},
        objects::{
            assignment::Constant,
            linear_relation::LinearRelation,
            variable::{NumericKind, Variable},
        },
        optimisation_algorithms::simplex_solver::SimplexSolver,
        solver_framework::{
            constraint_solver::{ConstraintSolver, Decision},
            solver_config::SolverConfig,
            solver_error::SolverError,
        },
    };

    fn exact() -> SimplexSolver<FractionExact> {
        SimplexSolver::new(SolverConfig::default().with_verify(true))
    }

    fn assert_sound(relations: &[LinearRelation], decision: &Decision) {
        if let Decision::Satisfiable(assignment) = decision {
            for relation in relations {
                assert!(
                    relation.is_satisfied_by(assignment).unwrap(),
                    "{} is violated by\n{}",
                    relation,
                    assignment
                );
            }
            for (variable, value) in assignment.iter() {
                assert_eq!(variable.is_integral(), value.is_integral());
            }
        }
    }

    /// a·x ≤ b as a·x - b ≤ 0
    fn at_most(variable: &Variable, a: i64, b: i64) -> LinearRelation {
        LinearRelation::weak()
            .with_term(variable.clone(), a)
            .with_constant(-b)
    }

    #[test]
    fn integral_range() {
        let x = Variable::integer("x");
        let relations = vec![at_most(&x, 1, 5), at_most(&x, -1, -3)];
        let mut solver = exact();
        for relation in &relations {
            solver.add_constraint(relation).unwrap();
        }
        let decision = solver.get_solution().unwrap();
        assert_sound(&relations, &decision);
        let value = decision.assignment().unwrap().value(&x).unwrap();
        assert!(value >= Fraction::from(3) && value <= Fraction::from(5));
    }

    #[test]
    fn strict_and_weak_over_reals() {
        let x = Variable::real("x");
        let y = Variable::real("y");
        let relations = vec![
            //x + y = 10
            LinearRelation::equation()
                .with_term(x.clone(), 1)
                .with_term(y.clone(), 1)
                .with_constant(-10),
            //x ≥ 0
            LinearRelation::weak().with_term(x.clone(), -1),
            //y > 0
            LinearRelation::strict().with_term(y.clone(), -1),
        ];
        for arithmetic_exact in [true, false] {
            let mut solver: Box<dyn ConstraintSolver> = if arithmetic_exact {
                Box::new(exact())
            } else {
                Box::new(SimplexSolver::<FractionF64>::new(SolverConfig::default().with_verify(true)))
            };
            for relation in &relations {
                solver.add_constraint(relation).unwrap();
            }
            let decision = solver.get_solution().unwrap();
            assert_sound(&relations, &decision);
            let y_value = decision.assignment().unwrap().value(&y).unwrap();
            assert!(y_value > Fraction::from(0));
        }
    }

    #[test]
    fn contradicting_equations() {
        let x = Variable::integer("x");
        let mut solver = exact();
        solver
            .add_constraint(&LinearRelation::equation().with_term(x.clone(), 1).with_constant(-1))
            .unwrap();
        assert!(solver.has_solution().unwrap());
        solver
            .add_constraint(&LinearRelation::equation().with_term(x.clone(), 1).with_constant(-2))
            .unwrap();
        assert_eq!(solver.get_solution().unwrap(), Decision::Infeasible);

        solver.remove_constraint().unwrap();
        let decision = solver.get_solution().unwrap();
        assert_eq!(
            decision.assignment().unwrap().get(&x),
            Some(&Constant::from_integral(1))
        );
    }

    #[test]
    fn integrally_infeasible_without_cuts() {
        let x = Variable::integer("x");
        for gomory_cuts in [true, false] {
            let mut solver = SimplexSolver::<FractionExact>::new(
                SolverConfig::default()
                    .with_verify(true)
                    .with_gomory_cuts(gomory_cuts),
            );
            //2x ≤ 7, 2x ≥ 7
            solver.add_constraint(&at_most(&x, 2, 7)).unwrap();
            solver.add_constraint(&at_most(&x, -2, -7)).unwrap();
            assert_eq!(solver.get_solution().unwrap(), Decision::Infeasible);
        }
    }

    #[test]
    #[timeout(20000)]
    fn mixed_system_needs_branching() {
        let x = Variable::integer("x");
        let y = Variable::integer("y");
        let z = Variable::real("z");
        let relations = vec![
            //2x + 3y = 7
            LinearRelation::equation()
                .with_term(x.clone(), 2)
                .with_term(y.clone(), 3)
                .with_constant(-7),
            at_most(&x, -1, 0),
            at_most(&y, -1, 0),
            //z < x
            LinearRelation::strict()
                .with_term(z.clone(), 1)
                .with_term(x.clone(), -1),
        ];
        for gomory_cuts in [true, false] {
            let mut solver = SimplexSolver::<FractionExact>::new(
                SolverConfig::default()
                    .with_verify(true)
                    .with_gomory_cuts(gomory_cuts),
            );
            for relation in &relations {
                solver.add_constraint(relation).unwrap();
            }
            let decision = solver.get_solution().unwrap();
            assert_sound(&relations, &decision);
            let assignment = decision.assignment().unwrap();
            assert_eq!(assignment.get(&x), Some(&Constant::from_integral(2)));
            assert_eq!(assignment.get(&y), Some(&Constant::from_integral(1)));
        }
    }

    #[test]
    fn idempotent_and_symmetric() {
        let x = Variable::new("x", NumericKind::Int);
        let y = Variable::real("y");
        let mut solver = exact();
        solver.add_constraint(&at_most(&x, 3, 10)).unwrap();
        solver
            .add_constraint(
                &LinearRelation::weak()
                    .with_term(x.clone(), -1)
                    .with_term(y.clone(), 2)
                    .with_constant(1),
            )
            .unwrap();
        let first = solver.get_solution().unwrap();
        assert_eq!(solver.get_solution().unwrap(), first);

        let pushed = LinearRelation::weak()
            .with_term(y.clone(), -1)
            .with_constant(100);
        solver.add_constraint(&pushed).unwrap();
        assert_eq!(solver.get_solution().unwrap(), Decision::Infeasible);
        //monotonicity
        solver.add_constraint(&at_most(&x, 1, 1000)).unwrap();
        assert!(!solver.has_solution().unwrap());
        solver.remove_constraint().unwrap();
        solver.remove_constraint().unwrap();

        assert_eq!(solver.get_solution().unwrap(), first);
        assert_eq!(solver.depth(), 2);
    }

    #[test]
    fn type_ranges() {
        let b = Variable::new("b", NumericKind::Byte);
        let mut solver = exact();
        solver.add_constraint(&at_most(&b, -1, -200)).unwrap();
        assert!(!solver.has_solution().unwrap());

        let mut solver = SimplexSolver::<FractionExact>::new(
            SolverConfig::default().with_bound_integral_kinds(false),
        );
        solver.add_constraint(&at_most(&b, -1, -200)).unwrap();
        assert!(solver.has_solution().unwrap());
    }

    #[test]
    fn contract_violations() {
        let mut solver = exact();
        assert!(matches!(
            solver.remove_constraint(),
            Err(SolverError::Contract(_))
        ));
        assert_eq!(solver.get_solution().unwrap(), Decision::Satisfiable(Default::default()));
    }

    #[test]
    fn timeout() {
        let x = Variable::real("x");
        let mut solver = exact();
        solver.set_timeout(Some(Duration::ZERO));
        solver.add_constraint(&at_most(&x, 1, 5)).unwrap();
        assert_eq!(solver.get_solution(), Err(SolverError::Timeout));

        //a timeout is not cached and does not disable the instance
        solver.set_timeout(None);
        assert!(solver.has_solution().unwrap());

        solver.reset();
        assert_eq!(solver.depth(), 0);
        assert!(solver.has_solution().unwrap());
    }

    #[test]
    fn numerical_failure_is_fatal_until_reset() {
        let x = Variable::real("x");
        let mut solver = exact();
        solver.add_constraint(&at_most(&x, 1, 5)).unwrap();
        assert!(solver.has_solution().unwrap());

        for entry in solver.stack.tableau.rows[0].iter_mut() {
            *entry = FractionExact::from(0);
        }
        assert!(matches!(
            solver.add_constraint(&at_most(&x, -1, 0)),
            Err(SolverError::Unstable(_))
        ));
        assert!(matches!(solver.get_solution(), Err(SolverError::Unstable(_))));
        assert!(matches!(
            solver.add_constraint(&at_most(&x, 1, 3)),
            Err(SolverError::Unstable(_))
        ));
        assert!(matches!(solver.remove_constraint(), Err(SolverError::Unstable(_))));

        solver.reset();
        assert_eq!(solver.depth(), 0);
        solver.add_constraint(&at_most(&x, 1, 5)).unwrap();
        let decision = solver.get_solution().unwrap();
        assert!(decision.assignment().unwrap().value(&x).unwrap() <= Fraction::from(5));
    }

    #[test]
    fn depth_limit_is_reported() {
        let x = Variable::integer("x");
        let z = Variable::real("z");
        let mut solver = SimplexSolver::<FractionExact>::new(
            SolverConfig::default()
                .with_gomory_cuts(false)
                .with_max_branch_depth(16),
        );
        //3x - 3z = 1 and z = y have no integral solution, and no bound ends the search
        solver
            .add_constraint(
                &LinearRelation::equation()
                    .with_term(x.clone(), 3)
                    .with_term(z.clone(), -3)
                    .with_constant(-1),
            )
            .unwrap();
        solver
            .add_constraint(
                &LinearRelation::equation()
                    .with_term(z.clone(), 3)
                    .with_term(Variable::integer("y"), -3),
            )
            .unwrap();
        assert_eq!(solver.get_solution(), Err(SolverError::DepthLimit(16)));
    }

    /// From-scratch decision over the given relations.
    fn fresh_decision(relations: &[LinearRelation]) -> Decision {
        let mut solver = exact();
        for relation in relations {
            solver.add_constraint(relation).unwrap();
        }
        solver.get_solution().unwrap()
    }

    #[test]
    #[timeout(60000)]
    fn random_push_and_pop() {
        let mut rng = StdRng::seed_from_u64(42);
        let variables = vec![
            Variable::new("a", NumericKind::Byte),
            Variable::real("b"),
            Variable::real("c"),
            Variable::new("d", NumericKind::Double),
        ];

        let mut relations = vec![];
        //the decision known right before each push
        let mut cached = vec![];
        let mut last = None;
        let mut solver = exact();
        for _ in 0..50 {
            let mut relation = match rng.gen_range(0..6) {
                0 => LinearRelation::equation(),
                1 | 2 => LinearRelation::strict(),
                _ => LinearRelation::weak(),
            };
            for variable in &variables {
                if rng.gen_bool(0.4) {
                    relation.add_term(variable.clone(), Fraction::from(rng.gen_range(-5i64..=5)));
                }
            }
            let relation = relation.with_constant(rng.gen_range(-20i64..=20));
            cached.push(last.take());
            solver.add_constraint(&relation).unwrap();
            relations.push(relation);

            if rng.gen_bool(0.5) {
                let decision = solver.get_solution().unwrap();
                assert_sound(&relations, &decision);
                last = Some(decision);
            }
        }

        while let Some(before_push) = cached.pop() {
            solver.remove_constraint().unwrap();
            relations.pop();
            let decision = solver.get_solution().unwrap();
            assert_sound(&relations, &decision);
            assert_eq!(
                decision.is_satisfiable(),
                fresh_decision(&relations).is_satisfiable(),
                "after popping to {} relations",
                relations.len()
            );
            if let Some(before_push) = before_push {
                assert_eq!(
                    decision,
                    before_push,
                    "after popping to {} relations",
                    relations.len()
                );
            }
        }
        assert!(relations.is_empty());
        assert_eq!(solver.get_solution().unwrap(), Decision::Satisfiable(Default::default()));
    }
}
