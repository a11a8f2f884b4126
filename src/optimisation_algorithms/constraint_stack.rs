use log::trace;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    math::{
        fraction::Fraction,
        infinitesimal::Infinitesimal,
        traits::{Number, One, Scalar, Zero},
    },
    objects::{
        linear_relation::{LinearRelation, RelationKind},
        variable::Variable,
    },
    optimisation_algorithms::{
        tableau::Tableau,
        variable_arena::{Origin, VarId},
    },
    solver_framework::{constraint_solver::Decision, solver_error::SolverError},
};

/**
 * The row a relation contributes: `slack = Σ coefficient·variable` with bounds on the slack, in exact
 * arithmetic.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct SlackRow<'r> {
    pub terms: Vec<(&'r Variable, Fraction)>,
    pub lower: Option<Infinitesimal<Fraction>>,
    pub upper: Option<Infinitesimal<Fraction>>,
    pub integral: bool,
}

impl<'r> SlackRow<'r> {
    /**
     * Moves the constant of `Σ a·x + c ⋈ 0` to the bounds of the slack `Σ a·x`. If all variables are
     * integral and all coefficients are integers, the slack is integral: the row is divided by the gcd of
     * its coefficients and the bounds are rounded inwards.
     */
    pub fn of(relation: &'r LinearRelation) -> Self {
        let mut terms = relation
            .terms()
            .map(|(variable, coefficient)| (variable, coefficient.clone()))
            .collect::<Vec<_>>();
        let mut rhs = -relation.constant();

        let integral = terms
            .iter()
            .all(|(variable, coefficient)| variable.is_integral() && coefficient.is_integer());
        if integral {
            let gcd = terms
                .iter()
                .fold(Fraction::zero(), |gcd, (_, coefficient)| gcd.gcd(coefficient));
            if !gcd.is_zero() && !gcd.is_one() {
                for (_, coefficient) in terms.iter_mut() {
                    *coefficient /= &gcd;
                }
                rhs /= &gcd;
            }
        }

        let (lower, upper) = match (relation.kind(), integral) {
            (RelationKind::Equation, false) => (
                Some(Infinitesimal::from_real(rhs.clone())),
                Some(Infinitesimal::from_real(rhs)),
            ),
            (RelationKind::Equation, true) => (
                Some(Infinitesimal::from_real(rhs.ceil())),
                Some(Infinitesimal::from_real(rhs.floor())),
            ),
            (RelationKind::WeakInequality, false) => (None, Some(Infinitesimal::from_real(rhs))),
            (RelationKind::WeakInequality, true) => (None, Some(Infinitesimal::from_real(rhs.floor()))),
            (RelationKind::StrictInequality, false) => {
                (None, Some(Infinitesimal::new(rhs, -Fraction::one())))
            }
            (RelationKind::StrictInequality, true) => {
                (None, Some(Infinitesimal::from_real(rhs.ceil() - Fraction::one())))
            }
        };

        Self {
            terms,
            lower,
            upper,
            integral,
        }
    }

    pub fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Some(lower), Some(upper)) => lower > upper,
            _ => false,
        }
    }
}

/**
 * One pushed relation and everything needed to undo it.
 */
#[derive(Debug, Clone)]
pub struct ConstraintFrame<F> {
    pub relation: LinearRelation,
    /// The slack of the relation; constant relations have none.
    pub additional: Option<VarId>,
    pub problem_variables: Vec<VarId>,
    /// Gomory cuts derived while this frame was on top.
    pub cuts: Vec<VarId>,
    values: FxHashMap<VarId, Infinitesimal<F>>,
    decision: Option<Decision>,
    /// Whether this frame or one below it is known to be infeasible without solving.
    pub infeasible: bool,
}

/**
 * The relations on the stack and the tableau they define.
 */
#[derive(Debug, Clone)]
pub struct ConstraintStack<F> {
    pub(crate) tableau: Tableau<F>,
    frames: Vec<ConstraintFrame<F>>,
    bound_integral_kinds: bool,
}

impl<F: Scalar> ConstraintStack<F> {
    pub fn new(zero_threshold: f64, tolerance: f64, bound_integral_kinds: bool) -> Self {
        Self {
            tableau: Tableau::new(zero_threshold, tolerance),
            frames: vec![],
            bound_integral_kinds,
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_infeasible(&self) -> bool {
        self.frames.last().is_some_and(|frame| frame.infeasible)
    }

    pub fn top_mut(&mut self) -> Option<&mut ConstraintFrame<F>> {
        self.frames.last_mut()
    }

    pub fn frames(&self) -> impl Iterator<Item = &ConstraintFrame<F>> {
        self.frames.iter()
    }

    /**
     * Pushes a relation. `decision` is the decision of the stack before the push, handed back by the matching
     * pop.
     */
    pub fn push(
        &mut self,
        relation: &LinearRelation,
        decision: Option<Decision>,
    ) -> Result<(), SolverError> {
        let names = relation
            .variables()
            .map(|variable| variable.name())
            .collect::<FxHashSet<_>>();
        if names.len() != relation.len() {
            return Err(SolverError::contract(format!(
                "relation {} uses a variable name with two kinds",
                relation
            )));
        }
        for variable in relation.variables() {
            self.tableau.check_declaration(variable)?;
        }
        let infeasible_below = self.is_infeasible();
        let values = self.tableau.snapshot_values();

        if relation.is_constant() {
            let holds = relation.kind().holds(relation.constant());
            trace!("constant relation {} holds: {}", relation, holds);
            self.frames.push(ConstraintFrame {
                relation: relation.clone(),
                additional: None,
                problem_variables: vec![],
                cuts: vec![],
                values,
                decision,
                infeasible: infeasible_below || !holds,
            });
            return Ok(());
        }

        let slack_row = SlackRow::of(relation);
        let mut problem_variables = vec![];
        let mut terms = vec![];
        for (variable, coefficient) in &slack_row.terms {
            let id = self
                .tableau
                .reference_problem_variable(variable, self.bound_integral_kinds)?;
            problem_variables.push(id);
            terms.push((id, F::from_exact(coefficient)));
        }
        let slack = self
            .tableau
            .add_row(&terms, Origin::Additional, slack_row.integral);

        //an empty slack range leaves the slack unbounded; the frame is infeasible as a whole
        let empty = slack_row.is_empty();
        if !empty {
            let convert = |bound: &Infinitesimal<Fraction>| {
                Infinitesimal::new(F::from_exact(&bound.real), F::from_exact(&bound.delta))
            };
            self.tableau
                .set_lower_bound(slack, slack_row.lower.as_ref().map(convert));
            self.tableau
                .set_upper_bound(slack, slack_row.upper.as_ref().map(convert));
        }
        trace!(
            "pushed {} as row of slack {}{}",
            relation,
            slack,
            if empty { ", which is empty" } else { "" }
        );

        self.frames.push(ConstraintFrame {
            relation: relation.clone(),
            additional: Some(slack),
            problem_variables,
            cuts: vec![],
            values,
            decision,
            infeasible: infeasible_below || empty,
        });
        Ok(())
    }

    /**
     * Pops the most recent relation together with its cuts, drops the columns of problem variables no other
     * relation references, and restores the values of the matching push. Returns the decision that was
     * handed to that push.
     */
    pub fn pop(&mut self) -> Result<Option<Decision>, SolverError> {
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| SolverError::contract("there is no constraint to remove"))?;

        for cut in frame.cuts.iter().rev() {
            self.tableau.remove_row_of(*cut)?;
        }
        if let Some(slack) = frame.additional {
            self.tableau.remove_row_of(slack)?;
        }
        for id in frame.problem_variables.iter().rev() {
            self.tableau.release_problem_variable(*id)?;
        }
        self.tableau.restore_values(&frame.values);
        trace!("popped {}", frame.relation);
        Ok(frame.decision)
    }
}
