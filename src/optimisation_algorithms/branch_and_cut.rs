use std::ops::{Deref, DerefMut};

use log::{debug, trace};

use crate::{
    math::{
        infinitesimal::Infinitesimal,
        traits::{Number, Scalar},
    },
    objects::assignment::Assignment,
    optimisation_algorithms::{
        simplex::PivotRules,
        tableau::Tableau,
        variable_arena::VarId,
    },
    solver_framework::{deadline::Deadline, solver_config::SolverConfig, solver_error::SolverError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Floor,
    Ceil,
}

/**
 * Recursive search for a feasible point in which every integral problem variable has an integral value.
 * Cuts derived at the root stay in the tableau and are handed to the caller; cuts derived deeper depend on
 * branching bounds and are removed before their node returns.
 */
pub struct BranchAndCut<'a, F: Scalar> {
    tableau: &'a mut Tableau<F>,
    config: &'a SolverConfig,
    deadline: Deadline,
    root_cuts: Vec<VarId>,
    nodes: usize,
}

impl<'a, F: Scalar> BranchAndCut<'a, F> {
    pub fn new(tableau: &'a mut Tableau<F>, config: &'a SolverConfig, deadline: Deadline) -> Self {
        Self {
            tableau,
            config,
            deadline,
            root_cuts: vec![],
            nodes: 0,
        }
    }

    /// Searches from the root. Returns a witness, or None if there is no integral feasible point.
    pub fn run(&mut self) -> Result<Option<Assignment>, SolverError> {
        let result = self.search(0);
        debug!(
            "branch-and-cut visited {} nodes, {} root cuts, found {}",
            self.nodes,
            self.root_cuts.len(),
            match &result {
                Ok(Some(_)) => "a solution",
                Ok(None) => "no solution",
                Err(_) => "an error",
            }
        );
        result
    }

    /// The cuts derived at the root, which remain valid as long as the current relations are on the stack.
    pub fn into_root_cuts(self) -> Vec<VarId> {
        self.root_cuts
    }

    fn rules(&self, depth: usize) -> PivotRules {
        PivotRules {
            bland_threshold: self.config.bland_threshold,
            prefer_additional: self.config.prefer_additional_entering && depth > 0,
        }
    }

    fn search(&mut self, depth: usize) -> Result<Option<Assignment>, SolverError> {
        if depth > self.config.max_branch_depth {
            return Err(SolverError::DepthLimit(self.config.max_branch_depth));
        }
        self.deadline.check()?;
        self.nodes += 1;

        let rules = self.rules(depth);
        if !self.tableau.solve(&self.deadline, &rules)? {
            trace!("[depth {}] pruned, infeasible", depth);
            return Ok(None);
        }

        let cuts = if self.config.gomory_cuts && F::is_exact() {
            self.tableau.add_gomory_cuts()
        } else {
            vec![]
        };
        if !cuts.is_empty() {
            trace!("[depth {}] added {} Gomory cuts", depth, cuts.len());
        }

        let result = self.explore(depth, !cuts.is_empty());

        if depth == 0 {
            self.root_cuts.extend(cuts);
        } else {
            for cut in cuts.into_iter().rev() {
                self.tableau.remove_row_of(cut)?;
            }
        }
        result
    }

    fn explore(&mut self, depth: usize, resolve: bool) -> Result<Option<Assignment>, SolverError> {
        if resolve && !self.tableau.solve(&self.deadline, &self.rules(depth))? {
            trace!("[depth {}] pruned by cuts", depth);
            return Ok(None);
        }

        let (variable, value) = match self.branch_variable() {
            Some(branch) => branch,
            None => {
                trace!("[depth {}] integral solution", depth);
                return self.tableau.witness().map(Some);
            }
        };

        for kind in [BranchKind::Floor, BranchKind::Ceil] {
            trace!("[depth {}] branch {:?} on variable {} = {}", depth, kind, variable, value);
            let mut scope = BoundScope::tighten(self, variable, kind, &value);
            if scope.is_consistent() {
                if let Some(assignment) = scope.search(depth + 1)? {
                    return Ok(Some(assignment));
                }
            }
        }
        Ok(None)
    }

    /// The first integral problem variable with a non-integral value.
    fn branch_variable(&self) -> Option<(VarId, Infinitesimal<F>)> {
        self.tableau
            .variables
            .iter()
            .find(|(_, variable)| {
                variable.is_problem() && variable.integral && !variable.value.is_integer()
            })
            .map(|(id, variable)| (id, variable.value.clone()))
    }
}

/**
 * A bound tightened for the lifetime of the scope. Dropping the scope restores the previous bound on every
 * exit path, early returns and errors included.
 */
pub struct BoundScope<'s, 'a, F: Scalar> {
    search: &'s mut BranchAndCut<'a, F>,
    variable: VarId,
    kind: BranchKind,
    previous: Option<Infinitesimal<F>>,
    consistent: bool,
}

impl<'s, 'a, F: Scalar> BoundScope<'s, 'a, F> {
    /// Floor lowers the upper bound to ⌊value⌋, ceil raises the lower bound to ⌈value⌉.
    pub fn tighten(
        search: &'s mut BranchAndCut<'a, F>,
        variable: VarId,
        kind: BranchKind,
        value: &Infinitesimal<F>,
    ) -> Self {
        let tableau = &mut *search.tableau;
        let (previous, consistent) = match kind {
            BranchKind::Floor => {
                let previous = tableau.variable(variable).upper.clone();
                (previous, tableau.set_upper_bound(variable, Some(value.floor())))
            }
            BranchKind::Ceil => {
                let previous = tableau.variable(variable).lower.clone();
                (previous, tableau.set_lower_bound(variable, Some(value.ceil())))
            }
        };
        Self {
            search,
            variable,
            kind,
            previous,
            consistent,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.consistent
    }
}

impl<'s, 'a, F: Scalar> Deref for BoundScope<'s, 'a, F> {
    type Target = BranchAndCut<'a, F>;

    fn deref(&self) -> &Self::Target {
        self.search
    }
}

impl<'s, 'a, F: Scalar> DerefMut for BoundScope<'s, 'a, F> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.search
    }
}

impl<'s, 'a, F: Scalar> Drop for BoundScope<'s, 'a, F> {
    fn drop(&mut self) {
        let previous = self.previous.take();
        match self.kind {
            BranchKind::Floor => self.search.tableau.set_upper_bound(self.variable, previous),
            BranchKind::Ceil => self.search.tableau.set_lower_bound(self.variable, previous),
        };
    }
}

#[cfg(test)]
mod tests {
    use ntest::timeout;

    use crate::{
        math::{fraction_exact::FractionExact, infinitesimal::Infinitesimal},
        objects::{assignment::Constant, variable::Variable},
        optimisation_algorithms::{
            branch_and_cut::{BoundScope, BranchAndCut, BranchKind},
            tableau::Tableau,
            variable_arena::Origin,
        },
        solver_framework::{deadline::Deadline, solver_config::SolverConfig, solver_error::SolverError},
    };

    fn v(value: i64) -> Infinitesimal<FractionExact> {
        Infinitesimal::from_real(FractionExact::from(value))
    }

    /// 2x + 3y = 7 over the integers, x, y ∈ [0, 10]
    fn diophantine(tableau: &mut Tableau<FractionExact>) -> (usize, usize) {
        let x = tableau
            .reference_problem_variable(&Variable::integer("x"), true)
            .unwrap();
        let y = tableau
            .reference_problem_variable(&Variable::integer("y"), true)
            .unwrap();
        for id in [x, y] {
            tableau.set_lower_bound(id, Some(v(0)));
            tableau.set_upper_bound(id, Some(v(10)));
        }
        let s = tableau.add_row(
            &[(x, FractionExact::from(2)), (y, FractionExact::from(3))],
            Origin::Additional,
            true,
        );
        tableau.set_lower_bound(s, Some(v(7)));
        tableau.set_upper_bound(s, Some(v(7)));
        (x, y)
    }

    #[test]
    #[timeout(10000)]
    fn integral_solution_with_and_without_cuts() {
        for gomory_cuts in [false, true] {
            let config = SolverConfig::default().with_gomory_cuts(gomory_cuts);
            let mut tableau = Tableau::new(0.0, 0.0);
            let (x, y) = diophantine(&mut tableau);
            let mut search = BranchAndCut::new(&mut tableau, &config, Deadline::never());
            let assignment = search.run().unwrap().unwrap();
            let cuts = search.into_root_cuts();

            assert_eq!(assignment.get_by_name("x"), Some(&Constant::from_integral(2)));
            assert_eq!(assignment.get_by_name("y"), Some(&Constant::from_integral(1)));
            assert!(gomory_cuts || cuts.is_empty());

            //branching bounds are gone
            assert_eq!(tableau.variable(x).upper, Some(v(10)));
            assert_eq!(tableau.variable(y).lower, Some(v(0)));
        }
    }

    #[test]
    #[timeout(10000)]
    fn integrally_infeasible() {
        //2x - y = 1, x integral, y real with 0 ≤ y ≤ 0
        let config = SolverConfig::default().with_gomory_cuts(false);
        let mut tableau = Tableau::<FractionExact>::new(0.0, 0.0);
        let x = tableau
            .reference_problem_variable(&Variable::integer("x"), true)
            .unwrap();
        let y = tableau
            .reference_problem_variable(&Variable::real("y"), true)
            .unwrap();
        tableau.set_lower_bound(y, Some(v(0)));
        tableau.set_upper_bound(y, Some(v(0)));
        let s = tableau.add_row(
            &[(x, FractionExact::from(2)), (y, FractionExact::from(-1))],
            Origin::Additional,
            false,
        );
        tableau.set_lower_bound(s, Some(v(1)));
        tableau.set_upper_bound(s, Some(v(1)));

        let mut search = BranchAndCut::new(&mut tableau, &config, Deadline::never());
        assert_eq!(search.run().unwrap(), None);
        assert_eq!(tableau.variable(x).lower, None);
        assert_eq!(tableau.variable(x).upper, None);
    }

    #[test]
    fn depth_limit() {
        //3x - 3y = 1 has no integral solution and no bounds to exhaust
        let config = SolverConfig::default()
            .with_gomory_cuts(false)
            .with_max_branch_depth(8);
        let mut tableau = Tableau::<FractionExact>::new(0.0, 0.0);
        let x = tableau
            .reference_problem_variable(&Variable::integer("x"), true)
            .unwrap();
        let y = tableau
            .reference_problem_variable(&Variable::integer("y"), true)
            .unwrap();
        let s = tableau.add_row(
            &[(x, FractionExact::from(3)), (y, FractionExact::from(-3))],
            Origin::Additional,
            false,
        );
        tableau.set_lower_bound(s, Some(v(1)));
        tableau.set_upper_bound(s, Some(v(1)));

        let mut search = BranchAndCut::new(&mut tableau, &config, Deadline::never());
        assert_eq!(search.run(), Err(SolverError::DepthLimit(8)));
        assert_eq!(tableau.variable(x).upper, None);
        assert_eq!(tableau.variable(y).lower, None);
    }

    #[test]
    fn scope_restores_bound() {
        let config = SolverConfig::default();
        let mut tableau = Tableau::<FractionExact>::new(0.0, 0.0);
        let x = tableau
            .reference_problem_variable(&Variable::integer("x"), true)
            .unwrap();
        let mut search = BranchAndCut::new(&mut tableau, &config, Deadline::never());
        let half = Infinitesimal::from_real(FractionExact::from((7, 2)));
        {
            let scope = BoundScope::tighten(&mut search, x, BranchKind::Ceil, &half);
            assert!(scope.is_consistent());
            assert_eq!(scope.tableau.variable(x).lower, Some(v(4)));
            assert_eq!(scope.tableau.variable(x).value, v(4));
        }
        assert_eq!(tableau.variable(x).lower, None);
    }
}
