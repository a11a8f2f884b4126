use indexmap::IndexMap;
use log::trace;
use rustc_hash::FxHashMap;

use crate::{
    math::{
        infinitesimal::Infinitesimal,
        traits::{Scalar, Zero},
    },
    objects::{
        assignment::{Assignment, Constant},
        variable::Variable,
    },
    optimisation_algorithms::variable_arena::{
        Origin, TableauVariable, VarId, VarState, VariableArena,
    },
    solver_framework::solver_error::SolverError,
};

#[derive(Debug, Clone, Copy)]
struct ProblemEntry {
    id: VarId,
    references: usize,
}

/**
 * A bounded-variable simplex tableau in reduced form. Every row expresses its basic variable as a dense
 * linear combination of the non-basic variables, one entry per column. Every variable carries its bounds
 * and its current value; non-basic values always lie within their bounds, basic values always equal the
 * evaluation of their row.
 */
#[derive(Debug, Clone)]
pub struct Tableau<F> {
    pub(crate) variables: VariableArena<F>,
    problem_variables: IndexMap<String, ProblemEntry>,
    pub(crate) rows: Vec<Vec<F>>,
    /// For each row the corresponding basic variable.
    pub(crate) basic: Vec<VarId>,
    /// For each column the corresponding non-basic variable.
    pub(crate) columns: Vec<VarId>,
    pub(crate) delta: F,
    pub(crate) zero_threshold: f64,
    pub(crate) tolerance: f64,
}

impl<F: Scalar> Tableau<F> {
    pub fn new(zero_threshold: f64, tolerance: f64) -> Self {
        Self {
            variables: VariableArena::new(),
            problem_variables: IndexMap::new(),
            rows: vec![],
            basic: vec![],
            columns: vec![],
            delta: F::one(),
            zero_threshold: zero_threshold.max(F::zero_tolerance()),
            tolerance,
        }
    }

    pub fn number_of_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn number_of_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn variable(&self, id: VarId) -> &TableauVariable<F> {
        &self.variables[id]
    }

    pub fn problem_variable(&self, name: &str) -> Option<VarId> {
        self.problem_variables.get(name).map(|entry| entry.id)
    }

    pub fn number_of_problem_variables(&self) -> usize {
        self.problem_variables.len()
    }

    /**
     * Fails if a problem variable of the same name but another kind is already present.
     */
    pub fn check_declaration(&self, variable: &Variable) -> Result<(), SolverError> {
        match self.problem_variables.get(variable.name()) {
            Some(entry) => match &self.variables[entry.id].origin {
                Origin::Problem(existing) if existing.kind() != variable.kind() => {
                    Err(SolverError::contract(format!(
                        "variable {} is used both as {} and as {}",
                        variable,
                        existing.kind(),
                        variable.kind()
                    )))
                }
                _ => Ok(()),
            },
            None => Ok(()),
        }
    }

    /**
     * Registers one more reference to a problem variable. An unknown variable becomes a new non-basic column,
     * bounded to its type range if requested.
     */
    pub fn reference_problem_variable(
        &mut self,
        variable: &Variable,
        type_range: bool,
    ) -> Result<VarId, SolverError> {
        self.check_declaration(variable)?;
        if let Some(entry) = self.problem_variables.get_mut(variable.name()) {
            entry.references += 1;
            return Ok(entry.id);
        }

        let (lower, upper) = match variable.kind().range_as_fractions() {
            Some((min, max)) if type_range => (
                Some(Infinitesimal::from_real(F::from_exact(&min))),
                Some(Infinitesimal::from_real(F::from_exact(&max))),
            ),
            _ => (None, None),
        };
        let mut value = Infinitesimal::zero();
        if let Some(lower) = &lower {
            if &value < lower {
                value = lower.clone();
            }
        }
        if let Some(upper) = &upper {
            if &value > upper {
                value = upper.clone();
            }
        }

        let column = self.columns.len();
        let id = self.variables.allocate(TableauVariable {
            origin: Origin::Problem(variable.clone()),
            integral: variable.is_integral(),
            lower,
            upper,
            value,
            state: VarState::NonBasic(column),
        });
        self.columns.push(id);
        for row in self.rows.iter_mut() {
            row.push(F::zero());
        }
        self.problem_variables.insert(
            variable.name().to_string(),
            ProblemEntry { id, references: 1 },
        );
        trace!("new column {} for problem variable {}", column, variable);
        Ok(id)
    }

    /**
     * Drops one reference to a problem variable. The column of an unreferenced variable is deleted; it must
     * be non-basic and all-zero by then.
     */
    pub fn release_problem_variable(&mut self, id: VarId) -> Result<(), SolverError> {
        let name = match &self.variables[id].origin {
            Origin::Problem(variable) => variable.name().to_string(),
            _ => return Err(SolverError::contract(format!("{} is not a problem variable", id))),
        };
        let entry = self
            .problem_variables
            .get_mut(&name)
            .ok_or_else(|| SolverError::contract(format!("{} is not referenced", name)))?;
        entry.references -= 1;
        if entry.references > 0 {
            return Ok(());
        }

        let column = match self.variables[id].state {
            VarState::NonBasic(column) => column,
            VarState::Basic(row) => {
                return Err(SolverError::unstable(format!(
                    "unreferenced variable {} is basic in row {}",
                    name, row
                )));
            }
        };
        if self.rows.iter().any(|row| !row[column].is_zero()) {
            return Err(SolverError::unstable(format!(
                "unreferenced variable {} still has a non-zero column",
                name
            )));
        }
        self.drop_column(column);
        self.variables.release(id);
        self.problem_variables.shift_remove(&name);
        trace!("dropped column {} of problem variable {}", column, name);
        Ok(())
    }

    fn drop_column(&mut self, column: usize) {
        for row in self.rows.iter_mut() {
            row.remove(column);
        }
        self.columns.remove(column);
        for (index, id) in self.columns.iter().enumerate().skip(column) {
            self.variables[*id].state = VarState::NonBasic(index);
        }
    }

    /**
     * Adds the row `new = Σ coefficient·variable`, eliminating basic variables so that the row ranges over
     * the non-basic columns only. The new variable is basic, unbounded and consistent with the current values.
     */
    pub fn add_row(&mut self, terms: &[(VarId, F)], origin: Origin, integral: bool) -> VarId {
        let mut row = vec![F::zero(); self.columns.len()];
        for (id, coefficient) in terms {
            match self.variables[*id].state {
                VarState::NonBasic(column) => row[column] += coefficient,
                VarState::Basic(basic_row) => {
                    for (entry, value) in row.iter_mut().zip(&self.rows[basic_row]) {
                        if !value.is_zero() {
                            *entry += &(value.clone() * coefficient);
                        }
                    }
                }
            }
        }
        for entry in row.iter_mut() {
            entry.snap_to_zero(self.zero_threshold);
        }

        let index = self.rows.len();
        let value = self.evaluate(&row);
        let id = self.variables.allocate(TableauVariable {
            origin,
            integral,
            lower: None,
            upper: None,
            value,
            state: VarState::Basic(index),
        });
        self.rows.push(row);
        self.basic.push(id);
        id
    }

    /**
     * Makes the variable basic and deletes its row, which removes the variable from the tableau.
     */
    pub fn remove_row_of(&mut self, id: VarId) -> Result<(), SolverError> {
        let row = self.make_basic(id)?;
        self.rows.remove(row);
        self.basic.remove(row);
        for (index, basic) in self.basic.iter().enumerate().skip(row) {
            self.variables[*basic].state = VarState::Basic(index);
        }
        self.variables.release(id);
        Ok(())
    }

    /**
     * Pivots a non-basic variable into the basis and returns its row. Rows whose basic variable would be
     * displaced within its bounds are preferred; otherwise the displaced variable is clamped to the nearer
     * violated bound.
     */
    pub fn make_basic(&mut self, id: VarId) -> Result<usize, SolverError> {
        let column = match self.variables[id].state {
            VarState::Basic(row) => return Ok(row),
            VarState::NonBasic(column) => column,
        };

        let mut fallback = None;
        let mut chosen = None;
        for (index, row) in self.rows.iter().enumerate() {
            if row[column].is_zero() {
                continue;
            }
            if self.is_within_bounds(self.basic[index]) {
                chosen = Some(index);
                break;
            }
            fallback.get_or_insert(index);
        }
        let row = chosen.or(fallback).ok_or_else(|| {
            SolverError::unstable(format!("the column of variable {} is zero", id))
        })?;

        let displaced = self.basic[row];
        self.pivot(row, column);

        let clamped = {
            let variable = &self.variables[displaced];
            match (&variable.lower, &variable.upper) {
                (Some(lower), _) if &variable.value < lower => Some(lower.clone()),
                (_, Some(upper)) if &variable.value > upper => Some(upper.clone()),
                _ => None,
            }
        };
        if let Some(bound) = clamped {
            self.update_non_basic(displaced, bound);
        }
        Ok(row)
    }

    /**
     * Exchanges the roles of the basic variable of `row` and the non-basic variable of `column` by Gaussian
     * elimination. Values are left untouched; they stay consistent with the rewritten rows.
     */
    pub fn pivot(&mut self, row: usize, column: usize) {
        let leaving = self.basic[row];
        let entering = self.columns[column];
        let pivot = self.rows[row][column].clone();

        //leaving = Σ a_j·x_j  becomes  entering = leaving/a_c - Σ_{j≠c} (a_j/a_c)·x_j
        let mut pivot_row = std::mem::take(&mut self.rows[row]);
        for (index, entry) in pivot_row.iter_mut().enumerate() {
            if index == column {
                *entry = F::one() / &pivot;
            } else if !entry.is_zero() {
                *entry = -(entry.clone() / &pivot);
            }
            entry.snap_to_zero(self.zero_threshold);
        }

        for (index, other) in self.rows.iter_mut().enumerate() {
            if index == row {
                continue;
            }
            let factor = other[column].clone();
            if factor.is_zero() {
                other[column] = F::zero();
                continue;
            }
            for (entry, pivot_entry) in other.iter_mut().zip(&pivot_row) {
                if !pivot_entry.is_zero() {
                    *entry += &(factor.clone() * pivot_entry);
                }
            }
            //the column now belongs to the leaving variable
            other[column] = factor * &pivot_row[column];
            for entry in other.iter_mut() {
                entry.snap_to_zero(self.zero_threshold);
            }
        }

        self.rows[row] = pivot_row;
        self.basic[row] = entering;
        self.columns[column] = leaving;
        self.variables[entering].state = VarState::Basic(row);
        self.variables[leaving].state = VarState::NonBasic(column);
    }

    /**
     * Moves the basic variable of `row` to `target` by changing the non-basic variable of `column`, updates
     * all other basic values accordingly, and pivots the two.
     */
    pub fn pivot_and_update(&mut self, row: usize, column: usize, target: Infinitesimal<F>) {
        let leaving = self.basic[row];
        let entering = self.columns[column];
        let coefficient = self.rows[row][column].clone();

        let theta = (target.clone() - &self.variables[leaving].value).divide(&coefficient);
        self.variables[leaving].value = target;
        self.variables[entering].value += &theta;
        for (index, other) in self.rows.iter().enumerate() {
            if index != row && !other[column].is_zero() {
                let basic = self.basic[index];
                self.variables[basic].value.add_scaled(&theta, &other[column]);
            }
        }
        self.snap_values();

        self.pivot(row, column);
    }

    /**
     * Sets the value of a non-basic variable and propagates the change to every basic variable.
     */
    pub fn update_non_basic(&mut self, id: VarId, value: Infinitesimal<F>) {
        let column = match self.variables[id].state {
            VarState::NonBasic(column) => column,
            VarState::Basic(_) => return,
        };
        let difference = value.clone() - &self.variables[id].value;
        for (index, row) in self.rows.iter().enumerate() {
            if !row[column].is_zero() {
                let basic = self.basic[index];
                self.variables[basic].value.add_scaled(&difference, &row[column]);
            }
        }
        self.variables[id].value = value;
        self.snap_values();
    }

    /**
     * Replaces the lower bound. A non-basic value below the new bound is moved onto it; a basic value is left
     * for the next solve. Returns whether the bounds of the variable are still consistent.
     */
    pub fn set_lower_bound(&mut self, id: VarId, bound: Option<Infinitesimal<F>>) -> bool {
        self.variables[id].lower = bound;
        if !self.bounds_consistent(id) {
            return false;
        }
        let variable = &self.variables[id];
        if !variable.is_basic() {
            if let Some(lower) = &variable.lower {
                if &variable.value < lower {
                    let lower = lower.clone();
                    self.update_non_basic(id, lower);
                }
            }
        }
        true
    }

    /// Counterpart of [Self::set_lower_bound].
    pub fn set_upper_bound(&mut self, id: VarId, bound: Option<Infinitesimal<F>>) -> bool {
        self.variables[id].upper = bound;
        if !self.bounds_consistent(id) {
            return false;
        }
        let variable = &self.variables[id];
        if !variable.is_basic() {
            if let Some(upper) = &variable.upper {
                if &variable.value > upper {
                    let upper = upper.clone();
                    self.update_non_basic(id, upper);
                }
            }
        }
        true
    }

    pub fn bounds_consistent(&self, id: VarId) -> bool {
        match (&self.variables[id].lower, &self.variables[id].upper) {
            (Some(lower), Some(upper)) => lower <= upper,
            _ => true,
        }
    }

    pub fn is_below_lower(&self, id: VarId) -> bool {
        let variable = &self.variables[id];
        variable
            .lower
            .as_ref()
            .is_some_and(|lower| &variable.value < lower)
    }

    pub fn is_above_upper(&self, id: VarId) -> bool {
        let variable = &self.variables[id];
        variable
            .upper
            .as_ref()
            .is_some_and(|upper| &variable.value > upper)
    }

    pub fn is_within_bounds(&self, id: VarId) -> bool {
        !self.is_below_lower(id) && !self.is_above_upper(id)
    }

    /**
     * Chooses a concrete value for δ that keeps every bound satisfied: for a bound `c_l + k_l·δ ≤ c_v + k_v·δ`
     * with `c_l < c_v` and `k_l > k_v`, δ may not exceed `(c_v - c_l) / (k_l - k_v)`. Without such a pair δ is 1.
     */
    pub fn update_delta(&mut self) {
        let mut delta: Option<F> = None;
        for (_, variable) in self.variables.iter() {
            let limits = [
                variable
                    .lower
                    .as_ref()
                    .and_then(|lower| delta_limit(lower, &variable.value)),
                variable
                    .upper
                    .as_ref()
                    .and_then(|upper| delta_limit(&variable.value, upper)),
            ];
            for limit in limits.into_iter().flatten() {
                delta = match delta {
                    Some(current) if current.compare(&limit).is_le() => Some(current),
                    _ => Some(limit),
                };
            }
        }
        self.delta = delta.unwrap_or_else(F::one);
    }

    /// Value of a dense row under the current values of the non-basic variables.
    pub fn evaluate(&self, row: &[F]) -> Infinitesimal<F> {
        let mut sum = Infinitesimal::zero();
        for (coefficient, id) in row.iter().zip(&self.columns) {
            if !coefficient.is_zero() {
                sum.add_scaled(&self.variables[*id].value, coefficient);
            }
        }
        sum
    }

    pub fn snapshot_values(&self) -> FxHashMap<VarId, Infinitesimal<F>> {
        self.variables
            .iter()
            .map(|(id, variable)| (id, variable.value.clone()))
            .collect()
    }

    /**
     * Restores the non-basic values of a snapshot, clamped to the current bounds, and re-derives all basic
     * values from their rows.
     */
    pub fn restore_values(&mut self, snapshot: &FxHashMap<VarId, Infinitesimal<F>>) {
        for id in self.columns.clone() {
            if let Some(value) = snapshot.get(&id) {
                self.variables[id].value = value.clone();
            }
            let variable = &mut self.variables[id];
            if let Some(lower) = &variable.lower {
                if &variable.value < lower {
                    variable.value = lower.clone();
                }
            }
            if let Some(upper) = &variable.upper {
                if &variable.value > upper {
                    variable.value = upper.clone();
                }
            }
        }
        self.recompute_basic_values();
    }

    pub fn recompute_basic_values(&mut self) {
        for index in 0..self.rows.len() {
            let value = self.evaluate(&self.rows[index]);
            let basic = self.basic[index];
            self.variables[basic].value = value;
        }
    }

    fn snap_values(&mut self) {
        if F::is_exact() {
            return;
        }
        for index in 0..self.basic.len() {
            let basic = self.basic[index];
            self.variables[basic].value.snap_to_zero(self.zero_threshold);
        }
    }

    /**
     * The current values of the problem variables with δ made concrete, in order of first reference.
     * Integral variables must hold integral values.
     */
    pub fn witness(&mut self) -> Result<Assignment, SolverError> {
        self.update_delta();
        let mut assignment = Assignment::new();
        for entry in self.problem_variables.values() {
            let variable = &self.variables[entry.id];
            let problem = match &variable.origin {
                Origin::Problem(problem) => problem,
                _ => continue,
            };
            let value = variable.value.materialise(&self.delta).to_exact();
            let constant = if problem.is_integral() {
                Constant::Integral(value.to_big_int().ok_or_else(|| {
                    SolverError::unstable(format!(
                        "integral variable {} has the fractional value {}",
                        problem, value
                    ))
                })?)
            } else {
                Constant::Real(value)
            };
            assignment.insert(problem.clone(), constant);
        }
        Ok(assignment)
    }
}

/// The largest δ for which `smaller ≤ larger` still holds, if that is a restriction.
fn delta_limit<F: Scalar>(smaller: &Infinitesimal<F>, larger: &Infinitesimal<F>) -> Option<F> {
    if smaller.real.compare(&larger.real).is_lt() && smaller.delta.compare(&larger.delta).is_gt() {
        Some((larger.real.clone() - &smaller.real) / (smaller.delta.clone() - &larger.delta))
    } else {
        None
    }
}
