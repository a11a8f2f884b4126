use log::{debug, trace};

use crate::{
    math::traits::Scalar,
    optimisation_algorithms::{
        tableau::Tableau,
        variable_arena::{Origin, VarId},
    },
    solver_framework::{deadline::Deadline, solver_error::SolverError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    BelowLower,
    AboveUpper,
}

/**
 * How `solve` chooses pivots.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PivotRules {
    /// Pivots after which the choice switches to Bland's rule for the remainder of the call.
    pub bland_threshold: usize,

    /// Let additional and cut variables enter the basis before problem variables.
    pub prefer_additional: bool,
}

impl Default for PivotRules {
    fn default() -> Self {
        Self {
            bland_threshold: 64,
            prefer_additional: false,
        }
    }
}

impl<F: Scalar> Tableau<F> {
    pub fn violation(&self, id: VarId) -> Option<Violation> {
        if self.is_below_lower(id) {
            Some(Violation::BelowLower)
        } else if self.is_above_upper(id) {
            Some(Violation::AboveUpper)
        } else {
            None
        }
    }

    fn can_increase(&self, id: VarId) -> bool {
        let variable = &self.variables[id];
        variable
            .upper
            .as_ref()
            .is_none_or(|upper| &variable.value < upper)
    }

    fn can_decrease(&self, id: VarId) -> bool {
        let variable = &self.variables[id];
        variable
            .lower
            .as_ref()
            .is_none_or(|lower| &variable.value > lower)
    }

    /**
     * A basic variable outside its bounds: the first in row order, or the one with the smallest identifier
     * under Bland's rule.
     */
    fn select_leaving(&self, bland: bool) -> Option<(usize, Violation)> {
        let mut candidates = self
            .basic
            .iter()
            .enumerate()
            .filter_map(|(row, id)| self.violation(*id).map(|violation| (row, violation)));
        if bland {
            candidates.min_by_key(|(row, _)| self.basic[*row])
        } else {
            candidates.next()
        }
    }

    /**
     * A non-basic variable of the row that can move in the direction that repairs the violation.
     */
    fn select_entering(
        &self,
        row: usize,
        violation: Violation,
        bland: bool,
        prefer_additional: bool,
    ) -> Option<usize> {
        let eligible = self.rows[row]
            .iter()
            .enumerate()
            .filter(|(column, coefficient)| {
                if coefficient.is_zero() {
                    return false;
                }
                let id = self.columns[*column];
                match (violation, coefficient.is_positive()) {
                    (Violation::BelowLower, true) | (Violation::AboveUpper, false) => {
                        self.can_increase(id)
                    }
                    (Violation::BelowLower, false) | (Violation::AboveUpper, true) => {
                        self.can_decrease(id)
                    }
                }
            })
            .map(|(column, _)| column);

        if bland {
            eligible.min_by_key(|column| self.columns[*column])
        } else if prefer_additional {
            let eligible = eligible.collect::<Vec<_>>();
            eligible
                .iter()
                .find(|column| {
                    !matches!(self.variables[self.columns[**column]].origin, Origin::Problem(_))
                })
                .or(eligible.first())
                .copied()
        } else {
            eligible.min()
        }
    }

    /**
     * Restores feasibility of all basic variables by pivoting. Returns false if the bounds admit no solution.
     */
    pub fn solve(&mut self, deadline: &Deadline, rules: &PivotRules) -> Result<bool, SolverError> {
        for iteration in 0.. {
            deadline.check()?;
            if iteration % 1000 == 0 && iteration > 0 {
                debug!(
                    "solve iteration {}, {} rows, {} columns",
                    iteration,
                    self.rows.len(),
                    self.columns.len()
                );
            }

            let bland = iteration >= rules.bland_threshold;
            let (row, violation) = match self.select_leaving(bland) {
                Some(leaving) => leaving,
                None => {
                    trace!("feasible after {} pivots", iteration);
                    self.update_delta();
                    return Ok(true);
                }
            };

            let column = match self.select_entering(row, violation, bland, rules.prefer_additional) {
                Some(column) => column,
                None => {
                    trace!(
                        "infeasible after {} pivots: row {} cannot be repaired",
                        iteration, row
                    );
                    return Ok(false);
                }
            };

            let leaving = self.basic[row];
            let target = match violation {
                Violation::BelowLower => self.variables[leaving].lower.clone(),
                Violation::AboveUpper => self.variables[leaving].upper.clone(),
            }
            .ok_or_else(|| SolverError::unstable(format!("variable {} violates a missing bound", leaving)))?;
            trace!(
                "pivot {}: variable {} leaves towards {}, variable {} enters",
                iteration, leaving, target, self.columns[column]
            );

            self.pivot_and_update(row, column, target);
            self.update_delta();
        }
        unreachable!()
    }
}
