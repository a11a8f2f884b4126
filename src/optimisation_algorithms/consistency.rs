use log::warn;

use crate::{
    math::traits::Scalar,
    optimisation_algorithms::{tableau::Tableau, variable_arena::VarState},
    solver_framework::solver_error::SolverError,
};

impl<F: Scalar> Tableau<F> {
    /**
     * Checks the structural and numerical invariants of the tableau. Any violation means the tableau can no
     * longer be trusted.
     */
    pub fn verify(&self) -> Result<(), SolverError> {
        let result = self.verify_structure().and_then(|_| self.verify_values());
        if let Err(error) = &result {
            warn!("tableau is inconsistent: {}", error);
        }
        result
    }

    fn verify_structure(&self) -> Result<(), SolverError> {
        for (row, id) in self.basic.iter().enumerate() {
            if !self.variables.contains(*id) || self.variables[*id].state != VarState::Basic(row) {
                return Err(SolverError::unstable(format!(
                    "row {} belongs to variable {}, which is not basic there",
                    row, id
                )));
            }
            if self.rows[row].len() != self.columns.len() {
                return Err(SolverError::unstable(format!("row {} has the wrong width", row)));
            }
            if self.rows[row].iter().all(|entry| entry.is_zero()) {
                return Err(SolverError::unstable(format!("row {} is zero", row)));
            }
        }

        for (column, id) in self.columns.iter().enumerate() {
            if !self.variables.contains(*id) || self.variables[*id].state != VarState::NonBasic(column)
            {
                return Err(SolverError::unstable(format!(
                    "column {} belongs to variable {}, which is not non-basic there",
                    column, id
                )));
            }
            if self.rows.iter().all(|row| row[column].is_zero()) {
                return Err(SolverError::unstable(format!(
                    "column {} of variable {} is zero",
                    column, id
                )));
            }
        }

        if self.variables.len() != self.basic.len() + self.columns.len() {
            return Err(SolverError::unstable(
                "variables are neither basic nor non-basic",
            ));
        }
        Ok(())
    }

    fn verify_values(&self) -> Result<(), SolverError> {
        for id in &self.columns {
            if !self.is_within_bounds(*id) {
                return Err(SolverError::unstable(format!(
                    "non-basic variable {} = {} is out of its bounds",
                    id, self.variables[*id].value
                )));
            }
        }

        for (row, id) in self.basic.iter().enumerate() {
            let expected = self.evaluate(&self.rows[row]);
            let actual = &self.variables[*id].value;
            let consistent = if F::is_exact() {
                &expected == actual
            } else {
                expected.approx_eq(actual, self.tolerance)
            };
            if !consistent {
                return Err(SolverError::unstable(format!(
                    "basic variable {} = {} differs from its row value {}",
                    id, actual, expected
                )));
            }
        }
        Ok(())
    }
}
