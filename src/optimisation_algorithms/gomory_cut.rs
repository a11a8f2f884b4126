use itertools::Itertools;
use log::trace;

use crate::{
    math::{infinitesimal::Infinitesimal, traits::Scalar},
    optimisation_algorithms::{
        tableau::Tableau,
        variable_arena::{Origin, VarId},
    },
};

/**
 * A cut `Σ coefficient·variable ≥ lower` over the non-basic variables of the row it was derived from.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct GomoryCut<F> {
    pub terms: Vec<(VarId, F)>,
    pub lower: F,
}

impl<F: Scalar> Tableau<F> {
    /**
     * Derives the mixed-integer Gomory cut of a row. The basic variable must be integral with a fractional,
     * δ-free value, and every non-basic variable of the row must sit exactly on a δ-free bound.
     *
     * With `t_j = x_j - l_j` for variables at their lower bound and `t_j = u_j - x_j` for variables at their
     * upper bound, the row reads `x_b + Σ ā_j·t_j = β`, and with `f₀ = fract(β)` the cut is `Σ g_j·t_j ≥ 1`.
     */
    pub fn gomory_cut(&self, row: usize) -> Option<GomoryCut<F>> {
        let basic = &self.variables[self.basic[row]];
        if !basic.integral || basic.value.has_delta() || basic.value.real.is_integer() {
            return None;
        }
        let f0 = basic.value.real.fract();
        let one_minus_f0 = F::one() - &f0;

        let mut terms = vec![];
        let mut lower = F::one();
        for (column, coefficient) in self.rows[row].iter().enumerate() {
            if coefficient.is_zero() {
                continue;
            }
            let id = self.columns[column];
            let variable = &self.variables[id];
            if variable.value.has_delta() {
                return None;
            }

            //x_b = β + a_j·(x_j - l_j)  or  x_b = β - a_j·(u_j - x_j)
            let (bound, at_lower) = match (&variable.lower, &variable.upper) {
                (Some(bound), _) if bound == &variable.value => (bound, true),
                (_, Some(bound)) if bound == &variable.value => (bound, false),
                _ => return None,
            };
            if bound.has_delta() {
                return None;
            }
            let a_bar = if at_lower {
                -coefficient.clone()
            } else {
                coefficient.clone()
            };

            let g = if variable.integral && bound.real.is_integer() {
                let f_j = a_bar.fract();
                if f_j.compare(&f0).is_le() {
                    f_j / &f0
                } else {
                    (F::one() - &f_j) / &one_minus_f0
                }
            } else if !a_bar.is_negative() {
                a_bar / &f0
            } else {
                -a_bar / &one_minus_f0
            };
            if g.is_zero() {
                continue;
            }

            //g·t_j = g·x_j - g·l_j  or  g·u_j - g·x_j
            if at_lower {
                lower += &(g.clone() * &bound.real);
                terms.push((id, g));
            } else {
                lower -= &(g.clone() * &bound.real);
                terms.push((id, -g));
            }
        }

        if terms.is_empty() {
            None
        } else {
            Some(GomoryCut { terms, lower })
        }
    }

    /**
     * Adds one cut for every eligible row, each as a new row whose basic cut variable is bounded from below.
     * Returns the cut variables in order of creation.
     */
    pub fn add_gomory_cuts(&mut self) -> Vec<VarId> {
        let cuts = (0..self.rows.len())
            .filter_map(|row| self.gomory_cut(row))
            .collect::<Vec<_>>();
        cuts.into_iter()
            .map(|cut| {
                let id = self.add_row(&cut.terms, Origin::Cut, false);
                trace!(
                    "Gomory cut {}: {} >= {}",
                    id,
                    cut.terms
                        .iter()
                        .map(|(variable, coefficient)| format!("{}*v{}", coefficient, variable))
                        .join(" + "),
                    cut.lower
                );
                self.set_lower_bound(id, Some(Infinitesimal::from_real(cut.lower)));
                id
            })
            .collect()
    }
}
