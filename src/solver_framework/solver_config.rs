use std::time::Duration;

use crate::math::fraction::Arithmetic;

/**
 * Settings of one solver instance.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    pub arithmetic: Arithmetic,

    /// Approximate values below this magnitude are replaced by zero after every pivot. The threshold never
    /// drops below the zero tolerance of the representation, so entries treated as zero are also stored as zero.
    pub zero_threshold: f64,

    /// Tolerance of the consistency check under approximate arithmetic.
    pub consistency_tolerance: f64,

    pub gomory_cuts: bool,

    /// During branch-and-bound, let additional and cut variables enter the basis before problem variables.
    pub prefer_additional_entering: bool,

    pub timeout: Option<Duration>,

    /// Recheck the tableau after every structural change.
    pub verify: bool,

    /// Number of pivots of one solve after which the pivot choice switches to Bland's rule.
    pub bland_threshold: usize,

    pub max_branch_depth: usize,

    /// Bound variables of the bounded integral kinds to the range of their type.
    pub bound_integral_kinds: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            arithmetic: Arithmetic::Exact,
            zero_threshold: 1e-12,
            consistency_tolerance: 1e-6,
            gomory_cuts: true,
            prefer_additional_entering: true,
            timeout: None,
            verify: cfg!(debug_assertions),
            bland_threshold: 64,
            max_branch_depth: 1024,
            bound_integral_kinds: true,
        }
    }
}

impl SolverConfig {
    pub fn with_arithmetic(mut self, arithmetic: Arithmetic) -> Self {
        self.arithmetic = arithmetic;
        self
    }

    pub fn with_gomory_cuts(mut self, gomory_cuts: bool) -> Self {
        self.gomory_cuts = gomory_cuts;
        self
    }

    pub fn with_prefer_additional_entering(mut self, prefer: bool) -> Self {
        self.prefer_additional_entering = prefer;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_bland_threshold(mut self, bland_threshold: usize) -> Self {
        self.bland_threshold = bland_threshold;
        self
    }

    pub fn with_max_branch_depth(mut self, max_branch_depth: usize) -> Self {
        self.max_branch_depth = max_branch_depth;
        self
    }

    pub fn with_bound_integral_kinds(mut self, bound_integral_kinds: bool) -> Self {
        self.bound_integral_kinds = bound_integral_kinds;
        self
    }

    pub fn with_zero_threshold(mut self, zero_threshold: f64) -> Self {
        self.zero_threshold = zero_threshold;
        self
    }
}
