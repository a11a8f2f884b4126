pub mod math {
    pub mod traits;
    pub mod fraction;
    pub mod fraction_exact;
    pub mod fraction_f64;
    pub mod infinitesimal;
}
pub mod objects {
    pub mod variable;
    pub mod linear_relation;
    pub mod assignment;
    pub mod relation_parser;
}
pub mod solver_framework {
    pub mod solver_config;
    pub mod solver_error;
    pub mod deadline;
    pub mod constraint_solver;
}
pub mod optimisation_algorithms {
    pub mod variable_arena;
    pub mod tableau;
    pub mod simplex;
    pub mod gomory_cut;
    pub mod branch_and_cut;
    pub mod constraint_stack;
    pub mod consistency;
    pub mod simplex_solver;
}
pub mod line_reader;
pub mod script;
