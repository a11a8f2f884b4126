use std::io::{BufRead, Write};

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use serde_json::{Map, Value};

use crate::{
    line_reader::LineReader,
    objects::relation_parser::{Declarations, parse_declaration, parse_relation},
    solver_framework::{
        constraint_solver::{ConstraintSolver, Decision, new_solver},
        solver_config::SolverConfig,
        solver_error::SolverError,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/**
 * Executes a script of declarations, relations and the directives `pop`, `check` and `reset` against one
 * solver instance. Every `check` writes the decision for the relations on the stack at that point. A script
 * that does not end with `check` gets a final one.
 */
pub struct ScriptRunner<'w> {
    solver: Box<dyn ConstraintSolver>,
    declarations: Declarations,
    format: OutputFormat,
    output: &'w mut dyn Write,
    checks: usize,
}

impl<'w> ScriptRunner<'w> {
    pub fn new(config: SolverConfig, format: OutputFormat, output: &'w mut dyn Write) -> Self {
        Self {
            solver: new_solver(config),
            declarations: Declarations::new(),
            format,
            output,
            checks: 0,
        }
    }

    pub fn number_of_checks(&self) -> usize {
        self.checks
    }

    pub fn run(&mut self, reader: &mut dyn BufRead) -> Result<()> {
        let mut lines = LineReader::new(reader);
        let mut ends_with_check = false;

        while let Some(line) = lines.next_line()? {
            let line = line.to_string();
            let line_no = lines.get_last_line_number();
            ends_with_check = self
                .execute(&line, line_no)
                .with_context(|| format!("line {}: `{}`", line_no, line))?;
        }

        if !ends_with_check {
            self.check(lines.get_last_line_number())
                .context("final check")?;
        }
        Ok(())
    }

    /// Executes one line; returns whether it was a check.
    fn execute(&mut self, line: &str, line_no: usize) -> Result<bool> {
        match line {
            "check" => {
                self.check(line_no)?;
                return Ok(true);
            }
            "pop" => {
                self.solver.remove_constraint()?;
                debug!("popped, {} relations left", self.solver.depth());
            }
            "reset" => {
                self.solver.reset();
                debug!("solver reset");
            }
            _ => {
                if let Some(variables) = parse_declaration(line)? {
                    for variable in variables {
                        self.declarations.declare(variable)?;
                    }
                } else {
                    let relation = parse_relation(line, &self.declarations)?;
                    debug!("push {}", relation);
                    self.solver.add_constraint(&relation)?;
                }
            }
        }
        Ok(false)
    }

    fn check(&mut self, line_no: usize) -> Result<()> {
        self.checks += 1;
        let outcome = match self.solver.get_solution() {
            Ok(decision) => Ok(decision),
            Err(error @ (SolverError::Timeout | SolverError::DepthLimit(_))) => Err(error),
            Err(error) => return Err(anyhow!(error)),
        };
        info!(
            "check {} on line {} with {} relations: {}",
            self.checks,
            line_no,
            self.solver.depth(),
            match &outcome {
                Ok(Decision::Satisfiable(_)) => "sat",
                Ok(Decision::Infeasible) => "unsat",
                Err(_) => "unknown",
            }
        );

        match self.format {
            OutputFormat::Text => match outcome {
                Ok(decision) => write!(self.output, "{}", decision)?,
                Err(error) => writeln!(self.output, "unknown ({})", error)?,
            },
            OutputFormat::Json => {
                let value = self.to_json(line_no, outcome);
                writeln!(self.output, "{}", value)?;
            }
        }
        Ok(())
    }

    fn to_json(&self, line_no: usize, outcome: Result<Decision, SolverError>) -> Value {
        let mut object = Map::new();
        object.insert("check".to_string(), Value::from(self.checks));
        object.insert("line".to_string(), Value::from(line_no));
        match outcome {
            Ok(Decision::Satisfiable(assignment)) => {
                object.insert("result".to_string(), Value::from("sat"));
                let mut values = Map::new();
                for (variable, value) in assignment.iter() {
                    values.insert(variable.name().to_string(), Value::from(value.to_string()));
                }
                object.insert("assignment".to_string(), Value::Object(values));
            }
            Ok(Decision::Infeasible) => {
                object.insert("result".to_string(), Value::from("unsat"));
            }
            Err(error) => {
                object.insert("result".to_string(), Value::from("unknown"));
                object.insert("reason".to_string(), Value::from(error.to_string()));
            }
        }
        Value::Object(object)
    }
}

/**
 * Runs a script and returns everything it printed.
 */
pub fn run_script(text: &str, config: SolverConfig, format: OutputFormat) -> Result<String> {
    let mut output = vec![];
    {
        let mut runner = ScriptRunner::new(config, format, &mut output);
        let mut reader = text.as_bytes();
        runner.run(&mut reader)?;
    }
    String::from_utf8(output).context("output is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use crate::{
        math::fraction::Arithmetic,
        script::{OutputFormat, run_script},
        solver_framework::solver_config::SolverConfig,
    };

    #[test]
    fn checks_and_pops() {
        let script = "\
# two integers on a line
int x, y
x + y = 3
x - y = 1
check
pop
x - y = 2
";
        let output = run_script(script, SolverConfig::default(), OutputFormat::Text).unwrap();
        assert_eq!(output, "sat\nx = 2\ny = 1\nunsat\n");
    }

    #[test]
    fn reals() {
        let script = "real a\n2a = 1\ncheck\n";
        let output = run_script(script, SolverConfig::default(), OutputFormat::Text).unwrap();
        assert_eq!(output, "sat\na = 1/2\n");

        let config = SolverConfig::default().with_arithmetic(Arithmetic::Approximate);
        let output = run_script(script, config, OutputFormat::Text).unwrap();
        assert_eq!(output, "sat\na = 1/2\n");
    }

    #[test]
    fn empty_script_is_satisfiable() {
        let output = run_script("# nothing\n", SolverConfig::default(), OutputFormat::Text).unwrap();
        assert_eq!(output, "sat\n");
    }

    #[test]
    fn reset_keeps_declarations() {
        let script = "int x\nx < 0\nx > 0\ncheck\nreset\nx >= 5\nx <= 5\n";
        let output = run_script(script, SolverConfig::default(), OutputFormat::Text).unwrap();
        assert_eq!(output, "unsat\nsat\nx = 5\n");
    }

    #[test]
    fn json() {
        let script = "int x\n2x = 1\ncheck\npop\nx >= 4\nx <= 4\n";
        let output = run_script(script, SolverConfig::default(), OutputFormat::Json).unwrap();
        let lines: Vec<Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["result"], "unsat");
        assert_eq!(lines[0]["line"], 3);
        assert_eq!(lines[1]["result"], "sat");
        assert_eq!(lines[1]["check"], 2);
        assert_eq!(lines[1]["assignment"]["x"], "4");
    }

    #[test]
    fn errors_carry_line_numbers() {
        let error = run_script("int x\n\nx <= y\n", SolverConfig::default(), OutputFormat::Text)
            .unwrap_err();
        assert!(format!("{:#}", error).contains("line 3"));

        let error = run_script("pop\n", SolverConfig::default(), OutputFormat::Text).unwrap_err();
        assert!(format!("{:#}", error).contains("line 1"));
    }
}
