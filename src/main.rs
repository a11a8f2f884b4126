use std::{
    fs::File,
    io::{self, BufReader},
    path::PathBuf,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use env_logger::Builder;

use tableau_solver::{
    math::fraction::Arithmetic,
    script::{OutputFormat, ScriptRunner},
    solver_framework::solver_config::SolverConfig,
};

#[derive(Parser)]
#[command(version, about = "Decides conjunctions of linear relations over integer and rational variables")]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a script of declarations, relations and the directives pop, check and reset.
    Solve {
        /// The script to run; `-` reads standard input.
        file: PathBuf,

        /// Compute with floating-point numbers instead of exact rationals.
        #[arg(long)]
        approximate: bool,

        /// Do not derive Gomory cuts.
        #[arg(long)]
        no_gomory: bool,

        /// Do not bound variables of the bounded integral kinds to the range of their type.
        #[arg(long)]
        no_type_ranges: bool,

        /// Give up on a check after this many milliseconds.
        #[arg(long, value_name = "MILLISECONDS")]
        timeout_ms: Option<u64>,

        /// Print one JSON object per check.
        #[arg(long)]
        json: bool,
    },
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();

    Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    log::info!("tableau-solver starting");

    match cli.command {
        Command::Solve {
            file,
            approximate,
            no_gomory,
            no_type_ranges,
            timeout_ms,
            json,
        } => {
            let config = SolverConfig::default()
                .with_arithmetic(if approximate {
                    Arithmetic::Approximate
                } else {
                    Arithmetic::Exact
                })
                .with_gomory_cuts(!no_gomory)
                .with_bound_integral_kinds(!no_type_ranges)
                .with_timeout(timeout_ms.map(Duration::from_millis));
            let format = if json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            };

            let stdout = io::stdout();
            let mut output = stdout.lock();
            let mut runner = ScriptRunner::new(config, format, &mut output);

            if file.as_os_str() == "-" {
                let mut reader = io::stdin().lock();
                runner.run(&mut reader).context("running script from standard input")?;
            } else {
                let opened = File::open(&file)
                    .with_context(|| format!("could not open {}", file.display()))?;
                let mut reader = BufReader::new(opened);
                runner
                    .run(&mut reader)
                    .with_context(|| format!("running script {}", file.display()))?;
            }
            log::info!("{} checks done", runner.number_of_checks());
        }
    }
    Ok(())
}
