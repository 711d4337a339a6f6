//! gridcalc CLI - evaluate spreadsheet formulas from the command line

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gridcalc::prelude::*;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gridcalc")]
#[command(author, version, about = "Spreadsheet formula evaluation tool")]
struct Cli {
    /// Cell content as POS=TEXT, e.g. A1=5 or "A2==A1*2" (repeatable)
    #[arg(short, long = "cell", global = true, value_name = "POS=TEXT")]
    cells: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value of one or more cells
    Get {
        /// Cell positions, e.g. A1 B2
        #[arg(required = true)]
        positions: Vec<String>,
    },

    /// Evaluate text as if it were a cell, without storing it
    #[command(alias = "eval")]
    Query {
        /// Formula or literal, e.g. "=SUM(A1:A3)"
        formula: String,
    },

    /// List every non-empty cell with its text and value
    Cells,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let sheet = build_sheet(&cli.cells)?;

    match cli.command {
        Commands::Get { positions } => get_values(&sheet, &positions),
        Commands::Query { formula } => query(&sheet, &formula),
        Commands::Cells => list_cells(&sheet),
    }
}

/// Split a `POS=TEXT` argument on its first `=`
fn parse_assignment(arg: &str) -> Result<(CellPosition, &str)> {
    let (position, text) = arg
        .split_once('=')
        .with_context(|| format!("Expected POS=TEXT, got '{}'", arg))?;
    let position = position.trim();
    if !CellPosition::is_reference_shaped(position) {
        bail!("'{}' is not a cell position", position);
    }
    Ok((CellPosition::from(position), text))
}

fn build_sheet(assignments: &[String]) -> Result<Spreadsheet> {
    let mut config = EnvironmentConfig::default();
    for arg in assignments {
        let (position, text) = parse_assignment(arg)?;
        config = config.cell(position, text);
    }
    tracing::debug!(cells = assignments.len(), "sheet loaded");
    Ok(Spreadsheet::with_config(config))
}

fn get_values(sheet: &Spreadsheet, positions: &[String]) -> Result<()> {
    let mut out = io::stdout().lock();
    let mut failed = 0;
    for position in positions {
        let written = match sheet.get_value(position.as_str()) {
            Ok(value) => writeln!(out, "{} = {}", position, value),
            Err(err) => {
                failed += 1;
                writeln!(out, "{}: {}", position, err)
            }
        };
        written.context("Failed to write to stdout")?;
    }
    if failed > 0 {
        bail!("{} of {} cells failed to evaluate", failed, positions.len());
    }
    Ok(())
}

fn query(sheet: &Spreadsheet, formula: &str) -> Result<()> {
    let value = sheet
        .evaluate_query(formula)
        .with_context(|| format!("Failed to evaluate '{}'", formula))?;
    println!("{}", value);
    Ok(())
}

fn list_cells(sheet: &Spreadsheet) -> Result<()> {
    let mut out = io::stdout().lock();
    for (position, content) in sheet.cells() {
        let value = match sheet.get_value(position) {
            Ok(value) => value.to_string(),
            Err(err) => format!("error: {}", err),
        };
        writeln!(out, "{}\t{}\t{}", position, content, value)
            .context("Failed to write to stdout")?;
    }
    Ok(())
}
