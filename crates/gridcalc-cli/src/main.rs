//! gridcalc CLI - evaluate and check grid formulas

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gridcalc::prelude::*;
use gridcalc::validate_formula_with;
use log::debug;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gridcalc")]
#[command(author, version, about = "Spreadsheet-style formula evaluation tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every formula in a grid file
    #[command(alias = "calc")]
    Eval {
        /// Input grid file (json, csv)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format when writing to stdout
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Print the full JSON response (rows, cell errors, stats) instead of the grid
        #[arg(short, long)]
        report: bool,

        /// Only accept a reference, a SUM/AVERAGE call or one arithmetic operation
        #[arg(long)]
        single_operation: bool,
    },

    /// Check a formula before saving it
    Check {
        /// Formula text, e.g. "=SUM(A1:B3)"
        formula: String,

        /// Grid file whose bounds the formula must stay within
        #[arg(short, long, conflicts_with_all = ["rows", "cols"])]
        grid: Option<PathBuf>,

        /// Number of rows in the target grid
        #[arg(long, requires = "cols")]
        rows: Option<u32>,

        /// Number of addressable columns in the target grid
        #[arg(long, requires = "rows")]
        cols: Option<u32>,

        /// Check against the grammar used by `eval --single-operation`
        #[arg(long)]
        single_operation: bool,
    },

    /// Show the evaluation order and any reference cycles
    Graph {
        /// Input grid file
        input: PathBuf,
    },

    /// Show information about a grid file
    Info {
        /// Input grid file
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Eval {
            input,
            output,
            format,
            report,
            single_operation,
        } => eval(&input, output.as_deref(), format, report, single_operation),
        Commands::Check {
            formula,
            grid,
            rows,
            cols,
            single_operation,
        } => check(
            &formula,
            grid.as_deref(),
            rows.zip(cols),
            grammar(single_operation),
        ),
        Commands::Graph { input } => show_graph(&input),
        Commands::Info { input } => show_info(&input),
    }
}

fn grammar(single_operation: bool) -> Grammar {
    if single_operation {
        Grammar::SingleOperation
    } else {
        Grammar::Expression
    }
}

fn open_grid(input: &Path) -> Result<Grid> {
    Grid::open(input).with_context(|| format!("Failed to open '{}'", input.display()))
}

fn eval(
    input: &Path,
    output: Option<&Path>,
    format: OutputFormat,
    report: bool,
    single_operation: bool,
) -> Result<()> {
    let grid = open_grid(input)?;
    let options = CalculationOptions {
        grammar: grammar(single_operation),
        collect_graph_info: report,
    };

    let evaluation = match grid.calculate_with_options(&options) {
        Ok(evaluation) => evaluation,
        Err(e) if report => {
            let response = EvaluationResponse::failure(Some(&grid), &e);
            return write_json(&response, output);
        }
        Err(e) => return Err(e).context("Failed to evaluate formulas"),
    };

    eprintln!(
        "Evaluated {} formulas ({} errors, {} circular)",
        evaluation.stats.formula_count,
        evaluation.stats.errors,
        evaluation.stats.circular_references
    );

    if report {
        return write_json(&EvaluationResponse::from_evaluation(&evaluation), output);
    }

    match output {
        Some(path) => {
            evaluation
                .grid
                .save(path)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            eprintln!(
                "Wrote {} rows to '{}'",
                evaluation.grid.row_count(),
                path.display()
            );
            Ok(())
        }
        None => match format {
            OutputFormat::Json => write_json(&evaluation.grid, None),
            OutputFormat::Csv => {
                let stdout = io::stdout();
                CsvWriter::write(
                    &evaluation.grid,
                    stdout.lock(),
                    &gridcalc::CsvWriteOptions::default(),
                )
                .context("Failed to write to stdout")
            }
        },
    }
}

fn write_json<T: serde::Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    match output {
        Some(path) => std::fs::write(path, text + "\n")
            .with_context(|| format!("Failed to write '{}'", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", text).context("Failed to write to stdout")
        }
    }
}

fn check(
    formula: &str,
    grid: Option<&Path>,
    size: Option<(u32, u32)>,
    grammar: Grammar,
) -> Result<()> {
    let bounds = match (grid, size) {
        (Some(path), _) => Some(open_grid(path)?.bounds()),
        (None, Some((rows, cols))) => Some(GridBounds::new(rows, cols)),
        (None, None) => None,
    };
    debug!("checking {:?} against {:?}", formula, bounds);

    let validation = validate_formula_with(formula, bounds, grammar);
    if !validation.dependencies.is_empty() {
        println!("Dependencies: {}", validation.dependencies.join(", "));
    }

    if validation.is_valid {
        println!("OK");
        return Ok(());
    }

    bail!(
        "{} ({})",
        validation.error.unwrap_or_default(),
        validation.error_code.unwrap_or("INVALID")
    )
}

fn show_graph(input: &Path) -> Result<()> {
    let grid = open_grid(input)?;
    let evaluation = grid
        .calculate_with_options(&CalculationOptions {
            collect_graph_info: true,
            ..Default::default()
        })
        .context("Failed to evaluate formulas")?;

    let order: Vec<String> = evaluation.order.iter().map(ToString::to_string).collect();
    println!("Evaluation order: {}", order.join(" -> "));

    if evaluation.cycles.is_empty() {
        println!("Cycles: none");
    } else {
        println!("Cycles:");
        for cycle in &evaluation.cycles {
            let cells: Vec<String> = cycle.iter().map(ToString::to_string).collect();
            println!("  {}", cells.join(" -> "));
        }
    }

    if let Some(stats) = evaluation.graph_stats {
        println!();
        println!("Formulas: {}", stats.formula_count);
        println!("Dependencies: {}", stats.edge_count);
        println!("Max dependencies of one cell: {}", stats.max_dependencies);
        println!("Max dependents of one cell: {}", stats.max_dependents);
    }

    Ok(())
}

fn show_info(input: &Path) -> Result<()> {
    let grid = open_grid(input)?;

    println!("File: {}", input.display());
    println!("Rows: {}", grid.row_count());
    println!("Addressable columns: {}", grid.col_count());
    match grid.bounds().last_address() {
        Some(last) => println!("Range: A1:{}", last),
        None => println!("Range: empty"),
    }
    println!("Formulas: {}", grid.formula_cells().count());

    println!();
    for column in grid.columns() {
        let letter = grid
            .column_index(&column.key)
            .map(CellAddress::column_to_letters)
            .unwrap_or_else(|| "-".to_string());
        println!("  {:>3}  {}\t{}", letter, column.key, column.title);
    }

    Ok(())
}
