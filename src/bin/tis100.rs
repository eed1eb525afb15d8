//! Command-line front-end: loads a program file, builds a grid, and runs
//! it to completion, piping stdin/stdout through the edge nodes.

use std::env;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use tis_100::error::RuntimeFault;
use tis_100::grid::Grid;
use tis_100::machine::{Machine, Outcome};
use tis_100::program::{load_save, LoadSaveError};
use tis_100::value::Value;

const USAGE: &str = "\
TIS-100 emulator

Usage:
    tis100 [--rows R] [--cols C] [--nodes LAYOUT] [--input LAYOUT] [--output LAYOUT]
           [--format decimal|byte] [--max-ticks N] <program-file>

Options:
    --rows R        body row count (default: 3)
    --cols C        column count (default: 4)
    --nodes LAYOUT  body layout, rows*cols chars of c/m/d/x (default: cccc repeated)
    --input LAYOUT  input-row layout, cols chars of -/x (default: stdin on column 0)
    --output LAYOUT output-row layout, cols chars of -/x (default: stdout on the last column)
    --format FMT    decimal (default) or byte, for both stdin and stdout
    --max-ticks N   stop after N ticks even if the grid has not settled";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Decimal,
    Byte,
}

struct Options {
    rows: usize,
    cols: usize,
    nodes: String,
    input: String,
    output: String,
    format: Format,
    max_ticks: usize,
    program_file: String,
}

enum ParseArgsError {
    Help,
    Bad(String),
}

fn parse_args(args: &[String]) -> Result<Options, ParseArgsError> {
    let mut rows = 3;
    let mut cols_val = 4;
    let mut nodes = None;
    let mut input = None;
    let mut output = None;
    let mut format = Format::Decimal;
    let mut max_ticks = usize::MAX;
    let mut program_file = None;

    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(ParseArgsError::Help),
            "--rows" => rows = parse_flag_value(&mut it, "--rows")?,
            "--cols" => cols_val = parse_flag_value(&mut it, "--cols")?,
            "--nodes" => nodes = Some(next_value(&mut it, "--nodes")?),
            "--input" => input = Some(next_value(&mut it, "--input")?),
            "--output" => output = Some(next_value(&mut it, "--output")?),
            "--max-ticks" => max_ticks = parse_flag_value(&mut it, "--max-ticks")?,
            "--format" => {
                format = match next_value(&mut it, "--format")?.as_str() {
                    "decimal" => Format::Decimal,
                    "byte" => Format::Byte,
                    other => {
                        return Err(ParseArgsError::Bad(format!("unknown --format '{other}'")))
                    }
                }
            }
            other if program_file.is_none() => program_file = Some(other.to_string()),
            other => return Err(ParseArgsError::Bad(format!("unexpected argument '{other}'"))),
        }
    }

    let program_file = program_file
        .ok_or_else(|| ParseArgsError::Bad("missing <program-file> argument".to_string()))?;
    let nodes = nodes.unwrap_or_else(|| "cccc".repeat(rows));
    let input = input.unwrap_or_else(|| format!("-{}", "x".repeat(cols_val.saturating_sub(1))));
    let output = output.unwrap_or_else(|| format!("{}-", "x".repeat(cols_val.saturating_sub(1))));

    Ok(Options { rows, cols: cols_val, nodes, input, output, format, max_ticks, program_file })
}

fn next_value<'a>(
    it: &mut std::slice::Iter<'a, String>,
    flag: &str,
) -> Result<String, ParseArgsError> {
    it.next()
        .cloned()
        .ok_or_else(|| ParseArgsError::Bad(format!("{flag} requires a value")))
}

fn parse_flag_value(
    it: &mut std::slice::Iter<String>,
    flag: &str,
) -> Result<usize, ParseArgsError> {
    let raw = next_value(it, flag)?;
    raw.parse()
        .map_err(|_| ParseArgsError::Bad(format!("{flag} expects a number, got '{raw}'")))
}

fn read_stdin_values(format: Format) -> io::Result<Vec<Value>> {
    let mut raw = Vec::new();
    io::stdin().read_to_end(&mut raw)?;

    Ok(match format {
        Format::Decimal => String::from_utf8_lossy(&raw)
            .split_whitespace()
            .filter_map(|token| token.parse::<i32>().ok())
            .map(Value::new)
            .collect(),
        Format::Byte => raw.into_iter().map(|byte| Value::new(byte as i32)).collect(),
    })
}

fn write_outputs(outputs: &[Vec<Value>], format: Format) -> io::Result<()> {
    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    for stream in outputs {
        match format {
            Format::Decimal => {
                for value in stream {
                    writeln!(stdout, "{}", value.get())?;
                }
            }
            Format::Byte => {
                let bytes: Vec<u8> = stream.iter().map(|v| v.get() as u8).collect();
                stdout.write_all(&bytes)?;
            }
        }
    }

    Ok(())
}

/// Exit code when a runtime fault other than a clean `HCF` halt stops the
/// grid (e.g. `LAST` read before use).
const EXIT_RUNTIME_FAULT: u8 = 4;
/// Exit code when the tick budget ran out before the grid settled.
const EXIT_BUDGET_EXHAUSTED: u8 = 5;

fn run() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(ParseArgsError::Help) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(ParseArgsError::Bad(message)) => {
            eprintln!("{message}\n\n{USAGE}");
            return ExitCode::from(1);
        }
    };

    let save = match load_save(&options.program_file) {
        Ok(save) => save,
        Err(LoadSaveError::Io(err)) => {
            eprintln!("could not read program file: {err}");
            return ExitCode::from(2);
        }
        Err(LoadSaveError::ParseFailed(errors)) => {
            let mut nodes: Vec<_> = errors.keys().copied().collect();
            nodes.sort_unstable();
            for node in nodes {
                for (line, error) in &errors[&node] {
                    eprintln!("node {node}: line {line}: {error}");
                }
            }
            return ExitCode::from(2);
        }
    };

    let stdin_values = match read_stdin_values(options.format) {
        Ok(values) => values,
        Err(err) => {
            eprintln!("could not read stdin: {err}");
            return ExitCode::from(2);
        }
    };

    let grid = match Grid::new(
        options.rows + 2,
        options.cols,
        &options.input,
        &options.nodes,
        &options.output,
        stdin_values,
        &save,
    ) {
        Ok(grid) => grid,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(3);
        }
    };

    let mut machine = Machine::new(grid);
    let outcome = match machine.run(options.max_ticks) {
        Ok(outcome) => outcome,
        Err(fault) => {
            eprintln!("{fault}");
            return ExitCode::from(EXIT_RUNTIME_FAULT);
        }
    };

    if let Err(err) = write_outputs(&machine.outputs(), options.format) {
        eprintln!("could not write stdout: {err}");
        return ExitCode::from(2);
    }

    match outcome {
        Outcome::Quiescent { .. } | Outcome::Halted { .. } => ExitCode::SUCCESS,
        Outcome::BudgetExhausted { ticks } => {
            eprintln!("{}", RuntimeFault::TickBudgetExhausted(ticks));
            ExitCode::from(EXIT_BUDGET_EXHAUSTED)
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    run()
}
