//! The error taxonomy surfaced by decoding, configuring, and running a
//! TIS-100 program.

use thiserror::Error;

use crate::program::SaveErrors;

/// Everything that can go wrong while turning a source file into programs
/// ready to load onto a grid.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("could not read program file: {0}")]
    Io(#[from] std::io::Error),

    #[error("{}", format_save_errors(.0))]
    Parse(SaveErrors),
}

fn format_save_errors(errors: &SaveErrors) -> String {
    let mut nodes: Vec<_> = errors.keys().copied().collect();
    nodes.sort_unstable();

    let mut lines = Vec::new();
    for node in nodes {
        for (line, error) in &errors[&node] {
            lines.push(format!("node {node}: line {line}: {error}"));
        }
    }
    lines.join("\n")
}

/// Everything that can go wrong while assembling the grid a decoded save
/// will run on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grid layout string '{0}' has length {1}, expected {2} (rows * cols)")]
    LayoutLength(String, usize, usize),

    #[error("unrecognised node-layout character '{0}'")]
    UnknownNodeChar(char),

    #[error("program file assigns code to compute-node index {0}, but the grid has only {1}")]
    NodeIndexOutOfRange(usize, usize),

    #[error("grid must have at least one row and one column")]
    EmptyGrid,
}

/// A fault raised while a program is executing, distinct from a clean `HCF`
/// halt.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeFault {
    #[error("LAST was read or written before any ANY/directional port use recorded one")]
    LastBeforeUse,

    #[error("the tick budget of {0} was exhausted before the grid reached quiescence")]
    TickBudgetExhausted(usize),
}
