//! Assembling a rectangular grid of nodes and wiring their ports together.

use crate::core::Port::*;
use crate::error::ConfigError;
use crate::fabric::Topology;
use crate::node::{ComputeNode, InputNode, Node, OutputNode, StackNode};
use crate::program::Save;
use crate::value::Value;

/// A rectangular grid of nodes with full-duplex connections between every
/// pair of orthogonal neighbours.
///
/// The top row holds input nodes, the bottom row holds output nodes, and
/// every row in between holds a compute, stack, damaged, or null node, per
/// the layout strings passed to [`Grid::new`].
#[derive(Debug)]
pub struct Grid {
    rows: usize,
    cols: usize,
    nodes: Vec<Node>,
    topology: Topology,
}

impl Grid {
    /// Build a grid from its layout strings and the programs to load.
    ///
    /// - `input`/`output` are `cols`-character strings using `-` for a
    ///   live stdin/stdout node and `x` for a null node.
    /// - `body` is a `(rows - 2) * cols`-character string, read row-major,
    ///   using `c` for a compute node, `m` for a stack node, and `d` for a
    ///   damaged node.
    /// - `stdin`/`stdout` feed the live input/output nodes in column order
    ///   (left to right) among however many `-` characters each row has.
    /// - `save` assigns parsed programs to compute nodes by their index
    ///   among all compute nodes, in row-major order.
    pub fn new(
        rows: usize,
        cols: usize,
        input: &str,
        body: &str,
        output: &str,
        stdin: Vec<Value>,
        save: &Save,
    ) -> Result<Grid, ConfigError> {
        if rows < 2 || cols == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        if input.chars().count() != cols {
            return Err(ConfigError::LayoutLength(input.to_string(), input.chars().count(), cols));
        }
        if output.chars().count() != cols {
            return Err(ConfigError::LayoutLength(output.to_string(), output.chars().count(), cols));
        }
        let body_rows = rows - 2;
        if body.chars().count() != body_rows * cols {
            return Err(ConfigError::LayoutLength(body.to_string(), body.chars().count(), body_rows * cols));
        }

        let mut nodes = Vec::with_capacity(rows * cols);
        let mut compute_index = 0;
        // The whole `--input` stream is fed through the first live input
        // node in the top row; any further `-` nodes stay empty. Puzzles
        // with more than one live input node are not modelled by this CLI.
        let mut stdin = Some(stdin);

        for c in input.chars() {
            nodes.push(match c {
                '-' => Node::Input(InputNode::new(Down, stdin.take().unwrap_or_default())),
                'x' => Node::Null,
                other => return Err(ConfigError::UnknownNodeChar(other)),
            });
        }

        let body_chars: Vec<char> = body.chars().collect();
        for row in 0..body_rows {
            for col in 0..cols {
                let c = body_chars[row * cols + col];
                nodes.push(match c {
                    'c' => {
                        let program = save.get(&compute_index).cloned().unwrap_or_default();
                        compute_index += 1;
                        Node::Compute(ComputeNode::with_program(program))
                    }
                    'm' => Node::Stack(StackNode::new()),
                    'd' => Node::Damaged,
                    'x' => Node::Null,
                    other => return Err(ConfigError::UnknownNodeChar(other)),
                });
            }
        }

        for c in output.chars() {
            nodes.push(match c {
                '-' => Node::Output(OutputNode::new(Up)),
                'x' => Node::Null,
                other => return Err(ConfigError::UnknownNodeChar(other)),
            });
        }

        if let Some(max_index) = save.keys().copied().max() {
            if max_index >= compute_index {
                return Err(ConfigError::NodeIndexOutOfRange(max_index, compute_index));
            }
        }

        let mut topology = Topology::new();
        for row in 0..rows {
            for col in 0..cols {
                let id = row * cols + col;
                if col + 1 < cols {
                    topology.connect(id, id + 1, Right);
                }
                if row + 1 < rows {
                    topology.connect(id, id + cols, Down);
                }
            }
        }

        Ok(Grid { rows, cols, nodes, topology })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }
}
