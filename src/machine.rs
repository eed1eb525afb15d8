//! The tick scheduler that drives a [`Grid`] to completion.

use std::collections::HashMap;

use crate::error::RuntimeFault;
use crate::fabric::resolve;
use crate::grid::Grid;
use crate::node::Node;
use crate::value::Value;

/// Consecutive ticks with no progress anywhere in the grid before the
/// scheduler declares it quiescent.
const QUIESCENCE_WINDOW: usize = 2;

/// Why a run stopped.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// No node could make progress for [`QUIESCENCE_WINDOW`] consecutive
    /// ticks; the grid has settled.
    Quiescent { ticks: usize },
    /// A compute node executed `HCF`, stopping the whole grid.
    Halted { ticks: usize },
    /// The tick budget passed to [`Machine::run`] ran out first.
    BudgetExhausted { ticks: usize },
}

/// Runs a [`Grid`] one tick at a time.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use tis_100::grid::Grid;
/// use tis_100::machine::Machine;
/// use tis_100::parse::parse_program;
///
/// let mut save = HashMap::new();
/// save.insert(0, parse_program("MOV UP DOWN\n").unwrap());
///
/// let grid = Grid::new(3, 1, "-", "c", "-", vec![7.into()], &save).unwrap();
/// let mut machine = Machine::new(grid);
/// machine.run(100).unwrap();
/// ```
#[derive(Debug)]
pub struct Machine {
    grid: Grid,
}

impl Machine {
    /// Wrap a grid ready to run.
    pub fn new(grid: Grid) -> Machine {
        Machine { grid }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Advance the grid by a single tick. Returns whether any node made
    /// progress.
    pub fn tick(&mut self) -> Result<bool, RuntimeFault> {
        let mut offers = HashMap::new();
        let mut progressed = false;

        for (id, node) in self.grid.nodes_mut().iter_mut().enumerate() {
            let (node_offers, local_progress) = node.offer()?;
            progressed |= local_progress;
            if !node_offers.is_empty() {
                offers.insert(id, node_offers);
            }
        }

        let resolutions = resolve(&offers, self.grid.topology());

        for (id, node) in self.grid.nodes_mut().iter_mut().enumerate() {
            if let Some(results) = resolutions.get(&id) {
                progressed |= node.retire(results);
            }
        }

        Ok(progressed)
    }

    /// Run until the grid goes quiescent, a node executes `HCF`, or the
    /// tick budget is exhausted.
    pub fn run(&mut self, max_ticks: usize) -> Result<Outcome, RuntimeFault> {
        let mut idle_streak = 0;

        for tick in 0..max_ticks {
            let progressed = self.tick()?;

            if self.any_halted() {
                return Ok(Outcome::Halted { ticks: tick + 1 });
            }

            if progressed {
                idle_streak = 0;
            } else {
                idle_streak += 1;
                if idle_streak >= QUIESCENCE_WINDOW {
                    return Ok(Outcome::Quiescent { ticks: tick + 1 });
                }
            }
        }

        Ok(Outcome::BudgetExhausted { ticks: max_ticks })
    }

    /// Whether any compute node has executed `HCF`.
    pub fn any_halted(&self) -> bool {
        self.grid.nodes().iter().any(Node::is_halted)
    }

    /// Values collected by every output node, in grid order.
    pub fn outputs(&self) -> Vec<Vec<Value>> {
        self.grid
            .nodes()
            .iter()
            .filter_map(|node| match node {
                Node::Output(output) => Some(output.received().to_vec()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_program;
    use std::collections::HashMap;

    #[test]
    fn echo_program_copies_input_to_output() {
        let mut save = HashMap::new();
        save.insert(0, parse_program("MOV UP DOWN\n").unwrap());

        let grid = Grid::new(3, 1, "-", "c", "-", vec![Value::new(42)], &save).unwrap();
        let mut machine = Machine::new(grid);
        machine.run(20).unwrap();

        assert_eq!(machine.outputs(), vec![vec![Value::new(42)]]);
    }

    #[test]
    fn an_empty_grid_goes_quiescent_quickly() {
        let save = HashMap::new();
        let grid = Grid::new(3, 1, "x", "d", "x", vec![], &save).unwrap();
        let mut machine = Machine::new(grid);
        let outcome = machine.run(100).unwrap();
        assert_eq!(outcome, Outcome::Quiescent { ticks: QUIESCENCE_WINDOW });
    }

    #[test]
    fn hcf_stops_the_whole_grid_not_just_its_node() {
        let mut save = HashMap::new();
        save.insert(0, parse_program("HCF\n").unwrap());

        let grid = Grid::new(3, 1, "x", "c", "x", vec![], &save).unwrap();
        let mut machine = Machine::new(grid);
        let outcome = machine.run(10).unwrap();
        assert_eq!(outcome, Outcome::Halted { ticks: 1 });
        assert!(machine.any_halted());
    }

    #[test]
    fn tick_budget_is_reported_when_the_grid_never_settles() {
        let mut save = HashMap::new();
        save.insert(0, parse_program("loop: JMP loop\n").unwrap());

        let grid = Grid::new(3, 1, "x", "c", "x", vec![], &save).unwrap();
        let mut machine = Machine::new(grid);
        let outcome = machine.run(5).unwrap();
        assert_eq!(outcome, Outcome::BudgetExhausted { ticks: 5 });
    }
}
