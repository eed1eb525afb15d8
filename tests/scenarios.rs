//! End-to-end scenarios driving the full lex -> parse -> grid -> scheduler
//! pipeline, rather than exercising any single module in isolation.

use std::collections::HashMap;

use tis_100::grid::Grid;
use tis_100::machine::{Machine, Outcome};
use tis_100::parse::parse_program;
use tis_100::value::Value;

fn single_node_grid(rows: usize, cols: usize, input: &str, body: &str, output: &str, program: &str, stdin: Vec<Value>) -> Grid {
    let mut save = HashMap::new();
    save.insert(0, parse_program(program).unwrap());
    Grid::new(rows, cols, input, body, output, stdin, &save).unwrap()
}

fn values(raw: &[i32]) -> Vec<Value> {
    raw.iter().copied().map(Value::new).collect()
}

#[test]
fn echo_copies_every_input_value_to_output_in_order() {
    let grid = single_node_grid(3, 1, "-", "c", "-", "MOV UP, DOWN\n", values(&[1, 2, 3]));
    let mut machine = Machine::new(grid);
    machine.run(20).unwrap();

    assert_eq!(machine.outputs(), vec![values(&[1, 2, 3])]);
}

#[test]
fn arithmetic_saturates_at_the_positive_bound() {
    let program = "MOV 999, ACC\nADD 999\nMOV ACC, DOWN\n";
    let grid = single_node_grid(3, 1, "x", "c", "-", program, vec![]);
    let mut machine = Machine::new(grid);
    machine.run(4).unwrap();

    assert_eq!(machine.outputs(), vec![values(&[999])]);
}

#[test]
fn sav_and_swp_round_trip_the_backup_register() {
    let program = "MOV 7, ACC\nSAV\nMOV 0, ACC\nSWP\nMOV ACC, DOWN\n";
    let grid = single_node_grid(3, 1, "x", "c", "-", program, vec![]);
    let mut machine = Machine::new(grid);
    machine.run(6).unwrap();

    assert_eq!(machine.outputs(), vec![values(&[7])]);
}

#[test]
fn conditional_jump_counts_down_to_zero() {
    let program = "MOV 3, ACC\nL: MOV ACC, DOWN\nSUB 1\nJGZ L\n";
    let grid = single_node_grid(3, 1, "x", "c", "-", program, vec![]);
    let mut machine = Machine::new(grid);
    machine.run(11).unwrap();

    assert_eq!(machine.outputs(), vec![values(&[3, 2, 1])]);
}

#[test]
fn a_stack_node_reverses_the_order_of_values_pushed_onto_it() {
    let mut save = HashMap::new();
    save.insert(
        0,
        parse_program(
            "MOV 5, RIGHT\nMOV 6, RIGHT\nMOV 7, RIGHT\nMOV RIGHT, DOWN\nMOV RIGHT, DOWN\nMOV RIGHT, DOWN\n",
        )
        .unwrap(),
    );
    let grid = Grid::new(3, 2, "xx", "cm", "-x", vec![], &save).unwrap();
    let mut machine = Machine::new(grid);
    machine.run(12).unwrap();

    assert_eq!(machine.outputs(), vec![values(&[7, 6, 5])]);
}

#[test]
fn a_grid_with_no_input_goes_quiescent_without_producing_output() {
    let grid = single_node_grid(3, 1, "x", "c", "x", "MOV UP, DOWN\n", vec![]);
    let mut machine = Machine::new(grid);
    let outcome = machine.run(100).unwrap();

    assert_eq!(outcome, Outcome::Quiescent { ticks: 2 });
    assert!(machine.outputs().is_empty());
}
