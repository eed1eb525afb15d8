//! The general-purpose execution node (the game's `T21`).

use crate::core::Instruction::*;
use crate::core::Port;
use crate::core::{Instruction, IoRegister, Port::*, Program, Register, Source};
use crate::error::RuntimeFault;
use crate::fabric::{Intent, Offer, Resolution, Selector};
use crate::value::Value;

/// What a `ComputeNode` is waiting on between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stall {
    Read(ReadSink, Selector),
    Write(Selector, Value),
}

/// Where a pending read's value will go once the fabric delivers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadSink {
    AddAcc,
    SubAcc,
    Jro,
    MovTo(Register),
}

/// Runs a `Program` one instruction at a time, blocking on ports as needed.
///
/// # Example
///
/// ```
/// use tis_100::core::Port::*;
/// use tis_100::fabric::{Intent, Offer, Resolution, Selector};
/// use tis_100::node::ComputeNode;
/// use tis_100::parse::parse_program;
///
/// let prog = parse_program("MOV UP ACC\nADD 1\nMOV ACC DOWN\n").unwrap();
/// let mut node = ComputeNode::with_program(prog);
///
/// let (offers, _) = node.offer().unwrap();
/// assert_eq!(offers, vec![Offer { selector: Selector::Port(Up), intent: Intent::Read }]);
///
/// node.retire(&[(Up, Resolution::Read(1.into()))]);
/// ```
#[derive(Debug)]
pub struct ComputeNode {
    program: Program,
    pc: usize,
    acc: Value,
    bak: Value,
    last: Option<Port>,
    stall: Option<Stall>,
    halted: bool,
    fault: Option<RuntimeFault>,
}

impl Default for ComputeNode {
    fn default() -> ComputeNode {
        ComputeNode::new()
    }
}

impl ComputeNode {
    /// Construct a new, empty `ComputeNode`.
    pub fn new() -> ComputeNode {
        ComputeNode {
            program: Program::new(),
            pc: 0,
            acc: Value::default(),
            bak: Value::default(),
            last: None,
            stall: None,
            halted: false,
            fault: None,
        }
    }

    /// Construct a `ComputeNode` and load it with the given program.
    pub fn with_program(program: Program) -> ComputeNode {
        let mut node = ComputeNode::new();
        node.set_program(program);
        node
    }

    /// Replace the node's program and reset it to the start.
    pub fn set_program(&mut self, program: Program) {
        self.program = program;
        self.pc = 0;
        self.stall = None;
        self.halted = false;
    }

    /// Whether the node has executed `HCF`.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    fn inc_pc(&mut self) {
        if self.program.is_empty() {
            return;
        }
        self.pc = (self.pc + 1) % self.program.len();
    }

    fn set_pc(&mut self, target: usize) {
        if self.program.is_empty() {
            self.pc = 0;
        } else {
            debug_assert!(target < self.program.len(), "jump target out of range");
            self.pc = target.min(self.program.len() - 1);
        }
    }

    /// Collect this tick's port request, running as many IO-free
    /// instructions as possible first. Returns the offer (if any) and
    /// whether local progress was made this tick.
    pub fn offer(&mut self) -> Result<(Vec<Offer>, bool), RuntimeFault> {
        if let Some(fault) = self.fault.take() {
            return Err(fault);
        }

        if self.halted || self.program.is_empty() {
            return Ok((Vec::new(), false));
        }

        if let Some(stall) = self.stall {
            let offer = match stall {
                Stall::Read(_, selector) => Offer { selector, intent: Intent::Read },
                Stall::Write(selector, value) => Offer { selector, intent: Intent::Write(value) },
            };
            return Ok((vec![offer], false));
        }

        let instruction = self.program[self.pc];
        self.run(instruction)
    }

    /// Evaluate a source that never needs the fabric (a literal or ACC/NIL).
    fn eval_local_source(&self, src: Source) -> Option<Value> {
        match src {
            Source::Val(v) => Some(v),
            Source::Reg(Register::Acc) => Some(self.acc),
            Source::Reg(Register::Nil) => Some(Value::default()),
            Source::Reg(Register::Io(_)) => None,
        }
    }

    fn selector_for(&self, io: IoRegister) -> Result<Selector, RuntimeFault> {
        match io {
            IoRegister::Dir(port) => Ok(Selector::Port(port)),
            IoRegister::Any => Ok(Selector::Any),
            IoRegister::Last => match self.last {
                Some(port) => Ok(Selector::Port(port)),
                None => Err(RuntimeFault::LastBeforeUse),
            },
        }
    }

    /// Execute `instruction` from scratch (no stall in progress).
    fn run(&mut self, instruction: Instruction) -> Result<(Vec<Offer>, bool), RuntimeFault> {
        match instruction {
            Nop => {
                self.inc_pc();
                Ok((Vec::new(), true))
            }
            Swp => {
                std::mem::swap(&mut self.acc, &mut self.bak);
                self.inc_pc();
                Ok((Vec::new(), true))
            }
            Sav => {
                self.bak = self.acc;
                self.inc_pc();
                Ok((Vec::new(), true))
            }
            Neg => {
                self.acc = -self.acc;
                self.inc_pc();
                Ok((Vec::new(), true))
            }
            Jmp(target) => {
                self.set_pc(target);
                Ok((Vec::new(), true))
            }
            Jez(target) => {
                if self.acc.get() == 0 {
                    self.set_pc(target);
                } else {
                    self.inc_pc();
                }
                Ok((Vec::new(), true))
            }
            Jnz(target) => {
                if self.acc.get() != 0 {
                    self.set_pc(target);
                } else {
                    self.inc_pc();
                }
                Ok((Vec::new(), true))
            }
            Jgz(target) => {
                if self.acc.get() > 0 {
                    self.set_pc(target);
                } else {
                    self.inc_pc();
                }
                Ok((Vec::new(), true))
            }
            Jlz(target) => {
                if self.acc.get() < 0 {
                    self.set_pc(target);
                } else {
                    self.inc_pc();
                }
                Ok((Vec::new(), true))
            }
            Hcf => {
                self.halted = true;
                log::warn!("node halted at pc {}", self.pc);
                Ok((Vec::new(), true))
            }
            Add(src) => self.begin_read(src, ReadSink::AddAcc),
            Sub(src) => self.begin_read(src, ReadSink::SubAcc),
            Jro(src) => self.begin_read(src, ReadSink::Jro),
            Mov(src, dst) => self.begin_read(src, ReadSink::MovTo(dst)),
        }
    }

    /// Start (or immediately satisfy) a read needed for `sink`.
    fn begin_read(
        &mut self,
        src: Source,
        sink: ReadSink,
    ) -> Result<(Vec<Offer>, bool), RuntimeFault> {
        if let Some(value) = self.eval_local_source(src) {
            self.apply_read(sink, value, None);
            return Ok((Vec::new(), true));
        }

        let Source::Reg(Register::Io(io)) = src else {
            unreachable!("eval_local_source only returns None for IO sources")
        };
        let selector = self.selector_for(io)?;
        self.stall = Some(Stall::Read(sink, selector));
        Ok((vec![Offer { selector, intent: Intent::Read }], false))
    }

    /// Apply a resolved read's value to whatever was waiting on it. `port`
    /// only updates `last` when the selector that was satisfied was `ANY`;
    /// a concrete directional read or write never touches `LAST`.
    fn apply_read(&mut self, sink: ReadSink, value: Value, resolved: Option<(Port, Selector)>) {
        if let Some((port, Selector::Any)) = resolved {
            self.last = Some(port);
        }

        match sink {
            ReadSink::AddAcc => {
                self.acc = self.acc + value;
                self.inc_pc();
            }
            ReadSink::SubAcc => {
                self.acc = self.acc - value;
                self.inc_pc();
            }
            ReadSink::Jro => {
                let target = (self.pc as isize + value.get() as isize)
                    .rem_euclid(self.program.len().max(1) as isize) as usize;
                self.set_pc(target);
            }
            ReadSink::MovTo(dst) => self.begin_write(dst, value),
        }
    }

    /// Start (or immediately satisfy) the write half of a `MOV`.
    fn begin_write(&mut self, dst: Register, value: Value) {
        match dst {
            Register::Acc => {
                self.acc = value;
                self.inc_pc();
            }
            Register::Nil => self.inc_pc(),
            Register::Io(io) => match self.selector_for(io) {
                Ok(selector) => self.stall = Some(Stall::Write(selector, value)),
                Err(fault) => self.fault = Some(fault),
            },
        }
    }

    /// Apply the fabric's resolutions for this node's single outstanding
    /// offer (a `ComputeNode` never has more than one).
    pub fn retire(&mut self, resolutions: &[(Port, Resolution)]) -> bool {
        let Some((port, resolution)) = resolutions.first().copied() else {
            return false;
        };

        match (self.stall.take(), resolution) {
            (Some(Stall::Read(sink, selector)), Resolution::Read(value)) => {
                self.apply_read(sink, value, Some((port, selector)));
                true
            }
            (Some(Stall::Write(selector, _)), Resolution::Written) => {
                if selector == Selector::Any {
                    self.last = Some(port);
                }
                self.inc_pc();
                true
            }
            (stall, _) => {
                self.stall = stall;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_program;

    #[test]
    fn non_io_instructions_progress_without_an_offer() {
        let mut node = ComputeNode::with_program(parse_program("ADD 1\nADD 1\n").unwrap());
        let (offers, progressed) = node.offer().unwrap();
        assert!(offers.is_empty());
        assert!(progressed);
        assert_eq!(node.acc.get(), 1);
    }

    #[test]
    fn mov_blocks_on_read_then_on_write() {
        let mut node = ComputeNode::with_program(parse_program("MOV UP DOWN\n").unwrap());
        let (offers, progressed) = node.offer().unwrap();
        assert!(!progressed);
        assert_eq!(offers, vec![Offer { selector: Selector::Port(Up), intent: Intent::Read }]);

        assert!(node.retire(&[(Up, Resolution::Read(Value::new(7)))]));

        let (offers, _) = node.offer().unwrap();
        assert_eq!(offers, vec![Offer { selector: Selector::Port(Down), intent: Intent::Write(Value::new(7)) }]);

        assert!(node.retire(&[(Down, Resolution::Written)]));
        assert_eq!(node.last, None);
    }

    #[test]
    fn any_resolutions_update_last_but_concrete_ones_do_not() {
        let mut node = ComputeNode::with_program(parse_program("MOV ANY ACC\n").unwrap());
        let (offers, _) = node.offer().unwrap();
        assert_eq!(offers, vec![Offer { selector: Selector::Any, intent: Intent::Read }]);

        assert!(node.retire(&[(Left, Resolution::Read(Value::new(3)))]));
        assert_eq!(node.last, Some(Left));
    }

    #[test]
    fn hcf_halts_cleanly() {
        let mut node = ComputeNode::with_program(parse_program("HCF\n").unwrap());
        let (_, progressed) = node.offer().unwrap();
        assert!(progressed);
        assert!(node.is_halted());
    }

    #[test]
    fn last_before_any_use_is_a_runtime_fault() {
        let mut node = ComputeNode::with_program(parse_program("MOV LAST ACC\n").unwrap());
        assert_eq!(node.offer().unwrap_err(), RuntimeFault::LastBeforeUse);
    }

    #[test]
    fn last_before_any_use_as_a_write_destination_is_a_runtime_fault() {
        let mut node = ComputeNode::with_program(parse_program("MOV ACC LAST\n").unwrap());
        node.offer().unwrap();
        assert_eq!(node.offer().unwrap_err(), RuntimeFault::LastBeforeUse);
    }

    #[test]
    fn jro_wraps_the_program_counter() {
        let mut node = ComputeNode::with_program(parse_program("JRO -1\nNOP\n").unwrap());
        node.offer().unwrap();
        assert_eq!(node.pc, 1);
    }
}
