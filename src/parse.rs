//! Functions for parsing TIS-100 assembly code into instructions.

use std::collections::HashMap;
use std::str::FromStr;

use thiserror::Error;

use crate::core::Instruction::*;
use crate::core::*;
use crate::lex::{lex_program, Label, Line};

/// An error that can be returned while parsing a single line of a TIS-100
/// assembly program.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ParseProgramError {
    #[error("invalid label")]
    InvalidLabel,
    #[error("undefined label: '{0}'")]
    UndefinedLabel(String),
    #[error("label is already defined: '{0}'")]
    DuplicateLabel(String),
    #[error("invalid opcode: '{0}'")]
    InvalidOpcode(String),
    #[error("invalid expression: '{0}'")]
    InvalidExpression(String),
    #[error("invalid register: '{0}'")]
    InvalidRegister(String),
    #[error("missing operand: '{0}'")]
    MissingOperand(String),
    #[error("too many operands: '{0}'")]
    TooManyOperands(String),
    #[error("program has {0} instructions, the maximum is {}", MAX_INSTRUCTIONS)]
    TooManyInstructions(usize),
}

use self::ParseProgramError::*;

/// All errors discovered while parsing a single node's program, paired with
/// the source line number each was found on.
pub type ProgramErrors = Vec<(usize, ParseProgramError)>;

/// A result that can be returned from intermediate phases of the parsing
/// process.
type ParseResult<T> = Result<T, ParseProgramError>;

/// Parse a node's program source code into a list of instructions. If one or
/// more errors are encountered during parsing, the full list of errors is
/// returned instead.
///
/// # Example
///
/// ```
/// use tis_100::core::Instruction::*;
/// use tis_100::core::Source::*;
/// use tis_100::core::Register::*;
/// use tis_100::core::IoRegister::*;
/// use tis_100::core::Port::*;
/// use tis_100::parse::parse_program;
///
/// let src = "MOV UP ACC\nADD 1\nMOV ACC DOWN\n";
/// let prog = parse_program(src).unwrap();
/// assert_eq!(prog[0], Mov(Reg(Io(Dir(Up))), Acc));
/// assert_eq!(prog[1], Add(Val(1.into())));
/// assert_eq!(prog[2], Mov(Reg(Acc), Io(Dir(Down))));
/// ```
pub fn parse_program(src: &str) -> Result<Program, ProgramErrors> {
    // 1. Tokenize the source into labels, opcodes, and operands.
    // 2. Build a mapping from labels to instruction indices.
    // 3. Parse opcodes and operands line-by-line into instructions.

    let mut label_map = HashMap::new();
    let mut instructions = Vec::new();
    let mut errors = Vec::new();

    let lines = lex_program(src);

    for Line(line_num, ref maybe_label, _) in lines.iter() {
        if let Some(Label(ref name, index)) = maybe_label {
            if name.is_empty() {
                errors.push((*line_num, InvalidLabel));
            } else if label_map.get(name).is_none() {
                label_map.insert(name.clone(), *index);
            } else {
                errors.push((*line_num, DuplicateLabel(name.clone())));
            }
        }
    }

    for Line(line_num, _, ref lexemes) in lines.iter() {
        if !lexemes.is_empty() {
            match parse_instruction(&lexemes[0], &lexemes[1..], &label_map) {
                Ok(instruction) => instructions.push(instruction),
                Err(err) => errors.push((*line_num, err)),
            }
        }
    }

    // A label trailing the last instruction resolves to an index one past
    // the end; land it on a synthetic no-op instead of leaving it dangling.
    if label_map.values().any(|&index| index == instructions.len()) {
        instructions.push(Nop);
    }

    if instructions.len() > MAX_INSTRUCTIONS {
        errors.push((0, TooManyInstructions(instructions.len())));
    }

    if !errors.is_empty() {
        Err(errors)
    } else {
        Ok(instructions)
    }
}

/// Attempt to parse a single TIS-100 assembly instruction.
fn parse_instruction(
    opcode: &str,
    operands: &[String],
    labels: &HashMap<String, usize>,
) -> ParseResult<Instruction> {
    match opcode.parse::<Opcode>() {
        Ok(Opcode::Nop) => parse_no_operands(Nop, operands),
        Ok(Opcode::Mov) => parse_two_operands(Mov, opcode, operands),
        Ok(Opcode::Swp) => parse_no_operands(Swp, operands),
        Ok(Opcode::Sav) => parse_no_operands(Sav, operands),
        Ok(Opcode::Add) => parse_one_operand(Add, opcode, operands),
        Ok(Opcode::Sub) => parse_one_operand(Sub, opcode, operands),
        Ok(Opcode::Neg) => parse_no_operands(Neg, operands),
        Ok(Opcode::Jmp) => parse_jump(Jmp, opcode, operands, labels),
        Ok(Opcode::Jez) => parse_jump(Jez, opcode, operands, labels),
        Ok(Opcode::Jnz) => parse_jump(Jnz, opcode, operands, labels),
        Ok(Opcode::Jgz) => parse_jump(Jgz, opcode, operands, labels),
        Ok(Opcode::Jlz) => parse_jump(Jlz, opcode, operands, labels),
        Ok(Opcode::Jro) => parse_one_operand(Jro, opcode, operands),
        Ok(Opcode::Hcf) => parse_no_operands(Hcf, operands),
        Err(_) => Err(InvalidOpcode(opcode.to_string())),
    }
}

/// Attempt to resolve a jump label to an instruction index.
fn resolve_label<'a>(
    label: &str,
    labels: &'a HashMap<String, usize>,
) -> ParseResult<&'a usize> {
    labels.get(label).ok_or_else(|| UndefinedLabel(label.to_string()))
}

/// Parse a jump opcode and label into a jump instruction.
fn parse_jump<F: Fn(usize) -> Instruction>(
    f: F,
    opcode: &str,
    operands: &[String],
    labels: &HashMap<String, usize>,
) -> ParseResult<Instruction> {
    if operands.is_empty() {
        Err(MissingOperand(opcode.to_string()))
    } else if operands.len() == 1 {
        resolve_label(&operands[0], labels).map(|&i| f(i))
    } else {
        Err(TooManyOperands(operands[1..].join(" ")))
    }
}

/// Parse an opcode with no operands into an instruction.
fn parse_no_operands(instruction: Instruction, operands: &[String]) -> ParseResult<Instruction> {
    if operands.is_empty() {
        Ok(instruction)
    } else {
        Err(TooManyOperands(operands.join(" ")))
    }
}

/// Parse an opcode and one operand into an instruction.
fn parse_one_operand<T: FromStr, F: Fn(T) -> Instruction>(
    f: F,
    opcode: &str,
    operands: &[String],
) -> ParseResult<Instruction> {
    if operands.is_empty() {
        Err(MissingOperand(opcode.to_string()))
    } else if operands.len() == 1 {
        match operands[0].parse::<T>() {
            Ok(op) => Ok(f(op)),
            Err(_) => Err(InvalidExpression(operands[0].clone())),
        }
    } else {
        Err(TooManyOperands(operands[1..].join(" ")))
    }
}

/// Parse an opcode and two operands into an instruction.
fn parse_two_operands<T: FromStr, U: FromStr, F: Fn(T, U) -> Instruction>(
    f: F,
    opcode: &str,
    operands: &[String],
) -> ParseResult<Instruction> {
    if operands.len() < 2 {
        Err(MissingOperand(opcode.to_string() + " " + &operands.join(" ")))
    } else if operands.len() == 2 {
        match operands[0].parse::<T>() {
            Ok(op1) => match operands[1].parse::<U>() {
                Ok(op2) => Ok(f(op1, op2)),
                Err(_) => Err(InvalidRegister(operands[1].clone())),
            },
            Err(_) => Err(InvalidExpression(operands[0].clone())),
        }
    } else {
        Err(TooManyOperands(operands[2..].join(" ")))
    }
}

/// The opcode component of a TIS-100 instruction.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Opcode {
    Nop,
    Mov,
    Swp,
    Sav,
    Add,
    Sub,
    Neg,
    Jmp,
    Jez,
    Jnz,
    Jgz,
    Jlz,
    Jro,
    Hcf,
}

/// An error which can be returned when parsing an opcode.
#[derive(Debug, PartialEq, Eq)]
pub struct ParseOpcodeError;

impl FromStr for Opcode {
    type Err = ParseOpcodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOP" => Ok(Opcode::Nop),
            "MOV" => Ok(Opcode::Mov),
            "SWP" => Ok(Opcode::Swp),
            "SAV" => Ok(Opcode::Sav),
            "ADD" => Ok(Opcode::Add),
            "SUB" => Ok(Opcode::Sub),
            "NEG" => Ok(Opcode::Neg),
            "JMP" => Ok(Opcode::Jmp),
            "JEZ" => Ok(Opcode::Jez),
            "JNZ" => Ok(Opcode::Jnz),
            "JGZ" => Ok(Opcode::Jgz),
            "JLZ" => Ok(Opcode::Jlz),
            "JRO" => Ok(Opcode::Jro),
            "HCF" => Ok(Opcode::Hcf),
            _ => Err(ParseOpcodeError),
        }
    }
}
