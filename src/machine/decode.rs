//! Instruction decoder for Intcode.
//!
//! An opcode word packs the operation into its two lowest decimal digits
//! and one addressing-mode digit per parameter above that, least
//! significant parameter first:
//!
//! ```text
//! 1002  ->  op = 02, modes = [0, 1, 0]
//!   ^^---- operation
//!  ^------ mode of parameter 1
//! ^------- mode of parameter 2
//! ```
//!
//! Missing mode digits are zero. Digits above the third parameter are
//! ignored.

use std::fmt;
use crate::machine::{Memory, Registers};
use crate::program::disasm::format_operand;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Per-parameter addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddrMode {
    /// The word is an address (mode 0).
    Position,
    /// The word is the value itself (mode 1).
    Immediate,
    /// The word is an offset from the relative base (mode 2).
    Relative,
}

impl AddrMode {
    /// Create from a mode digit.
    pub fn from_digit(digit: i64) -> Option<Self> {
        match digit {
            0 => Some(AddrMode::Position),
            1 => Some(AddrMode::Immediate),
            2 => Some(AddrMode::Relative),
            _ => None,
        }
    }

    /// Convert to a mode digit.
    pub fn digit(self) -> i64 {
        match self {
            AddrMode::Position => 0,
            AddrMode::Immediate => 1,
            AddrMode::Relative => 2,
        }
    }
}

/// Operation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// `c := a + b`
    Add,
    /// `c := a * b`
    Mul,
    /// `a := next input`
    Input,
    /// emit `a`
    Output,
    /// `pc := b` if `a != 0`
    JumpIfTrue,
    /// `pc := b` if `a == 0`
    JumpIfFalse,
    /// `c := (a < b) as 0/1`
    LessThan,
    /// `c := (a == b) as 0/1`
    Equals,
    /// `relative_base += a`
    AdjustBase,
    /// Stop for good.
    Halt,
}

impl Opcode {
    /// Every opcode, in code order.
    pub const ALL: [Opcode; 10] = [
        Opcode::Add,
        Opcode::Mul,
        Opcode::Input,
        Opcode::Output,
        Opcode::JumpIfTrue,
        Opcode::JumpIfFalse,
        Opcode::LessThan,
        Opcode::Equals,
        Opcode::AdjustBase,
        Opcode::Halt,
    ];

    /// Look up an operation by its two-digit code.
    pub fn from_code(code: i64) -> Option<Self> {
        let op = match code {
            1 => Opcode::Add,
            2 => Opcode::Mul,
            3 => Opcode::Input,
            4 => Opcode::Output,
            5 => Opcode::JumpIfTrue,
            6 => Opcode::JumpIfFalse,
            7 => Opcode::LessThan,
            8 => Opcode::Equals,
            9 => Opcode::AdjustBase,
            99 => Opcode::Halt,
            _ => return None,
        };
        Some(op)
    }

    /// The two-digit code.
    pub fn code(self) -> i64 {
        match self {
            Opcode::Add => 1,
            Opcode::Mul => 2,
            Opcode::Input => 3,
            Opcode::Output => 4,
            Opcode::JumpIfTrue => 5,
            Opcode::JumpIfFalse => 6,
            Opcode::LessThan => 7,
            Opcode::Equals => 8,
            Opcode::AdjustBase => 9,
            Opcode::Halt => 99,
        }
    }

    /// Number of parameter words following the opcode word.
    pub fn arity(self) -> usize {
        match self {
            Opcode::Add | Opcode::Mul | Opcode::LessThan | Opcode::Equals => 3,
            Opcode::JumpIfTrue | Opcode::JumpIfFalse => 2,
            Opcode::Input | Opcode::Output | Opcode::AdjustBase => 1,
            Opcode::Halt => 0,
        }
    }

    /// Assembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Mul => "MUL",
            Opcode::Input => "IN",
            Opcode::Output => "OUT",
            Opcode::JumpIfTrue => "JNZ",
            Opcode::JumpIfFalse => "JZ",
            Opcode::LessThan => "LT",
            Opcode::Equals => "EQ",
            Opcode::AdjustBase => "ARB",
            Opcode::Halt => "HLT",
        }
    }
}

/// A resolved parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Addressing mode the parameter was decoded with.
    pub mode: AddrMode,
    /// Raw parameter word.
    pub word: i64,
    /// Value read through the mode.
    pub value: i64,
    /// Address a write would go to; `None` in immediate mode.
    pub target: Option<usize>,
}

impl Param {
    /// Placeholder for a slot the opcode does not use.
    pub const UNUSED: Param = Param {
        mode: AddrMode::Immediate,
        word: 0,
        value: 0,
        target: None,
    };
}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub op: Opcode,
    pub params: [Param; 3],
}

impl Instruction {
    /// Cells occupied by the instruction, opcode word included.
    pub fn width(&self) -> usize {
        1 + self.op.arity()
    }

    /// Read value of parameter `index` (0-based).
    #[inline]
    pub fn value(&self, index: usize) -> i64 {
        self.params[index].value
    }

    /// Write target of parameter `index` (0-based).
    #[inline]
    pub fn target(&self, index: usize) -> Option<usize> {
        self.params[index].target
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = self.op.mnemonic().to_string();
        for param in &self.params[..self.op.arity()] {
            text.push(' ');
            text.push_str(&format_operand(param.mode, param.word));
        }
        f.pad(&text)
    }
}

/// Split an opcode word into its operation and the three parameter modes.
pub fn split_word(word: i64) -> Result<(Opcode, [AddrMode; 3]), DecodeError> {
    if word < 0 {
        return Err(DecodeError::InvalidOpcode { word });
    }
    let op = Opcode::from_code(word % 100).ok_or(DecodeError::InvalidOpcode { word })?;

    let mut modes = [AddrMode::Position; 3];
    let mut rest = word / 100;
    for (param, mode) in modes.iter_mut().enumerate() {
        let digit = rest % 10;
        *mode = AddrMode::from_digit(digit).ok_or(DecodeError::InvalidMode { param, digit })?;
        rest /= 10;
    }

    Ok((op, modes))
}

/// Build an opcode word from an operation and parameter modes.
pub fn encode(op: Opcode, modes: &[AddrMode]) -> i64 {
    modes
        .iter()
        .take(3)
        .rev()
        .fold(0, |acc, mode| acc * 10 + mode.digit())
        * 100
        + op.code()
}

/// Decode the instruction at `regs.pc`.
///
/// Only the parameters the operation uses are resolved; the rest are
/// [`Param::UNUSED`]. Memory is never modified.
pub fn decode(mem: &Memory, regs: &Registers) -> Result<Instruction, DecodeError> {
    let pc = regs.pc;
    let (op, modes) = split_word(mem.get(pc))?;

    let mut params = [Param::UNUSED; 3];
    for (index, slot) in params.iter_mut().enumerate().take(op.arity()) {
        let word = mem.get(pc + 1 + index);
        *slot = resolve(mem, regs, index, modes[index], word)?;
    }

    Ok(Instruction { op, params })
}

fn resolve(
    mem: &Memory,
    regs: &Registers,
    param: usize,
    mode: AddrMode,
    word: i64,
) -> Result<Param, DecodeError> {
    let target = match mode {
        AddrMode::Immediate => {
            return Ok(Param { mode, word, value: word, target: None });
        }
        AddrMode::Position => word,
        AddrMode::Relative => regs
            .relative_address(word)
            .ok_or(DecodeError::Overflow { param })?,
    };
    let addr = usize::try_from(target)
        .map_err(|_| DecodeError::NegativeAddress { param, address: target })?;

    Ok(Param {
        mode,
        word,
        value: mem.get(addr),
        target: Some(addr),
    })
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode in word {word}")]
    InvalidOpcode { word: i64 },

    #[error("invalid addressing mode {digit} for parameter {param}")]
    InvalidMode { param: usize, digit: i64 },

    #[error("parameter {param} resolves to negative address {address}")]
    NegativeAddress { param: usize, address: i64 },

    #[error("relative address of parameter {param} overflows")]
    Overflow { param: usize },
}

impl DecodeError {
    /// Whether this is an addressing error rather than a bad opcode.
    pub fn is_addressing(&self) -> bool {
        matches!(
            self,
            DecodeError::InvalidMode { .. }
                | DecodeError::NegativeAddress { .. }
                | DecodeError::Overflow { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_at(program: &[i64], pc: usize, relative_base: i64) -> Result<Instruction, DecodeError> {
        let mem = Memory::from_program(program);
        let regs = Registers { pc, relative_base };
        decode(&mem, &regs)
    }

    #[test]
    fn test_split_mixed_modes() {
        let (op, modes) = split_word(1002).unwrap();
        assert_eq!(op, Opcode::Mul);
        assert_eq!(modes, [AddrMode::Position, AddrMode::Immediate, AddrMode::Position]);

        let (op, modes) = split_word(21101).unwrap();
        assert_eq!(op, Opcode::Add);
        assert_eq!(modes, [AddrMode::Immediate, AddrMode::Immediate, AddrMode::Relative]);
    }

    #[test]
    fn test_split_ignores_high_digits() {
        let (op, modes) = split_word(1_000_099).unwrap();
        assert_eq!(op, Opcode::Halt);
        assert_eq!(modes, [AddrMode::Position; 3]);
    }

    #[test]
    fn test_invalid_opcode() {
        assert_eq!(split_word(42), Err(DecodeError::InvalidOpcode { word: 42 }));
        assert_eq!(split_word(-1), Err(DecodeError::InvalidOpcode { word: -1 }));
        assert_eq!(split_word(0), Err(DecodeError::InvalidOpcode { word: 0 }));
        assert!(!DecodeError::InvalidOpcode { word: 0 }.is_addressing());
    }

    #[test]
    fn test_invalid_mode() {
        let err = split_word(1302).unwrap_err();
        assert_eq!(err, DecodeError::InvalidMode { param: 0, digit: 3 });
        assert!(err.is_addressing());

        // Bad digit in an unused slot still fails.
        let err = split_word(90004).unwrap_err();
        assert_eq!(err, DecodeError::InvalidMode { param: 2, digit: 9 });
    }

    #[test]
    fn test_encode_matches_split() {
        for op in Opcode::ALL {
            let modes = [AddrMode::Relative, AddrMode::Position, AddrMode::Immediate];
            let word = encode(op, &modes);
            assert_eq!(split_word(word).unwrap(), (op, modes));
        }
        assert_eq!(encode(Opcode::Mul, &[AddrMode::Position, AddrMode::Immediate]), 1002);
    }

    #[test]
    fn test_decode_position_and_immediate() {
        let instr = decode_at(&[1002, 4, 3, 4, 33], 0, 0).unwrap();
        assert_eq!(instr.op, Opcode::Mul);
        assert_eq!(instr.value(0), 33);
        assert_eq!(instr.target(0), Some(4));
        assert_eq!(instr.value(1), 3);
        assert_eq!(instr.target(1), None);
        assert_eq!(instr.target(2), Some(4));
        assert_eq!(instr.width(), 4);
    }

    #[test]
    fn test_display() {
        let instr = decode_at(&[21101, 4, -3, 9, 99], 0, 0).unwrap();
        assert_eq!(instr.to_string(), "ADD 4 -3 [rb+9]");
        assert_eq!(format!("{:<8}|", decode_at(&[99], 0, 0).unwrap()), "HLT     |");
    }

    #[test]
    fn test_decode_relative() {
        let instr = decode_at(&[204, -2, 0, 77], 0, 5).unwrap();
        assert_eq!(instr.op, Opcode::Output);
        assert_eq!(instr.params[0].target, Some(3));
        assert_eq!(instr.value(0), 77);
    }

    #[test]
    fn test_decode_short_program_reads_zero() {
        // Parameters past the end of the program read as zero.
        let instr = decode_at(&[1], 0, 0).unwrap();
        assert_eq!(instr.op, Opcode::Add);
        assert_eq!(instr.target(2), Some(0));
        assert_eq!(instr.value(0), 1);
    }

    #[test]
    fn test_decode_unused_params_not_resolved() {
        // Halt followed by a negative word: nothing to resolve.
        let instr = decode_at(&[99, -5, -5, -5], 0, 0).unwrap();
        assert_eq!(instr.op, Opcode::Halt);
        assert_eq!(instr.params, [Param::UNUSED; 3]);
    }

    #[test]
    fn test_decode_negative_address() {
        let err = decode_at(&[4, -1], 0, 0).unwrap_err();
        assert_eq!(err, DecodeError::NegativeAddress { param: 0, address: -1 });

        let err = decode_at(&[204, 3], 0, -10).unwrap_err();
        assert_eq!(err, DecodeError::NegativeAddress { param: 0, address: -7 });
    }

    #[test]
    fn test_decode_relative_overflow() {
        let err = decode_at(&[204, i64::MAX], 0, 1).unwrap_err();
        assert_eq!(err, DecodeError::Overflow { param: 0 });
    }
}
