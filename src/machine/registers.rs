//! Intcode machine registers.
//!
//! The machine has two registers:
//! - pc: program counter, an absolute address
//! - relative base: offset added to relative-mode parameters, moved only by
//!   the adjust-relative-base instruction

use serde::{Serialize, Deserialize};

/// The register file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// Program counter.
    pub pc: usize,

    /// Relative base. May dip below zero between adjustments; only the
    /// addresses computed from it have to be non-negative.
    pub relative_base: i64,
}

impl Registers {
    /// Create a register file with both registers zeroed.
    pub fn new() -> Self {
        Self {
            pc: 0,
            relative_base: 0,
        }
    }

    /// Move the program counter forward by `width` cells.
    /// Returns the old value.
    pub fn advance_pc(&mut self, width: usize) -> usize {
        let old = self.pc;
        self.pc += width;
        old
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: usize) {
        self.pc = addr;
    }

    /// Add `delta` to the relative base.
    ///
    /// Returns `None` (leaving the register untouched) on overflow.
    pub fn adjust_base(&mut self, delta: i64) -> Option<i64> {
        self.relative_base = self.relative_base.checked_add(delta)?;
        Some(self.relative_base)
    }

    /// The signed address a relative-mode word refers to.
    pub fn relative_address(&self, word: i64) -> Option<i64> {
        word.checked_add(self.relative_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_pc() {
        let mut regs = Registers::new();
        regs.pc = 10;

        let old = regs.advance_pc(4);
        assert_eq!(old, 10);
        assert_eq!(regs.pc, 14);
    }

    #[test]
    fn test_relative_address() {
        let mut regs = Registers::new();
        assert_eq!(regs.adjust_base(2000), Some(2000));
        assert_eq!(regs.adjust_base(19), Some(2019));
        assert_eq!(regs.relative_address(-34), Some(1985));
    }

    #[test]
    fn test_adjust_base_overflow() {
        let mut regs = Registers::new();
        regs.relative_base = i64::MAX;
        assert_eq!(regs.adjust_base(1), None);
        assert_eq!(regs.relative_base, i64::MAX);
        assert_eq!(regs.relative_address(1), None);
    }
}
