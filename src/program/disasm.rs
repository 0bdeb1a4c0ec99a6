//! Disassembler for Intcode programs.
//!
//! Intcode mixes code and data freely, so this is a plain linear sweep:
//! words that do not decode are listed as `DATA` and the sweep moves on
//! one cell at a time.

use crate::machine::Memory;
use crate::machine::decode::{split_word, AddrMode};

/// Disassemble the instruction starting at `addr`.
///
/// Returns the text and the number of cells it covers.
pub fn disassemble_at(mem: &Memory, addr: usize) -> (String, usize) {
    let word = mem.get(addr);
    match split_word(word) {
        Ok((op, modes)) => {
            let mut text = op.mnemonic().to_string();
            for (i, mode) in modes.iter().enumerate().take(op.arity()) {
                text.push(' ');
                text.push_str(&format_operand(*mode, mem.get(addr + 1 + i)));
            }
            (text, 1 + op.arity())
        }
        Err(_) => (format!("DATA {}", word), 1),
    }
}

/// Disassemble a whole program.
pub fn disassemble(program: &[i64]) -> String {
    let mem = Memory::from_program(program);
    let mut output = String::new();
    output.push_str("; Intcode Disassembly\n");
    output.push_str("; -------------------\n\n");

    let mut addr = 0;
    while addr < program.len() {
        let (text, width) = disassemble_at(&mem, addr);
        let raw: Vec<String> = (addr..addr + width)
            .map(|a| mem.get(a).to_string())
            .collect();
        output.push_str(&format!("{:04}: {:<28} ; {}\n", addr, text, raw.join(",")));
        addr += width;
    }

    output
}

/// Format an operand word for its addressing mode.
pub fn format_operand(mode: AddrMode, word: i64) -> String {
    match mode {
        AddrMode::Position => format!("[{}]", word),
        AddrMode::Immediate => format!("{}", word),
        AddrMode::Relative if word < 0 => format!("[rb-{}]", word.unsigned_abs()),
        AddrMode::Relative => format!("[rb+{}]", word),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_hlt() {
        let mem = Memory::from_program(&[99]);
        assert_eq!(disassemble_at(&mem, 0), ("HLT".to_string(), 1));
    }

    #[test]
    fn test_disassemble_mixed_modes() {
        let mem = Memory::from_program(&[1002, 4, 3, 4, 33]);
        assert_eq!(disassemble_at(&mem, 0), ("MUL [4] 3 [4]".to_string(), 4));

        let mem = Memory::from_program(&[22201, -1, 2, 0]);
        let (text, _) = disassemble_at(&mem, 0);
        assert_eq!(text, "ADD [rb-1] [rb+2] [rb+0]");
    }

    #[test]
    fn test_disassemble_data() {
        let mem = Memory::from_program(&[33]);
        assert_eq!(disassemble_at(&mem, 0), ("DATA 33".to_string(), 1));
    }

    #[test]
    fn test_disassemble_listing() {
        let listing = disassemble(&[3, 0, 4, 0, 99, 33]);
        let lines: Vec<&str> = listing.lines().skip(3).collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("0000: IN [0]"));
        assert!(lines[0].ends_with("; 3,0"));
        assert!(lines[1].starts_with("0002: OUT [0]"));
        assert!(lines[2].starts_with("0004: HLT"));
        assert!(lines[3].starts_with("0005: DATA 33"));
    }
}
