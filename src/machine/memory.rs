//! Intcode memory subsystem.
//!
//! Memory is logically infinite and zero-filled. Low addresses live in a
//! flat vector that grows on demand; anything past [`DENSE_LIMIT`] is kept
//! in an ordered map so a stray write to a huge address stays cheap.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

/// Addresses below this bound are stored densely.
pub const DENSE_LIMIT: usize = 1 << 16;

/// Intcode memory: address → signed 64-bit value, zero by default.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Memory {
    dense: Vec<i64>,
    sparse: BTreeMap<usize, i64>,
}

impl Memory {
    /// Create an empty memory (every cell reads as zero).
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            sparse: BTreeMap::new(),
        }
    }

    /// Create a memory with `program[i]` loaded at address `i`.
    pub fn from_program(program: &[i64]) -> Self {
        let mut mem = Self::new();
        for (addr, &value) in program.iter().enumerate() {
            mem.set(addr, value);
        }
        mem
    }

    /// Read a cell. Unwritten cells read as zero.
    #[inline]
    pub fn get(&self, addr: usize) -> i64 {
        if addr < DENSE_LIMIT {
            self.dense.get(addr).copied().unwrap_or(0)
        } else {
            self.sparse.get(&addr).copied().unwrap_or(0)
        }
    }

    /// Write a cell. Never fails.
    #[inline]
    pub fn set(&mut self, addr: usize, value: i64) {
        if addr < DENSE_LIMIT {
            if addr >= self.dense.len() {
                if value == 0 {
                    return;
                }
                self.dense.resize(addr + 1, 0);
            }
            self.dense[addr] = value;
        } else if value == 0 {
            self.sparse.remove(&addr);
        } else {
            self.sparse.insert(addr, value);
        }
    }

    /// One past the highest non-zero cell.
    pub fn extent(&self) -> usize {
        if let Some((&addr, _)) = self.sparse.iter().next_back() {
            return addr + 1;
        }
        self.dense
            .iter()
            .rposition(|&v| v != 0)
            .map_or(0, |i| i + 1)
    }

    /// Non-zero cells in address order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, i64)> + '_ {
        self.dense
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != 0)
            .map(|(addr, &v)| (addr, v))
            .chain(self.sparse.iter().map(|(&addr, &v)| (addr, v)))
    }

    /// Dump a dense window of memory (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<i64> {
        (start..start.saturating_add(count))
            .map(|addr| self.get(addr))
            .collect()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("non_zero_cells", &self.cells().count())
            .field("extent", &self.extent())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::new();
        mem.set(10, 42);
        assert_eq!(mem.get(10), 42);
        assert_eq!(mem.get(9), 0);
        assert_eq!(mem.get(11), 0);
    }

    #[test]
    fn test_memory_huge_address() {
        let mut mem = Memory::new();
        mem.set(1 << 40, -7);
        assert_eq!(mem.get(1 << 40), -7);
        assert_eq!(mem.extent(), (1 << 40) + 1);

        // Zeroing a sparse cell drops it.
        mem.set(1 << 40, 0);
        assert_eq!(mem.extent(), 0);
    }

    #[test]
    fn test_from_program_and_dump() {
        let mem = Memory::from_program(&[1, 0, 0, 0, 99]);
        assert_eq!(mem.dump(0, 5), vec![1, 0, 0, 0, 99]);
        assert_eq!(mem.dump(3, 4), vec![0, 99, 0, 0]);
        assert_eq!(mem.extent(), 5);
    }

    #[test]
    fn test_cells_in_order() {
        let mut mem = Memory::from_program(&[5, 0, 6]);
        mem.set(DENSE_LIMIT + 3, 8);
        let cells: Vec<_> = mem.cells().collect();
        assert_eq!(cells, vec![(0, 5), (2, 6), (DENSE_LIMIT + 3, 8)]);
    }

    proptest! {
        #[test]
        fn unwritten_addresses_read_zero(
            writes in prop::collection::vec((0usize..200_000, any::<i64>()), 0..64),
            probe in 0usize..400_000,
        ) {
            let mut mem = Memory::new();
            for &(addr, value) in &writes {
                mem.set(addr, value);
            }
            let expected = writes
                .iter()
                .rev()
                .find(|(addr, _)| *addr == probe)
                .map_or(0, |&(_, value)| value);
            prop_assert_eq!(mem.get(probe), expected);
        }
    }
}
