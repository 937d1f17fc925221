//! RAM memory nodes.
//!
//! A node is the sparse counter table behind one tuple of one discriminator.
//! Only addresses that were actually trained occupy memory, so a 16-bit tuple
//! costs a handful of entries instead of 65536 cells.

use rustc_hash::FxHashMap;

use crate::error::{RamnetError, Result};

/// Per-address training count
pub type Counter = u32;

/// Address formed by the bits of `pattern` at `tuple`, read in tuple order,
/// most-significant bit first.
#[inline]
pub(crate) fn address(pattern: &[bool], tuple: &[usize]) -> u64 {
    tuple
        .iter()
        .fold(0u64, |acc, &position| (acc << 1) | u64::from(pattern[position]))
}

/// Sparse `address -> counter` table for a `bits`-wide tuple.
///
/// Counters saturate at `limit` and never wrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryNode {
    bits: usize,
    limit: Counter,
    cells: FxHashMap<u64, Counter>,
}

impl MemoryNode {
    pub fn new(bits: usize, limit: Counter) -> Self {
        debug_assert!(bits >= 1 && bits <= 64);
        debug_assert!(limit >= 1);
        Self {
            bits,
            limit,
            cells: FxHashMap::default(),
        }
    }

    /// Tuple width `k`; valid addresses are `[0, 2^k)`
    #[inline]
    pub fn bits(&self) -> usize {
        self.bits
    }

    #[inline]
    pub fn limit(&self) -> Counter {
        self.limit
    }

    #[inline]
    fn check(&self, address: u64) -> Result<()> {
        if self.bits < 64 && address >> self.bits != 0 {
            return Err(RamnetError::AddressOutOfRange {
                address,
                bits: self.bits,
            });
        }
        Ok(())
    }

    /// Add one occurrence at `address` and return the new counter value.
    pub fn increment(&mut self, address: u64) -> Result<Counter> {
        self.check(address)?;
        let cell = self.cells.entry(address).or_insert(0);
        if *cell < self.limit {
            *cell += 1;
        }
        Ok(*cell)
    }

    /// Counter at `address`, 0 when never trained
    #[inline]
    pub fn get(&self, address: u64) -> Counter {
        self.cells.get(&address).copied().unwrap_or(0)
    }

    /// Restore a stored cell. Used when decoding a persisted model, so anything a
    /// training run could not have produced is rejected.
    pub fn insert(&mut self, address: u64, counter: Counter) -> Result<()> {
        self.check(address)?;
        if counter == 0 || counter > self.limit {
            return Err(RamnetError::corruption(format!(
                "counter {} at address {} outside [1, {}]",
                counter, address, self.limit
            )));
        }
        if self.cells.insert(address, counter).is_some() {
            return Err(RamnetError::corruption(format!(
                "address {} stored twice",
                address
            )));
        }
        Ok(())
    }

    /// Number of addresses with a non-zero counter
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Stored cells ordered by address
    pub fn iter(&self) -> impl Iterator<Item = (u64, Counter)> {
        let mut cells: Vec<(u64, Counter)> = self.cells.iter().map(|(&a, &c)| (a, c)).collect();
        cells.sort_unstable_by_key(|&(address, _)| address);
        cells.into_iter()
    }

    pub fn max_counter(&self) -> Counter {
        self.cells.values().copied().max().unwrap_or(0)
    }

    /// Cells pinned at the saturation limit
    pub fn saturated(&self) -> usize {
        self.cells.values().filter(|&&c| c == self.limit).count()
    }
}
