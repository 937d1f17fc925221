//! Bit-Tuple Mapping
//!
//! Fixes, once per model, which input positions feed each RAM node. The same
//! mapping is used by every discriminator, for training and for inference,
//! and it survives export/import unchanged.
//!
//! # Construction
//! ```text
//! identity  [0, 1, 2, ..., L-1]
//! shuffle   ChaCha8(seed)            -> [p0, p1, ..., pL-1]
//! slice     runs of T positions      -> tuple 0 = [p0..pT), tuple 1 = [pT..p2T), ...
//! ```
//! The last tuple is shorter when `L mod T != 0`.
//!
//! # Invariants
//! - Every position in `[0, L)` appears in exactly one tuple
//! - Tuple order and position order inside a tuple never change
//! - Same `(L, T, seed)` always yields the same mapping

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{RamnetError, Result};
use crate::memory;

/// Widest tuple supported; addresses are stored as `u64`
pub const MAX_TUPLE_SIZE: usize = 64;

/// Partition of the input positions into ordered tuples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    tuple_size: usize,
    seed: u64,
    /// Shuffled positions; tuple `i` is `permutation[i*T .. min((i+1)*T, L)]`
    permutation: Vec<usize>,
}

impl Mapping {
    /// Build a fresh mapping for `input_bits` positions and tuples of `tuple_size`.
    ///
    /// The generator is local to this call, so the result depends on nothing
    /// but the three arguments.
    pub fn build(input_bits: usize, tuple_size: usize, seed: u64) -> Result<Self> {
        check_dimensions(input_bits, tuple_size)?;

        let mut permutation: Vec<usize> = (0..input_bits).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        permutation.shuffle(&mut rng);

        Ok(Self {
            tuple_size,
            seed,
            permutation,
        })
    }

    /// Rebuild a mapping from an explicit permutation of `[0, L)`.
    ///
    /// `seed` is carried along for bookkeeping only.
    pub fn from_permutation(tuple_size: usize, seed: u64, permutation: Vec<usize>) -> Result<Self> {
        let input_bits = permutation.len();
        check_dimensions(input_bits, tuple_size)?;

        let mut seen = vec![false; input_bits];
        for &position in &permutation {
            if position >= input_bits {
                return Err(RamnetError::config(format!(
                    "position {} outside [0, {})",
                    position, input_bits
                )));
            }
            if seen[position] {
                return Err(RamnetError::config(format!(
                    "position {} appears in more than one tuple",
                    position
                )));
            }
            seen[position] = true;
        }

        Ok(Self {
            tuple_size,
            seed,
            permutation,
        })
    }

    /// Pattern length `L`
    #[inline]
    pub fn input_bits(&self) -> usize {
        self.permutation.len()
    }

    /// Maximum tuple size `T`
    #[inline]
    pub fn tuple_size(&self) -> usize {
        self.tuple_size
    }

    /// Number of tuples `N = ceil(L / T)`
    #[inline]
    pub fn tuple_count(&self) -> usize {
        self.permutation.len().div_ceil(self.tuple_size)
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Positions feeding tuple `index`, in address order (MSB first)
    #[inline]
    pub fn tuple(&self, index: usize) -> &[usize] {
        let start = index * self.tuple_size;
        let end = (start + self.tuple_size).min(self.permutation.len());
        &self.permutation[start..end]
    }

    pub fn tuples(&self) -> std::slice::Chunks<'_, usize> {
        self.permutation.chunks(self.tuple_size)
    }

    /// The shuffled positions, concatenated in tuple order
    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    /// Address of tuple `index` for `pattern`; `pattern` must hold `L` bits
    #[inline]
    pub(crate) fn address(&self, index: usize, pattern: &[bool]) -> u64 {
        memory::address(pattern, self.tuple(index))
    }
}

fn check_dimensions(input_bits: usize, tuple_size: usize) -> Result<()> {
    if input_bits == 0 {
        return Err(RamnetError::config("input_bits must be > 0"));
    }
    if tuple_size == 0 {
        return Err(RamnetError::config("tuple_size must be > 0"));
    }
    if tuple_size > input_bits {
        return Err(RamnetError::config(format!(
            "tuple_size {} exceeds input_bits {}",
            tuple_size, input_bits
        )));
    }
    if tuple_size > MAX_TUPLE_SIZE {
        return Err(RamnetError::config(format!(
            "tuple_size {} exceeds the {}-bit address limit",
            tuple_size, MAX_TUPLE_SIZE
        )));
    }
    Ok(())
}
