//! Discriminator: one class worth of RAM nodes, one node per tuple.

use crate::error::{RamnetError, Result};
use crate::mapping::Mapping;
use crate::memory::{Counter, MemoryNode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discriminator {
    nodes: Vec<MemoryNode>,
}

impl Discriminator {
    /// Empty discriminator shaped after `mapping`
    pub fn new(mapping: &Mapping, limit: Counter) -> Self {
        let nodes = mapping
            .tuples()
            .map(|tuple| MemoryNode::new(tuple.len(), limit))
            .collect();
        Self { nodes }
    }

    /// Reject patterns and mappings this discriminator was not shaped for
    fn check(&self, mapping: &Mapping, pattern: &[bool]) -> Result<()> {
        if pattern.len() != mapping.input_bits() {
            return Err(RamnetError::Shape {
                expected: mapping.input_bits(),
                actual: pattern.len(),
            });
        }
        if mapping.tuple_count() != self.nodes.len() {
            return Err(RamnetError::config(format!(
                "mapping has {} tuples, discriminator has {} nodes",
                mapping.tuple_count(),
                self.nodes.len()
            )));
        }
        Ok(())
    }

    /// Increment, in every node, the cell addressed by `pattern`.
    pub fn train(&mut self, mapping: &Mapping, pattern: &[bool]) -> Result<()> {
        self.check(mapping, pattern)?;
        for (index, node) in self.nodes.iter_mut().enumerate() {
            node.increment(mapping.address(index, pattern))?;
        }
        Ok(())
    }

    /// Raw counter per tuple for `pattern`
    pub fn respond(&self, mapping: &Mapping, pattern: &[bool]) -> Result<Vec<Counter>> {
        self.check(mapping, pattern)?;
        let mut out = vec![0; self.nodes.len()];
        self.respond_into(mapping, pattern, &mut out);
        Ok(out)
    }

    /// Same as [`respond`](Self::respond), writing into `out` (one slot per
    /// tuple). The caller has already checked the pattern length.
    pub(crate) fn respond_into(&self, mapping: &Mapping, pattern: &[bool], out: &mut [Counter]) {
        debug_assert_eq!(out.len(), self.nodes.len());
        for (index, (node, slot)) in self.nodes.iter().zip(out.iter_mut()).enumerate() {
            *slot = node.get(mapping.address(index, pattern));
        }
    }

    #[inline]
    pub fn nodes(&self) -> &[MemoryNode] {
        &self.nodes
    }

    #[inline]
    pub(crate) fn nodes_mut(&mut self) -> &mut [MemoryNode] {
        &mut self.nodes
    }

    /// Total stored cells across all nodes
    pub fn cells(&self) -> usize {
        self.nodes.iter().map(MemoryNode::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(bits: &str) -> Vec<bool> {
        bits.chars().map(|c| c == '1').collect()
    }

    #[test]
    fn test_one_node_per_tuple() {
        let mapping = Mapping::build(10, 4, 0).unwrap();
        let disc = Discriminator::new(&mapping, Counter::MAX);
        let widths: Vec<usize> = disc.nodes().iter().map(MemoryNode::bits).collect();
        assert_eq!(widths, vec![4, 4, 2]);
    }

    #[test]
    fn test_train_then_respond() {
        let mapping = Mapping::build(8, 4, 11).unwrap();
        let mut disc = Discriminator::new(&mapping, Counter::MAX);
        let p = pattern("10110010");
        let q = pattern("01001101");

        assert_eq!(disc.respond(&mapping, &p).unwrap(), vec![0, 0]);
        disc.train(&mapping, &p).unwrap();
        disc.train(&mapping, &p).unwrap();
        assert_eq!(disc.respond(&mapping, &p).unwrap(), vec![2, 2]);
        // complement shares no address with p in any tuple
        assert_eq!(disc.respond(&mapping, &q).unwrap(), vec![0, 0]);
        assert_eq!(disc.cells(), 2);
    }

    #[test]
    fn test_respond_into_matches_respond() {
        let mapping = Mapping::build(12, 5, 2).unwrap();
        let mut disc = Discriminator::new(&mapping, 3);
        let p = pattern("110011001100");
        for _ in 0..5 {
            disc.train(&mapping, &p).unwrap();
        }
        let mut buf = vec![99; mapping.tuple_count()];
        disc.respond_into(&mapping, &p, &mut buf);
        assert_eq!(buf, disc.respond(&mapping, &p).unwrap());
        assert_eq!(buf, vec![3, 3, 3]);
    }

    #[test]
    fn test_mismatched_pattern_is_rejected() {
        let mapping = Mapping::build(8, 4, 0).unwrap();
        let mut disc = Discriminator::new(&mapping, Counter::MAX);
        let short = pattern("101");
        assert!(matches!(
            disc.respond(&mapping, &short),
            Err(RamnetError::Shape { expected: 8, actual: 3 })
        ));
        assert!(matches!(
            disc.train(&mapping, &short),
            Err(RamnetError::Shape { .. })
        ));
        assert_eq!(disc.cells(), 0);

        let other = Mapping::build(12, 4, 0).unwrap();
        assert!(matches!(
            disc.respond(&other, &[false; 12]),
            Err(RamnetError::Config(_))
        ));
    }
}
