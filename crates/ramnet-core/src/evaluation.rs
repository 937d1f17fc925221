//! Accuracy bookkeeping for classification runs.

use serde::Serialize;

use crate::error::{RamnetError, Result};

/// `C x C` counts, rows = expected label, columns = predicted label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    classes: usize,
    counts: Vec<u64>,
}

impl ConfusionMatrix {
    pub fn new(classes: usize) -> Self {
        Self {
            classes,
            counts: vec![0; classes * classes],
        }
    }

    /// Count one prediction
    pub fn record(&mut self, expected: usize, predicted: usize) -> Result<()> {
        for label in [expected, predicted] {
            if label >= self.classes {
                return Err(RamnetError::Label {
                    label,
                    classes: self.classes,
                });
            }
        }
        self.counts[expected * self.classes + predicted] += 1;
        Ok(())
    }

    #[inline]
    pub fn classes(&self) -> usize {
        self.classes
    }

    pub fn count(&self, expected: usize, predicted: usize) -> u64 {
        self.counts[expected * self.classes + predicted]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Predictions on the diagonal
    pub fn hits(&self) -> u64 {
        (0..self.classes).map(|c| self.count(c, c)).sum()
    }

    pub fn misses(&self) -> u64 {
        self.total() - self.hits()
    }

    /// `hits / total`, 0.0 before anything was recorded
    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.hits() as f64 / total as f64,
        }
    }

    /// Fraction of class `label` samples predicted as `label`; `None` if the
    /// class was never seen
    pub fn recall(&self, label: usize) -> Option<f64> {
        let row = &self.counts[label * self.classes..(label + 1) * self.classes];
        let seen: u64 = row.iter().sum();
        (seen > 0).then(|| row[label] as f64 / seen as f64)
    }

    pub fn recalls(&self) -> Vec<Option<f64>> {
        (0..self.classes).map(|c| self.recall(c)).collect()
    }

    /// Add the counts of `other`, which must have the same number of classes
    pub fn merge(&mut self, other: &ConfusionMatrix) -> Result<()> {
        if other.classes != self.classes {
            return Err(RamnetError::config(format!(
                "cannot merge {}-class matrix into {}-class matrix",
                other.classes, self.classes
            )));
        }
        for (a, b) in self.counts.iter_mut().zip(&other.counts) {
            *a += b;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_matrix() {
        let m = ConfusionMatrix::new(3);
        assert_eq!(m.total(), 0);
        assert_eq!(m.accuracy(), 0.0);
        assert_eq!(m.recall(1), None);
    }

    #[test]
    fn test_record_and_accuracy() {
        let mut m = ConfusionMatrix::new(2);
        m.record(0, 0).unwrap();
        m.record(0, 1).unwrap();
        m.record(1, 1).unwrap();
        m.record(1, 1).unwrap();
        assert_eq!(m.hits(), 3);
        assert_eq!(m.misses(), 1);
        assert!((m.accuracy() - 0.75).abs() < 1e-12);
        assert_eq!(m.recall(0), Some(0.5));
        assert_eq!(m.recall(1), Some(1.0));
        assert_eq!(m.count(0, 1), 1);
    }

    #[test]
    fn test_record_rejects_unknown_labels() {
        let mut m = ConfusionMatrix::new(2);
        assert!(matches!(
            m.record(2, 0),
            Err(RamnetError::Label { label: 2, classes: 2 })
        ));
        assert!(m.record(0, 5).is_err());
        assert_eq!(m.total(), 0);
    }

    #[test]
    fn test_merge() {
        let mut a = ConfusionMatrix::new(2);
        let mut b = ConfusionMatrix::new(2);
        a.record(0, 0).unwrap();
        b.record(1, 0).unwrap();
        a.merge(&b).unwrap();
        assert_eq!(a.total(), 2);
        assert!(a.merge(&ConfusionMatrix::new(3)).is_err());
    }
}
