//! Bleaching: threshold escalation over discriminator responses.
//!
//! A discriminator's score at threshold `b` is the number of its nodes whose
//! counter is at least `b`. Raw counts saturate quickly under noise, so many
//! classes end up tied at `b = 1`; raising `b` keeps only the cells that were
//! reinforced often and usually isolates a single winner.
//!
//! # Algorithm
//! ```text
//! b = 1
//! loop:
//!     score[c]  = |{ i : R[c][i] >= b }|
//!     winners   = argmax(score)
//!     |winners| == 1        -> return winner
//!     max(score) == 0       -> fallback
//!     b == max(R)           -> fallback
//!     b += 1
//! fallback: lowest class index among the winners at b = 1
//! ```
//!
//! Scores only change at thresholds just above a counter value present in `R`,
//! so the loop jumps straight to those thresholds. The outcome, including the
//! reported decisive threshold, is the same as stepping one by one.

use tracing::{debug, trace};

use crate::error::{RamnetError, Result};
use crate::memory::Counter;

/// `C x N` matrix of raw counters: one row per class, one column per tuple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMatrix {
    classes: usize,
    tuples: usize,
    data: Vec<Counter>,
}

impl ResponseMatrix {
    /// Zero-filled matrix; both dimensions must be non-zero
    pub(crate) fn new(classes: usize, tuples: usize) -> Self {
        Self {
            classes,
            tuples,
            data: vec![0; classes * tuples],
        }
    }

    /// Build from explicit rows, all of the same non-zero length
    pub fn from_rows(rows: Vec<Vec<Counter>>) -> Result<Self> {
        let classes = rows.len();
        let tuples = rows.first().map(Vec::len).unwrap_or(0);
        if classes == 0 || tuples == 0 {
            return Err(RamnetError::config("response matrix must be non-empty"));
        }
        if rows.iter().any(|r| r.len() != tuples) {
            return Err(RamnetError::config("response rows differ in length"));
        }
        Ok(Self {
            classes,
            tuples,
            data: rows.into_iter().flatten().collect(),
        })
    }

    #[inline]
    pub fn classes(&self) -> usize {
        self.classes
    }

    #[inline]
    pub fn tuples(&self) -> usize {
        self.tuples
    }

    #[inline]
    pub fn row(&self, class: usize) -> &[Counter] {
        &self.data[class * self.tuples..(class + 1) * self.tuples]
    }

    #[inline]
    pub(crate) fn row_mut(&mut self, class: usize) -> &mut [Counter] {
        &mut self.data[class * self.tuples..(class + 1) * self.tuples]
    }

    pub fn max_counter(&self) -> Counter {
        self.data.iter().copied().max().unwrap_or(0)
    }

    /// Per-class number of tuples responding at or above `threshold`
    pub fn scores(&self, threshold: Counter) -> Vec<usize> {
        self.data
            .chunks(self.tuples)
            .map(|row| row.iter().filter(|&&c| c >= threshold).count())
            .collect()
    }

    /// Per-class sum of raw counters
    pub fn sums(&self) -> Vec<u64> {
        self.data
            .chunks(self.tuples)
            .map(|row| row.iter().map(|&c| u64::from(c)).sum())
            .collect()
    }
}

/// Outcome of one bleaching run
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Winning class
    pub label: usize,
    /// Threshold at which the decision was taken (1 when the fallback fired)
    pub threshold: Counter,
    /// Per-class scores at `threshold`
    pub scores: Vec<usize>,
    /// `(best - second) / best` over `scores`
    pub confidence: f32,
    /// True when no threshold isolated a single class
    pub fallback: bool,
}

impl Resolution {
    /// Classes ordered by score, ties broken by lower index
    pub fn ranking(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.scores.len()).collect();
        order.sort_by(|&a, &b| self.scores[b].cmp(&self.scores[a]).then(a.cmp(&b)));
        order
    }
}

/// Index of the largest value, lowest index on ties
pub fn argmax<T: Ord + Copy>(values: &[T]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Relative margin between the two best scores
pub fn confidence(scores: &[usize]) -> f32 {
    if scores.len() < 2 {
        return 1.0;
    }
    let mut best = 0usize;
    let mut second = 0usize;
    for &s in scores {
        if s > best {
            second = best;
            best = s;
        } else if s > second {
            second = s;
        }
    }
    if best == 0 {
        0.0
    } else {
        (best - second) as f32 / best as f32
    }
}

/// Single winner of `scores`, if there is exactly one class at the maximum
fn unique_winner(scores: &[usize]) -> Option<usize> {
    let best = argmax(scores);
    let top = scores[best];
    if scores.iter().filter(|&&s| s == top).count() == 1 {
        Some(best)
    } else {
        None
    }
}

/// Resolve the winning class for `matrix`.
pub fn resolve(matrix: &ResponseMatrix) -> Resolution {
    let ceiling = matrix.max_counter();
    let mut levels: Vec<Counter> = matrix.data.iter().copied().filter(|&c| c > 0).collect();
    levels.sort_unstable();
    levels.dedup();

    let initial = matrix.scores(1);
    let mut threshold: Counter = 1;
    let mut scores = initial.clone();

    loop {
        if let Some(label) = unique_winner(&scores) {
            trace!(threshold, label, "bleaching isolated a winner");
            return Resolution {
                label,
                threshold,
                confidence: confidence(&scores),
                scores,
                fallback: false,
            };
        }
        if scores.iter().all(|&s| s == 0) {
            break;
        }
        // Scores at b+1 differ from b only if some counter equals b, so the next
        // informative threshold sits just above the smallest level >= b.
        let next = levels.partition_point(|&v| v < threshold);
        match levels.get(next) {
            Some(&level) if level < ceiling => {
                threshold = level + 1;
                scores = matrix.scores(threshold);
                trace!(threshold, ?scores, "bleaching escalated");
            }
            _ => break,
        }
    }

    let label = argmax(&initial);
    debug!(
        label,
        ceiling,
        classes = matrix.classes(),
        "bleaching exhausted thresholds, using lowest tied class"
    );
    Resolution {
        label,
        threshold: 1,
        confidence: confidence(&initial),
        scores: initial,
        fallback: true,
    }
}
