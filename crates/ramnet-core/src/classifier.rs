//! WiSARD classifier: the shared mapping plus one discriminator per class.
//!
//! # Lifecycle
//! ```text
//! new / from_config ──▶ train* ──▶ classify* ──▶ export ─┐
//!                                                      │
//! import / load ◀──────────────────────────────────────┘
//! ```
//!
//! # Invariants
//! - The mapping is built once and never changes
//! - `train` validates shape and label before any counter moves
//! - Read operations never mutate counters, so a trained model can be shared
//!   across threads for classification

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::bleaching::{self, ResponseMatrix, Resolution};
use crate::codec;
use crate::config::ClassifierConfig;
use crate::discriminator::Discriminator;
use crate::error::{RamnetError, Result};
use crate::mapping::Mapping;
use crate::memory::{Counter, MemoryNode};

/// Memory footprint and saturation summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ModelStats {
    /// Stored (non-zero) cells across all discriminators
    pub cells: usize,
    /// Largest counter in the model
    pub max_counter: Counter,
    /// Cells pinned at the saturation limit
    pub saturated: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    mapping: Mapping,
    saturation: Counter,
    discriminators: Vec<Discriminator>,
}

impl Classifier {
    /// Fresh model for `classes` classes over `input_bits`-bit patterns.
    pub fn new(input_bits: usize, tuple_size: usize, classes: usize, seed: u64) -> Result<Self> {
        Self::from_config(&ClassifierConfig::new(input_bits, tuple_size, classes, seed))
    }

    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        config.validate()?;
        let mapping = Mapping::build(config.input_bits, config.tuple_size, config.seed)?;
        let discriminators = (0..config.classes)
            .map(|_| Discriminator::new(&mapping, config.saturation))
            .collect();

        debug!(
            input_bits = config.input_bits,
            tuple_size = config.tuple_size,
            tuples = mapping.tuple_count(),
            classes = config.classes,
            seed = config.seed,
            "classifier created"
        );

        Ok(Self {
            mapping,
            saturation: config.saturation,
            discriminators,
        })
    }

    /// Assemble a model from decoded parts; shapes are checked by the codec
    pub(crate) fn from_parts(
        mapping: Mapping,
        saturation: Counter,
        discriminators: Vec<Discriminator>,
    ) -> Self {
        Self {
            mapping,
            saturation,
            discriminators,
        }
    }

    #[inline]
    fn check_pattern(&self, pattern: &[bool]) -> Result<()> {
        if pattern.len() != self.mapping.input_bits() {
            return Err(RamnetError::Shape {
                expected: self.mapping.input_bits(),
                actual: pattern.len(),
            });
        }
        Ok(())
    }

    #[inline]
    fn check_label(&self, label: usize) -> Result<()> {
        if label >= self.discriminators.len() {
            return Err(RamnetError::Label {
                label,
                classes: self.discriminators.len(),
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Training
    // ------------------------------------------------------------------

    /// Present `pattern` as an example of class `label`.
    pub fn train(&mut self, pattern: &[bool], label: usize) -> Result<()> {
        self.check_pattern(pattern)?;
        self.check_label(label)?;
        self.discriminators[label].train(&self.mapping, pattern)
    }

    /// Train on a batch. Every sample is validated before the first one is
    /// learned, so an invalid sample leaves the model untouched.
    pub fn train_batch<'a, I>(&mut self, samples: I) -> Result<usize>
    where
        I: IntoIterator<Item = (&'a [bool], usize)>,
    {
        let samples: Vec<(&[bool], usize)> = samples.into_iter().collect();
        for &(pattern, label) in &samples {
            self.check_pattern(pattern)?;
            self.check_label(label)?;
        }
        for &(pattern, label) in &samples {
            self.discriminators[label].train(&self.mapping, pattern)?;
        }
        Ok(samples.len())
    }

    // ------------------------------------------------------------------
    // Inference
    // ------------------------------------------------------------------

    /// Raw `C x N` counters for `pattern`
    pub fn responses(&self, pattern: &[bool]) -> Result<ResponseMatrix> {
        self.check_pattern(pattern)?;
        let mut matrix = ResponseMatrix::new(self.discriminators.len(), self.mapping.tuple_count());
        for (class, disc) in self.discriminators.iter().enumerate() {
            disc.respond_into(&self.mapping, pattern, matrix.row_mut(class));
        }
        Ok(matrix)
    }

    /// Most likely class for `pattern`, resolved by bleaching
    pub fn classify(&self, pattern: &[bool]) -> Result<usize> {
        Ok(self.classify_detailed(pattern)?.label)
    }

    /// Bleaching outcome with scores, decisive threshold and confidence
    pub fn classify_detailed(&self, pattern: &[bool]) -> Result<Resolution> {
        let matrix = self.responses(pattern)?;
        Ok(bleaching::resolve(&matrix))
    }

    /// Classic WiSARD read: count nodes with any training at the pattern's
    /// address, lowest index wins ties.
    pub fn classify_binary(&self, pattern: &[bool]) -> Result<usize> {
        let matrix = self.responses(pattern)?;
        Ok(bleaching::argmax(&matrix.scores(1)))
    }

    /// Sum of raw counters per class, lowest index wins ties.
    pub fn classify_counts(&self, pattern: &[bool]) -> Result<usize> {
        let matrix = self.responses(pattern)?;
        Ok(bleaching::argmax(&matrix.sums()))
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Write the model in the binary model format
    pub fn export<W: Write>(&self, sink: W) -> Result<()> {
        codec::write_model(self, sink)
    }

    /// Read a model written by [`export`](Self::export)
    pub fn import<R: Read>(source: R) -> Result<Self> {
        codec::read_model(source)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.export(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::import(BufReader::new(File::open(path)?))
    }

    /// Replace this model with the one stored in `source`. On error the
    /// current state is kept as is.
    pub fn reload_from<R: Read>(&mut self, source: R) -> Result<()> {
        *self = Self::import(source)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[inline]
    pub fn input_bits(&self) -> usize {
        self.mapping.input_bits()
    }

    #[inline]
    pub fn tuple_size(&self) -> usize {
        self.mapping.tuple_size()
    }

    #[inline]
    pub fn tuple_count(&self) -> usize {
        self.mapping.tuple_count()
    }

    #[inline]
    pub fn classes(&self) -> usize {
        self.discriminators.len()
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.mapping.seed()
    }

    #[inline]
    pub fn saturation(&self) -> Counter {
        self.saturation
    }

    #[inline]
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn discriminator(&self, label: usize) -> Option<&Discriminator> {
        self.discriminators.get(label)
    }

    pub(crate) fn discriminators(&self) -> &[Discriminator] {
        &self.discriminators
    }

    pub fn stats(&self) -> ModelStats {
        self.discriminators
            .iter()
            .flat_map(Discriminator::nodes)
            .fold(ModelStats::default(), |acc, node: &MemoryNode| ModelStats {
                cells: acc.cells + node.len(),
                max_counter: acc.max_counter.max(node.max_counter()),
                saturated: acc.saturated + node.saturated(),
            })
    }
}
