//! RAM-net core: a WiSARD weightless neural network classifier.
//!
//! Patterns are fixed-length bit vectors. A seeded [`Mapping`] splits the input
//! positions into tuples; each class owns a [`Discriminator`] holding one sparse
//! [`MemoryNode`] per tuple. Training increments the addressed counters of the
//! target class, classification collects every class's counters and lets the
//! bleaching resolver pick the winner. Models persist through a versioned,
//! checksummed binary format.
//!
//! ```no_run
//! use ramnet_core::Classifier;
//!
//! # fn main() -> ramnet_core::Result<()> {
//! let mut model = Classifier::new(8, 4, 2, 42)?;
//! model.train(&[true, true, false, false, true, false, true, false], 0)?;
//! let label = model.classify(&[true, true, false, false, true, false, true, true])?;
//! model.save("model.rnet")?;
//! # let _ = label;
//! # Ok(())
//! # }
//! ```

pub mod bleaching;
pub mod classifier;
pub mod codec;
pub mod config;
pub mod discriminator;
pub mod encoding;
pub mod error;
pub mod evaluation;
pub mod mapping;
pub mod memory;
pub mod synthetic;

#[cfg(test)]
mod tests_proptest;

// ============================================================================
// CURATED PUBLIC API EXPORTS
// ============================================================================

// Model
pub use classifier::{Classifier, ModelStats};
pub use discriminator::Discriminator;
pub use mapping::{Mapping, MAX_TUPLE_SIZE};
pub use memory::{Counter, MemoryNode};

// Inference
pub use bleaching::{resolve, Resolution, ResponseMatrix};

// Persistence
pub use codec::FORMAT_VERSION;

// Configuration and errors
pub use config::ClassifierConfig;
pub use error::{RamnetError, Result};

// Harness support
pub use evaluation::ConfusionMatrix;
pub use synthetic::PatternSource;
