//! Binary model format.
//!
//! # Layout (little-endian, version 1)
//! ```text
//! magic        b"RNET"                          4 bytes
//! version      u16                              = 1
//! flags        u16                              = 0
//! input_bits   u32   L
//! tuple_size   u32   T
//! classes      u32   C
//! seed         u64
//! saturation   u32
//! permutation  L x u32                          tuple order, see Mapping
//! nodes        C x N x { count u32, count x (address u64, counter u32) }
//! end marker   u32                              = 0xFFFF_FFFF
//! digest       blake3 of every byte above       32 bytes
//! ```
//! Node entries are written in label order, then tuple order, with cells sorted
//! by address, so equal models always encode to equal bytes.
//!
//! # Errors
//! - truncated stream, bad magic, missing end marker, trailing bytes: `Format`
//! - unknown version: `Version`
//! - anything a training run could not have produced, or a digest mismatch:
//!   `Corruption`

use std::io::{Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::{debug, warn};

use crate::classifier::Classifier;
use crate::config::ClassifierConfig;
use crate::discriminator::Discriminator;
use crate::error::{RamnetError, Result};
use crate::mapping::Mapping;

pub const MAGIC: [u8; 4] = *b"RNET";
pub const FORMAT_VERSION: u16 = 1;
pub const END_MARKER: u32 = u32::MAX;
pub const DIGEST_LEN: usize = 32;

/// Bytes per stored cell: address u64 + counter u32
const CELL_LEN: usize = 12;

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| RamnetError::format(format!("{} {} too large to encode", what, value)))
}

/// Encode `model` into a self-contained byte buffer
pub fn encode(model: &Classifier) -> Result<Bytes> {
    let mapping = model.mapping();
    let stats = model.stats();
    let mut buf = BytesMut::with_capacity(
        32 + 4 * mapping.input_bits()
            + 4 * model.classes() * model.tuple_count()
            + CELL_LEN * stats.cells
            + 4
            + DIGEST_LEN,
    );

    buf.put_slice(&MAGIC);
    buf.put_u16_le(FORMAT_VERSION);
    buf.put_u16_le(0);
    buf.put_u32_le(to_u32(mapping.input_bits(), "input_bits")?);
    buf.put_u32_le(to_u32(mapping.tuple_size(), "tuple_size")?);
    buf.put_u32_le(to_u32(model.classes(), "classes")?);
    buf.put_u64_le(mapping.seed());
    buf.put_u32_le(model.saturation());

    for &position in mapping.permutation() {
        buf.put_u32_le(to_u32(position, "position")?);
    }

    for disc in model.discriminators() {
        for node in disc.nodes() {
            buf.put_u32_le(to_u32(node.len(), "cell count")?);
            for (address, counter) in node.iter() {
                buf.put_u64_le(address);
                buf.put_u32_le(counter);
            }
        }
    }

    buf.put_u32_le(END_MARKER);
    let digest = blake3::hash(&buf);
    buf.put_slice(digest.as_bytes());
    Ok(buf.freeze())
}

/// Sequential reader that turns every short read into a `Format` error
struct Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Decoder<'a> {
    fn need(&self, len: usize, what: &str) -> Result<()> {
        if self.buf.remaining() < len {
            return Err(RamnetError::format(format!(
                "stream truncated while reading {} ({} of {} bytes left)",
                what,
                self.buf.remaining(),
                len
            )));
        }
        Ok(())
    }

    fn u16(&mut self, what: &str) -> Result<u16> {
        self.need(2, what)?;
        Ok(self.buf.get_u16_le())
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        self.need(4, what)?;
        Ok(self.buf.get_u32_le())
    }

    fn u64(&mut self, what: &str) -> Result<u64> {
        self.need(8, what)?;
        Ok(self.buf.get_u64_le())
    }

    fn bytes(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        self.need(len, what)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }
}

/// Decode a model produced by [`encode`]. Never returns a partial model.
pub fn decode(data: &[u8]) -> Result<Classifier> {
    let mut dec = Decoder { buf: data };

    if dec.bytes(MAGIC.len(), "magic")? != &MAGIC[..] {
        return Err(RamnetError::format("not a ramnet model (bad magic)"));
    }
    let version = dec.u16("version")?;
    if version != FORMAT_VERSION {
        return Err(RamnetError::Version {
            found: version,
            supported: FORMAT_VERSION,
        });
    }
    let flags = dec.u16("flags")?;
    if flags != 0 {
        return Err(RamnetError::corruption(format!("unknown flags {:#06x}", flags)));
    }

    let config = ClassifierConfig {
        input_bits: dec.u32("input_bits")? as usize,
        tuple_size: dec.u32("tuple_size")? as usize,
        classes: dec.u32("classes")? as usize,
        seed: dec.u64("seed")?,
        saturation: dec.u32("saturation")?,
    };
    config
        .validate()
        .map_err(|e| RamnetError::corruption(format!("invalid header: {}", e)))?;

    dec.need(4 * config.input_bits, "permutation")?;
    let mut permutation = Vec::with_capacity(config.input_bits);
    for _ in 0..config.input_bits {
        permutation.push(dec.u32("permutation")? as usize);
    }
    let mapping = Mapping::from_permutation(config.tuple_size, config.seed, permutation)
        .map_err(|e| RamnetError::corruption(format!("invalid mapping: {}", e)))?;

    // every node carries at least its u32 cell count, then the trailer follows
    dec.need(
        config
            .classes
            .saturating_mul(4 * mapping.tuple_count())
            .saturating_add(4 + DIGEST_LEN),
        "nodes",
    )?;
    let mut discriminators = Vec::new();
    for label in 0..config.classes {
        let mut disc = Discriminator::new(&mapping, config.saturation);
        for (index, node) in disc.nodes_mut().iter_mut().enumerate() {
            let count = dec.u32("cell count")? as usize;
            dec.need(count.saturating_mul(CELL_LEN), "cells")?;
            for _ in 0..count {
                let address = dec.u64("address")?;
                let counter = dec.u32("counter")?;
                node.insert(address, counter).map_err(|e| match e {
                    RamnetError::AddressOutOfRange { address, bits } => {
                        RamnetError::corruption(format!(
                            "class {} tuple {}: address {} outside [0, 2^{})",
                            label, index, address, bits
                        ))
                    }
                    RamnetError::Corruption(msg) => RamnetError::corruption(format!(
                        "class {} tuple {}: {}",
                        label, index, msg
                    )),
                    other => other,
                })?;
            }
        }
        discriminators.push(disc);
    }

    if dec.u32("end marker")? != END_MARKER {
        return Err(RamnetError::format("missing end marker"));
    }
    let body_len = data.len() - dec.buf.remaining();
    let stored = dec.bytes(DIGEST_LEN, "digest")?;
    if !dec.buf.is_empty() {
        return Err(RamnetError::format(format!(
            "{} trailing bytes after digest",
            dec.buf.len()
        )));
    }
    if blake3::hash(&data[..body_len]).as_bytes() != stored {
        return Err(RamnetError::corruption("digest mismatch"));
    }

    Ok(Classifier::from_parts(mapping, config.saturation, discriminators))
}

/// Encode `model` and write it to `sink`
pub fn write_model<W: Write>(model: &Classifier, mut sink: W) -> Result<()> {
    let bytes = encode(model)?;
    sink.write_all(&bytes)?;
    debug!(bytes = bytes.len(), classes = model.classes(), "model exported");
    Ok(())
}

/// Read `source` to the end and decode the model it holds
pub fn read_model<R: Read>(mut source: R) -> Result<Classifier> {
    let mut data = Vec::new();
    source.read_to_end(&mut data)?;
    match decode(&data) {
        Ok(model) => {
            debug!(bytes = data.len(), classes = model.classes(), "model imported");
            Ok(model)
        }
        Err(e) => {
            warn!(code = e.code(), error = %e, "model import rejected");
            Err(e)
        }
    }
}
