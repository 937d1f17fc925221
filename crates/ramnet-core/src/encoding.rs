//! Scalar to bit-pattern encoders.
//!
//! The classifier only sees `&[bool]`; these helpers turn numeric features into
//! patterns and join several features into one input.
//!
//! - `thermometer`: similar values share most of their bits, the usual choice
//!   for continuous features
//! - `binary`: compact, but neighbouring values may differ in every bit
//! - `gray`: binary reflected code, neighbouring values differ in one bit

use crate::error::{RamnetError, Result};

/// Thermometer code of `value` over `[min, max]` in `bits` positions.
///
/// Values outside the range are clamped. The first `round(fraction * bits)`
/// positions are set.
pub fn thermometer(value: f32, min: f32, max: f32, bits: usize) -> Result<Vec<bool>> {
    if !(max > min) || !min.is_finite() || !max.is_finite() {
        return Err(RamnetError::config(format!(
            "thermometer range [{}, {}] is empty",
            min, max
        )));
    }
    if value.is_nan() {
        return Err(RamnetError::config("thermometer value is NaN"));
    }
    let fraction = ((value - min) / (max - min)).clamp(0.0, 1.0);
    let active = (fraction * bits as f32).round() as usize;
    Ok((0..bits).map(|i| i < active).collect())
}

/// `value` as `bits` binary digits, most significant first
pub fn binary(value: u64, bits: usize) -> Result<Vec<bool>> {
    if bits == 0 || bits > 64 {
        return Err(RamnetError::config(format!("bits must be in [1, 64], got {}", bits)));
    }
    if bits < 64 && value >> bits != 0 {
        return Err(RamnetError::config(format!(
            "value {} does not fit in {} bits",
            value, bits
        )));
    }
    Ok((0..bits).rev().map(|shift| (value >> shift) & 1 == 1).collect())
}

/// Reflected Gray code of `value` in `bits` digits, most significant first
pub fn gray(value: u64, bits: usize) -> Result<Vec<bool>> {
    binary(value ^ (value >> 1), bits)
}

/// Join per-feature encodings into a single pattern
pub fn concat<I, P>(parts: I) -> Vec<bool>
where
    I: IntoIterator<Item = P>,
    P: AsRef<[bool]>,
{
    let mut out = Vec::new();
    for part in parts {
        out.extend_from_slice(part.as_ref());
    }
    out
}
