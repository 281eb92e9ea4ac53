//! Normalized information-theoretic randomness scores over byte buffers.
//!
//! All three measures are scaled into `[0, 1]`: Shannon and Rényi by the
//! 8 bits/byte maximum of the 256-symbol alphabet, Tsallis by its closed-form
//! maximum for a uniform distribution over 256 symbols (the Tsallis scale is
//! `q`-dependent, so a fixed divisor would not be comparable across orders).

/// Default Rényi order used by [`EntropyVector::of`].
pub const DEFAULT_RENYI_ORDER: f64 = 2.0;
/// Default Tsallis order used by [`EntropyVector::of`].
pub const DEFAULT_TSALLIS_ORDER: f64 = 1.5;

/// Maximum entropy of an 8-bit alphabet, in bits per symbol.
const MAX_BITS_PER_BYTE: f64 = 8.0;
const ALPHABET_SIZE: f64 = 256.0;

/// Normalized entropy scores for one payload, immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntropyVector {
    pub shannon: f64,
    pub renyi: f64,
    pub tsallis: f64,
}

impl EntropyVector {
    /// Scores `data` with the default Rényi and Tsallis orders.
    pub fn of(data: &[u8]) -> Self {
        score(data, DEFAULT_RENYI_ORDER, DEFAULT_TSALLIS_ORDER)
    }
}

/// Probabilities of the byte values actually present in `data`.
///
/// Absent values would contribute probability 0 to every sum below, so they
/// are simply excluded.
fn byte_probabilities(data: &[u8]) -> Vec<f64> {
    let mut counts = [0u64; 256];
    for &b in data {
        counts[b as usize] += 1;
    }
    let total = data.len() as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| c as f64 / total)
        .collect()
}

/// Shannon entropy of `data`, normalized by the 8-bit maximum.
///
/// Empty input scores exactly `0.0` by convention.
pub fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let ent: f64 = byte_probabilities(data)
        .iter()
        .map(|p| -p * p.log2())
        .sum();
    ent / MAX_BITS_PER_BYTE
}

/// Rényi entropy of order `alpha`, normalized by the 8-bit maximum.
///
/// `alpha == 1.0` is a removable singularity of the general formula and is
/// defined to equal the Shannon value. Callers must supply `alpha > 0`; this
/// is a precondition, not validated here.
pub fn renyi_entropy(data: &[u8], alpha: f64) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    if alpha == 1.0 {
        return shannon_entropy(data);
    }
    let s: f64 = byte_probabilities(data).iter().map(|p| p.powf(alpha)).sum();
    let ent = (1.0 / (1.0 - alpha)) * s.log2();
    ent / MAX_BITS_PER_BYTE
}

/// Tsallis entropy of order `q`, normalized by the maximum attainable value
/// for a uniform distribution over 256 symbols.
///
/// `q == 1.0` equals the Shannon value (removable singularity). A degenerate
/// `q` that makes the maximum zero yields `0.0` rather than a division error.
pub fn tsallis_entropy(data: &[u8], q: f64) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    if q == 1.0 {
        return shannon_entropy(data);
    }
    let s: f64 = byte_probabilities(data).iter().map(|p| p.powf(q)).sum();
    let ent = (1.0 - s) / (q - 1.0);
    let max_ent = (1.0 - ALPHABET_SIZE * (1.0 / ALPHABET_SIZE).powf(q)) / (q - 1.0);
    if max_ent == 0.0 {
        0.0
    } else {
        ent / max_ent
    }
}

/// Computes all three normalized scores for `data`.
pub fn score(data: &[u8], renyi_order: f64, tsallis_order: f64) -> EntropyVector {
    EntropyVector {
        shannon: shannon_entropy(data),
        renyi: renyi_entropy(data, renyi_order),
        tsallis: tsallis_entropy(data, tsallis_order),
    }
}
