//! Similarity-preserving fingerprints for short text records.
//!
//! Each record is mapped to a fixed 256-bit code such that inputs sharing
//! many 3-byte windows produce codes differing in few bits. The code is
//! built from 256 window-occurrence counters thresholded at their mean,
//! so it captures which digest buckets a record's windows fall into.

use md5::{Digest, Md5};

/// Number of bits in a fingerprint code.
pub const FINGERPRINT_BITS: usize = 256;

/// Number of bytes in a fingerprint code.
pub const FINGERPRINT_BYTES: usize = FINGERPRINT_BITS / 8;

/// Byte width of the sliding window digested per position.
pub const WINDOW_SIZE: usize = 3;

/// A 256-bit similarity-preserving fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Fingerprint([u8; FINGERPRINT_BYTES]);

impl Fingerprint {
    /// Wrap a raw 32-byte code.
    #[must_use]
    pub fn from_bytes(bytes: [u8; FINGERPRINT_BYTES]) -> Self {
        Self(bytes)
    }

    /// The raw code bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_BYTES] {
        &self.0
    }

    /// Bit `i` of the code, most-significant-bit first within each byte.
    ///
    /// # Panics
    /// Panics if `i >= 256`.
    #[must_use]
    pub fn bit(&self, i: usize) -> u8 {
        (self.0[i / 8] >> (7 - (i % 8))) & 1
    }

    /// Hamming distance between two fingerprints (XOR + popcount).
    #[must_use]
    pub fn hamming_distance(&self, other: &Self) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fingerprint(")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// Fingerprint a byte record.
///
/// Slides a full-length [`WINDOW_SIZE`]-byte window over the input one byte
/// at a time, digests each window with MD5 and increments the counter
/// selected by the final digest byte. Output bit *i* is 1 iff counter *i*
/// is `>=` the mean over all 256 counters.
///
/// The `>=` tie rule means a record with no full window (fewer than 3
/// bytes) has every counter equal to the zero mean and fingerprints to the
/// all-ones code; all such degenerate records group together.
#[must_use]
pub fn fingerprint(input: &[u8]) -> Fingerprint {
    let mut counters = [0u32; FINGERPRINT_BITS];
    for window in input.windows(WINDOW_SIZE) {
        counters[bucket(window)] += 1;
    }

    let sum: u32 = counters.iter().sum();
    let mean = sum as f32 / FINGERPRINT_BITS as f32;

    let mut code = [0u8; FINGERPRINT_BYTES];
    for (i, byte) in code.iter_mut().enumerate() {
        for k in 0..8 {
            let hot = counters[i * 8 + k] as f32 >= mean;
            *byte = (*byte << 1) | u8::from(hot);
        }
    }

    Fingerprint(code)
}

/// Map a window to a counter index via the last byte of its MD5 digest.
fn bucket(window: &[u8]) -> usize {
    let digest = Md5::digest(window);
    usize::from(digest[digest.len() - 1])
}
