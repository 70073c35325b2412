/*
MIT License

Copyright (c) 2026 Raja Lehtihet and Wael El Oraiby

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! Stable structural fingerprints.
//!
//! The encoding is tagged and length-prefixed so that distinct argument lists
//! can never serialize to the same byte stream, and it only depends on values
//! (never on addresses or hasher seeds), so digests are reproducible across
//! runs and platforms.

use glam::DVec3;
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 digest identifying a feature by type and resolved arguments.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructuralHash([u8; 32]);

impl StructuralHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(64);
        for byte in self.0 {
            out.push_str(&format!("{byte:02x}"));
        }
        out
    }

    /// First 12 hex digits, for log lines.
    pub fn short(&self) -> String {
        self.to_hex()[..12].to_string()
    }
}

impl fmt::Display for StructuralHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for StructuralHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StructuralHash({})", self.short())
    }
}

/// Canonical bit pattern of a float: `-0.0` folds to `0.0`, every NaN to one NaN.
pub(crate) fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 {
        0
    } else if value.is_nan() {
        f64::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

/// Incremental hash accumulator.
pub(crate) struct HashBuilder {
    hasher: Sha256,
}

impl HashBuilder {
    /// Starts a digest in a named domain so different digest uses never collide.
    pub(crate) fn new(domain: &str) -> Self {
        let mut builder = Self {
            hasher: Sha256::new(),
        };
        builder.str(domain);
        builder
    }

    pub(crate) fn tag(&mut self, tag: u8) {
        self.hasher.update([tag]);
    }

    pub(crate) fn u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    pub(crate) fn str(&mut self, value: &str) {
        self.u64(value.len() as u64);
        self.hasher.update(value.as_bytes());
    }

    pub(crate) fn f64(&mut self, value: f64) {
        self.u64(canonical_bits(value));
    }

    pub(crate) fn vec3(&mut self, value: DVec3) {
        self.f64(value.x);
        self.f64(value.y);
        self.f64(value.z);
    }

    pub(crate) fn hash(&mut self, value: &StructuralHash) {
        self.hasher.update(value.as_bytes());
    }

    pub(crate) fn finish(self) -> StructuralHash {
        StructuralHash(self.hasher.finalize().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_zero_and_nan_are_canonical() {
        assert_eq!(canonical_bits(-0.0), canonical_bits(0.0));
        assert_eq!(canonical_bits(f64::NAN), canonical_bits(-f64::NAN));
        assert_ne!(canonical_bits(1.0), canonical_bits(-1.0));
    }

    #[test]
    fn length_prefix_separates_adjacent_strings() {
        let mut a = HashBuilder::new("test");
        a.str("ab");
        a.str("c");
        let mut b = HashBuilder::new("test");
        b.str("a");
        b.str("bc");
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn hex_rendering_is_stable() {
        let digest = HashBuilder::new("").finish();
        assert_eq!(digest.to_hex().len(), 64);
        assert_eq!(digest.short(), digest.to_hex()[..12]);
        assert_eq!(digest, HashBuilder::new("").finish());
    }
}
