//! Incremental digest accumulators used to hash one group at a time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::digest::Digest;
use sha2::Sha256;

use crate::errors::SyncError;
use crate::models::{ContentDigest, IdAndValueDigests};

/// A running hash over a sequence of byte slices.
///
/// `finish` returns the digest of everything fed since the previous `finish`
/// and leaves the accumulator ready for a new sequence.
pub trait DigestAccumulator {
    fn update(&mut self, bytes: &[u8]);

    fn finish(&mut self) -> ContentDigest;
}

impl DigestAccumulator for Sha1 {
    fn update(&mut self, bytes: &[u8]) {
        Digest::update(self, bytes);
    }

    fn finish(&mut self) -> ContentDigest {
        ContentDigest::from_slice(&self.finalize_reset())
    }
}

impl DigestAccumulator for Sha256 {
    fn update(&mut self, bytes: &[u8]) {
        Digest::update(self, bytes);
    }

    fn finish(&mut self) -> ContentDigest {
        ContentDigest::from_slice(&self.finalize_reset())
    }
}

/// Hash function selection for grouping passes and record digests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// 20-byte SHA-1, the digest peers exchange by default.
    #[default]
    Sha1,
    Sha256,
}

impl DigestAlgorithm {
    pub fn output_len(self) -> usize {
        match self {
            DigestAlgorithm::Sha1 => 20,
            DigestAlgorithm::Sha256 => 32,
        }
    }

    pub fn accumulator(self) -> Accumulator {
        match self {
            DigestAlgorithm::Sha1 => Accumulator::Sha1(Sha1::new()),
            DigestAlgorithm::Sha256 => Accumulator::Sha256(Sha256::new()),
        }
    }

    /// One-shot digest of `data`.
    pub fn digest(self, data: &[u8]) -> ContentDigest {
        let mut acc = self.accumulator();
        acc.update(data);
        acc.finish()
    }

    /// Build record digests from raw identity and content bytes.
    ///
    /// The value digest hashes the identity followed by the content.
    pub fn record(self, id: &[u8], content: &[u8]) -> IdAndValueDigests {
        let mut acc = self.accumulator();
        acc.update(id);
        let id_digest = acc.finish();
        acc.update(id);
        acc.update(content);
        IdAndValueDigests::new(id_digest, acc.finish())
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigestAlgorithm::Sha1 => f.write_str("sha1"),
            DigestAlgorithm::Sha256 => f.write_str("sha256"),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = SyncError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(DigestAlgorithm::Sha1),
            "sha256" | "sha-256" => Ok(DigestAlgorithm::Sha256),
            other => Err(SyncError::Config(format!(
                "unknown digest algorithm {other:?}, expected sha1 or sha256"
            ))),
        }
    }
}

/// Accumulator for a [`DigestAlgorithm`] chosen at runtime.
#[derive(Clone)]
pub enum Accumulator {
    Sha1(Sha1),
    Sha256(Sha256),
}

impl DigestAccumulator for Accumulator {
    fn update(&mut self, bytes: &[u8]) {
        match self {
            Accumulator::Sha1(h) => DigestAccumulator::update(h, bytes),
            Accumulator::Sha256(h) => DigestAccumulator::update(h, bytes),
        }
    }

    fn finish(&mut self) -> ContentDigest {
        match self {
            Accumulator::Sha1(h) => h.finish(),
            Accumulator::Sha256(h) => h.finish(),
        }
    }
}
