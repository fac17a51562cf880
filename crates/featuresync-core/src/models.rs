//! Shared typed models used by the grouping engine and its result sinks.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::SyncResult;

// ---------------------------------------------------------------------------
// 1. ContentDigest
// ---------------------------------------------------------------------------

/// A fixed-length digest produced by a [`DigestAccumulator`].
///
/// Ordering is lexicographic over the raw bytes, which is the order the
/// grouping engine buckets records in.
///
/// [`DigestAccumulator`]: crate::sync::accumulator::DigestAccumulator
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentDigest(Box<[u8]>);

impl ContentDigest {
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }

    /// Parse a digest from its hex rendering (either case).
    pub fn from_hex(value: &str) -> SyncResult<Self> {
        Ok(Self(hex::decode(value.trim())?.into_boxed_slice()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy the leading bytes of the digest into `out`.
    ///
    /// Copies `min(out.len(), self.len())` bytes and returns that count.
    pub fn copy_prefix(&self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.0.len());
        out[..n].copy_from_slice(&self.0[..n]);
        n
    }

    /// True when the first `position.len()` bytes equal the position bytes.
    pub fn has_prefix(&self, position: &GroupPosition) -> bool {
        self.0.get(..position.len()) == Some(position.as_bytes())
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl From<Vec<u8>> for ContentDigest {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into_boxed_slice())
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw).map_err(D::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// 2. GroupPosition
// ---------------------------------------------------------------------------

/// The bucket-key prefix shared by every record of one group.
///
/// Its length is fixed when it is created; the bytes change only through
/// [`GroupPosition::set_from_digest`]. The empty position identifies the
/// single group of a level-0 pass.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupPosition(Vec<u8>);

impl GroupPosition {
    /// A zeroed position of `len` bytes.
    pub fn with_len(len: usize) -> Self {
        Self(vec![0; len])
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn from_hex(value: &str) -> SyncResult<Self> {
        Ok(Self(hex::decode(value.trim())?))
    }

    /// Overwrite the position with the leading bytes of `digest`.
    ///
    /// A digest shorter than the position truncates it to the digest length.
    pub fn set_from_digest(&mut self, digest: &ContentDigest) {
        let copied = digest.copy_prefix(&mut self.0);
        self.0.truncate(copied);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for GroupPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for GroupPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupPosition({})", self.to_hex())
    }
}

impl Serialize for GroupPosition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for GroupPosition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw).map_err(D::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// 3. IdAndValueDigests
// ---------------------------------------------------------------------------

/// A record reduced to the two digests the grouping engine works with.
///
/// `id` identifies the record and is stable across edits. `value` covers the
/// whole record (identity included), so two records that swap contents still
/// produce different payloads.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdAndValueDigests {
    pub id: ContentDigest,
    pub value: ContentDigest,
}

impl IdAndValueDigests {
    pub fn new(id: ContentDigest, value: ContentDigest) -> Self {
        Self { id, value }
    }
}

// ---------------------------------------------------------------------------
// 4. LevelSummary
// ---------------------------------------------------------------------------

/// One emitted group: its position and aggregate digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDigest {
    pub position: GroupPosition,
    pub digest: ContentDigest,
}

/// The digest summary of one dataset snapshot at one level.
///
/// `groups` is in scan order, which is ascending bucket-key order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSummary {
    pub level: usize,
    pub version_token: String,
    pub max_group_size: u64,
    pub groups: Vec<GroupDigest>,
}

impl LevelSummary {
    pub fn to_json(&self) -> SyncResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(payload: &str) -> SyncResult<Self> {
        Ok(serde_json::from_str(payload)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_prefix_clamps_to_digest_length() {
        let digest = ContentDigest::from_slice(&[0xab, 0xcd]);
        let mut out = [0u8; 4];
        assert_eq!(digest.copy_prefix(&mut out), 2);
        assert_eq!(out, [0xab, 0xcd, 0, 0]);

        let mut short = [0u8; 1];
        assert_eq!(digest.copy_prefix(&mut short), 1);
        assert_eq!(short, [0xab]);
    }

    #[test]
    fn test_has_prefix() {
        let digest = ContentDigest::from_slice(&[0x10, 0x20, 0x30]);
        let mut position = GroupPosition::with_len(2);
        position.set_from_digest(&digest);
        assert!(digest.has_prefix(&position));
        assert!(digest.has_prefix(&GroupPosition::empty()));

        let other = ContentDigest::from_slice(&[0x10, 0x21, 0x30]);
        assert!(!other.has_prefix(&position));

        // Too short to carry the whole prefix.
        let short = ContentDigest::from_slice(&[0x10]);
        assert!(!short.has_prefix(&position));
    }

    #[test]
    fn test_set_from_short_digest_truncates() {
        let mut position = GroupPosition::with_len(4);
        position.set_from_digest(&ContentDigest::from_slice(&[0x01, 0x02]));
        assert_eq!(position.as_bytes(), &[0x01, 0x02]);
    }

    #[test]
    fn test_hex_is_lowercase() {
        let digest = ContentDigest::from_hex("BA5A86A5").unwrap();
        assert_eq!(digest.to_hex(), "ba5a86a5");
        assert_eq!(digest.to_string(), "ba5a86a5");
        assert!(ContentDigest::from_hex("xyz").is_err());
    }

    #[test]
    fn test_digest_order_is_bytewise() {
        let a = ContentDigest::from_slice(&[0x0f, 0xff]);
        let b = ContentDigest::from_slice(&[0x10, 0x00]);
        assert!(a < b);
    }

    #[test]
    fn test_summary_json_shape() {
        let summary = LevelSummary {
            level: 1,
            version_token: "v1".to_string(),
            max_group_size: 2,
            groups: vec![GroupDigest {
                position: GroupPosition::from_hex("10").unwrap(),
                digest: ContentDigest::from_slice(&[0xde, 0xad]),
            }],
        };
        let json = summary.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"level":1,"versionToken":"v1","maxGroupSize":2,"groups":[{"position":"10","digest":"dead"}]}"#
        );
        assert_eq!(LevelSummary::from_json(&json).unwrap(), summary);
    }

    #[test]
    fn test_summary_from_json_rejects_bad_hex() {
        let json = r#"{"level":0,"versionToken":"v","maxGroupSize":1,"groups":[{"position":"","digest":"zz"}]}"#;
        assert!(LevelSummary::from_json(json).is_err());
    }
}
