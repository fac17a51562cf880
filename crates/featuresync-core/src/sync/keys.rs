//! Bucket key providers: which digest places a record in a group, and which
//! digest is hashed into the group's aggregate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::SyncError;
use crate::models::{ContentDigest, IdAndValueDigests};

/// Label of the dataset snapshot a summary is computed over.
pub trait SnapshotVersion {
    fn version_token(&self) -> &str;
}

/// Supplies, per record, the digests the grouping engine orders and hashes.
///
/// Implementations must be pure: the same record always yields the same
/// digests for the lifetime of a grouping pass.
pub trait BucketKeyProvider<R>: SnapshotVersion {
    /// Digest whose prefix decides group membership.
    fn bucket_prefix_digest<'r>(&self, record: &'r R) -> &'r ContentDigest;

    /// Digest fed into the running group digest. May be the bucket digest.
    fn payload_digest<'r>(&self, record: &'r R) -> &'r ContentDigest;
}

impl<P: SnapshotVersion + ?Sized> SnapshotVersion for &P {
    fn version_token(&self) -> &str {
        (**self).version_token()
    }
}

impl<R, P: BucketKeyProvider<R> + ?Sized> BucketKeyProvider<R> for &P {
    fn bucket_prefix_digest<'r>(&self, record: &'r R) -> &'r ContentDigest {
        (**self).bucket_prefix_digest(record)
    }

    fn payload_digest<'r>(&self, record: &'r R) -> &'r ContentDigest {
        (**self).payload_digest(record)
    }
}

/// Which digest of an [`IdAndValueDigests`] buckets the record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketBy {
    /// Bucket on the identity digest; edits keep a record in its group.
    #[default]
    Id,
    /// Bucket on the value digest; every edit moves the record.
    Value,
}

impl fmt::Display for BucketBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketBy::Id => f.write_str("id"),
            BucketBy::Value => f.write_str("value"),
        }
    }
}

impl FromStr for BucketBy {
    type Err = SyncError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "id" => Ok(BucketBy::Id),
            "value" => Ok(BucketBy::Value),
            other => Err(SyncError::Config(format!(
                "unknown bucket key {other:?}, expected id or value"
            ))),
        }
    }
}

/// Provider for [`IdAndValueDigests`] records of one dataset version.
///
/// The payload is always the value digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionFeatures {
    token: String,
    bucket_by: BucketBy,
}

impl VersionFeatures {
    pub fn new(token: impl Into<String>, bucket_by: BucketBy) -> Self {
        Self {
            token: token.into(),
            bucket_by,
        }
    }

    pub fn by_id(token: impl Into<String>) -> Self {
        Self::new(token, BucketBy::Id)
    }

    pub fn by_value(token: impl Into<String>) -> Self {
        Self::new(token, BucketBy::Value)
    }

    pub fn bucket_by(&self) -> BucketBy {
        self.bucket_by
    }
}

impl SnapshotVersion for VersionFeatures {
    fn version_token(&self) -> &str {
        &self.token
    }
}

impl BucketKeyProvider<IdAndValueDigests> for VersionFeatures {
    fn bucket_prefix_digest<'r>(&self, record: &'r IdAndValueDigests) -> &'r ContentDigest {
        match self.bucket_by {
            BucketBy::Id => &record.id,
            BucketBy::Value => &record.value,
        }
    }

    fn payload_digest<'r>(&self, record: &'r IdAndValueDigests) -> &'r ContentDigest {
        &record.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> IdAndValueDigests {
        IdAndValueDigests::new(
            ContentDigest::from_slice(&[0x01]),
            ContentDigest::from_slice(&[0x02]),
        )
    }

    #[test]
    fn test_bucket_by_id() {
        let keys = VersionFeatures::by_id("v7");
        let r = record();
        assert_eq!(keys.bucket_prefix_digest(&r).as_bytes(), &[0x01]);
        assert_eq!(keys.payload_digest(&r).as_bytes(), &[0x02]);
        assert_eq!(keys.version_token(), "v7");
    }

    #[test]
    fn test_bucket_by_value() {
        let keys = VersionFeatures::by_value("v7");
        let r = record();
        assert_eq!(keys.bucket_prefix_digest(&r).as_bytes(), &[0x02]);
        assert_eq!(keys.payload_digest(&r).as_bytes(), &[0x02]);
    }

    #[test]
    fn test_provider_by_reference() {
        let keys = VersionFeatures::by_value("snap");
        let borrowed = &keys;
        let r = record();
        assert_eq!(borrowed.version_token(), "snap");
        assert_eq!(
            BucketKeyProvider::bucket_prefix_digest(&borrowed, &r).as_bytes(),
            &[0x02]
        );
    }

    #[test]
    fn test_parse_bucket_by() {
        assert_eq!(" ID ".parse::<BucketBy>().unwrap(), BucketBy::Id);
        assert_eq!("value".parse::<BucketBy>().unwrap(), BucketBy::Value);
        assert!("hash".parse::<BucketBy>().is_err());
    }

    #[test]
    fn test_bucket_by_display_matches_parse_and_serde() {
        for bucket in [BucketBy::Id, BucketBy::Value] {
            let name = bucket.to_string();
            assert_eq!(name.parse::<BucketBy>().unwrap(), bucket);
            assert_eq!(serde_json::to_string(&bucket).unwrap(), format!("\"{name}\""));
        }
        assert_eq!(VersionFeatures::by_value("v").bucket_by().to_string(), "value");
    }
}
