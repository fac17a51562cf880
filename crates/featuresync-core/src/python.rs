//! Python-facing wrappers over the grouping engine.

use pyo3::prelude::*;

use crate::errors::SyncResult;
use crate::models::{ContentDigest, IdAndValueDigests};
use crate::sync::accumulator::DigestAlgorithm;
use crate::sync::grouping::SortedRecords;
use crate::sync::guards::{validate_level, GroupingConfig};
use crate::sync::keys::VersionFeatures;

/// Hex digest of `data` (SHA-1 unless `algorithm` says otherwise).
#[pyfunction]
#[pyo3(signature = (data, algorithm=None))]
pub fn digest_hex(data: &[u8], algorithm: Option<&str>) -> PyResult<String> {
    let algorithm = match algorithm {
        Some(name) => name.parse::<DigestAlgorithm>()?,
        None => DigestAlgorithm::default(),
    };
    Ok(algorithm.digest(data).to_hex())
}

/// Summarize `(id_hex, value_hex)` records at `level` and return the summary
/// as JSON.
#[pyfunction]
#[pyo3(signature = (records, level, version_token, bucket="id", algorithm=None))]
pub fn group_for_level(
    py: Python<'_>,
    records: Vec<(String, String)>,
    level: i64,
    version_token: String,
    bucket: &str,
    algorithm: Option<&str>,
) -> PyResult<String> {
    let mut config = GroupingConfig::from_env()?;
    if let Some(name) = algorithm {
        config.algorithm = name.parse()?;
    }
    let level = validate_level(level, config.max_level)?;
    let provider = VersionFeatures::new(version_token, bucket.parse()?);

    let parsed = records
        .iter()
        .map(|(id, value)| -> SyncResult<IdAndValueDigests> {
            Ok(IdAndValueDigests::new(
                ContentDigest::from_hex(id)?,
                ContentDigest::from_hex(value)?,
            ))
        })
        .collect::<SyncResult<Vec<_>>>()?;

    let summary = py.allow_threads(|| {
        SortedRecords::with_config(parsed, provider, config).group_for_level(level)
    })?;
    Ok(summary.to_json()?)
}
