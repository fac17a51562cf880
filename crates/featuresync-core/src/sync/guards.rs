//! Level bounds and grouping configuration.

use serde::{Deserialize, Serialize};

use crate::errors::{SyncError, SyncResult};
use crate::sync::accumulator::DigestAlgorithm;

/// Deepest level a pass runs at by default. Deeper requests run at this
/// level; it is past every supported digest length.
pub const DEFAULT_MAX_LEVEL: usize = 64;
pub const DEFAULT_PARALLEL_SORT_THRESHOLD: usize = 16_384;

pub const ENV_MAX_LEVEL: &str = "FEATURESYNC_MAX_LEVEL";
pub const ENV_PARALLEL_SORT_THRESHOLD: &str = "FEATURESYNC_PARALLEL_SORT_THRESHOLD";
pub const ENV_DIGEST: &str = "FEATURESYNC_DIGEST";

/// Number of prefix bytes compared at `level` for a digest of `digest_len`.
pub fn prefix_len(level: usize, digest_len: usize) -> usize {
    level.min(digest_len)
}

/// Accept a signed level from an outer surface. Only negative levels fail;
/// the result is clamped with [`clamp_level`].
pub fn validate_level(level: i64, max_level: usize) -> SyncResult<usize> {
    let level = usize::try_from(level).map_err(|_| SyncError::InvalidLevel { level })?;
    Ok(clamp_level(level, max_level))
}

/// Level a pass actually runs at.
pub fn clamp_level(level: usize, max_level: usize) -> usize {
    level.min(max_level)
}

/// Tuning for grouping passes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GroupingConfig {
    pub max_level: usize,
    pub parallel_sort_threshold: usize,
    pub algorithm: DigestAlgorithm,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            max_level: DEFAULT_MAX_LEVEL,
            parallel_sort_threshold: DEFAULT_PARALLEL_SORT_THRESHOLD,
            algorithm: DigestAlgorithm::default(),
        }
    }
}

impl GroupingConfig {
    /// Defaults overridden by `FEATURESYNC_*` environment variables.
    pub fn from_env() -> SyncResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> SyncResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = non_empty(lookup(ENV_MAX_LEVEL)) {
            config.max_level = parse_usize(ENV_MAX_LEVEL, &value)?;
        }
        if let Some(value) = non_empty(lookup(ENV_PARALLEL_SORT_THRESHOLD)) {
            config.parallel_sort_threshold = parse_usize(ENV_PARALLEL_SORT_THRESHOLD, &value)?;
        }
        if let Some(value) = non_empty(lookup(ENV_DIGEST)) {
            config.algorithm = value.parse()?;
        }
        Ok(config)
    }

    pub fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_parallel_sort_threshold(mut self, threshold: usize) -> Self {
        self.parallel_sort_threshold = threshold;
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_usize(name: &str, value: &str) -> SyncResult<usize> {
    value
        .parse()
        .map_err(|e| SyncError::Config(format!("{name}={value:?}: {e}")))
}
