//! Result sink that folds a grouping pass into a [`LevelSummary`], and
//! comparison of two summaries of the same level.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{SyncError, SyncResult};
use crate::models::{ContentDigest, GroupDigest, GroupPosition, LevelSummary};
use crate::sync::grouping::GroupSink;
use crate::sync::keys::SnapshotVersion;

/// Builds the summary of one `(snapshot, level)` pass.
///
/// The version token is read from the snapshot when the pass begins.
pub struct SummarySink<'a, V: ?Sized> {
    snapshot: &'a V,
    summary: Option<LevelSummary>,
    complete: bool,
}

impl<'a, V: SnapshotVersion + ?Sized> SummarySink<'a, V> {
    pub fn new(snapshot: &'a V) -> Self {
        Self {
            snapshot,
            summary: None,
            complete: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// The finished summary. Fails if `end` has not been called.
    pub fn into_summary(self) -> SyncResult<LevelSummary> {
        match self.summary {
            Some(summary) if self.complete => Ok(summary),
            _ => Err(SyncError::IncompleteSummary),
        }
    }
}

impl<V: SnapshotVersion + ?Sized> GroupSink for SummarySink<'_, V> {
    fn begin(&mut self, level: usize) {
        self.complete = false;
        self.summary = Some(LevelSummary {
            level,
            version_token: self.snapshot.version_token().to_string(),
            max_group_size: 0,
            groups: Vec::new(),
        });
    }

    fn group_completed(&mut self, position: &GroupPosition, digest: ContentDigest, _size: u64) {
        if let Some(summary) = self.summary.as_mut() {
            summary.groups.push(GroupDigest {
                position: position.clone(),
                digest,
            });
        }
    }

    fn end(&mut self, max_group_size: u64) {
        if let Some(summary) = self.summary.as_mut() {
            summary.max_group_size = max_group_size;
            self.complete = true;
        }
    }
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Positions at which two summaries of the same level disagree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDelta {
    /// Present on both sides with different digests.
    pub changed: Vec<GroupPosition>,
    /// Only in the local summary.
    pub local_only: Vec<GroupPosition>,
    /// Only in the remote summary.
    pub remote_only: Vec<GroupPosition>,
}

impl SummaryDelta {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.local_only.is_empty() && self.remote_only.is_empty()
    }

    /// Every differing position, in ascending byte order.
    pub fn positions(&self) -> Vec<GroupPosition> {
        let mut all: Vec<GroupPosition> = self
            .changed
            .iter()
            .chain(&self.local_only)
            .chain(&self.remote_only)
            .cloned()
            .collect();
        all.sort();
        all
    }
}

impl LevelSummary {
    /// Diff this (local) summary against a peer's summary of the same level.
    ///
    /// Output lists follow each summary's scan order.
    pub fn compare(&self, remote: &LevelSummary) -> SyncResult<SummaryDelta> {
        if self.level != remote.level {
            return Err(SyncError::LevelMismatch {
                local: self.level,
                remote: remote.level,
            });
        }
        if self.version_token != remote.version_token {
            debug!(
                local = %self.version_token,
                remote = %remote.version_token,
                "comparing summaries of different snapshots"
            );
        }

        let mut theirs: IndexMap<&GroupPosition, &ContentDigest> = remote
            .groups
            .iter()
            .map(|g| (&g.position, &g.digest))
            .collect();

        let mut delta = SummaryDelta::default();
        for group in &self.groups {
            match theirs.shift_remove(&group.position) {
                Some(digest) if digest == &group.digest => {}
                Some(_) => delta.changed.push(group.position.clone()),
                None => delta.local_only.push(group.position.clone()),
            }
        }
        delta.remote_only = theirs.into_keys().cloned().collect();
        Ok(delta)
    }

    pub fn is_in_sync_with(&self, remote: &LevelSummary) -> SyncResult<bool> {
        Ok(self.compare(remote)?.is_empty())
    }
}
