use serde::Serialize;
use std::path::PathBuf;

/// What happened to one target manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetOutcome {
    /// At least one field differed and the file was rewritten.
    Updated,
    /// Every field already matched the root; the file was not touched.
    Unchanged,
    /// Dry run: the file differs and would have been rewritten.
    WouldUpdate,
}

impl TargetOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::WouldUpdate => "would update",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetReport {
    pub path: PathBuf,
    pub outcome: TargetOutcome,
    pub changed_keys: Vec<String>,
}

/// Result of a synchronization run, targets in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub root: PathBuf,
    pub table: String,
    pub keys: Vec<String>,
    pub dry_run: bool,
    pub targets: Vec<TargetReport>,
}

impl SyncReport {
    fn count(&self, outcome: TargetOutcome) -> usize {
        self.targets.iter().filter(|t| t.outcome == outcome).count()
    }

    /// Number of files rewritten.
    pub fn updated(&self) -> usize {
        self.count(TargetOutcome::Updated)
    }

    pub fn unchanged(&self) -> usize {
        self.count(TargetOutcome::Unchanged)
    }

    pub fn pending(&self) -> usize {
        self.count(TargetOutcome::WouldUpdate)
    }

    /// True when some target was (or in a dry run, would be) out of sync.
    pub fn has_drift(&self) -> bool {
        self.targets
            .iter()
            .any(|t| t.outcome != TargetOutcome::Unchanged)
    }
}
