//! Outcomes of moderation and merge operations.

use serde::Serialize;

/// Result of a merge attempt against the canonical index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The site was appended; carries the new index version.
    Merged { version: u64 },
    /// The url was already listed; the index is unchanged.
    DuplicateMerge { version: u64 },
}

/// Result of a single approval vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApproveOutcome {
    /// Vote recorded; the submission is still below the threshold.
    Pending { approvals: u32, threshold: u32 },
    /// Threshold reached and the site was added to the index.
    Merged { version: u64 },
    /// Threshold reached but the url was already in the index.
    DuplicateMerge { version: u64 },
}

impl From<MergeOutcome> for ApproveOutcome {
    fn from(outcome: MergeOutcome) -> Self {
        match outcome {
            MergeOutcome::Merged { version } => ApproveOutcome::Merged { version },
            MergeOutcome::DuplicateMerge { version } => ApproveOutcome::DuplicateMerge { version },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serialization() {
        let pending = serde_json::to_value(ApproveOutcome::Pending {
            approvals: 2,
            threshold: 3,
        })
        .unwrap();
        assert_eq!(
            pending,
            serde_json::json!({ "status": "pending", "approvals": 2, "threshold": 3 })
        );

        let dup = serde_json::to_value(ApproveOutcome::from(MergeOutcome::DuplicateMerge {
            version: 7,
        }))
        .unwrap();
        assert_eq!(
            dup,
            serde_json::json!({ "status": "duplicate_merge", "version": 7 })
        );
    }
}
