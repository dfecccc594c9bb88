//! Moderation engine.
//!
//! Drives a submission through its lifecycle:
//!
//! ```text
//! Pending(n) --approve--> Pending(n+1)            if n+1 < threshold
//! Pending(n) --approve--> Merged | DuplicateMerge if n+1 >= threshold
//! Pending(n) --reject---> Rejected
//! ```
//!
//! Merged records are deleted from the submission store. Rejected records stay
//! on disk, are hidden from listings and can never be merged.

use std::sync::Arc;

use crate::errors::AppError;
use crate::models::{
    ApproveOutcome, MergeOutcome, NewSubmission, SiteIndex, SubmitRequest, Submission,
};
use crate::store::{IndexStore, SubmissionStore};

/// Orchestrates submit, approve and reject across the two stores.
pub struct ModerationEngine {
    submissions: Arc<SubmissionStore>,
    index: Arc<IndexStore>,
    threshold: u32,
}

impl ModerationEngine {
    pub fn new(submissions: Arc<SubmissionStore>, index: Arc<IndexStore>, threshold: u32) -> Self {
        Self {
            submissions,
            index,
            threshold: threshold.max(1),
        }
    }

    /// Validate and store a new submission.
    pub async fn submit(&self, request: SubmitRequest) -> Result<Submission, AppError> {
        let candidate = NewSubmission::try_from(request)?;
        let record = self.submissions.create(candidate).await?;
        tracing::info!("New submission {}: {} ({})", record.id, record.name, record.url);
        Ok(record)
    }

    /// All pending submissions, oldest first.
    pub async fn list(&self) -> Result<Vec<Submission>, AppError> {
        self.submissions.list().await
    }

    pub async fn get(&self, id: &str) -> Result<Submission, AppError> {
        self.submissions.get(id).await
    }

    /// Record one approval vote.
    ///
    /// The whole sequence runs under the submission's lock. When the threshold
    /// is reached the index is written before the record is deleted, so a
    /// storage failure can leave a pending record behind but never lose one.
    pub async fn approve(&self, id: &str) -> Result<ApproveOutcome, AppError> {
        let guard = self.submissions.lock(id).await?;
        let mut record = guard.load().await?;

        if record.rejected {
            return Err(AppError::Rejected(format!(
                "Submission {} has been rejected",
                guard.id()
            )));
        }

        record.approvals += 1;

        if record.approvals < self.threshold {
            guard.save(&record).await?;
            tracing::info!(
                "Approval {}/{} for {} ({})",
                record.approvals,
                self.threshold,
                record.id,
                record.url
            );
            return Ok(ApproveOutcome::Pending {
                approvals: record.approvals,
                threshold: self.threshold,
            });
        }

        let outcome = self.index.merge(record.to_site()).await?;
        tracing::info!(
            "Submission {} reached {} approvals: {:?}",
            record.id,
            record.approvals,
            outcome
        );

        Ok(settle_merge(outcome, guard.remove().await, &record.id))
    }

    /// Mark a submission as rejected. Rejecting twice is harmless.
    pub async fn reject(&self, id: &str) -> Result<Submission, AppError> {
        let record = self
            .submissions
            .update(id, |record| {
                record.rejected = true;
                Ok(())
            })
            .await?;
        tracing::info!("Rejected submission {} ({})", record.id, record.url);
        Ok(record)
    }

    /// A copy of the canonical index document.
    pub async fn index(&self) -> SiteIndex {
        self.index.snapshot().await
    }

    pub async fn index_version(&self) -> u64 {
        self.index.version().await
    }
}

/// The index already reflects `outcome`, so a failed cleanup of the pending
/// record does not change what the voter is told. The leftover record resolves
/// as a duplicate merge on its next vote.
fn settle_merge(
    outcome: MergeOutcome,
    removal: Result<(), AppError>,
    id: &str,
) -> ApproveOutcome {
    if let Err(e) = removal {
        tracing::error!("Merged submission {} but failed to delete its record: {}", id, e);
    }
    outcome.into()
}
