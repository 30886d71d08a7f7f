//! Review status classification

use crate::model::{PullRequest, ReviewStatus};

/// Label marking a PR as reviewed
pub const REVIEWED_LABEL: &str = "reviewed";

/// Label marking a PR as waiting on a reviewer
pub const REVIEW_REQUESTED_LABEL: &str = "review requested";

/// Derive the review status of a grid cell from its matched PR, if any
///
/// `reviewed` wins over `review requested` when both labels are present.
pub fn classify(pr: Option<&PullRequest>) -> ReviewStatus {
    match pr {
        None => ReviewStatus::Missing,
        Some(pr) if pr.has_label(REVIEWED_LABEL) => ReviewStatus::Reviewed,
        Some(pr) if pr.has_label(REVIEW_REQUESTED_LABEL) => ReviewStatus::Requested,
        Some(_) => ReviewStatus::Unreviewed,
    }
}
