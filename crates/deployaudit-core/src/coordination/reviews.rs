//! Run-level review gate summary

use crate::http::RateLimitedClient;
use crate::traits::HttpTransport;
use crate::types::{Diagnostic, DiagnosticCategory, FetchOutcome, RepoRef, RunReview};
use tracing::{debug, warn};

/// Separator between approver logins in the report column
pub const APPROVER_SEPARATOR: &str = ", ";

/// Separator between approval comments in the report column
pub const COMMENT_SEPARATOR: &str = " | ";

/// Approvers and comments of one run's reviews
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewSummary {
    /// Distinct approver logins, first-seen order
    pub approvers: Vec<String>,
    /// Non-empty comments of approving reviews
    pub comments: Vec<String>,
    /// Review records seen, approved or not
    pub review_count: usize,
}

impl ReviewSummary {
    /// Reduce review records to approvers and comments
    pub fn from_reviews(reviews: &[RunReview]) -> Self {
        let mut summary = Self {
            review_count: reviews.len(),
            ..Default::default()
        };

        for review in reviews.iter().filter(|r| r.is_approved()) {
            if let Some(login) = review.user.as_deref() {
                if !summary.approvers.iter().any(|a| a == login) {
                    summary.approvers.push(login.to_string());
                }
            }
            if let Some(comment) = review.comment.as_deref() {
                if !comment.trim().is_empty() {
                    summary.comments.push(comment.to_string());
                }
            }
        }

        summary
    }

    /// `Deployment Approved By` column
    pub fn approved_by(&self) -> String {
        self.approvers.join(APPROVER_SEPARATOR)
    }

    /// `Approval Comment` column
    pub fn approval_comment(&self) -> String {
        self.comments.join(COMMENT_SEPARATOR)
    }

    /// Reviews exist but none approved the run
    #[inline]
    pub fn lacks_approval(&self) -> bool {
        self.review_count > 0 && self.approvers.is_empty()
    }
}

/// Fetches and summarizes a run's review records
pub struct RunReviewFetcher<'a, T: HttpTransport> {
    client: &'a RateLimitedClient<T>,
}

impl<'a, T: HttpTransport> RunReviewFetcher<'a, T> {
    /// Create a fetcher over the shared client
    pub fn new(client: &'a RateLimitedClient<T>) -> Self {
        Self { client }
    }

    /// Summary of `run_id`'s reviews.
    ///
    /// A 404 means the run had no review gate and yields an empty summary.
    /// A failed fetch also yields an empty summary, plus a diagnostic.
    pub async fn fetch_summary(
        &self,
        repo: &RepoRef,
        run_id: u64,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ReviewSummary {
        let reviews = match self.client.list_run_reviews(repo, run_id).await {
            FetchOutcome::Found(reviews) => reviews,
            FetchOutcome::Absent => {
                debug!(repository = %repo, run_id, "No review gate");
                return ReviewSummary::default();
            }
            FetchOutcome::Failed(e) => {
                warn!(repository = %repo, run_id, error = %e, "Could not fetch run reviews");
                diagnostics.push(Diagnostic::soft_error(
                    DiagnosticCategory::RunReviews,
                    format!("{} run {}: reviews unavailable: {}", repo, run_id, e),
                ));
                return ReviewSummary::default();
            }
        };

        let summary = ReviewSummary::from_reviews(&reviews);
        if summary.lacks_approval() {
            warn!(
                repository = %repo,
                run_id,
                reviews = summary.review_count,
                "Run has reviews but none approved"
            );
            diagnostics.push(Diagnostic::warning(
                DiagnosticCategory::ReviewsWithoutApproval,
                format!(
                    "{} run {}: {} review(s), none approved",
                    repo, run_id, summary.review_count
                ),
            ));
        }
        summary
    }
}
