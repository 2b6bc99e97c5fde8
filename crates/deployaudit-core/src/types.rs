//! Core type definitions for the audit pipeline

use crate::error::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt;

/// Parse a GitHub ISO 8601 timestamp into UTC
#[inline]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Render a timestamp the way GitHub does (`2024-01-01T00:00:00Z`)
#[inline]
pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

/// Repository identifier (`owner/name`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    /// Owning user or organization
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepoRef {
    /// Parse `owner/name`
    pub fn parse(full_name: &str) -> Result<Self> {
        let mut parts = full_name.trim().splitn(2, '/');
        match (parts.next(), parts.next()) {
            (Some(owner), Some(name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(Error::InvalidRepository(full_name.to_string())),
        }
    }

    /// Accept `name` or `owner/name`; bare names are qualified with `org`
    pub fn qualify(org: Option<&str>, repository: &str) -> Result<Self> {
        if repository.contains('/') {
            return Self::parse(repository);
        }
        match org {
            Some(org) if !org.is_empty() => Self::parse(&format!("{}/{}", org, repository)),
            _ => Err(Error::InvalidRepository(format!(
                "{} (no organization to qualify it with)",
                repository
            ))),
        }
    }

    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// One CI invocation
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowRun {
    /// Run ID
    pub id: u64,
    /// Workflow name
    pub name: String,
    /// Login of the triggering actor
    pub actor: Option<String>,
    /// Creation time
    pub created_at: Option<DateTime<Utc>>,
    /// Lifecycle status (`queued`, `in_progress`, `completed`, ...)
    pub status: Option<String>,
    /// Conclusion once completed (`success`, `failure`, ...)
    pub conclusion: Option<String>,
}

impl WorkflowRun {
    /// Conclusion if the run finished, otherwise its current status
    pub fn terminal_status(&self) -> &str {
        self.conclusion
            .as_deref()
            .or(self.status.as_deref())
            .unwrap_or("")
    }
}

/// A recorded release to a named environment
#[derive(Debug, Clone, PartialEq)]
pub struct Deployment {
    /// Deployment ID
    pub id: u64,
    /// Login of the creator
    pub creator: Option<String>,
    /// Creation time
    pub created_at: Option<DateTime<Utc>>,
    /// Target environment name
    pub environment: Option<String>,
}

/// Deployment status state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentState {
    /// Reviewer approved a gated deployment
    Approved,
    /// Deployed successfully
    Success,
    /// Deployment failed
    Failure,
    /// Superseded by a newer deployment
    Inactive,
    /// Deployment errored
    Error,
    /// Created, not started
    Pending,
    /// Queued for a runner
    Queued,
    /// Running
    InProgress,
    /// Waiting on a protection rule
    Waiting,
    /// Any state this crate does not know about, kept verbatim
    Other(String),
}

impl DeploymentState {
    /// Parse from the API string. Case-sensitive; unknown values are preserved.
    pub fn parse(s: &str) -> Self {
        match s {
            "approved" => Self::Approved,
            "success" => Self::Success,
            "failure" => Self::Failure,
            "inactive" => Self::Inactive,
            "error" => Self::Error,
            "pending" => Self::Pending,
            "queued" => Self::Queued,
            "in_progress" => Self::InProgress,
            "waiting" => Self::Waiting,
            other => Self::Other(other.to_string()),
        }
    }

    /// API string representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::Approved => "approved",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Inactive => "inactive",
            Self::Error => "error",
            Self::Pending => "pending",
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Waiting => "waiting",
            Self::Other(s) => s,
        }
    }

    /// Concluded outcome: `success`, `failure`, `inactive` or `error`
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Failure | Self::Inactive | Self::Error
        )
    }
}

/// One entry of a deployment's status history
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentStatus {
    /// State
    pub state: DeploymentState,
    /// Login of whoever recorded the status
    pub creator: Option<String>,
    /// When it was recorded
    pub created_at: Option<DateTime<Utc>>,
}

/// An `approved` status projected to who and when
#[derive(Debug, Clone, PartialEq)]
pub struct Approval {
    /// Approver login
    pub approver: Option<String>,
    /// Approval time
    pub approved_at: Option<DateTime<Utc>>,
}

/// Kind of environment protection rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtectionRuleKind {
    /// Named reviewers must approve
    RequiredReviewers,
    /// Fixed delay before deploying
    WaitTimer,
    /// Only selected branches may deploy
    BranchPolicy,
    /// Custom or future rule types
    Other(String),
}

impl ProtectionRuleKind {
    /// Parse the rule `type` field
    pub fn parse(s: &str) -> Self {
        match s {
            "required_reviewers" => Self::RequiredReviewers,
            "wait_timer" => Self::WaitTimer,
            "branch_policy" => Self::BranchPolicy,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A configured environment protection rule
#[derive(Debug, Clone, PartialEq)]
pub struct ProtectionRule {
    /// Rule ID
    pub id: Option<u64>,
    /// Rule kind
    pub kind: ProtectionRuleKind,
}

/// Deployment target configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    /// Environment name
    pub name: String,
    /// Protection rules in API order
    pub protection_rules: Vec<ProtectionRule>,
}

impl Environment {
    /// Any rule of any kind counts as protection
    #[inline]
    pub fn has_protection(&self) -> bool {
        !self.protection_rules.is_empty()
    }
}

/// Review record attached to a workflow run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReview {
    /// Review state (`approved`, `rejected`, ...)
    pub state: String,
    /// Reviewer login
    pub user: Option<String>,
    /// Reviewer comment
    pub comment: Option<String>,
}

impl RunReview {
    /// Whether this review approved the run
    #[inline]
    pub fn is_approved(&self) -> bool {
        self.state == "approved"
    }
}

/// Result of a fetch that may legitimately find nothing.
///
/// Distinguishes "the entity is absent" from "the entity could not be
/// reached", so callers never have to infer either from an error type.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    /// Data was retrieved
    Found(T),
    /// The resource does not exist (404)
    Absent,
    /// The resource could not be retrieved or decoded
    Failed(Error),
}

impl<T> FetchOutcome<T> {
    /// Transform the found value
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FetchOutcome<U> {
        match self {
            Self::Found(v) => FetchOutcome::Found(f(v)),
            Self::Absent => FetchOutcome::Absent,
            Self::Failed(e) => FetchOutcome::Failed(e),
        }
    }

    /// Transform the found value with a fallible function
    pub fn and_then<U, F: FnOnce(T) -> Result<U>>(self, f: F) -> FetchOutcome<U> {
        match self {
            Self::Found(v) => match f(v) {
                Ok(u) => FetchOutcome::Found(u),
                Err(e) => FetchOutcome::Failed(e),
            },
            Self::Absent => FetchOutcome::Absent,
            Self::Failed(e) => FetchOutcome::Failed(e),
        }
    }

    /// The found value, if any
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(v) => Some(v),
            _ => None,
        }
    }

    /// Whether the fetch failed (as opposed to finding nothing)
    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl<T: Default> FetchOutcome<T> {
    /// Found value, or the default for `Absent`; errors are handed back
    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Found(v) => Ok(v),
            Self::Absent => Ok(T::default()),
            Self::Failed(e) => Err(e),
        }
    }
}

/// How a row's deployment status was (or was not) resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentResolution {
    /// The run matched no deployment
    NoDeployment,
    /// The deployment named no environment
    NoEnvironment,
    /// The environment has no protection rules
    Unprotected,
    /// Status history was fetched and reduced to a final status
    Resolved,
    /// Environment or status history could not be fetched
    Unresolved,
}

/// One flat report line: a workflow run and at most one matched deployment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    /// `owner/name` the run belongs to
    pub repository: String,
    /// Workflow run ID
    pub run_id: u64,
    /// Workflow name
    pub workflow_name: String,
    /// Triggering actor login
    pub triggered_by: String,
    /// Run creation time
    pub triggered_at: String,
    /// Run-review approvers, comma-joined
    pub approved_by: String,
    /// Run-review approval comments, pipe-joined
    pub approval_comment: String,
    /// Run conclusion (or status while running)
    pub final_status: String,
    /// Final deployment status, empty when unprotected or unresolved
    pub deployment_status: String,
    /// Matched deployment
    pub deployment_id: Option<u64>,
    /// Matched deployment's environment
    pub environment: Option<String>,
    /// Approvers recorded on the deployment's status history
    pub deployment_approvers: Vec<String>,
    /// How `deployment_status` was obtained
    pub deployment_resolution: DeploymentResolution,
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSeverity {
    /// Informational, the report is complete
    Warning,
    /// Data was skipped, the report is partial
    SoftError,
}

/// Which fetch or check produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCategory {
    /// Organization repository listing
    Repositories,
    /// Workflow run listing
    WorkflowRuns,
    /// Deployment listing
    Deployments,
    /// Environment configuration lookup
    Environment,
    /// Deployment status history
    DeploymentStatuses,
    /// Run review lookup
    RunReviews,
    /// Reviews exist but none approved the run
    ReviewsWithoutApproval,
}

/// Non-fatal event recorded while building the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Severity
    pub severity: DiagnosticSeverity,
    /// Category
    pub category: DiagnosticCategory,
    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    /// Data was skipped because a fetch failed
    pub fn soft_error(category: DiagnosticCategory, message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::SoftError,
            category,
            message: message.into(),
        }
    }

    /// Something looked inconsistent but nothing was skipped
    pub fn warning(category: DiagnosticCategory, message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            category,
            message: message.into(),
        }
    }
}

/// Everything produced by one report run
#[derive(Debug, Default, Clone, Serialize)]
pub struct AuditReport {
    /// Report rows in source page order
    pub rows: Vec<ReportRow>,
    /// Soft failures and inconsistencies
    pub diagnostics: Vec<Diagnostic>,
    /// Repositories visited
    pub repositories_scanned: usize,
}

impl AuditReport {
    /// Whether any data was skipped
    pub fn is_partial(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::SoftError)
    }
}

/// Last rate-limit headers observed by the client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    /// `x-ratelimit-remaining`
    pub remaining: Option<u32>,
    /// `x-ratelimit-reset` (epoch seconds)
    pub reset_epoch: Option<u64>,
}
