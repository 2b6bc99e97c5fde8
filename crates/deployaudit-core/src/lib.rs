//! # deployaudit core
//!
//! Deployment governance report for GitHub workflow runs.
//!
//! For every workflow run created inside a time window this library finds
//! the deployments the run most likely produced, checks whether their
//! environments carry protection rules, and reduces each protected
//! deployment's status history to its approvals and final outcome.
//!
//! - **Sequential I/O**: one request in flight at a time through a single
//!   rate-limited client, so the API quota needs no coordination
//! - **Explicit outcomes**: fetches return [`FetchOutcome`] (found, absent,
//!   failed) instead of signalling through errors
//! - **Partial over aborted**: every soft failure becomes a [`Diagnostic`]
//!   on the report and the walk continues
//! - **GATs** at the transport seam, so tests script the API without boxing
//!
//! Runs and deployments share no key in the API. They are paired by
//! [`ActorTimeWindow`]: same login, created less than five minutes apart.
//! Matches are therefore probabilistic.
//!
//! ## Example
//!
//! ```no_run
//! use deployaudit_core::{generate_report, AuditConfig, AuditTarget, ClientConfig, ReportWindow};
//!
//! # async fn example() -> deployaudit_core::Result<()> {
//! let window = ReportWindow::last_days(7, chrono::Utc::now())?;
//! let audit = AuditConfig::new(AuditTarget::Organization("acme".to_string()), window);
//!
//! let report = generate_report(ClientConfig::with_token("ghp_..."), &audit).await?;
//! println!("{} rows, partial: {}", report.rows.len(), report.is_partial());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod coordination;
pub mod error;
pub mod http;
pub mod output;
pub mod traits;
pub mod types;

pub use config::{parse_window_bound, AuditConfig, AuditTarget, ClientConfig, ReportWindow};
pub use coordination::{extract_approvals, ActorTimeWindow, AuditProcessor, DeploymentOutcome};
pub use error::{Error, ErrorKind, Result};
pub use http::{RateLimitedClient, ReqwestTransport};
pub use output::{OutputFormat, ReportWriter};
pub use traits::{CorrelationEngine, HttpTransport};
pub use types::{
    AuditReport, Deployment, DeploymentResolution, DeploymentState, DeploymentStatus, Diagnostic,
    DiagnosticCategory, DiagnosticSeverity, FetchOutcome, RepoRef, ReportRow, WorkflowRun,
};

/// Build a deployment report.
///
/// This is the main entry point for the library. It handles:
/// - Repository listing (organization target)
/// - Window-filtered workflow runs and their review gates
/// - Run/deployment correlation
/// - Environment protection and deployment status resolution
///
/// Only configuration errors are returned; everything that goes wrong
/// while talking to the API ends up in [`AuditReport::diagnostics`].
///
/// # Example
///
/// ```no_run
/// use deployaudit_core::{generate_report, AuditConfig, AuditTarget, ClientConfig, RepoRef, ReportWindow};
///
/// # async fn example() -> deployaudit_core::Result<()> {
/// let repo = RepoRef::parse("acme/api")?;
/// let window = ReportWindow::last_days(30, chrono::Utc::now())?;
/// let audit = AuditConfig::new(AuditTarget::Repository(repo), window);
///
/// let report = generate_report(ClientConfig::with_token("ghp_..."), &audit).await?;
/// for row in &report.rows {
///     println!("{} {} {}", row.run_id, row.final_status, row.deployment_status);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn generate_report(client_config: ClientConfig, audit: &AuditConfig) -> Result<AuditReport> {
    let client = RateLimitedClient::new(client_config)?;
    let report = run_audit(&client, audit).await;

    let quota = client.rate_limit();
    tracing::info!(
        remaining = quota.remaining,
        reset_epoch = quota.reset_epoch,
        "Rate limit at end of run"
    );
    Ok(report)
}

/// [`generate_report`] over an existing client, any transport
pub async fn run_audit<T: HttpTransport>(client: &RateLimitedClient<T>, audit: &AuditConfig) -> AuditReport {
    AuditProcessor::new(client, audit).run().await
}
