//! Audit pipeline coordinator
//!
//! Walks repositories, runs and matched deployments strictly in source
//! order, one request at a time. Every fetch failure is contained here:
//! it becomes a diagnostic and the walk continues with the next entity.

use crate::config::{AuditConfig, AuditTarget};
use crate::coordination::assembler::ReportAssembler;
use crate::coordination::correlation::ActorTimeWindow;
use crate::coordination::reviews::RunReviewFetcher;
use crate::http::RateLimitedClient;
use crate::traits::{CorrelationEngine, HttpTransport};
use crate::types::{
    AuditReport, Deployment, Diagnostic, DiagnosticCategory, FetchOutcome, RepoRef,
};
use tracing::{debug, info, warn};

/// Drives one report run over an organization or a single repository
pub struct AuditProcessor<'a, T: HttpTransport, C = ActorTimeWindow> {
    client: &'a RateLimitedClient<T>,
    config: &'a AuditConfig,
    engine: C,
}

impl<'a, T: HttpTransport> AuditProcessor<'a, T, ActorTimeWindow> {
    /// Processor using the actor/time heuristic with the configured window
    pub fn new(client: &'a RateLimitedClient<T>, config: &'a AuditConfig) -> Self {
        Self::with_engine(client, config, ActorTimeWindow::new(config.match_window))
    }
}

impl<'a, T: HttpTransport, C: CorrelationEngine> AuditProcessor<'a, T, C> {
    /// Processor with a custom correlation policy
    pub fn with_engine(client: &'a RateLimitedClient<T>, config: &'a AuditConfig, engine: C) -> Self {
        Self {
            client,
            config,
            engine,
        }
    }

    /// Run the whole audit. Never fails: unreachable data is reported as
    /// diagnostics and the report is returned partial.
    pub async fn run(&self) -> AuditReport {
        let mut report = AuditReport::default();

        let repositories = match &self.config.target {
            AuditTarget::Repository(repo) => vec![repo.clone()],
            AuditTarget::Organization(org) => match self.client.list_org_repos(org).await {
                FetchOutcome::Found(repos) => repos,
                FetchOutcome::Absent => {
                    warn!(org = %org, "Organization not found");
                    report.diagnostics.push(Diagnostic::soft_error(
                        DiagnosticCategory::Repositories,
                        format!("organization {} not found", org),
                    ));
                    Vec::new()
                }
                FetchOutcome::Failed(e) => {
                    warn!(org = %org, error = %e, "Could not list repositories");
                    report.diagnostics.push(Diagnostic::soft_error(
                        DiagnosticCategory::Repositories,
                        format!("organization {}: {}", org, e),
                    ));
                    Vec::new()
                }
            },
        };

        let total = repositories.len();
        info!(
            repositories = total,
            start = %self.config.window.start,
            end = %self.config.window.end,
            "Starting audit"
        );

        for (i, repo) in repositories.iter().enumerate() {
            info!(repository = %repo, "Repository {}/{}", i + 1, total);
            self.audit_repository(repo, &mut report).await;
            report.repositories_scanned += 1;
        }

        info!(
            rows = report.rows.len(),
            diagnostics = report.diagnostics.len(),
            "Audit finished"
        );
        report
    }

    /// Append the rows of one repository to `report`
    pub async fn audit_repository(&self, repo: &RepoRef, report: &mut AuditReport) {
        let runs = match self.client.list_workflow_runs(repo, &self.config.window).await {
            FetchOutcome::Found(runs) => runs,
            FetchOutcome::Absent => {
                debug!(repository = %repo, "No workflow runs endpoint");
                Vec::new()
            }
            FetchOutcome::Failed(e) => {
                warn!(repository = %repo, error = %e, "Could not list workflow runs");
                report.diagnostics.push(Diagnostic::soft_error(
                    DiagnosticCategory::WorkflowRuns,
                    format!("{}: {}", repo, e),
                ));
                return;
            }
        };

        if runs.is_empty() {
            info!(repository = %repo, "No workflow runs in window");
            return;
        }

        let deployments = self.fetch_deployments(repo, report).await;
        info!(
            repository = %repo,
            runs = runs.len(),
            deployments = deployments.len(),
            "Fetched runs and deployments"
        );

        let reviews = RunReviewFetcher::new(self.client);
        let mut assembler = ReportAssembler::new(self.client);

        for run in &runs {
            let summary = reviews
                .fetch_summary(repo, run.id, &mut report.diagnostics)
                .await;
            let matched = self.engine.correlate(run, &deployments);
            debug!(
                repository = %repo,
                run_id = run.id,
                matched = matched.len(),
                "Correlated run"
            );
            let rows = assembler
                .assemble(repo, run, &summary, &matched, &mut report.diagnostics)
                .await;
            report.rows.extend(rows);
        }
    }

    async fn fetch_deployments(&self, repo: &RepoRef, report: &mut AuditReport) -> Vec<Deployment> {
        let deployments = match self.client.list_deployments(repo).await {
            FetchOutcome::Found(deployments) => deployments,
            FetchOutcome::Absent => Vec::new(),
            FetchOutcome::Failed(e) => {
                warn!(repository = %repo, error = %e, "Could not list deployments");
                report.diagnostics.push(Diagnostic::soft_error(
                    DiagnosticCategory::Deployments,
                    format!("{}: {}", repo, e),
                ));
                Vec::new()
            }
        };

        if !self.config.bound_deployments_to_window {
            return deployments;
        }

        let reachable = self.config.window.widened(self.config.match_window);
        let fetched = deployments.len();
        let bounded: Vec<Deployment> = deployments
            .into_iter()
            .filter(|d| d.created_at.is_some_and(|ts| reachable.contains(ts)))
            .collect();
        debug!(
            repository = %repo,
            fetched,
            kept = bounded.len(),
            "Bounded deployments to window"
        );
        bounded
    }
}
