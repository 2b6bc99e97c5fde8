//! Report row assembly: one row per matched deployment, or one bare row

use crate::coordination::approvals::{extract_approvals, DeploymentOutcome};
use crate::coordination::protection::{Protection, ProtectionResolver};
use crate::coordination::reviews::ReviewSummary;
use crate::http::RateLimitedClient;
use crate::traits::HttpTransport;
use crate::types::{
    format_timestamp, Deployment, DeploymentResolution, Diagnostic, DiagnosticCategory,
    FetchOutcome, RepoRef, ReportRow, WorkflowRun,
};
use tracing::{debug, warn};

/// Deployment-side half of a row
struct DeploymentColumns {
    status: String,
    approvers: Vec<String>,
    resolution: DeploymentResolution,
}

impl DeploymentColumns {
    fn empty(resolution: DeploymentResolution) -> Self {
        Self {
            status: String::new(),
            approvers: Vec::new(),
            resolution,
        }
    }

    fn resolved(outcome: &DeploymentOutcome) -> Self {
        Self {
            status: outcome.final_status_str().to_string(),
            approvers: outcome.approvers(),
            resolution: DeploymentResolution::Resolved,
        }
    }
}

/// Builds report rows for a run and its matched deployments
pub struct ReportAssembler<'a, T: HttpTransport> {
    client: &'a RateLimitedClient<T>,
    protection: ProtectionResolver<'a, T>,
}

impl<'a, T: HttpTransport> ReportAssembler<'a, T> {
    /// Create an assembler over the shared client
    pub fn new(client: &'a RateLimitedClient<T>) -> Self {
        Self {
            client,
            protection: ProtectionResolver::new(client),
        }
    }

    /// Rows for `run`: exactly `max(matched.len(), 1)` of them, in
    /// `matched` order. Every row carries the same run-level columns.
    pub async fn assemble(
        &mut self,
        repo: &RepoRef,
        run: &WorkflowRun,
        reviews: &ReviewSummary,
        matched: &[&Deployment],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<ReportRow> {
        let base = ReportRow {
            repository: repo.full_name(),
            run_id: run.id,
            workflow_name: run.name.clone(),
            triggered_by: run.actor.clone().unwrap_or_default(),
            triggered_at: format_timestamp(run.created_at),
            approved_by: reviews.approved_by(),
            approval_comment: reviews.approval_comment(),
            final_status: run.terminal_status().to_string(),
            deployment_status: String::new(),
            deployment_id: None,
            environment: None,
            deployment_approvers: Vec::new(),
            deployment_resolution: DeploymentResolution::NoDeployment,
        };

        if matched.is_empty() {
            return vec![base];
        }

        let mut rows = Vec::with_capacity(matched.len());
        for deployment in matched {
            let columns = self.deployment_columns(repo, deployment, diagnostics).await;
            rows.push(ReportRow {
                deployment_status: columns.status,
                deployment_id: Some(deployment.id),
                environment: deployment.environment.clone(),
                deployment_approvers: columns.approvers,
                deployment_resolution: columns.resolution,
                ..base.clone()
            });
        }
        rows
    }

    async fn deployment_columns(
        &mut self,
        repo: &RepoRef,
        deployment: &Deployment,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> DeploymentColumns {
        let Some(environment) = deployment.environment.as_deref() else {
            debug!(repository = %repo, deployment_id = deployment.id, "Deployment has no environment");
            return DeploymentColumns::empty(DeploymentResolution::NoEnvironment);
        };

        match self.protection.resolve(repo, environment, diagnostics).await {
            Protection::Protected => {}
            Protection::Unprotected => {
                return DeploymentColumns::empty(DeploymentResolution::Unprotected)
            }
            Protection::Unknown => return DeploymentColumns::empty(DeploymentResolution::Unresolved),
        }

        match self
            .client
            .list_deployment_statuses(repo, deployment.id)
            .await
        {
            FetchOutcome::Found(statuses) => {
                DeploymentColumns::resolved(&extract_approvals(&statuses))
            }
            FetchOutcome::Absent => DeploymentColumns::resolved(&extract_approvals(&[])),
            FetchOutcome::Failed(e) => {
                warn!(
                    repository = %repo,
                    deployment_id = deployment.id,
                    error = %e,
                    "Could not fetch deployment statuses"
                );
                diagnostics.push(Diagnostic::soft_error(
                    DiagnosticCategory::DeploymentStatuses,
                    format!("{} deployment {}: {}", repo, deployment.id, e),
                ));
                DeploymentColumns::empty(DeploymentResolution::Unresolved)
            }
        }
    }
}
