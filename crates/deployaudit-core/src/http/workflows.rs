//! GitHub Actions workflow runs and run approvals

use crate::config::ReportWindow;
use crate::http::client::RateLimitedClient;
use crate::http::pagination::{decode_items, fetch_all, PageShape};
use crate::http::GitHubUser;
use crate::traits::HttpTransport;
use crate::types::{parse_timestamp, FetchOutcome, RepoRef, RunReview, WorkflowRun};
use serde::Deserialize;

/// GitHub API workflow run object
#[derive(Debug, Deserialize)]
struct GitHubWorkflowRun {
    id: u64,
    name: Option<String>,
    display_title: Option<String>,
    actor: Option<GitHubUser>,
    created_at: Option<String>,
    status: Option<String>,
    conclusion: Option<String>,
}

/// GitHub API review record from `/actions/runs/{id}/approvals`
#[derive(Debug, Deserialize)]
struct GitHubRunReview {
    state: Option<String>,
    user: Option<GitHubUser>,
    comment: Option<String>,
}

/// Convert GitHub API workflow run to our type
fn convert_workflow_run(run: GitHubWorkflowRun) -> WorkflowRun {
    let name = run
        .name
        .filter(|n| !n.is_empty())
        .or(run.display_title)
        .unwrap_or_default();

    WorkflowRun {
        id: run.id,
        name,
        actor: run.actor.map(|a| a.login),
        created_at: run.created_at.as_deref().and_then(parse_timestamp),
        status: run.status,
        conclusion: run.conclusion,
    }
}

fn convert_review(review: GitHubRunReview) -> RunReview {
    RunReview {
        state: review.state.unwrap_or_default(),
        user: review.user.map(|u| u.login),
        comment: review.comment,
    }
}

/// Keep runs created inside the window; runs without a timestamp are dropped
pub fn filter_runs_in_window(runs: Vec<WorkflowRun>, window: &ReportWindow) -> Vec<WorkflowRun> {
    runs.into_iter()
        .filter(|run| run.created_at.is_some_and(|ts| window.contains(ts)))
        .collect()
}

impl<T: HttpTransport> RateLimitedClient<T> {
    /// List workflow runs created inside `window`, in API order
    ///
    /// Endpoint: GET /repos/{owner}/{repo}/actions/runs
    /// The window is applied client-side.
    pub async fn list_workflow_runs(
        &self,
        repo: &RepoRef,
        window: &ReportWindow,
    ) -> FetchOutcome<Vec<WorkflowRun>> {
        let url = self.url(&format!("/repos/{}/{}/actions/runs", repo.owner, repo.name));

        fetch_all::<_, GitHubWorkflowRun>(self, &url, &[], PageShape::Field("workflow_runs"))
            .await
            .map(|runs| {
                let runs = runs.into_iter().map(convert_workflow_run).collect();
                filter_runs_in_window(runs, window)
            })
    }

    /// Review records attached to a run; `Absent` when the run has no review gate
    ///
    /// Endpoint: GET /repos/{owner}/{repo}/actions/runs/{run_id}/approvals
    pub async fn list_run_reviews(&self, repo: &RepoRef, run_id: u64) -> FetchOutcome<Vec<RunReview>> {
        let url = self.url(&format!(
            "/repos/{}/{}/actions/runs/{}/approvals",
            repo.owner, repo.name, run_id
        ));

        self.get(&url, &[]).await.and_then(|body| {
            let reviews: Vec<GitHubRunReview> =
                decode_items(PageShape::ArrayOrField("environment_reviews"), body)?;
            Ok(reviews.into_iter().map(convert_review).collect())
        })
    }
}
