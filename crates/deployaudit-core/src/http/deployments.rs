//! Deployments, environments and deployment status history

use crate::http::client::RateLimitedClient;
use crate::http::pagination::{fetch_all, PageShape};
use crate::http::{path_segment, GitHubUser};
use crate::traits::HttpTransport;
use crate::types::{
    parse_timestamp, Deployment, DeploymentState, DeploymentStatus, Environment, FetchOutcome,
    ProtectionRule, ProtectionRuleKind, RepoRef,
};
use serde::Deserialize;

/// GitHub API deployment object
#[derive(Debug, Deserialize)]
struct GitHubDeployment {
    id: u64,
    creator: Option<GitHubUser>,
    created_at: Option<String>,
    environment: Option<String>,
}

/// GitHub API environment object
#[derive(Debug, Deserialize)]
struct GitHubEnvironment {
    name: Option<String>,
    protection_rules: Option<Vec<GitHubProtectionRule>>,
}

#[derive(Debug, Deserialize)]
struct GitHubProtectionRule {
    id: Option<u64>,
    #[serde(rename = "type")]
    rule_type: Option<String>,
}

/// GitHub API deployment status object
#[derive(Debug, Deserialize)]
struct GitHubDeploymentStatus {
    state: String,
    creator: Option<GitHubUser>,
    created_at: Option<String>,
}

fn convert_deployment(dep: GitHubDeployment) -> Deployment {
    Deployment {
        id: dep.id,
        creator: dep.creator.map(|c| c.login),
        created_at: dep.created_at.as_deref().and_then(parse_timestamp),
        environment: dep.environment.filter(|e| !e.is_empty()),
    }
}

fn convert_environment(env: GitHubEnvironment, requested_name: &str) -> Environment {
    let protection_rules = env
        .protection_rules
        .unwrap_or_default()
        .into_iter()
        .map(|rule| ProtectionRule {
            id: rule.id,
            kind: ProtectionRuleKind::parse(rule.rule_type.as_deref().unwrap_or("")),
        })
        .collect();

    Environment {
        name: env.name.unwrap_or_else(|| requested_name.to_string()),
        protection_rules,
    }
}

fn convert_status(status: GitHubDeploymentStatus) -> DeploymentStatus {
    DeploymentStatus {
        state: DeploymentState::parse(&status.state),
        creator: status.creator.map(|c| c.login),
        created_at: status.created_at.as_deref().and_then(parse_timestamp),
    }
}

impl<T: HttpTransport> RateLimitedClient<T> {
    /// List every deployment of a repository (no time bound)
    ///
    /// Endpoint: GET /repos/{owner}/{repo}/deployments
    pub async fn list_deployments(&self, repo: &RepoRef) -> FetchOutcome<Vec<Deployment>> {
        let url = self.url(&format!("/repos/{}/{}/deployments", repo.owner, repo.name));

        fetch_all::<_, GitHubDeployment>(self, &url, &[], PageShape::Array)
            .await
            .map(|deps| deps.into_iter().map(convert_deployment).collect())
    }

    /// Get one environment's configuration
    ///
    /// Endpoint: GET /repos/{owner}/{repo}/environments/{name}
    pub async fn get_environment(&self, repo: &RepoRef, name: &str) -> FetchOutcome<Environment> {
        let url = self.url(&format!(
            "/repos/{}/{}/environments/{}",
            repo.owner,
            repo.name,
            path_segment(name)
        ));

        self.get(&url, &[]).await.and_then(|body| {
            let env: GitHubEnvironment = serde_json::from_value(body)?;
            Ok(convert_environment(env, name))
        })
    }

    /// List a deployment's statuses in API order (newest first)
    ///
    /// Endpoint: GET /repos/{owner}/{repo}/deployments/{id}/statuses
    pub async fn list_deployment_statuses(
        &self,
        repo: &RepoRef,
        deployment_id: u64,
    ) -> FetchOutcome<Vec<DeploymentStatus>> {
        let url = self.url(&format!(
            "/repos/{}/{}/deployments/{}/statuses",
            repo.owner, repo.name, deployment_id
        ));

        fetch_all::<_, GitHubDeploymentStatus>(self, &url, &[], PageShape::Array)
            .await
            .map(|statuses| statuses.into_iter().map(convert_status).collect())
    }
}
