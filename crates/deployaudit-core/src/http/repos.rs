//! Organization repository listing

use crate::http::client::RateLimitedClient;
use crate::http::pagination::{fetch_all, PageShape};
use crate::http::path_segment;
use crate::traits::HttpTransport;
use crate::types::{FetchOutcome, RepoRef};
use serde::Deserialize;

/// GitHub API repository object
#[derive(Debug, Deserialize)]
struct GitHubRepository {
    full_name: String,
}

impl<T: HttpTransport> RateLimitedClient<T> {
    /// List every repository of an organization
    ///
    /// Endpoint: GET /orgs/{org}/repos?type=all
    pub async fn list_org_repos(&self, org: &str) -> FetchOutcome<Vec<RepoRef>> {
        let url = self.url(&format!("/orgs/{}/repos", path_segment(org)));
        let query = vec![("type".to_string(), "all".to_string())];

        fetch_all::<_, GitHubRepository>(self, &url, &query, PageShape::Array)
            .await
            .and_then(|repos| {
                repos
                    .into_iter()
                    .map(|r| RepoRef::parse(&r.full_name))
                    .collect()
            })
    }
}
