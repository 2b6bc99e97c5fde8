//! HTTP client for the GitHub REST API

pub mod client;
pub mod deployments;
pub mod pagination;
pub mod repos;
pub mod transport;
pub mod workflows;

pub use client::RateLimitedClient;
pub use pagination::{fetch_all, PageShape};
pub use transport::{RawResponse, ReqwestTransport};

use serde::Deserialize;

/// GitHub API user reference (`actor`, `creator`, `user`)
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GitHubUser {
    pub(crate) login: String,
}

/// Percent-encode one URL path segment
pub(crate) fn path_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
