//! Trait seams: the HTTP transport under the client, and the correlation policy

use crate::error::Result;
use crate::http::transport::RawResponse;
use crate::types::{Deployment, WorkflowRun};
use std::future::Future;

/// One authenticated GET round-trip.
///
/// Uses a GAT for the returned future so the production transport can box
/// while scripted test transports return `std::future::Ready` with no
/// allocation. Implementations attach credentials and version headers and
/// report transport failures as `Err`; any HTTP status, including 4xx/5xx,
/// comes back as `Ok(RawResponse)` for the client to classify.
pub trait HttpTransport {
    /// GAT for the async GET
    type GetFuture<'a>: Future<Output = Result<RawResponse>> + Send + 'a
    where
        Self: 'a;

    /// Issue a GET for `url` with `query` appended
    fn get<'a>(&'a self, url: &'a str, query: &'a [(String, String)]) -> Self::GetFuture<'a>;
}

/// Policy deciding which deployments a workflow run produced.
///
/// The API offers no foreign key between the two collections, so any
/// implementation is a heuristic; matches are probabilistic.
pub trait CorrelationEngine {
    /// Whether `deployment` is attributed to `run`
    fn is_match(&self, run: &WorkflowRun, deployment: &Deployment) -> bool;

    /// All deployments attributed to `run`, in input order
    fn correlate<'d>(&self, run: &WorkflowRun, deployments: &'d [Deployment]) -> Vec<&'d Deployment> {
        deployments
            .iter()
            .filter(|d| self.is_match(run, d))
            .collect()
    }
}
