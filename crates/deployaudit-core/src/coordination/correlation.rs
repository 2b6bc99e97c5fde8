//! Actor/time proximity correlation between runs and deployments

use crate::config::DEFAULT_MATCH_WINDOW;
use crate::traits::CorrelationEngine;
use crate::types::{Deployment, WorkflowRun};
use std::time::Duration;

/// Matches a deployment to a run when the same login created both less
/// than `window` apart.
///
/// There is no foreign key between runs and deployments, so this is a
/// heuristic: a deployment made by the same actor a few minutes after an
/// unrelated run is a false positive, and a pipeline that takes longer than
/// the window to reach its deploy step is a false negative. Every qualifying
/// deployment matches; there is no tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorTimeWindow {
    /// Exclusive upper bound on `|deployment.created_at - run.created_at|`
    pub window: Duration,
}

impl Default for ActorTimeWindow {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_WINDOW)
    }
}

impl ActorTimeWindow {
    /// Engine with the given window
    pub fn new(window: Duration) -> Self {
        Self { window }
    }
}

impl CorrelationEngine for ActorTimeWindow {
    fn is_match(&self, run: &WorkflowRun, deployment: &Deployment) -> bool {
        let (Some(run_at), Some(deployed_at)) = (run.created_at, deployment.created_at) else {
            return false;
        };
        // Two missing logins compare equal, as the API reports them
        if run.actor != deployment.creator {
            return false;
        }

        let distance_ms = (deployed_at - run_at).num_milliseconds().unsigned_abs();
        u128::from(distance_ms) < self.window.as_millis()
    }
}
