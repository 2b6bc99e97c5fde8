//! Deployment status history reduction
//!
//! Deployment histories interleave transient states (`queued`,
//! `in_progress`, `waiting`) with the concluded outcome, and bookkeeping
//! entries may be appended after it. The reduction therefore looks for the
//! last *terminal* entry rather than simply taking the last one.

use crate::types::{Approval, DeploymentState, DeploymentStatus};

/// Approvals and final outcome of one deployment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeploymentOutcome {
    /// `approved` entries in source order
    pub approvals: Vec<Approval>,
    /// Last terminal state, else the last state, else `None`
    pub final_status: Option<DeploymentState>,
}

impl DeploymentOutcome {
    /// Final status as its API string, empty when undefined
    pub fn final_status_str(&self) -> &str {
        self.final_status.as_ref().map_or("", DeploymentState::as_str)
    }

    /// Distinct approver logins in approval order
    pub fn approvers(&self) -> Vec<String> {
        let mut approvers: Vec<String> = Vec::with_capacity(self.approvals.len());
        for login in self.approvals.iter().filter_map(|a| a.approver.as_deref()) {
            if !approvers.iter().any(|seen| seen == login) {
                approvers.push(login.to_string());
            }
        }
        approvers
    }
}

/// Reduce a status history in the order the API returned it.
///
/// The history is never reordered: "last" means last in source order.
/// Pure and deterministic: the same input always yields the same outcome.
pub fn extract_approvals(statuses: &[DeploymentStatus]) -> DeploymentOutcome {
    let approvals = statuses
        .iter()
        .filter(|s| s.state == DeploymentState::Approved)
        .map(|s| Approval {
            approver: s.creator.clone(),
            approved_at: s.created_at,
        })
        .collect();

    let final_status = statuses
        .iter()
        .rev()
        .find(|s| s.state.is_terminal())
        .or_else(|| statuses.last())
        .map(|s| s.state.clone());

    DeploymentOutcome {
        approvals,
        final_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn history(states: &[&str]) -> Vec<DeploymentStatus> {
        states
            .iter()
            .enumerate()
            .map(|(i, state)| DeploymentStatus {
                state: DeploymentState::parse(state),
                creator: Some(format!("user{}", i)),
                created_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, i as u32, 0).unwrap()),
            })
            .collect()
    }

    #[test]
    fn test_falls_back_to_last_entry_without_terminal_state() {
        let outcome = extract_approvals(&history(&["queued", "approved", "waiting"]));
        assert_eq!(outcome.final_status_str(), "waiting");
    }

    #[test]
    fn test_last_terminal_entry_wins() {
        let outcome = extract_approvals(&history(&["queued", "failure", "success"]));
        assert_eq!(outcome.final_status, Some(DeploymentState::Success));
    }

    #[test]
    fn test_terminal_entry_beats_later_bookkeeping() {
        let outcome = extract_approvals(&history(&["approved", "success", "queued"]));
        assert_eq!(outcome.final_status_str(), "success");
    }

    #[test]
    fn test_newest_first_history_is_not_reordered() {
        let at = |d, h, m| Some(Utc.with_ymd_and_hms(2024, 5, d, h, m, 0).unwrap());
        let status = |state: &str, created_at| DeploymentStatus {
            state: DeploymentState::parse(state),
            creator: Some("carol".to_string()),
            created_at,
        };
        // A superseded deployment, listed the way the API returns it
        let statuses = vec![
            status("inactive", at(2, 0, 0)),
            status("success", at(1, 9, 5)),
            status("approved", at(1, 9, 3)),
        ];
        let outcome = extract_approvals(&statuses);
        assert_eq!(outcome.final_status_str(), "success");
        assert_eq!(outcome.approvers(), vec!["carol".to_string()]);
    }

    #[test]
    fn test_empty_history() {
        let outcome = extract_approvals(&[]);
        assert_eq!(outcome.final_status, None);
        assert_eq!(outcome.final_status_str(), "");
        assert!(outcome.approvals.is_empty());
    }

    #[test]
    fn test_approvals_keep_source_order() {
        let outcome = extract_approvals(&history(&["approved", "in_progress", "approved", "success"]));
        let approvers: Vec<_> = outcome
            .approvals
            .iter()
            .map(|a| a.approver.clone().unwrap())
            .collect();
        assert_eq!(approvers, vec!["user0", "user2"]);
        assert_eq!(
            outcome.approvals[1].approved_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 2, 0).unwrap())
        );
    }

    #[test]
    fn test_approvers_are_distinct() {
        let statuses = vec![
            DeploymentStatus {
                state: DeploymentState::Approved,
                creator: Some("carol".to_string()),
                created_at: None,
            },
            DeploymentStatus {
                state: DeploymentState::Approved,
                creator: None,
                created_at: None,
            },
            DeploymentStatus {
                state: DeploymentState::Approved,
                creator: Some("carol".to_string()),
                created_at: None,
            },
        ];
        let outcome = extract_approvals(&statuses);
        assert_eq!(outcome.approvals.len(), 3);
        assert_eq!(outcome.approvers(), vec!["carol".to_string()]);
    }

    fn state_strategy() -> impl Strategy<Value = String> {
        prop::sample::select(vec![
            "approved",
            "success",
            "failure",
            "inactive",
            "error",
            "pending",
            "queued",
            "in_progress",
            "waiting",
            "destroyed",
        ])
        .prop_map(str::to_string)
    }

    proptest! {
        #[test]
        fn prop_extraction_is_idempotent(states in prop::collection::vec(state_strategy(), 0..20)) {
            let refs: Vec<&str> = states.iter().map(String::as_str).collect();
            let statuses = history(&refs);
            prop_assert_eq!(extract_approvals(&statuses), extract_approvals(&statuses));
        }

        #[test]
        fn prop_final_status_is_terminal_when_any_terminal_exists(
            states in prop::collection::vec(state_strategy(), 1..20)
        ) {
            let refs: Vec<&str> = states.iter().map(String::as_str).collect();
            let statuses = history(&refs);
            let outcome = extract_approvals(&statuses);
            let any_terminal = statuses.iter().any(|s| s.state.is_terminal());
            let final_status = outcome.final_status.unwrap();
            if any_terminal {
                prop_assert!(final_status.is_terminal());
            } else {
                prop_assert_eq!(Some(&final_status), statuses.last().map(|s| &s.state));
            }
        }

        #[test]
        fn prop_approval_count_matches_approved_entries(
            states in prop::collection::vec(state_strategy(), 0..20)
        ) {
            let refs: Vec<&str> = states.iter().map(String::as_str).collect();
            let outcome = extract_approvals(&history(&refs));
            prop_assert_eq!(
                outcome.approvals.len(),
                states.iter().filter(|s| *s == "approved").count()
            );
        }
    }
}
