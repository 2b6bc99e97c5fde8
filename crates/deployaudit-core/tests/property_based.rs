//! Property-based tests using proptest

use chrono::{Duration, TimeZone, Utc};
use deployaudit_core::output::csv_format::{escape_csv_into, format_csv, CSV_HEADERS};
use deployaudit_core::{
    extract_approvals, ActorTimeWindow, CorrelationEngine, Deployment, DeploymentResolution,
    DeploymentState, DeploymentStatus, ReportRow, WorkflowRun,
};
use proptest::prelude::*;

fn arb_state() -> impl Strategy<Value = DeploymentState> {
    prop_oneof![
        Just(DeploymentState::Approved),
        Just(DeploymentState::Success),
        Just(DeploymentState::Failure),
        Just(DeploymentState::Inactive),
        Just(DeploymentState::Error),
        Just(DeploymentState::Pending),
        Just(DeploymentState::Queued),
        Just(DeploymentState::InProgress),
        Just(DeploymentState::Waiting),
        "[a-z_]{1,12}".prop_map(|s| DeploymentState::parse(&s)),
    ]
}

fn arb_statuses() -> impl Strategy<Value = Vec<DeploymentStatus>> {
    prop::collection::vec(
        (arb_state(), prop::option::of("[a-z]{1,8}")),
        0..24,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, (state, creator))| DeploymentStatus {
                state,
                creator,
                created_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(i as i64)),
            })
            .collect()
    })
}

// Field text that exercises quoting: commas, quotes, newlines
fn arb_field() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z ,\"\n]{0,16}").expect("valid regex")
}

/// Split one CSV record, honouring quotes
fn parse_record(line: &str) -> Vec<String> {
    let mut fields = vec![String::new()];
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match (ch, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                fields.last_mut().unwrap().push('"');
            }
            ('"', _) => quoted = !quoted,
            (',', false) => fields.push(String::new()),
            (c, _) => fields.last_mut().unwrap().push(c),
        }
    }
    fields
}

proptest! {
    #[test]
    fn test_extraction_idempotent(statuses in arb_statuses()) {
        let first = extract_approvals(&statuses);
        let second = extract_approvals(&statuses);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_final_status_defined_iff_history_non_empty(statuses in arb_statuses()) {
        let outcome = extract_approvals(&statuses);
        prop_assert_eq!(outcome.final_status.is_some(), !statuses.is_empty());
    }

    #[test]
    fn test_approvals_are_a_subsequence(statuses in arb_statuses()) {
        let outcome = extract_approvals(&statuses);
        let expected: Vec<_> = statuses
            .iter()
            .filter(|s| s.state == DeploymentState::Approved)
            .map(|s| (s.creator.clone(), s.created_at))
            .collect();
        let actual: Vec<_> = outcome
            .approvals
            .iter()
            .map(|a| (a.approver.clone(), a.approved_at))
            .collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn test_correlation_preserves_input_order(offsets in prop::collection::vec(-600i64..600, 0..30)) {
        let t = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let run = WorkflowRun {
            id: 1,
            name: "Deploy".to_string(),
            actor: Some("alice".to_string()),
            created_at: Some(t),
            status: None,
            conclusion: None,
        };
        let deployments: Vec<Deployment> = offsets
            .iter()
            .enumerate()
            .map(|(i, off)| Deployment {
                id: i as u64,
                creator: Some("alice".to_string()),
                created_at: Some(t + Duration::seconds(*off)),
                environment: None,
            })
            .collect();

        let matched: Vec<u64> = ActorTimeWindow::default()
            .correlate(&run, &deployments)
            .iter()
            .map(|d| d.id)
            .collect();
        let expected: Vec<u64> = offsets
            .iter()
            .enumerate()
            .filter(|(_, off)| off.abs() < 300)
            .map(|(i, _)| i as u64)
            .collect();
        prop_assert_eq!(matched, expected);
    }

    #[test]
    fn test_csv_field_roundtrip(field in arb_field()) {
        let mut buf = String::new();
        escape_csv_into(&field, &mut buf);
        let parsed = parse_record(&buf);
        prop_assert_eq!(parsed, vec![field]);
    }

    #[test]
    fn test_csv_record_has_eight_columns(
        name in arb_field(),
        approved_by in arb_field(),
        comment in arb_field(),
    ) {
        let row = ReportRow {
            repository: "acme/api".to_string(),
            run_id: 1,
            workflow_name: name.clone(),
            triggered_by: "alice".to_string(),
            triggered_at: String::new(),
            approved_by,
            approval_comment: comment,
            final_status: "success".to_string(),
            deployment_status: String::new(),
            deployment_id: None,
            environment: None,
            deployment_approvers: Vec::new(),
            deployment_resolution: DeploymentResolution::NoDeployment,
        };
        let csv = format_csv(&[row]);
        let record = csv
            .strip_prefix(&format!("{}\r\n", CSV_HEADERS.join(",")))
            .unwrap()
            .strip_suffix("\r\n")
            .unwrap();
        let fields = parse_record(record);
        prop_assert_eq!(fields.len(), CSV_HEADERS.len());
        prop_assert_eq!(&fields[1], &name);
    }
}
