#![no_main]

use deployaudit_core::{extract_approvals, DeploymentState, DeploymentStatus};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);

    // One status per line: `state[,creator]`
    let statuses: Vec<DeploymentStatus> = text
        .lines()
        .take(256)
        .map(|line| {
            let mut parts = line.splitn(2, ',');
            DeploymentStatus {
                state: DeploymentState::parse(parts.next().unwrap_or("")),
                creator: parts.next().map(str::to_string),
                created_at: None,
            }
        })
        .collect();

    let outcome = extract_approvals(&statuses);
    assert_eq!(outcome, extract_approvals(&statuses));
    assert_eq!(outcome.final_status.is_some(), !statuses.is_empty());
    if statuses.iter().any(|s| s.state.is_terminal()) {
        assert!(outcome.final_status.map_or(false, |s| s.is_terminal()));
    }
});
