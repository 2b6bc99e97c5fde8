//! JSON rendering of report rows

use crate::error::Result;
use crate::types::ReportRow;

/// Pretty-printed JSON array of full rows, provenance fields included
pub fn format_json(rows: &[ReportRow]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeploymentResolution;

    #[test]
    fn test_rows_serialize_with_provenance() {
        let row = ReportRow {
            repository: "acme/api".to_string(),
            run_id: 7,
            workflow_name: "Deploy".to_string(),
            triggered_by: "alice".to_string(),
            triggered_at: "2024-05-01T09:00:00Z".to_string(),
            approved_by: String::new(),
            approval_comment: String::new(),
            final_status: "failure".to_string(),
            deployment_status: String::new(),
            deployment_id: None,
            environment: None,
            deployment_approvers: Vec::new(),
            deployment_resolution: DeploymentResolution::NoDeployment,
        };
        let json = format_json(&[row]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[0]["run_id"], 7);
        assert_eq!(value[0]["repository"], "acme/api");
        assert_eq!(value[0]["deployment_resolution"], "no_deployment");
        assert!(value[0]["deployment_id"].is_null());
    }

    #[test]
    fn test_empty() {
        assert_eq!(format_json(&[]).unwrap(), "[]");
    }
}
