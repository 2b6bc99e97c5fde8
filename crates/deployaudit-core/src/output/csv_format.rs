//! CSV rendering of report rows (RFC 4180)

use crate::types::ReportRow;

/// Column headers, in output order
pub const CSV_HEADERS: [&str; 8] = [
    "Workflow Run ID",
    "Workflow Name",
    "Triggered By",
    "Triggered At",
    "Deployment Approved By",
    "Approval Comment",
    "Final Status",
    "Deployment Status",
];

/// Whether a field has to be quoted
#[inline]
fn needs_quoting(field: &str) -> bool {
    field
        .bytes()
        .any(|b| matches!(b, b',' | b'"' | b'\n' | b'\r'))
}

/// Append one field, quoting it and doubling embedded quotes when needed
pub fn escape_csv_into(field: &str, buf: &mut String) {
    if !needs_quoting(field) {
        buf.push_str(field);
        return;
    }
    buf.push('"');
    for ch in field.chars() {
        if ch == '"' {
            buf.push('"');
        }
        buf.push(ch);
    }
    buf.push('"');
}

fn push_record<'f>(fields: impl IntoIterator<Item = &'f str>, buf: &mut String) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            buf.push(',');
        }
        escape_csv_into(field, buf);
    }
    buf.push_str("\r\n");
}

/// Render a header line plus one record per row
pub fn format_csv(rows: &[ReportRow]) -> String {
    let mut buf = String::with_capacity(128 + rows.len() * 96);
    push_record(CSV_HEADERS, &mut buf);

    for row in rows {
        let run_id = row.run_id.to_string();
        push_record(
            [
                run_id.as_str(),
                row.workflow_name.as_str(),
                row.triggered_by.as_str(),
                row.triggered_at.as_str(),
                row.approved_by.as_str(),
                row.approval_comment.as_str(),
                row.final_status.as_str(),
                row.deployment_status.as_str(),
            ],
            &mut buf,
        );
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeploymentResolution;

    fn row() -> ReportRow {
        ReportRow {
            repository: "acme/api".to_string(),
            run_id: 101,
            workflow_name: "Deploy".to_string(),
            triggered_by: "alice".to_string(),
            triggered_at: "2024-05-01T09:00:00Z".to_string(),
            approved_by: "carol".to_string(),
            approval_comment: String::new(),
            final_status: "success".to_string(),
            deployment_status: "success".to_string(),
            deployment_id: Some(5),
            environment: Some("prod".to_string()),
            deployment_approvers: vec!["carol".to_string()],
            deployment_resolution: DeploymentResolution::Resolved,
        }
    }

    #[test]
    fn test_header_only_for_no_rows() {
        assert_eq!(
            format_csv(&[]),
            "Workflow Run ID,Workflow Name,Triggered By,Triggered At,Deployment Approved By,Approval Comment,Final Status,Deployment Status\r\n"
        );
    }

    #[test]
    fn test_plain_row() {
        let csv = format_csv(&[row()]);
        let line = csv.lines().nth(1).unwrap();
        assert_eq!(
            line,
            "101,Deploy,alice,2024-05-01T09:00:00Z,carol,,success,success"
        );
    }

    #[test]
    fn test_quoting() {
        let mut row = row();
        row.approved_by = "carol, dave".to_string();
        row.approval_comment = "said \"ship it\"\nthen left".to_string();
        let csv = format_csv(&[row]);
        assert!(csv.contains(",\"carol, dave\","));
        assert!(csv.contains("\"said \"\"ship it\"\"\nthen left\""));
    }

    #[test]
    fn test_escape_csv_into() {
        let mut buf = String::new();
        escape_csv_into("plain", &mut buf);
        buf.push('|');
        escape_csv_into("a,b", &mut buf);
        buf.push('|');
        escape_csv_into("", &mut buf);
        assert_eq!(buf, "plain|\"a,b\"|");
    }
}
