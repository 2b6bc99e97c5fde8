#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::Parser;
use deployaudit_core::{
    generate_report, parse_window_bound, AuditConfig, AuditReport, AuditTarget, ClientConfig,
    DiagnosticSeverity, OutputFormat, RepoRef, ReportWindow, ReportWriter,
};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "deployaudit",
    version,
    about = "Report workflow runs with their deployment approvals and outcomes"
)]
struct Cli {
    /// Organization to audit (all repositories unless --repository is set)
    #[arg(long, env = "ENTERPRISE_ORG_NAME")]
    org: Option<String>,

    /// Single repository, `name` (qualified with --org) or `owner/name`
    #[arg(long, env = "REPOSITORY")]
    repository: Option<String>,

    /// Window start, RFC 3339 or YYYY-MM-DD
    #[arg(long, env = "START_DATE")]
    start_date: Option<String>,

    /// Window end, RFC 3339 or YYYY-MM-DD (whole day included)
    #[arg(long, env = "END_DATE")]
    end_date: Option<String>,

    /// Window length in days when start or end is missing
    #[arg(long, env = "DAYS", default_value_t = 7)]
    days: u32,

    /// GitHub token for API access
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// API base URL (GitHub Enterprise Server: https://HOST/api/v3)
    #[arg(long, env = "GITHUB_API_URL")]
    api_url: Option<String>,

    /// Report file
    #[arg(long, default_value = "deployment_report.csv")]
    output: PathBuf,

    /// Report format: csv or json
    #[arg(long, default_value = "csv")]
    format: OutputFormat,

    /// Attempts per request for transient failures
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    /// Ignore deployments that cannot match any run inside the window
    #[arg(long)]
    bound_deployments_to_window: bool,
}

fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    std::process::exit(run(cli));
}

/// Filter empty string from Option (env vars may produce "" for empty values)
fn clean_opt(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn run(cli: Cli) -> i32 {
    let (client_config, audit_config) = match build_configs(&cli, Utc::now()) {
        Ok(configs) => configs,
        Err(e) => {
            error!("{:#}", e);
            return 2;
        }
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build();
    let rt = match rt {
        Ok(rt) => rt,
        Err(e) => {
            error!("failed to create runtime: {e}");
            return 1;
        }
    };

    let report = match rt.block_on(generate_report(client_config, &audit_config)) {
        Ok(report) => report,
        Err(e) => {
            error!("{e}");
            return 1;
        }
    };

    summarize(&report);

    match ReportWriter::write(&cli.output, &report.rows, cli.format) {
        Ok(true) => {
            info!(
                path = %cli.output.display(),
                rows = report.rows.len(),
                "Report written"
            );
            0
        }
        Ok(false) => {
            info!("No data found for the specified period.");
            0
        }
        Err(e) => {
            error!(path = %cli.output.display(), "Could not write report: {e}");
            1
        }
    }
}

fn build_configs(cli: &Cli, now: DateTime<Utc>) -> anyhow::Result<(ClientConfig, AuditConfig)> {
    let token = clean_opt(&cli.token).context("a GitHub token is required (--token or GITHUB_TOKEN)")?;
    let org = clean_opt(&cli.org);

    let target = match (clean_opt(&cli.repository), org) {
        (Some(repository), org) => AuditTarget::Repository(
            RepoRef::qualify(org, repository).context("invalid --repository")?,
        ),
        (None, Some(org)) => AuditTarget::Organization(org.to_string()),
        (None, None) => bail!("either --org or --repository is required"),
    };

    let window = build_window(cli, now)?;

    let mut client_config = ClientConfig::with_token(token);
    if let Some(api_url) = clean_opt(&cli.api_url) {
        client_config.base_url = api_url.to_string();
    }
    client_config.max_attempts = cli.max_attempts;
    client_config.validate()?;

    let mut audit_config = AuditConfig::new(target, window);
    audit_config.bound_deployments_to_window = cli.bound_deployments_to_window;

    Ok((client_config, audit_config))
}

fn build_window(cli: &Cli, now: DateTime<Utc>) -> anyhow::Result<ReportWindow> {
    let start = clean_opt(&cli.start_date)
        .map(|s| parse_window_bound(s, false))
        .transpose()
        .context("invalid --start-date")?;
    let end = clean_opt(&cli.end_date)
        .map(|s| parse_window_bound(s, true))
        .transpose()
        .context("invalid --end-date")?;

    let window = match (start, end) {
        (None, None) => ReportWindow::last_days(cli.days, now)?,
        (Some(start), None) => ReportWindow::new(start, now)?,
        (None, Some(end)) => {
            let start = ReportWindow::last_days(cli.days, end)?.start;
            ReportWindow::new(start, end)?
        }
        (Some(start), Some(end)) => ReportWindow::new(start, end)?,
    };
    Ok(window)
}

fn summarize(report: &AuditReport) {
    for diagnostic in &report.diagnostics {
        if diagnostic.severity == DiagnosticSeverity::SoftError {
            warn!(category = ?diagnostic.category, "{}", diagnostic.message);
        }
    }
    if report.is_partial() {
        warn!(
            diagnostics = report.diagnostics.len(),
            "Report is partial: some data could not be fetched"
        );
    }
    info!(
        repositories = report.repositories_scanned,
        rows = report.rows.len(),
        "Audit complete; run/deployment matches are heuristic"
    );
}
