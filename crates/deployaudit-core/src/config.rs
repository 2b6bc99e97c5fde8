//! Immutable configuration injected into the client and the audit pipeline

use crate::error::{Error, Result};
use crate::types::RepoRef;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveTime, TimeZone, Utc};
use std::time::Duration;

/// Default GitHub REST API base URL
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// REST API version sent in `X-GitHub-Api-Version`
pub const DEFAULT_API_VERSION: &str = "2022-11-28";

/// Width of the actor/time correlation window
pub const DEFAULT_MATCH_WINDOW: Duration = Duration::from_secs(300);

/// Configuration for the rate-limited API client
#[derive(Clone)]
pub struct ClientConfig {
    /// API base URL without trailing slash
    pub base_url: String,
    /// Bearer credential
    pub token: String,
    /// Value of the `X-GitHub-Api-Version` header
    pub api_version: String,
    /// `User-Agent` header
    pub user_agent: String,
    /// Attempts for transient failures (rate-limit waits are not counted)
    pub max_attempts: u32,
    /// Fixed sleep between transient-failure attempts
    pub retry_delay: Duration,
    /// Wait used when quota is exhausted but no reset header was sent
    pub default_rate_limit_wait: Duration,
    /// Per-request timeout
    pub timeout: Duration,
    /// Items requested per page
    pub per_page: u32,
    /// Safety limit on pages per collection
    pub max_pages: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            user_agent: concat!("deployaudit/", env!("CARGO_PKG_VERSION")).to_string(),
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
            default_rate_limit_wait: Duration::from_secs(60),
            timeout: Duration::from_secs(30),
            per_page: 100,
            max_pages: 1000,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field(
                "token",
                &if self.token.is_empty() {
                    "<empty>"
                } else {
                    "<redacted>"
                },
            )
            .field("api_version", &self.api_version)
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay", &self.retry_delay)
            .field("per_page", &self.per_page)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    /// Config with the given credential and defaults for everything else
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Default::default()
        }
    }

    /// Reject values the client cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::Config("GitHub token is required".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(Error::Config("max_attempts must be at least 1".to_string()));
        }
        if self.per_page == 0 || self.per_page > 100 {
            return Err(Error::Config(format!(
                "per_page must be between 1 and 100, got {}",
                self.per_page
            )));
        }
        Ok(())
    }

    /// Base URL with any trailing slash removed
    pub fn api_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Inclusive `[start, end]` window applied to workflow run creation times
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    /// Earliest run creation time included
    pub start: DateTime<Utc>,
    /// Latest run creation time included
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    /// Build a window, rejecting `start > end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(Error::Config(format!(
                "start ({}) is after end ({})",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// Window covering the `days` days ending at `now`
    pub fn last_days(days: u32, now: DateTime<Utc>) -> Result<Self> {
        let start = now
            .checked_sub_signed(ChronoDuration::days(i64::from(days)))
            .ok_or_else(|| Error::Config(format!("{} days before {} is out of range", days, now)))?;
        Ok(Self { start, end: now })
    }

    /// Whether `ts` falls inside the window (both bounds inclusive)
    #[inline]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }

    /// Window widened by `margin` on both sides
    pub fn widened(&self, margin: Duration) -> Self {
        let margin = ChronoDuration::from_std(margin).unwrap_or_else(|_| ChronoDuration::zero());
        Self {
            start: self.start - margin,
            end: self.end + margin,
        }
    }
}

/// Parse a window bound from RFC 3339 or `YYYY-MM-DD`.
///
/// Plain dates expand to the start of the day, or to its last second when
/// `end_of_day` is set, so `--end-date 2024-01-31` includes the whole day.
pub fn parse_window_bound(input: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| Error::InvalidTimestamp(input.to_string()))?;
    let time = if end_of_day {
        NaiveTime::from_hms_opt(23, 59, 59)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    };
    let time = time.ok_or_else(|| Error::InvalidTimestamp(input.to_string()))?;
    Ok(Utc.from_utc_datetime(&date.and_time(time)))
}

/// What the audit walks over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditTarget {
    /// Every repository of an organization
    Organization(String),
    /// A single repository
    Repository(RepoRef),
}

/// Configuration for one report run
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Organization or repository to audit
    pub target: AuditTarget,
    /// Run creation window
    pub window: ReportWindow,
    /// Maximum distance between run and deployment creation (exclusive)
    pub match_window: Duration,
    /// Drop deployments that cannot match any in-window run
    pub bound_deployments_to_window: bool,
}

impl AuditConfig {
    /// Config with the default correlation window and unbounded deployment fetch
    pub fn new(target: AuditTarget, window: ReportWindow) -> Self {
        Self {
            target,
            window,
            match_window: DEFAULT_MATCH_WINDOW,
            bound_deployments_to_window: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://api.github.com");
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(2));
        assert_eq!(config.per_page, 100);
        assert!(config.user_agent.starts_with("deployaudit/"));
    }

    #[test]
    fn test_client_config_debug_redacts_token() {
        let config = ClientConfig::with_token("ghp_SuperSecret42");
        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("ghp_SuperSecret42"));
        assert!(debug_output.contains("<redacted>"));
    }

    #[test]
    fn test_client_config_validate() {
        assert!(ClientConfig::default().validate().is_err());
        assert!(ClientConfig::with_token("t").validate().is_ok());

        let mut config = ClientConfig::with_token("t");
        config.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::with_token("t");
        config.per_page = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_root_trims_slash() {
        let config = ClientConfig {
            base_url: "https://ghe.example.com/api/v3/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.api_root(), "https://ghe.example.com/api/v3");
    }

    #[test]
    fn test_window_contains_is_inclusive() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
        let window = ReportWindow::new(start, end).unwrap();

        assert!(window.contains(start));
        assert!(window.contains(end));
        assert!(!window.contains(start - ChronoDuration::seconds(1)));
        assert!(!window.contains(end + ChronoDuration::seconds(1)));
    }

    #[test]
    fn test_window_rejects_inverted_bounds() {
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(ReportWindow::new(start, end).is_err());
    }

    #[test]
    fn test_last_days() {
        let now = Utc.with_ymd_and_hms(2024, 3, 8, 12, 0, 0).unwrap();
        let window = ReportWindow::last_days(7, now).unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        assert_eq!(window.end, now);
    }

    #[test]
    fn test_last_days_out_of_range() {
        let now = Utc.with_ymd_and_hms(2024, 3, 8, 12, 0, 0).unwrap();
        let err = ReportWindow::last_days(u32::MAX, now).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }

    #[test]
    fn test_widened() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let window = ReportWindow::new(start, end)
            .unwrap()
            .widened(Duration::from_secs(300));
        assert_eq!(window.start, start - ChronoDuration::seconds(300));
        assert_eq!(window.end, end + ChronoDuration::seconds(300));
    }

    #[test]
    fn test_parse_window_bound() {
        assert_eq!(
            parse_window_bound("2024-01-15T10:30:00Z", false).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
        );
        assert_eq!(
            parse_window_bound("2024-01-15", false).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_window_bound("2024-01-15", true).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 15, 23, 59, 59).unwrap()
        );
        assert!(parse_window_bound("last tuesday", false).is_err());
    }
}
