//! reqwest-backed transport and raw response handling

use crate::config::ClientConfig;
use crate::error::Result;
use crate::traits::HttpTransport;
use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION};

/// Status line, rate-limit headers, pagination link and body of one response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// `x-ratelimit-remaining`
    pub rate_limit_remaining: Option<u32>,
    /// `x-ratelimit-reset` (epoch seconds)
    pub rate_limit_reset: Option<u64>,
    /// `rel="next"` target of the `Link` header
    pub next_link: Option<String>,
    /// Response body
    pub body: String,
}

impl RawResponse {
    /// 2xx
    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 403 with a zero remaining-quota header
    #[inline]
    pub fn is_rate_limited(&self) -> bool {
        self.status == 403 && self.rate_limit_remaining == Some(0)
    }

    async fn read(response: reqwest::Response) -> Result<Self> {
        let status = response.status().as_u16();
        let headers = response.headers();
        let rate_limit_remaining = header_number(headers, "x-ratelimit-remaining");
        let rate_limit_reset = header_number(headers, "x-ratelimit-reset");
        let next_link = headers
            .get("link")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_link_next);
        let body = response.text().await?;

        Ok(Self {
            status,
            rate_limit_remaining,
            rate_limit_reset,
            next_link,
            body,
        })
    }
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// Extract the `rel="next"` URL from a `Link` header value
pub fn parse_link_next(link: &str) -> Option<String> {
    link.split(',').find_map(|part| {
        let part = part.trim();
        let mut segments = part.split(';');
        let target = segments.next()?.trim();
        let is_next = segments.any(|p| {
            let p = p.trim();
            p == "rel=\"next\"" || p == "rel=next"
        });
        if !is_next {
            return None;
        }
        let url = target.strip_prefix('<')?.strip_suffix('>')?;
        (!url.is_empty()).then(|| url.to_string())
    })
}

/// Cut a response body down to something fit for a log line
pub fn truncate_body(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Production transport over a pooled `reqwest::Client`
pub struct ReqwestTransport {
    client: reqwest::Client,
    token: String,
    api_version: String,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("token", &"<redacted>")
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    /// Build the underlying client from the injected configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            token: config.token.clone(),
            api_version: config.api_version.clone(),
        })
    }
}

impl HttpTransport for ReqwestTransport {
    type GetFuture<'a> = BoxFuture<'a, Result<RawResponse>>;

    fn get<'a>(&'a self, url: &'a str, query: &'a [(String, String)]) -> Self::GetFuture<'a> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .query(query)
                .header(AUTHORIZATION, format!("Bearer {}", self.token))
                .header(ACCEPT, "application/vnd.github+json")
                .header("X-GitHub-Api-Version", self.api_version.as_str())
                .send()
                .await?;

            RawResponse::read(response).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_link_next_finds_next_url() {
        let link = "<https://api.github.com/repositories/1/deployments?page=2>; rel=\"next\", <https://api.github.com/repositories/1/deployments?page=5>; rel=\"last\"";
        assert_eq!(
            parse_link_next(link),
            Some("https://api.github.com/repositories/1/deployments?page=2".to_string())
        );
    }

    #[test]
    fn test_parse_link_next_none_on_last_page() {
        let link = "<https://api.github.com/x?page=1>; rel=\"first\", <https://api.github.com/x?page=4>; rel=\"prev\"";
        assert_eq!(parse_link_next(link), None);
        assert_eq!(parse_link_next(""), None);
        assert_eq!(parse_link_next("garbage"), None);
    }

    #[test]
    fn test_parse_link_next_order_independent() {
        let link = "<https://api.github.com/x?page=9>; rel=\"last\", <https://api.github.com/x?page=3>; rel=\"next\"";
        assert_eq!(
            parse_link_next(link),
            Some("https://api.github.com/x?page=3".to_string())
        );
    }

    #[test]
    fn test_rate_limited_requires_403_and_zero_remaining() {
        let mut resp = RawResponse {
            status: 403,
            rate_limit_remaining: Some(0),
            ..Default::default()
        };
        assert!(resp.is_rate_limited());

        resp.rate_limit_remaining = Some(12);
        assert!(!resp.is_rate_limited());

        resp.rate_limit_remaining = None;
        assert!(!resp.is_rate_limited());

        resp.status = 429;
        resp.rate_limit_remaining = Some(0);
        assert!(!resp.is_rate_limited());
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("short", 10), "short");
        assert_eq!(truncate_body("abcdefghij", 4), "abcd...");
        assert_eq!(truncate_body("ééééé", 2), "éé...");
    }

    #[test]
    fn test_transport_debug_redacts_token() {
        let transport = ReqwestTransport::new(&ClientConfig::with_token("ghp_TransportSecret")).unwrap();
        let debug_output = format!("{:?}", transport);
        assert!(!debug_output.contains("ghp_TransportSecret"));
        assert!(debug_output.contains("<redacted>"));
    }
}
