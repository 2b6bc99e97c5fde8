//! Scripted GitHub API for integration tests

#![allow(dead_code)]

use deployaudit_core::http::RawResponse;
use deployaudit_core::{ClientConfig, HttpTransport, RateLimitedClient, Result};
use parking_lot::Mutex;
use std::collections::HashMap;

pub const API: &str = "https://api.github.com";

/// Serves fixed responses by exact URL path; unknown paths answer 404
#[derive(Default)]
pub struct FakeGitHub {
    routes: HashMap<String, RawResponse>,
    requests: Mutex<Vec<String>>,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `path` with 200 and `body`
    pub fn json(self, path: &str, body: serde_json::Value) -> Self {
        self.respond(path, 200, &body.to_string())
    }

    /// Answer `path` with an arbitrary status
    pub fn respond(mut self, path: &str, status: u16, body: &str) -> Self {
        self.routes.insert(
            format!("{}{}", API, path),
            RawResponse {
                status,
                body: body.to_string(),
                ..Default::default()
            },
        );
        self
    }

    /// Paths requested so far, in order
    pub fn requested(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|url| url.trim_start_matches(API).to_string())
            .collect()
    }

    /// How many times `path` was requested
    pub fn hits(&self, path: &str) -> usize {
        self.requested().iter().filter(|p| *p == path).count()
    }
}

impl HttpTransport for FakeGitHub {
    type GetFuture<'a> = std::future::Ready<Result<RawResponse>>;

    fn get<'a>(&'a self, url: &'a str, _query: &'a [(String, String)]) -> Self::GetFuture<'a> {
        self.requests.lock().push(url.to_string());
        let response = self.routes.get(url).cloned().unwrap_or(RawResponse {
            status: 404,
            body: r#"{"message":"Not Found"}"#.to_string(),
            ..Default::default()
        });
        std::future::ready(Ok(response))
    }
}

/// Client over `fake` that gives up on the first failure
pub fn client(fake: FakeGitHub) -> RateLimitedClient<FakeGitHub> {
    let config = ClientConfig {
        max_attempts: 1,
        ..ClientConfig::with_token("test-token")
    };
    RateLimitedClient::with_transport(fake, config)
}
