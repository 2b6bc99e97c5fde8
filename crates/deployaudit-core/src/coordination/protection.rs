//! Environment protection lookup with a per-repository cache

use crate::http::RateLimitedClient;
use crate::traits::HttpTransport;
use crate::types::{Diagnostic, DiagnosticCategory, FetchOutcome, RepoRef};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Protection state of one environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    /// At least one protection rule of any kind
    Protected,
    /// No rules, or the environment does not exist
    Unprotected,
    /// The configuration could not be fetched
    Unknown,
}

impl Protection {
    /// Only a confirmed rule counts; `Unknown` is treated as unprotected
    #[inline]
    pub fn is_protected(self) -> bool {
        self == Protection::Protected
    }
}

/// Resolves whether environments carry protection rules.
///
/// Each environment is fetched once per repository: results, including
/// `Unknown`, are cached by name until a different repository is resolved.
pub struct ProtectionResolver<'a, T: HttpTransport> {
    client: &'a RateLimitedClient<T>,
    repository: Option<RepoRef>,
    cache: HashMap<String, Protection>,
}

impl<'a, T: HttpTransport> ProtectionResolver<'a, T> {
    /// Create a resolver over the shared client
    pub fn new(client: &'a RateLimitedClient<T>) -> Self {
        Self {
            client,
            repository: None,
            cache: HashMap::new(),
        }
    }

    /// Protection state of `environment` in `repo`.
    ///
    /// Never fails: a fetch error is logged, recorded in `diagnostics` and
    /// reported as `Unknown`.
    pub async fn resolve(
        &mut self,
        repo: &RepoRef,
        environment: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Protection {
        if self.repository.as_ref() != Some(repo) {
            self.cache.clear();
            self.repository = Some(repo.clone());
        }
        if let Some(&cached) = self.cache.get(environment) {
            return cached;
        }

        let protection = match self.client.get_environment(repo, environment).await {
            FetchOutcome::Found(env) => {
                debug!(
                    repository = %repo,
                    environment,
                    rules = env.protection_rules.len(),
                    "Resolved environment"
                );
                if env.has_protection() {
                    Protection::Protected
                } else {
                    Protection::Unprotected
                }
            }
            FetchOutcome::Absent => {
                debug!(repository = %repo, environment, "Environment not found");
                Protection::Unprotected
            }
            FetchOutcome::Failed(e) => {
                warn!(repository = %repo, environment, error = %e, "Could not resolve environment");
                diagnostics.push(Diagnostic::soft_error(
                    DiagnosticCategory::Environment,
                    format!("{} environment {}: {}", repo, environment, e),
                ));
                Protection::Unknown
            }
        };

        self.cache.insert(environment.to_string(), protection);
        protection
    }

    /// `resolve` reduced to a flag; unknown counts as unprotected
    pub async fn has_protection(
        &mut self,
        repo: &RepoRef,
        environment: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> bool {
        self.resolve(repo, environment, diagnostics)
            .await
            .is_protected()
    }
}
