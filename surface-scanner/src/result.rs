use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An endpoint string pulled out of a JavaScript source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// The matched string, quoting stripped.
    pub raw: String,
    /// The JS source URL or local path it came from.
    pub origin: String,
}

impl Endpoint {
    pub fn new(raw: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            origin: origin.into(),
        }
    }
}

/// A per-URL failure recorded during the crawl. Failures never abort
/// the crawl; they are carried into the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlFailure {
    pub url: String,
    pub message: String,
}

/// Everything one crawl run produced. Uniqueness within each set is
/// the invariant; insertion order is not significant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlReport {
    /// Every URL that was fetched (or attempted) exactly once.
    pub visited: HashSet<String>,
    /// URLs that answered 401/403.
    pub hidden_pages: HashSet<String>,
    /// Links leaving the target origin. Recorded, never fetched.
    pub external_links: HashSet<String>,
    /// Internal URLs matching a sensitive pattern.
    pub sensitive_links: HashSet<String>,
    /// Internal URLs or JS-extracted strings matching an API pattern.
    pub api_endpoints: HashSet<String>,
    /// JS-extracted endpoint strings, first-seen order per source.
    pub endpoints: Vec<Endpoint>,
    /// Transport errors and unexpected statuses, one entry per URL.
    pub failures: Vec<CrawlFailure>,
}

impl CrawlReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_failure(&mut self, url: impl Into<String>, message: impl Into<String>) {
        self.failures.push(CrawlFailure {
            url: url.into(),
            message: message.into(),
        });
    }

    /// Total pages attempted, hidden pages included.
    pub fn pages_scanned(&self) -> usize {
        self.visited.len()
    }
}
