use crate::beautify::beautify;
use crate::error::{Result, ScanError};
use crate::matcher::extract_candidates;
use crate::result::Endpoint;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Pulls endpoint strings out of JavaScript sources, fetched or local.
pub struct EndpointExtractor {
    client: Client,
}

impl EndpointExtractor {
    pub fn new() -> Self {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self::builder(timeout_secs, false)
    }

    /// TLS verification is off unless asked for: scan targets often
    /// present self-signed certificates.
    pub fn builder(timeout_secs: u64, verify_tls: bool) -> Self {
        let client = Client::builder()
            .user_agent(crate::crawler::USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    /// Wrap an already-configured client, so the crawler's pool and
    /// settings are shared when extraction runs mid-crawl.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Resolve the input and extract endpoints from it.
    ///
    /// An existing local file is read from disk; anything else is
    /// treated as a URL to GET. A connect failure yields an empty
    /// result with a warning; an input that is neither a file nor a
    /// URL is `InputNotFound`.
    pub async fn extract(&self, input: &str) -> Result<Vec<Endpoint>> {
        let path = Path::new(input);
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            return Ok(self.extract_from_text(&content, input));
        }

        if input.starts_with("http://") || input.starts_with("https://") || input.starts_with("//")
        {
            return Ok(self.extract_from_url(input).await);
        }

        Err(ScanError::InputNotFound(path.to_path_buf()))
    }

    /// Fetch a JS source and extract. Failure to connect is reported
    /// and yields an empty result, never an error.
    pub async fn extract_from_url(&self, url: &str) -> Vec<Endpoint> {
        let target = if url.starts_with("//") {
            format!("https:{}", url)
        } else {
            url.to_string()
        };

        let body = match self.client.get(&target).send().await {
            Ok(resp) => match resp.text().await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Error reading body from {}: {}", target, e);
                    return Vec::new();
                }
            },
            Err(e) => {
                warn!("Error connecting to {}: {}", target, e);
                return Vec::new();
            }
        };

        self.extract_from_text(&body, url)
    }

    /// Beautify then run the pattern table. Empty content is not an
    /// error; it extracts nothing.
    pub fn extract_from_text(&self, content: &str, origin: &str) -> Vec<Endpoint> {
        if content.is_empty() {
            return Vec::new();
        }

        let expanded = beautify(content);
        let candidates = extract_candidates(&expanded);
        debug!("{}: {} endpoint candidates", origin, candidates.len());

        candidates
            .into_iter()
            .map(|raw| Endpoint::new(raw, origin))
            .collect()
    }
}

impl Default for EndpointExtractor {
    fn default() -> Self {
        Self::new()
    }
}
