use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Host reputation/metadata for a resolved IP. Fields the lookup
/// service omits simply stay empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostInfo {
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub org: Option<String>,
    #[serde(default)]
    pub isp: Option<String>,
    #[serde(default)]
    pub asn: Option<String>,
    #[serde(default)]
    pub ports: Vec<u16>,
    #[serde(default)]
    pub hostnames: Vec<String>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, rename = "country_name")]
    pub country: Option<String>,
    #[serde(default)]
    pub last_update: Option<String>,
    #[serde(default, rename = "vulns")]
    pub vulnerabilities: Vec<String>,
}

/// Host-reputation lookup, consumed once after a crawl completes.
/// Implementations must never make the caller fail: any trouble is
/// "no data available".
#[async_trait]
pub trait HostLookup: Send + Sync {
    async fn lookup(&self, ip: &str) -> Option<HostInfo>;
}

/// Shodan-backed implementation of [`HostLookup`].
pub struct ShodanLookup {
    client: Client,
    api_key: String,
}

impl ShodanLookup {
    const API_BASE: &'static str = "https://api.shodan.io/shodan/host";

    /// Returns `None` when no key was supplied, so enrichment is
    /// skipped rather than attempted and failed.
    pub fn new(api_key: Option<String>) -> Option<Self> {
        let api_key = api_key.filter(|k| !k.trim().is_empty())?;
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("Failed to create HTTP client");
        Some(Self { client, api_key })
    }
}

#[async_trait]
impl HostLookup for ShodanLookup {
    async fn lookup(&self, ip: &str) -> Option<HostInfo> {
        let url = format!("{}/{}?key={}", Self::API_BASE, ip, self.api_key);

        let resp = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Host lookup unavailable for {}: {}", ip, e);
                return None;
            }
        };

        if !resp.status().is_success() {
            warn!("Host lookup for {} returned {}", ip, resp.status());
            return None;
        }

        match resp.json::<HostInfo>().await {
            Ok(info) => {
                debug!("Host lookup for {} returned data", ip);
                Some(info)
            }
            Err(e) => {
                warn!("Host lookup for {} returned undecodable data: {}", ip, e);
                None
            }
        }
    }
}

/// Resolve the target's host to an IP for the lookup key. Any
/// resolution failure means enrichment is skipped.
pub async fn resolve_target_ip(target_url: &str) -> Option<String> {
    let parsed = Url::parse(target_url).ok()?;
    let host = parsed.host_str()?.to_string();
    let port = parsed.port_or_known_default().unwrap_or(80);

    let mut addrs = tokio::net::lookup_host((host.as_str(), port)).await.ok()?;
    addrs.next().map(|a| a.ip().to_string())
}
