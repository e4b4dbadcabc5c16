use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use surface_scanner::enrich::{resolve_target_ip, HostLookup, ShodanLookup};
use surface_scanner::{CrawlReport, Crawler, HostInfo};
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub url: String,
    pub threads: usize,
    pub timeout_secs: u64,
    pub verify_tls: bool,
    pub shodan_key: Option<String>,
    pub show_progress_bars: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            url: String::new(),
            threads: 10,
            timeout_secs: 10,
            verify_tls: false,
            shodan_key: None,
            show_progress_bars: true,
        }
    }
}

/// A finished crawl plus the optional post-crawl host lookup.
pub struct CrawlOutcome {
    pub target: String,
    pub report: CrawlReport,
    pub host_ip: Option<String>,
    pub host_info: Option<HostInfo>,
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Execute a crawl with the given options, then run the host lookup
/// once against the resolved target IP. Lookup trouble never touches
/// the crawl results.
pub async fn execute_crawl(
    options: CrawlOptions,
    cancel: CancellationToken,
) -> Result<CrawlOutcome, String> {
    let CrawlOptions {
        url,
        threads,
        timeout_secs,
        verify_tls,
        shodan_key,
        show_progress_bars,
    } = options;

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));

    let internal_progress_callback: surface_scanner::crawler::ProgressCallback =
        if let Some(ref pb) = progress_bar {
            let pb_clone = pb.clone();
            let count_clone = processed_count.clone();
            Arc::new(move |_worker_id: usize, _url: String| {
                let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
                pb_clone.set_message(format!("Crawling... {} URLs processed", count));
                pb_clone.tick();
            })
        } else {
            Arc::new(|_worker_id: usize, _url: String| {})
        };

    let crawler = Crawler::with_config(timeout_secs, verify_tls)
        .with_progress_callback(internal_progress_callback)
        .with_cancellation(cancel);

    let report = crawler
        .crawl(&url, threads)
        .await
        .map_err(|e| format!("Failed to crawl {}: {}", url, e))?;

    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl complete! {} URLs processed", total));
    }

    // Enrichment runs once, after the crawl, on its own timeout.
    let mut host_ip = None;
    let mut host_info = None;
    if let Some(lookup) = ShodanLookup::new(shodan_key) {
        if let Some(ip) = resolve_target_ip(&url).await {
            info!("Looking up host data for {}", ip);
            host_info = lookup.lookup(&ip).await;
            host_ip = Some(ip);
        } else {
            info!("Could not resolve {}; skipping host lookup", url);
        }
    } else {
        info!("No API key supplied; skipping host lookup");
    }

    Ok(CrawlOutcome {
        target: url,
        report,
        host_ip,
        host_info,
    })
}
