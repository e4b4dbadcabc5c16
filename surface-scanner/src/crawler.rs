use crate::classify::{classify, matches_api_pattern, LinkTag};
use crate::error::{Result, ScanError};
use crate::extract::EndpointExtractor;
use crate::result::CrawlReport;
use reqwest::Client;
use scraper::{Html, Node, Selector};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// Fixed UA for every outbound request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Frontier-and-workers crawl controller, bounded by a single target
/// origin. Owns the visited set; no URL is ever fetched twice.
pub struct Crawler {
    client: Client,
    visited: Arc<Mutex<HashSet<String>>>,
    report: Arc<Mutex<CrawlReport>>,
    progress_callback: Option<ProgressCallback>,
    cancel: CancellationToken,
}

impl Crawler {
    pub fn new() -> Self {
        Self::with_config(10, false)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self::with_config(timeout_secs, false)
    }

    /// TLS verification is off by default: scan targets frequently use
    /// self-signed certificates. `verify_tls` turns it back on.
    pub fn with_config(timeout_secs: u64, verify_tls: bool) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(timeout_secs.div_ceil(2)))
            .danger_accept_invalid_certs(!verify_tls)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            visited: Arc::new(Mutex::new(HashSet::new())),
            report: Arc::new(Mutex::new(CrawlReport::new())),
            progress_callback: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// A cancelled token stops new fetches; in-flight fetches finish
    /// and partial results are returned.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub async fn crawl(&self, seed_url: &str, workers: usize) -> Result<CrawlReport> {
        info!("Starting crawl of {} with {} workers", seed_url, workers);

        let parsed = Url::parse(seed_url)
            .map_err(|e| ScanError::InvalidSeed(format!("{}: {}", seed_url, e)))?;

        // Store the seed in normalized form so a later "/" link
        // resolves to the same visited-set entry.
        let seed = parsed.to_string();

        // The origin string links are classified against. Trailing
        // slash is trimmed so "https://t.example/" and
        // "https://t.example" classify identically.
        let target_origin = seed_url.trim_end_matches('/').to_string();

        {
            let mut visited = self.visited.lock().await;
            visited.insert(seed.clone());
        }

        // Worker-owned queues; new URLs are dealt round-robin.
        let worker_queues: Arc<Vec<Mutex<VecDeque<String>>>> =
            Arc::new((0..workers).map(|_| Mutex::new(VecDeque::new())).collect());

        {
            let mut queue = worker_queues[0].lock().await;
            queue.push_back(seed);
        }

        // URLs dequeued but not yet fully processed. Workers may only
        // exit when every queue is drained AND this is zero: a sibling
        // mid-fetch can still discover new work.
        let in_flight = Arc::new(AtomicUsize::new(0));

        let mut worker_handles = Vec::new();

        for worker_id in 0..workers {
            let client = self.client.clone();
            let target_origin = target_origin.clone();
            let progress_cb = self.progress_callback.clone();
            let visited = self.visited.clone();
            let report = self.report.clone();
            let cancel = self.cancel.clone();
            let worker_queues = worker_queues.clone();
            let in_flight = in_flight.clone();

            let handle = tokio::spawn(async move {
                debug!("Worker {} started", worker_id);
                let extractor = EndpointExtractor::with_client(client.clone());
                let mut empty_iterations = 0;
                const MAX_EMPTY_ITERATIONS: usize = 10;

                loop {
                    if cancel.is_cancelled() {
                        debug!("Worker {} cancelled", worker_id);
                        break;
                    }

                    let work_item = {
                        let mut queue = worker_queues[worker_id].lock().await;
                        let item = queue.pop_front();
                        // Counted under the queue lock, so an item can
                        // never be invisible to both the queues and
                        // the counter during the handoff.
                        if item.is_some() {
                            in_flight.fetch_add(1, Ordering::SeqCst);
                        }
                        item
                    };

                    let url = match work_item {
                        Some(url) => {
                            empty_iterations = 0;
                            url
                        }
                        None => {
                            // Own queue empty: exit once every queue
                            // stays drained, with nothing in flight,
                            // for a few consecutive checks.
                            if Self::all_queues_empty(&worker_queues).await
                                && in_flight.load(Ordering::SeqCst) == 0
                            {
                                empty_iterations += 1;
                                if empty_iterations >= MAX_EMPTY_ITERATIONS {
                                    debug!("Worker {} exiting", worker_id);
                                    break;
                                }
                            } else {
                                empty_iterations = 0;
                            }

                            tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
                            continue;
                        }
                    };

                    if let Some(ref callback) = progress_cb {
                        callback(worker_id, url.clone());
                    }

                    let discovered = Self::visit_page(
                        &client,
                        &extractor,
                        &url,
                        &target_origin,
                        &report,
                    )
                    .await;

                    // Enqueue unseen internal links. The check and the
                    // insert happen under one lock so two workers can
                    // never claim the same URL.
                    let mut target_worker = worker_id;
                    for new_url in discovered {
                        let should_queue = {
                            let mut visited_lock = visited.lock().await;
                            visited_lock.insert(new_url.clone())
                        };

                        if should_queue {
                            debug!("[Worker {}] Queuing {}", worker_id, new_url);
                            let mut queue = worker_queues[target_worker].lock().await;
                            queue.push_back(new_url);
                            drop(queue);

                            target_worker = (target_worker + 1) % worker_queues.len();
                        }
                    }

                    // Discoveries are enqueued before the item is
                    // considered done.
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }

                debug!("Worker {} finished", worker_id);
            });

            worker_handles.push(handle);
        }

        for handle in worker_handles {
            handle.await?;
        }

        let mut report = self.report.lock().await.clone();
        report.visited = self.visited.lock().await.clone();
        info!(
            "Crawl complete. Visited {} pages, {} hidden, {} sensitive, {} api, {} external",
            report.visited.len(),
            report.hidden_pages.len(),
            report.sensitive_links.len(),
            report.api_endpoints.len(),
            report.external_links.len()
        );
        Ok(report)
    }

    async fn all_queues_empty(worker_queues: &Arc<Vec<Mutex<VecDeque<String>>>>) -> bool {
        for queue in worker_queues.iter() {
            if !queue.lock().await.is_empty() {
                return false;
            }
        }
        true
    }

    /// Fetch one page, fold everything it reveals into the report, and
    /// return the internal link candidates to enqueue. Failures are
    /// recorded and never propagate; the crawl carries on.
    async fn visit_page(
        client: &Client,
        extractor: &EndpointExtractor,
        url: &str,
        target_origin: &str,
        report: &Arc<Mutex<CrawlReport>>,
    ) -> Vec<String> {
        debug!("Fetching {}", url);

        let response = match client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Error crawling {}: {}", url, e);
                report.lock().await.record_failure(url, e.to_string());
                return Vec::new();
            }
        };

        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            info!("Protected page found: {}", url);
            report.lock().await.hidden_pages.insert(url.to_string());
            return Vec::new();
        }

        if status != 200 {
            report
                .lock()
                .await
                .record_failure(url, format!("HTTP {}", status));
            return Vec::new();
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        // Best-effort HTML parse: anything served without a content
        // type is treated as a page, non-HTML bodies are skipped.
        let parse_as_html = content_type
            .as_ref()
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(true);

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Error reading body from {}: {}", url, e);
                report.lock().await.record_failure(url, e.to_string());
                return Vec::new();
            }
        };

        if !parse_as_html {
            return Vec::new();
        }

        let (links, scripts) = Self::extract_page_targets(&body, url);

        let mut to_enqueue = Vec::new();
        {
            let mut report = report.lock().await;
            for link in &links {
                let tags = classify(link, target_origin);
                if tags.contains(&LinkTag::External) {
                    report.external_links.insert(link.clone());
                    continue;
                }
                if tags.contains(&LinkTag::Sensitive) {
                    report.sensitive_links.insert(link.clone());
                }
                if tags.contains(&LinkTag::Api) {
                    report.api_endpoints.insert(link.clone());
                }
                to_enqueue.push(link.clone());
            }
        }

        // Per-page ordering: a page's scripts are mined before its
        // processing completes, so their endpoints land in the report
        // with the page that revealed them.
        for script_url in scripts {
            if !script_url.contains(target_origin) {
                continue;
            }
            let endpoints = extractor.extract_from_url(&script_url).await;
            if endpoints.is_empty() {
                continue;
            }
            debug!("{}: {} endpoints extracted", script_url, endpoints.len());

            let mut report = report.lock().await;
            for endpoint in endpoints {
                if matches_api_pattern(&endpoint.raw) {
                    report.api_endpoints.insert(endpoint.raw.clone());
                }
                // A script referenced from several pages is mined once
                // per reference; keep the endpoint list unique.
                if !report.endpoints.contains(&endpoint) {
                    report.endpoints.push(endpoint);
                }
            }
        }

        to_enqueue
    }

    /// Collect `<a href>`, `<link href>`, `<script src>`, `<img src>`
    /// targets resolved to absolute URLs, plus script sources
    /// separately for endpoint extraction. Malformed HTML is parsed
    /// best-effort; absent nodes yield no links.
    fn extract_page_targets(html: &str, current_url: &str) -> (Vec<String>, Vec<String>) {
        let document = Html::parse_document(html);

        let (comments, hidden_inputs) = Self::page_observations(&document);
        for comment in &comments {
            debug!("{}: HTML comment: {}", current_url, comment);
        }
        for name in &hidden_inputs {
            info!("{}: hidden input field '{}'", current_url, name);
        }

        let href_selector = Selector::parse("a[href], link[href]").unwrap();
        let src_selector = Selector::parse("script[src], img[src]").unwrap();
        let script_selector = Selector::parse("script[src]").unwrap();

        let mut links = Vec::new();

        for element in document.select(&href_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute) = Self::resolve_url(current_url, href) {
                    links.push(absolute);
                }
            }
        }
        for element in document.select(&src_selector) {
            if let Some(src) = element.value().attr("src") {
                if let Some(absolute) = Self::resolve_url(current_url, src) {
                    links.push(absolute);
                }
            }
        }

        let mut scripts = Vec::new();
        for element in document.select(&script_selector) {
            if let Some(src) = element.value().attr("src") {
                if let Some(absolute) = Self::resolve_url(current_url, src) {
                    scripts.push(absolute);
                }
            }
        }

        (links, scripts)
    }

    /// HTML comments and hidden form input names on a page. Both
    /// routinely leak internal paths and parameter names, so they are
    /// surfaced as log events while the page is processed.
    fn page_observations(document: &Html) -> (Vec<String>, Vec<String>) {
        let mut comments = Vec::new();
        for node in document.tree.nodes() {
            if let Node::Comment(comment) = node.value() {
                let text = comment.trim();
                if !text.is_empty() {
                    comments.push(text.to_string());
                }
            }
        }

        let hidden_selector = Selector::parse(r#"input[type="hidden"]"#).unwrap();
        let mut hidden_inputs = Vec::new();
        for element in document.select(&hidden_selector) {
            let name = element.value().attr("name").unwrap_or("unnamed");
            hidden_inputs.push(name.to_string());
        }

        (comments, hidden_inputs)
    }

    fn resolve_url(base: &str, href: &str) -> Option<String> {
        // Skip empty, javascript:, mailto:, tel:, fragments.
        if href.is_empty()
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with('#')
        {
            return None;
        }

        let base_url = Url::parse(base).ok()?;
        let mut resolved = base_url.join(href).ok()?;
        resolved.set_fragment(None);

        Some(resolved.to_string())
    }

    pub async fn get_visited_count(&self) -> usize {
        self.visited.lock().await.len()
    }
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_html(server: &MockServer, at: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(body.into_bytes()),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn sensitive_link_lands_in_sensitive_set() {
        let server = MockServer::start().await;

        mount_html(
            &server,
            "/",
            r#"<html><body><a href="/admin/login">admin</a></body></html>"#.to_string(),
        )
        .await;
        mount_html(&server, "/admin/login", "<html><body>login</body></html>".to_string()).await;

        let crawler = Crawler::new();
        let report = crawler.crawl(&server.uri(), 2).await.unwrap();

        let expected = format!("{}/admin/login", server.uri());
        assert!(report.sensitive_links.contains(&expected));
        assert!(report.visited.contains(&expected));
    }

    #[tokio::test]
    async fn js_endpoints_fold_into_api_set() {
        let server = MockServer::start().await;

        mount_html(
            &server,
            "/",
            r#"<html><head><script src="/static/app.js"></script></head></html>"#.to_string(),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/static/app.js"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/javascript")
                    .set_body_bytes(br#"fetch("/api/v2/users/123").then(r=>r.json());"#.to_vec()),
            )
            .mount(&server)
            .await;

        let crawler = Crawler::new();
        let report = crawler.crawl(&server.uri(), 2).await.unwrap();

        assert!(report.api_endpoints.contains("/api/v2/users/123"));
        assert!(report
            .endpoints
            .iter()
            .any(|e| e.raw == "/api/v2/users/123"));
    }

    #[tokio::test]
    async fn external_links_are_recorded_never_fetched() {
        let server = MockServer::start().await;

        mount_html(
            &server,
            "/",
            r#"<html><body><a href="https://other-domain.example/page">out</a></body></html>"#
                .to_string(),
        )
        .await;

        let crawler = Crawler::new();
        let report = crawler.crawl(&server.uri(), 2).await.unwrap();

        assert!(report
            .external_links
            .contains("https://other-domain.example/page"));
        assert!(!report.visited.contains("https://other-domain.example/page"));
    }

    #[tokio::test]
    async fn forbidden_page_is_hidden_and_crawl_continues() {
        let server = MockServer::start().await;

        mount_html(
            &server,
            "/",
            r#"<html><body><a href="/secret">s</a><a href="/open">o</a></body></html>"#.to_string(),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/secret"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        mount_html(&server, "/open", "<html><body>open</body></html>".to_string()).await;

        let crawler = Crawler::new();
        let report = crawler.crawl(&server.uri(), 2).await.unwrap();

        assert!(report
            .hidden_pages
            .contains(&format!("{}/secret", server.uri())));
        assert!(report.visited.contains(&format!("{}/open", server.uri())));
    }

    #[tokio::test]
    async fn cyclic_graph_terminates_with_each_page_fetched_once() {
        let server = MockServer::start().await;

        mount_html(
            &server,
            "/",
            r#"<html><body><a href="/a">a</a></body></html>"#.to_string(),
        )
        .await;
        mount_html(
            &server,
            "/a",
            r#"<html><body><a href="/b">b</a><a href="/">home</a></body></html>"#.to_string(),
        )
        .await;
        mount_html(
            &server,
            "/b",
            r#"<html><body><a href="/a">a</a><a href="/b">self</a></body></html>"#.to_string(),
        )
        .await;

        let crawler = Crawler::new();
        let report = crawler.crawl(&server.uri(), 3).await.unwrap();

        // seed + /a + /b, each exactly once
        assert_eq!(report.visited.len(), 3);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn server_error_is_recorded_and_crawl_continues() {
        let server = MockServer::start().await;

        mount_html(
            &server,
            "/",
            r#"<html><body><a href="/broken">x</a><a href="/fine">y</a></body></html>"#.to_string(),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mount_html(&server, "/fine", "<html><body>ok</body></html>".to_string()).await;

        let crawler = Crawler::new();
        let report = crawler.crawl(&server.uri(), 2).await.unwrap();

        assert!(report
            .failures
            .iter()
            .any(|f| f.url.ends_with("/broken") && f.message.contains("500")));
        assert!(report.visited.contains(&format!("{}/fine", server.uri())));
    }

    #[tokio::test]
    async fn img_and_link_tags_are_discovered() {
        let server = MockServer::start().await;

        mount_html(
            &server,
            "/",
            r#"<html><head><link href="/style/backup.css" rel="stylesheet"></head>
               <body><img src="/images/logo.png"></body></html>"#
                .to_string(),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/style/backup.css"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/css"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/images/logo.png"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/png"))
            .mount(&server)
            .await;

        let crawler = Crawler::new();
        let report = crawler.crawl(&server.uri(), 2).await.unwrap();

        // "backup" is on the sensitive denylist
        assert!(report
            .sensitive_links
            .contains(&format!("{}/style/backup.css", server.uri())));
        assert!(report
            .visited
            .contains(&format!("{}/images/logo.png", server.uri())));
    }

    #[tokio::test]
    async fn cancelled_crawl_returns_partial_results() {
        let server = MockServer::start().await;

        mount_html(
            &server,
            "/",
            r#"<html><body><a href="/next">n</a></body></html>"#.to_string(),
        )
        .await;
        mount_html(&server, "/next", "<html></html>".to_string()).await;

        let token = CancellationToken::new();
        token.cancel();

        let crawler = Crawler::new().with_cancellation(token);
        let report = crawler.crawl(&server.uri(), 2).await.unwrap();

        // Nothing was fetched, but the call returns cleanly with the
        // seed marked visited.
        assert!(report.visited.contains(&format!("{}/", server.uri())));
        assert!(report.hidden_pages.is_empty());
    }

    #[tokio::test]
    async fn invalid_seed_is_fatal() {
        let crawler = Crawler::new();
        let err = crawler.crawl("not a url", 1).await.unwrap_err();
        assert!(matches!(err, ScanError::InvalidSeed(_)));
    }

    async fn mount_slow_html(server: &MockServer, at: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_delay(std::time::Duration::from_millis(500))
                    .set_body_bytes(body.as_bytes().to_vec()),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn slow_responses_do_not_strand_the_crawl() {
        let server = MockServer::start().await;

        // Every response takes far longer than a worker's idle-exit
        // window, so idle workers must wait on their fetching sibling
        // instead of exiting.
        mount_slow_html(
            &server,
            "/",
            r#"<html><body><a href="/p1">1</a><a href="/p2">2</a>
               <a href="/p3">3</a><a href="/p4">4</a></body></html>"#,
        )
        .await;
        for page in ["/p1", "/p2", "/p3", "/p4"] {
            mount_slow_html(&server, page, "<html><body>page</body></html>").await;
        }

        let crawler = Crawler::new();
        let report = tokio::time::timeout(
            std::time::Duration::from_secs(20),
            crawler.crawl(&server.uri(), 2),
        )
        .await
        .expect("crawl must terminate on a slow site")
        .unwrap();

        assert_eq!(report.visited.len(), 5);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn comments_and_hidden_inputs_are_observed() {
        let html = r#"<html><body>
            <!-- staging mirror: /old-api -->
            <form>
                <input type="hidden" name="csrf_token" value="abc">
                <input type="text" name="q">
            </form>
        </body></html>"#;

        let document = Html::parse_document(html);
        let (comments, hidden_inputs) = Crawler::page_observations(&document);

        assert_eq!(comments, vec!["staging mirror: /old-api"]);
        assert_eq!(hidden_inputs, vec!["csrf_token"]);
    }
}
