use clap::ArgMatches;
use colored::Colorize;
use std::path::PathBuf;
use surface_core::crawl::{execute_crawl, CrawlOptions};
use surface_core::report::{render, write_endpoints_file, write_report, CrawlSummary, ReportFormat};
use surface_scanner::{EndpointExtractor, ScanError};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Parse a seed argument, adding http:// when the scheme is missing.
pub fn normalize_seed(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    // "host:port" parses as a scheme of "host", so require a real
    // http(s) scheme before accepting the input as-is.
    if let Ok(parsed) = Url::parse(trimmed) {
        if parsed.scheme() == "http" || parsed.scheme() == "https" {
            return Some(trimmed.to_string());
        }
    }

    let with_scheme = format!("http://{}", trimmed);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    None
}

pub async fn handle_crawl(sub_matches: &ArgMatches) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let raw_url = sub_matches.get_one::<String>("url").unwrap();
    let url = match normalize_seed(raw_url) {
        Some(url) => url,
        None => {
            eprintln!("{} Invalid target URL: {}", "[-]".red(), raw_url);
            std::process::exit(1);
        }
    };
    let threads = *sub_matches.get_one::<usize>("threads").unwrap_or(&10);
    let timeout_secs = *sub_matches.get_one::<u64>("timeout").unwrap_or(&10);
    let verify_tls = sub_matches.get_flag("verify-tls");
    let shodan_key = sub_matches.get_one::<String>("shodan-key").cloned();
    let output = sub_matches.get_one::<PathBuf>("output");
    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|s| ReportFormat::from_str(s.as_str()))
        .unwrap_or(ReportFormat::Text);

    println!("\n{} Starting crawl on {}", "[+]".green(), url);
    println!("Workers: {}", threads);
    println!("Timeout: {}s", timeout_secs);
    println!(
        "TLS verification: {}\n",
        if verify_tls { "on" } else { "off" }
    );

    let options = CrawlOptions {
        url,
        threads,
        timeout_secs,
        verify_tls,
        shodan_key,
        show_progress_bars: true,
    };

    // Ctrl-C stops new fetches; in-flight requests drain and the
    // partial report is still rendered.
    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n{} Cancellation requested, finishing up...", "[!]".yellow());
            cancel_on_signal.cancel();
        }
    });

    let outcome = match execute_crawl(options, cancel).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{} Crawl failed: {}", "[-]".red(), e);
            std::process::exit(1);
        }
    };

    let summary = CrawlSummary::build(&outcome);
    let rendered = render(&summary, &format);

    match output {
        Some(path) => match write_report(path, &rendered) {
            Ok(()) => println!("{} Report saved to {}", "[+]".green(), path.display()),
            Err(e) => {
                eprintln!("{} Failed to write {}: {}", "[-]".red(), path.display(), e);
                std::process::exit(1);
            }
        },
        None => print!("{}", rendered),
    }
}

pub async fn handle_extract(sub_matches: &ArgMatches) {
    tracing_subscriber::fmt::init();

    let input = sub_matches.get_one::<String>("input").unwrap();
    let output = sub_matches.get_one::<PathBuf>("output");
    let timeout_secs = *sub_matches.get_one::<u64>("timeout").unwrap_or(&10);

    let extractor = EndpointExtractor::with_timeout(timeout_secs);
    let endpoints = match extractor.extract(input).await {
        Ok(endpoints) => endpoints,
        Err(ScanError::InputNotFound(path)) => {
            eprintln!("{} Input not found: {}", "[-]".red(), path.display());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("{} Extraction failed: {}", "[-]".red(), e);
            std::process::exit(1);
        }
    };

    match output {
        Some(path) => match write_endpoints_file(path, &endpoints) {
            Ok(()) => println!(
                "{} {} endpoints saved to {}",
                "[+]".green(),
                endpoints.len(),
                path.display()
            ),
            Err(e) => {
                eprintln!("{} Failed to write {}: {}", "[-]".red(), path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            for endpoint in &endpoints {
                println!("{}", endpoint.raw);
            }
        }
    }
}
