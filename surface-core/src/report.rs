use chrono::Utc;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use surface_scanner::result::{CrawlFailure, Endpoint};
use surface_scanner::HostInfo;

use crate::crawl::CrawlOutcome;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// Serializable scan summary. Set members are sorted so the same
/// crawl always renders the same document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub target: String,
    pub generated_at: String,
    pub pages_scanned: usize,
    pub hidden_pages: Vec<String>,
    pub external_links: Vec<String>,
    pub sensitive_links: Vec<String>,
    pub api_endpoints: Vec<String>,
    pub extracted_endpoints: Vec<Endpoint>,
    pub failures: Vec<CrawlFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_info: Option<HostInfo>,
}

impl CrawlSummary {
    pub fn build(outcome: &CrawlOutcome) -> Self {
        let report = &outcome.report;

        let mut hidden_pages: Vec<String> = report.hidden_pages.iter().cloned().collect();
        let mut external_links: Vec<String> = report.external_links.iter().cloned().collect();
        let mut sensitive_links: Vec<String> = report.sensitive_links.iter().cloned().collect();
        let mut api_endpoints: Vec<String> = report.api_endpoints.iter().cloned().collect();
        hidden_pages.sort();
        external_links.sort();
        sensitive_links.sort();
        api_endpoints.sort();

        Self {
            target: outcome.target.clone(),
            generated_at: Utc::now().to_rfc3339(),
            pages_scanned: report.pages_scanned(),
            hidden_pages,
            external_links,
            sensitive_links,
            api_endpoints,
            extracted_endpoints: report.endpoints.clone(),
            failures: report.failures.clone(),
            host_ip: outcome.host_ip.clone(),
            host_info: outcome.host_info.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn push_section(out: &mut String, heading: String, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push('\n');
    out.push_str(&heading);
    out.push('\n');
    for item in items {
        out.push_str(&format!("  └─ {}\n", item));
    }
}

/// Render the colorized console summary.
pub fn render_text(summary: &CrawlSummary) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", "=".repeat(52).green()));
    out.push_str(&format!(
        "{}\n",
        format!("Scan Summary for {}", summary.target).green().bold()
    ));
    out.push_str(&format!("{}\n", "=".repeat(52).green()));

    out.push_str(&format!(
        "\n{} Total Pages Scanned: {}\n",
        "[+]".cyan(),
        summary.pages_scanned
    ));

    push_section(
        &mut out,
        format!(
            "{} Protected Pages ({}):",
            "[!]".yellow(),
            summary.hidden_pages.len()
        ),
        &summary.hidden_pages,
    );
    push_section(
        &mut out,
        format!(
            "{} API Endpoints ({}):",
            "[+]".magenta(),
            summary.api_endpoints.len()
        ),
        &summary.api_endpoints,
    );
    push_section(
        &mut out,
        format!(
            "{} Potentially Sensitive URLs ({}):",
            "[!]".red(),
            summary.sensitive_links.len()
        ),
        &summary.sensitive_links,
    );
    push_section(
        &mut out,
        format!(
            "{} External Links ({}):",
            "[+]".blue(),
            summary.external_links.len()
        ),
        &summary.external_links,
    );

    if !summary.extracted_endpoints.is_empty() {
        out.push_str(&format!(
            "\n{} JS Endpoints ({}):\n",
            "[+]".cyan(),
            summary.extracted_endpoints.len()
        ));
        for endpoint in &summary.extracted_endpoints {
            out.push_str(&format!("  └─ {}  ({})\n", endpoint.raw, endpoint.origin));
        }
    }

    if !summary.failures.is_empty() {
        out.push_str(&format!(
            "\n{} Errors ({}):\n",
            "[-]".red(),
            summary.failures.len()
        ));
        for failure in &summary.failures {
            out.push_str(&format!("  └─ {}: {}\n", failure.url, failure.message));
        }
    }

    if let Some(ref info) = summary.host_info {
        out.push('\n');
        out.push_str(&format!("{}\n", "Host Information".green().bold()));
        if let Some(ref ip) = summary.host_ip {
            out.push_str(&format!("  IP: {}\n", ip));
        }
        out.push_str(&format!(
            "  OS: {}\n",
            info.os.as_deref().unwrap_or("Unknown")
        ));
        out.push_str(&format!(
            "  Organization: {}\n",
            info.org.as_deref().unwrap_or("Unknown")
        ));
        let ports: Vec<String> = info.ports.iter().map(|p| p.to_string()).collect();
        out.push_str(&format!("  Open Ports: {}\n", ports.join(", ")));
        out.push_str(&format!(
            "  Location: {}, {}\n",
            info.city.as_deref().unwrap_or("Unknown"),
            info.country.as_deref().unwrap_or("Unknown")
        ));
        out.push_str(&format!(
            "  Last Update: {}\n",
            info.last_update.as_deref().unwrap_or("Unknown")
        ));
        if !info.vulnerabilities.is_empty() {
            out.push_str(&format!("  {}\n", "Found Vulnerabilities:".red().bold()));
            for vuln in &info.vulnerabilities {
                out.push_str(&format!("  - {}\n", vuln));
            }
        }
    }

    out
}

/// Render in the requested format.
pub fn render(summary: &CrawlSummary, format: &ReportFormat) -> String {
    match format {
        ReportFormat::Text => render_text(summary),
        ReportFormat::Json => summary.to_json().unwrap_or_else(|e| {
            format!("{{\"error\": \"failed to serialize report: {}\"}}", e)
        }),
    }
}

pub fn write_report(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())
}

/// One endpoint string per line, UTF-8, newline-terminated, no header.
pub fn write_endpoints_file(path: &Path, endpoints: &[Endpoint]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    for endpoint in endpoints {
        writeln!(file, "{}", endpoint.raw)?;
    }
    Ok(())
}
