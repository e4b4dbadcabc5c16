pub mod crawl;
pub mod report;

pub use crawl::{execute_crawl, extract_url_path, CrawlOptions, CrawlOutcome};
pub use report::{render, render_text, write_endpoints_file, write_report, CrawlSummary, ReportFormat};

const BANNER: &str = r#"
   ___ _   _ _ __ / _| __ _  ___ ___
  / __| | | | '__| |_ / _` |/ __/ _ \
  \__ \ |_| | |  |  _| (_| | (_|  __/
  |___/\__,_|_|  |_|  \__,_|\___\___|

  attack-surface crawler and endpoint extractor
"#;

pub fn print_banner() {
    println!("{}", BANNER);
}
