// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::normalize_seed;

// Re-export crawl functionality from surface-core
pub use surface_core::crawl::{execute_crawl, extract_url_path, CrawlOptions, CrawlOutcome};
pub use surface_core::report::{CrawlSummary, ReportFormat};
