pub mod beautify;
pub mod classify;
pub mod crawler;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod matcher;
pub mod result;

pub use classify::{classify, LinkTag};
pub use crawler::Crawler;
pub use enrich::{HostInfo, HostLookup, ShodanLookup};
pub use error::ScanError;
pub use extract::EndpointExtractor;
pub use result::{CrawlReport, Endpoint};
