use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Substrings suggesting an administrative, debug, or
/// credential-adjacent resource.
pub const SENSITIVE_PATTERNS: &[&str] = &[
    "admin",
    "login",
    "wp-admin",
    "dashboard",
    "config",
    "backup",
    "db",
    "database",
    "dev",
    "test",
    "phpinfo",
    "info.php",
    ".git",
    ".env",
    "robots.txt",
    "sitemap.xml",
    ".htaccess",
    "console",
];

/// Substrings suggesting a programmatic/service endpoint rather than a
/// rendered page.
pub const API_PATTERNS: &[&str] = &[
    "/api/",
    "/v1/",
    "/v2/",
    "/v3/",
    "/rest/",
    "/graphql",
    "/swagger",
    "/docs/api",
    "/api-docs",
    "/api/v1/",
    "/wp-json/",
    "/api/swagger",
    "/openapi",
    "/redoc",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkTag {
    Internal,
    External,
    Sensitive,
    Api,
}

/// Classify an absolute URL against the target origin.
///
/// Pure function of its inputs and the fixed pattern tables: calling
/// it twice yields identical tag sets. Matching is substring-based,
/// not path-segment-based, which deliberately favors recall over
/// precision.
pub fn classify(url: &str, target_origin: &str) -> HashSet<LinkTag> {
    let origin = target_origin.trim_end_matches('/');
    let mut tags = HashSet::new();

    if !url.contains(origin) {
        tags.insert(LinkTag::External);
        return tags;
    }
    tags.insert(LinkTag::Internal);

    // Everything after the origin prefix, case-folded.
    let path = url
        .splitn(2, origin)
        .nth(1)
        .unwrap_or_default()
        .to_lowercase();

    if SENSITIVE_PATTERNS.iter().any(|p| path.contains(p)) {
        tags.insert(LinkTag::Sensitive);
    }
    if API_PATTERNS.iter().any(|p| path.contains(p)) {
        tags.insert(LinkTag::Api);
    }

    tags
}

/// True when a bare string (typically a JS-extracted endpoint, not an
/// absolute URL) carries an API-pattern substring.
pub fn matches_api_pattern(s: &str) -> bool {
    let lower = s.to_lowercase();
    API_PATTERNS.iter().any(|p| lower.contains(p))
}
