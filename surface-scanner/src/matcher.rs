use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

// One alternation, four shapes, tried in order on the same quote
// anchor. The regex engine prefers earlier branches at the same
// position, so a span that is both a full URL and incidentally a bare
// filename resolves as a URL.
//
// 1. protocol or protocol-relative URL with a dotted host
// 2. relative path (/, ./, ../) with a metacharacter denylist on the
//    first character
// 3. API-style path ending in a 1-4 letter extension or `action`,
//    optional query
// 4. bare filename with a recognized extension, optional query
static ENDPOINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"(?:"|')"#,
        r#"("#,
        r#"(?:[a-zA-Z]{1,10}://|//)[^"'/]+\.[a-zA-Z]{2,}[^"']*"#,
        r#"|"#,
        r#"(?:/|\.\./|\./)[^"'><,;| *()%$^/\\\[\]][^"'><,;|()]+"#,
        r#"|"#,
        r#"[a-zA-Z0-9_\-/]+/[a-zA-Z0-9_\-/]+\.(?:[a-zA-Z]{1,4}|action)(?:[?|/][^"|']*|)"#,
        r#"|"#,
        r#"[a-zA-Z0-9_\-]+\.(?:php|asp|aspx|jsp|json|action|html|js|txt|xml)(?:\?[^"|']*|)"#,
        r#")"#,
        r#"(?:"|')"#,
    ))
    .expect("endpoint pattern table must compile")
});

/// Pull candidate endpoint strings out of a text blob.
///
/// Only content delimited by a single- or double-quote pair is
/// considered; the quoting anchors the match and is stripped from the
/// result. Output order is left-to-right occurrence order; duplicate
/// spans collapse to the first occurrence.
pub fn extract_candidates(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for caps in ENDPOINT_RE.captures_iter(text) {
        if let Some(m) = caps.get(1) {
            let candidate = m.as_str();
            if !candidate.is_empty() && seen.insert(candidate.to_string()) {
                out.push(candidate.to_string());
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_url_span() {
        let got = extract_candidates(r#"var u = "https://api.example.com/v1/users";"#);
        assert_eq!(got, vec!["https://api.example.com/v1/users"]);
    }

    #[test]
    fn protocol_relative_url_span() {
        let got = extract_candidates(r#"src = '//cdn.example.com/app.js';"#);
        assert_eq!(got, vec!["//cdn.example.com/app.js"]);
    }

    #[test]
    fn relative_path_span() {
        let got = extract_candidates(r#"fetch("/api/v2/users/123")"#);
        assert_eq!(got, vec!["/api/v2/users/123"]);
    }

    #[test]
    fn dot_relative_path_span() {
        let got = extract_candidates(r#"load('./assets/data.json')"#);
        assert_eq!(got, vec!["./assets/data.json"]);
    }

    #[test]
    fn api_path_with_action_extension() {
        let got = extract_candidates(r#"post("user/save/profile.action?next=home")"#);
        assert_eq!(got, vec!["user/save/profile.action?next=home"]);
    }

    #[test]
    fn bare_filename_with_query() {
        let got = extract_candidates(r#"a.src="x.php?id=1""#);
        assert_eq!(got, vec!["x.php?id=1"]);
    }

    #[test]
    fn unquoted_text_is_ignored() {
        let got = extract_candidates("https://loose.example.com/path with no quotes");
        assert!(got.is_empty());
    }

    #[test]
    fn template_metacharacter_blocks_relative_path() {
        // First char after the slash is denylisted.
        let got = extract_candidates(r#"path = "/%7Btemplate%7D/x""#);
        assert!(got.is_empty());
    }

    #[test]
    fn precedence_url_over_bare_filename() {
        // Ends in .html so it also looks like alternative 4, but the
        // full-URL branch wins on the same anchor.
        let got = extract_candidates(r#"href = "https://www.example.com/docs/index.html""#);
        assert_eq!(got, vec!["https://www.example.com/docs/index.html"]);
    }

    #[test]
    fn duplicates_collapse_to_first_occurrence() {
        let text = r#"
            fetch("/api/v1/a");
            fetch("/api/v1/b");
            fetch("/api/v1/a");
        "#;
        let got = extract_candidates(text);
        assert_eq!(got, vec!["/api/v1/a", "/api/v1/b"]);
    }

    #[test]
    fn extraction_is_idempotent() {
        let text = r#"x("/one/two.json"); y('//host.example.com/z');"#;
        assert_eq!(extract_candidates(text), extract_candidates(text));
    }

    #[test]
    fn matching_does_not_cross_quote_boundaries() {
        let got = extract_candidates(r#"["/api/v1/first", "/api/v1/second"]"#);
        assert_eq!(got, vec!["/api/v1/first", "/api/v1/second"]);
    }

    #[test]
    fn empty_span_is_not_reported() {
        let got = extract_candidates(r#"var s = "";"#);
        assert!(got.is_empty());
    }
}
