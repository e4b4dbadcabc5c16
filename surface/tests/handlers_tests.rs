use surface::normalize_seed;

#[test]
fn test_normalize_seed_with_scheme() {
    let result = normalize_seed("https://example.com");
    assert_eq!(result, Some("https://example.com".to_string()));
}

#[test]
fn test_normalize_seed_without_scheme() {
    let result = normalize_seed("example.com");
    assert_eq!(result, Some("http://example.com".to_string()));
}

#[test]
fn test_normalize_seed_trims_whitespace() {
    let result = normalize_seed("  https://example.com  ");
    assert_eq!(result, Some("https://example.com".to_string()));
}

#[test]
fn test_normalize_seed_empty() {
    assert_eq!(normalize_seed(""), None);
    assert_eq!(normalize_seed("   "), None);
}

#[test]
fn test_normalize_seed_invalid() {
    let result = normalize_seed("not a valid url!!!");
    assert_eq!(result, None);
}

#[test]
fn test_normalize_seed_keeps_path_and_port() {
    let result = normalize_seed("example.com:8080/app");
    assert_eq!(result, Some("http://example.com:8080/app".to_string()));
}
