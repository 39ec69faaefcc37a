use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use sync_config::model::Source;
use sync_fs::checksum::{format_checksum, sha256_hex};
use sync_source::{CancelToken, Error, HttpClient, HttpResponse, SourceResolver, UrlResolver};

/// In-memory HTTP double serving canned responses per URL.
struct FakeClient {
    responses: BTreeMap<String, (u16, Vec<u8>)>,
    requests: Mutex<Vec<String>>,
}

impl FakeClient {
    fn serving(url: &str, status: u16, body: &[u8]) -> Self {
        let mut responses = BTreeMap::new();
        responses.insert(url.to_string(), (status, body.to_vec()));
        Self {
            responses,
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl HttpClient for FakeClient {
    fn get(&self, url: &str, _timeout: Option<Duration>) -> std::io::Result<HttpResponse> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.responses.get(url) {
            Some((status, body)) => Ok(HttpResponse {
                status: *status,
                body: body.clone(),
            }),
            None => Err(std::io::Error::other("connection refused")),
        }
    }
}

const URL: &str = "https://example.com/rules/security.md";

fn url_spec(name: &str, checksum: &str) -> Source {
    Source {
        name: name.to_string(),
        kind: "url".to_string(),
        url: URL.to_string(),
        checksum: checksum.to_string(),
        ..Default::default()
    }
}

fn resolver_serving(status: u16, body: &[u8]) -> UrlResolver {
    UrlResolver::new(Box::new(FakeClient::serving(URL, status, body)), 0, None)
}

#[test]
fn resolve_records_the_basename_and_digest() {
    let body = b"# Security Rules\n";
    let checksum = format_checksum(&sha256_hex(body));
    let resolver = resolver_serving(200, body);

    let resolved = resolver
        .resolve(&url_spec("rules", &checksum), Path::new("."), &CancelToken::new())
        .unwrap();

    assert_eq!(resolved.kind, "url");
    assert_eq!(resolved.url, URL);
    assert_eq!(resolved.files.len(), 1);
    assert_eq!(resolved.files["security.md"], sha256_hex(body));
}

#[test]
fn checksum_mismatch_is_fatal_for_the_source() {
    let resolver = resolver_serving(200, b"actual content");
    let declared = format_checksum(&"0".repeat(64));

    let err = resolver
        .resolve(&url_spec("rules", &declared), Path::new("."), &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, Error::ChecksumMismatch { .. }));
}

#[test]
fn non_200_status_is_an_error() {
    let resolver = resolver_serving(404, b"not found");
    let checksum = format_checksum(&sha256_hex(b"whatever"));

    let err = resolver
        .resolve(&url_spec("rules", &checksum), Path::new("."), &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
}

#[test]
fn transport_failure_surfaces_with_the_url() {
    let resolver = UrlResolver::new(
        Box::new(FakeClient::serving("https://elsewhere.invalid/", 200, b"")),
        0,
        None,
    );
    let checksum = format_checksum(&sha256_hex(b"whatever"));

    let err = resolver
        .resolve(&url_spec("rules", &checksum), Path::new("."), &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, Error::Http { .. }));
    assert!(err.to_string().contains(URL));
}

#[test]
fn only_sha256_checksums_are_accepted() {
    let resolver = resolver_serving(200, b"body");

    let err = resolver
        .resolve(&url_spec("rules", "md5:abcdef"), Path::new("."), &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedAlgorithm { .. }));
}

#[test]
fn malformed_checksum_is_an_error() {
    let resolver = resolver_serving(200, b"body");

    let err = resolver
        .resolve(&url_spec("rules", "justahexstring"), Path::new("."), &CancelToken::new())
        .unwrap_err();
    assert!(err.to_string().contains("algorithm:hex"));
}

#[test]
fn missing_checksum_field_is_an_error() {
    let resolver = resolver_serving(200, b"body");

    let err = resolver
        .resolve(&url_spec("rules", ""), Path::new("."), &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, Error::MissingField { field: "checksum", .. }));
}

#[test]
fn oversized_body_is_rejected() {
    let body = b"0123456789";
    let checksum = format_checksum(&sha256_hex(body));
    let resolver = UrlResolver::new(Box::new(FakeClient::serving(URL, 200, body)), 4, None);

    let err = resolver
        .resolve(&url_spec("rules", &checksum), Path::new("."), &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, Error::TooLarge { limit: 4, .. }));
}

#[test]
fn fetch_re_verifies_against_the_resolved_digest() {
    let body = b"# Security Rules\n";
    let checksum = format_checksum(&sha256_hex(body));
    let resolver = resolver_serving(200, body);
    let cancel = CancelToken::new();

    let resolved = resolver
        .resolve(&url_spec("rules", &checksum), Path::new("."), &cancel)
        .unwrap();
    let fetched = resolver.fetch(&resolved, Path::new("."), &cancel).unwrap();

    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].rel_path, "security.md");
    assert_eq!(fetched[0].content, body);
}

#[test]
fn fetch_detects_upstream_drift() {
    let body = b"original";
    let checksum = format_checksum(&sha256_hex(body));
    let resolver = resolver_serving(200, body);
    let cancel = CancelToken::new();
    let resolved = resolver
        .resolve(&url_spec("rules", &checksum), Path::new("."), &cancel)
        .unwrap();

    // Upstream now serves different bytes.
    let drifted = resolver_serving(200, b"changed");
    let err = drifted.fetch(&resolved, Path::new("."), &cancel).unwrap_err();
    assert!(matches!(err, Error::HashMismatch { .. }));
}
