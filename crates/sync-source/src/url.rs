//! URL source resolution over HTTP(S).
//!
//! Only `sha256:` checksums and status 200 responses are accepted. The HTTP
//! transport sits behind a narrow trait so tests substitute an in-memory
//! double.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use sync_config::model::Source;
use sync_fs::checksum::{parse_checksum, sha256_hex};

use crate::cancel::CancelToken;
use crate::resolver::{FetchedFile, ResolvedSource, SourceResolver};
use crate::{Error, Result};

const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimal HTTP surface needed by the resolver.
pub trait HttpClient: Send + Sync {
    fn get(&self, url: &str, timeout: Option<Duration>) -> std::io::Result<HttpResponse>;
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Default transport backed by reqwest's blocking client.
#[derive(Debug, Default)]
pub struct ReqwestClient;

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str, timeout: Option<Duration>) -> std::io::Result<HttpResponse> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(std::io::Error::other)?;
        let response = client.get(url).send().map_err(std::io::Error::other)?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(std::io::Error::other)?.to_vec();
        Ok(HttpResponse { status, body })
    }
}

pub struct UrlResolver {
    client: Box<dyn HttpClient>,
    /// Maximum accepted body size in bytes; 0 disables the limit.
    max_size: u64,
    timeout: Option<Duration>,
}

impl UrlResolver {
    pub fn new(client: Box<dyn HttpClient>, max_size: u64, timeout: Option<Duration>) -> Self {
        Self {
            client,
            max_size,
            timeout,
        }
    }
}

impl Default for UrlResolver {
    fn default() -> Self {
        Self::new(
            Box::new(ReqwestClient),
            DEFAULT_MAX_SIZE,
            Some(DEFAULT_TIMEOUT),
        )
    }
}

impl SourceResolver for UrlResolver {
    fn resolve(
        &self,
        spec: &Source,
        _project_root: &Path,
        cancel: &CancelToken,
    ) -> Result<ResolvedSource> {
        if spec.url.is_empty() {
            return Err(Error::MissingField {
                source_name: spec.name.clone(),
                field: "url",
                hint: "add 'url: https://...' to the source definition",
            });
        }
        if spec.checksum.is_empty() {
            return Err(Error::MissingField {
                source_name: spec.name.clone(),
                field: "checksum",
                hint: "add 'checksum: sha256:<hex>' to the source definition",
            });
        }

        let (algo, expected) = parse_checksum(&spec.checksum)?;
        if algo != "sha256" {
            return Err(Error::UnsupportedAlgorithm {
                source_name: spec.name.clone(),
                algo: algo.to_string(),
            });
        }

        let body = self.fetch_url(&spec.name, &spec.url, cancel)?;
        let actual = sha256_hex(&body);
        if actual != expected {
            return Err(Error::ChecksumMismatch {
                source_name: spec.name.clone(),
                expected: expected.to_string(),
                actual,
            });
        }

        let mut files = BTreeMap::new();
        files.insert(url_basename(&spec.url), actual);

        Ok(ResolvedSource {
            name: spec.name.clone(),
            kind: "url".to_string(),
            url: spec.url.clone(),
            files,
            ..Default::default()
        })
    }

    fn fetch(
        &self,
        resolved: &ResolvedSource,
        _project_root: &Path,
        cancel: &CancelToken,
    ) -> Result<Vec<FetchedFile>> {
        if resolved.url.is_empty() {
            return Err(Error::MissingField {
                source_name: resolved.name.clone(),
                field: "url",
                hint: "the lockfile entry has no URL; run update to re-lock",
            });
        }

        let body = self.fetch_url(&resolved.name, &resolved.url, cancel)?;
        let actual = sha256_hex(&body);

        if let Some((rel_path, expected)) = resolved.files.iter().next() {
            if &actual != expected {
                return Err(Error::HashMismatch {
                    source_name: resolved.name.clone(),
                    path: rel_path.clone(),
                    expected: expected.clone(),
                    actual,
                });
            }
            return Ok(vec![FetchedFile {
                rel_path: rel_path.clone(),
                sha256: actual,
                content: body,
            }]);
        }

        // A lockfile entry without files; key by basename.
        Ok(vec![FetchedFile {
            rel_path: url_basename(&resolved.url),
            sha256: actual,
            content: body,
        }])
    }
}

impl UrlResolver {
    fn fetch_url(&self, source_name: &str, url: &str, cancel: &CancelToken) -> Result<Vec<u8>> {
        cancel.check()?;
        let response = self
            .client
            .get(url, self.timeout)
            .map_err(|e| Error::Http {
                source_name: source_name.to_string(),
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if response.status != 200 {
            return Err(Error::HttpStatus {
                source_name: source_name.to_string(),
                status: response.status,
                url: url.to_string(),
            });
        }

        if self.max_size > 0 && response.body.len() as u64 > self.max_size {
            return Err(Error::TooLarge {
                source_name: source_name.to_string(),
                url: url.to_string(),
                limit: self.max_size,
            });
        }

        Ok(response.body)
    }
}

/// Last path segment of the URL, or `file` when there is none worth using.
fn url_basename(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    match trimmed.rsplit('/').next() {
        Some(base) if !base.is_empty() && base != "." && !base.ends_with(':') => base.to_string(),
        _ => "file".to_string(),
    }
}
