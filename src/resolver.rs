//! Fallback resolution pipeline with cache-aside caching.
//!
//! [`Resolver`] is the engine of the crate. Given a repository and a raw
//! git reference it validates the input, canonicalizes the reference into
//! a cache key, consults the cache, and on a miss walks the configured
//! sources in priority order, short-circuiting on the first response that
//! is not a 404. The conclusive response is written back to the cache and
//! returned verbatim.
//!
//! # Resolution flow
//!
//! ```text
//! resolve("owner/name", "v1.2.3--stage")
//!             │
//!             ▼ canonicalize: "owner/name:v1.2.3"
//!   ┌───────────────────┐
//!   │  ReferenceCache   │──► live hit: return stored (status, body)
//!   └─────────┬─────────┘
//!             │ miss (or expired → removed)
//!             ▼
//!   ┌───────────────────┐
//!   │  ReleaseSource    │──► non-404: conclusive
//!   └─────────┬─────────┘
//!             │ 404
//!             ▼
//!   ┌───────────────────┐
//!   │  TagSource        │──► optional stage; non-404: conclusive
//!   └─────────┬─────────┘
//!             │ 404
//!             ▼
//!   ┌───────────────────┐
//!   │  CommitSource     │──► always conclusive, 404 included
//!   └───────────────────┘
//! ```
//!
//! Within one request the walk is strictly sequential — each source's 404
//! is the precondition for trying the next. Two concurrent requests for
//! the same key that both miss may both walk the sources; the lookups are
//! idempotent reads and the last writer wins, so no single-flight
//! deduplication is attempted. The cache lock is never held across a
//! source call.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument};

use crate::cache::{CachedResponse, ReferenceCache};
use crate::sources::{OutcomeClass, ReferenceSource, SourceResponse};
use crate::telemetry;
use crate::{MuninnError, Result};

/// Strip the optional `--<metadata>` suffix from a reference.
///
/// `"v1.2.3--release"` → `"v1.2.3"`, `"dd295fd679--stage"` →
/// `"dd295fd679"`; references without the delimiter pass through
/// unchanged. Pure and total.
pub fn base_reference(git_ref: &str) -> &str {
    match git_ref.split_once("--") {
        Some((base, _)) => base,
        None => git_ref,
    }
}

/// Cache key for a repository + base reference.
///
/// References differing only in their metadata suffix map to the same key
/// and share one cache entry. That sharing is intentional: the suffix
/// carries deployment metadata, not identity.
pub fn cache_key(repo: &str, base_ref: &str) -> String {
    format!("{repo}:{base_ref}")
}

/// A conclusive resolution: the status and body to forward verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Fallback dispatcher over an ordered source chain and a shared cache.
pub struct Resolver {
    sources: Vec<Arc<dyn ReferenceSource>>,
    cache: ReferenceCache,
}

impl Resolver {
    /// Create a resolver over `sources` in priority order (index 0 is
    /// tried first).
    ///
    /// The final source is the universal fallback: its response is
    /// conclusive whatever the status. At least one source is required.
    pub fn new(cache: ReferenceCache, sources: Vec<Arc<dyn ReferenceSource>>) -> Result<Self> {
        if sources.is_empty() {
            return Err(MuninnError::Configuration(
                "at least one reference source is required".to_string(),
            ));
        }
        Ok(Self { sources, cache })
    }

    /// Resolve `git_ref` within `repo`.
    ///
    /// Validation failures — an empty parameter or the disallowed
    /// `"latest"` reference — are returned as errors and never reach the
    /// cache or the sources. Every other path produces a [`Resolved`]
    /// response and exactly one cache write (or none on a hit).
    #[instrument(skip(self), fields(operation = "resolve"))]
    pub async fn resolve(&self, repo: &str, git_ref: &str) -> Result<Resolved> {
        if repo.is_empty() || git_ref.is_empty() {
            return Err(MuninnError::MissingParameter);
        }
        if git_ref == "latest" {
            return Err(MuninnError::MutableReference);
        }

        let base = base_reference(git_ref);
        let key = cache_key(repo, base);

        if let Some(cached) = self.cache.get(&key) {
            Self::record_request("cache", cached.status, Instant::now());
            return Ok(Resolved {
                status: cached.status,
                body: cached.body,
            });
        }

        let response = self.walk(repo, base).await;
        self.cache
            .put(&key, CachedResponse::new(response.status, response.body.clone()));

        Ok(Resolved {
            status: response.status,
            body: response.body,
        })
    }

    /// Walk the source chain with the canonicalized reference.
    ///
    /// Every source but the last falls through on 404; the last source's
    /// response is conclusive regardless of status.
    async fn walk(&self, repo: &str, base_ref: &str) -> SourceResponse {
        let start = Instant::now();
        let (last, preferred) = self
            .sources
            .split_last()
            .expect("constructor requires a non-empty chain");

        for source in preferred {
            let response = source.lookup(repo, base_ref).await;
            match OutcomeClass::classify(response.status) {
                OutcomeClass::NotFound => {
                    debug!(
                        source = source.name(),
                        repo,
                        git_ref = base_ref,
                        "not found, falling through"
                    );
                }
                _ => {
                    Self::record_request(source.name(), response.status, start);
                    return response;
                }
            }
        }

        let response = last.lookup(repo, base_ref).await;
        Self::record_request(last.name(), response.status, start);
        response
    }

    /// Record which source concluded the request, and how long it took.
    fn record_request(source: &str, status: u16, start: Instant) {
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "source" => source.to_owned(),
            "status" => status.to_string(),
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
            "source" => source.to_owned(),
        )
        .record(start.elapsed().as_secs_f64());
    }
}
