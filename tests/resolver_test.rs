//! Integration tests for the fallback resolution pipeline.
//!
//! Scripted sources stand in for the real GitHub lookups so the tests can
//! verify the walk order, short-circuiting, and cache interplay without
//! any network traffic.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use muninn::MuninnError;
use muninn::cache::{CacheConfig, CachedResponse, ReferenceCache};
use muninn::resolver::{Resolver, cache_key};
use muninn::sources::{ReferenceSource, SourceResponse};

/// Source that always answers with a fixed response and counts calls.
struct ScriptedSource {
    name: &'static str,
    status: u16,
    body: &'static str,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn new(name: &'static str, status: u16, body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            status,
            body,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReferenceSource for ScriptedSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn lookup(&self, _repo: &str, _git_ref: &str) -> SourceResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        SourceResponse {
            status: self.status,
            body: self.body.as_bytes().to_vec(),
        }
    }
}

fn resolver_with(
    cache: ReferenceCache,
    sources: Vec<Arc<dyn ReferenceSource>>,
) -> Resolver {
    Resolver::new(cache, sources).expect("chain is non-empty")
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs()
}

// =========================================================================
// Walk order and short-circuiting
// =========================================================================

#[tokio::test]
async fn release_hit_short_circuits_the_chain() {
    let releases = ScriptedSource::new("releases", 200, r#"{"handler":"releases"}"#);
    let tags = ScriptedSource::new("tags", 200, r#"{"handler":"tags"}"#);
    let commits = ScriptedSource::new("commits", 200, r#"{"handler":"commits"}"#);

    let resolver = resolver_with(
        ReferenceCache::new(CacheConfig::default()),
        vec![releases.clone(), tags.clone(), commits.clone()],
    );

    let resolved = resolver.resolve("test/repo", "v1.0.0").await.unwrap();
    assert_eq!(resolved.status, 200);
    assert_eq!(resolved.body, br#"{"handler":"releases"}"#);

    assert_eq!(releases.calls(), 1);
    assert_eq!(tags.calls(), 0, "tag source must not be consulted");
    assert_eq!(commits.calls(), 0, "commit source must not be consulted");
}

#[tokio::test]
async fn release_miss_falls_through_to_tags() {
    let releases = ScriptedSource::new("releases", 404, r#"{"error":"no release"}"#);
    let tags = ScriptedSource::new("tags", 200, r#"{"handler":"tags"}"#);
    let commits = ScriptedSource::new("commits", 200, r#"{"handler":"commits"}"#);

    let resolver = resolver_with(
        ReferenceCache::new(CacheConfig::default()),
        vec![releases.clone(), tags.clone(), commits.clone()],
    );

    let resolved = resolver.resolve("test/repo", "v1.0.0").await.unwrap();
    assert_eq!(resolved.body, br#"{"handler":"tags"}"#);

    assert_eq!(releases.calls(), 1);
    assert_eq!(tags.calls(), 1);
    assert_eq!(commits.calls(), 0);
}

#[tokio::test]
async fn release_and_tag_miss_falls_through_to_commits() {
    let releases = ScriptedSource::new("releases", 404, r#"{"error":"no release"}"#);
    let tags = ScriptedSource::new("tags", 404, r#"{"error":"no tag"}"#);
    let commits = ScriptedSource::new("commits", 200, r#"{"handler":"commits"}"#);

    let resolver = resolver_with(
        ReferenceCache::new(CacheConfig::default()),
        vec![releases.clone(), tags.clone(), commits.clone()],
    );

    let resolved = resolver.resolve("test/repo", "abc1234").await.unwrap();
    assert_eq!(resolved.status, 200);
    assert_eq!(resolved.body, br#"{"handler":"commits"}"#);
}

#[tokio::test]
async fn last_source_not_found_is_conclusive() {
    let releases = ScriptedSource::new("releases", 404, r#"{"error":"no release"}"#);
    let commits = ScriptedSource::new("commits", 404, r#"{"error":"no commit"}"#);

    let resolver = resolver_with(
        ReferenceCache::new(CacheConfig::default()),
        vec![releases.clone(), commits.clone()],
    );

    let resolved = resolver.resolve("test/repo", "bogus").await.unwrap();
    assert_eq!(resolved.status, 404);
    assert_eq!(resolved.body, br#"{"error":"no commit"}"#);
    assert_eq!(commits.calls(), 1);
}

#[tokio::test]
async fn upstream_error_is_conclusive_immediately() {
    let releases = ScriptedSource::new("releases", 502, r#"{"error":"upstream down"}"#);
    let tags = ScriptedSource::new("tags", 200, r#"{"handler":"tags"}"#);
    let commits = ScriptedSource::new("commits", 200, r#"{"handler":"commits"}"#);

    let resolver = resolver_with(
        ReferenceCache::new(CacheConfig::default()),
        vec![releases.clone(), tags.clone(), commits.clone()],
    );

    let resolved = resolver.resolve("test/repo", "v1.0.0").await.unwrap();
    assert_eq!(resolved.status, 502);
    assert_eq!(tags.calls(), 0, "an error outcome must not fall through");
    assert_eq!(commits.calls(), 0);
}

#[tokio::test]
async fn chain_without_tag_stage_degrades_to_two_hops() {
    let releases = ScriptedSource::new("releases", 404, r#"{"error":"no release"}"#);
    let commits = ScriptedSource::new("commits", 200, r#"{"handler":"commits"}"#);

    let resolver = resolver_with(
        ReferenceCache::new(CacheConfig::default()),
        vec![releases.clone(), commits.clone()],
    );

    let resolved = resolver.resolve("test/repo", "abc1234").await.unwrap();
    assert_eq!(resolved.body, br#"{"handler":"commits"}"#);
}

#[tokio::test]
async fn empty_chain_is_a_configuration_error() {
    let result = Resolver::new(ReferenceCache::new(CacheConfig::default()), vec![]);
    assert!(matches!(result, Err(MuninnError::Configuration(_))));
}

// =========================================================================
// Caching
// =========================================================================

#[tokio::test]
async fn second_call_is_served_from_cache() {
    let releases = ScriptedSource::new("releases", 200, r#"{"handler":"releases"}"#);

    let resolver = resolver_with(
        ReferenceCache::new(CacheConfig::default()),
        vec![releases.clone()],
    );

    let first = resolver.resolve("test/repo", "v1.0.0").await.unwrap();
    let second = resolver.resolve("test/repo", "v1.0.0").await.unwrap();

    assert_eq!(releases.calls(), 1, "second call must not reach the source");
    assert_eq!(first.status, second.status);
    assert_eq!(first.body, second.body, "cached body must be byte-identical");
}

#[tokio::test]
async fn error_responses_are_cached_too() {
    let releases = ScriptedSource::new("releases", 500, r#"{"error":"boom"}"#);

    let resolver = resolver_with(
        ReferenceCache::new(CacheConfig::default()),
        vec![releases.clone()],
    );

    resolver.resolve("test/repo", "v1.0.0").await.unwrap();
    let second = resolver.resolve("test/repo", "v1.0.0").await.unwrap();

    assert_eq!(releases.calls(), 1);
    assert_eq!(second.status, 500);
}

#[tokio::test]
async fn metadata_suffixes_share_one_cache_entry() {
    let releases = ScriptedSource::new("releases", 200, r#"{"handler":"releases"}"#);

    let resolver = resolver_with(
        ReferenceCache::new(CacheConfig::default()),
        vec![releases.clone()],
    );

    let first = resolver.resolve("test/repo", "v1.2.3--release").await.unwrap();
    let second = resolver.resolve("test/repo", "v1.2.3--stage").await.unwrap();

    assert_eq!(releases.calls(), 1, "both suffixes map to the same key");
    assert_eq!(first.body, second.body);

    // A genuinely different base reference walks the chain again.
    resolver.resolve("test/repo", "v9.9.9").await.unwrap();
    assert_eq!(releases.calls(), 2);
}

#[tokio::test]
async fn expired_success_entry_triggers_a_fresh_walk() {
    let cache = ReferenceCache::new(CacheConfig::default());
    // A 200 stored 25 hours ago is past the 24-hour success TTL.
    cache.put(
        &cache_key("test/repo", "v1.0.0"),
        CachedResponse {
            status: 200,
            body: br#"{"handler":"stale"}"#.to_vec(),
            stored_at: unix_now() - 25 * 60 * 60,
        },
    );

    let releases = ScriptedSource::new("releases", 200, r#"{"handler":"releases"}"#);
    let resolver = resolver_with(cache, vec![releases.clone()]);

    let resolved = resolver.resolve("test/repo", "v1.0.0").await.unwrap();
    assert_eq!(releases.calls(), 1, "expired entry must not satisfy the request");
    assert_eq!(resolved.body, br#"{"handler":"releases"}"#);
}

#[tokio::test]
async fn error_entry_expires_sooner_than_a_success() {
    let cache = ReferenceCache::new(CacheConfig::default());
    let two_hours_ago = unix_now() - 2 * 60 * 60;

    // 500 stored two hours ago: past the 1-hour error TTL.
    cache.put(
        &cache_key("test/repo", "broken"),
        CachedResponse {
            status: 500,
            body: br#"{"error":"stale"}"#.to_vec(),
            stored_at: two_hours_ago,
        },
    );
    // 200 stored two hours ago: well within the 24-hour success TTL.
    cache.put(
        &cache_key("test/repo", "v1.0.0"),
        CachedResponse {
            status: 200,
            body: br#"{"handler":"cached"}"#.to_vec(),
            stored_at: two_hours_ago,
        },
    );

    let releases = ScriptedSource::new("releases", 200, r#"{"handler":"releases"}"#);
    let resolver = resolver_with(cache, vec![releases.clone()]);

    let success = resolver.resolve("test/repo", "v1.0.0").await.unwrap();
    assert_eq!(success.body, br#"{"handler":"cached"}"#);
    assert_eq!(releases.calls(), 0);

    let refreshed = resolver.resolve("test/repo", "broken").await.unwrap();
    assert_eq!(releases.calls(), 1, "expired error entry must be re-resolved");
    assert_eq!(refreshed.status, 200);
}

#[tokio::test]
async fn short_error_ttl_still_serves_within_the_window() {
    let cache = ReferenceCache::new(
        CacheConfig::new().error_ttl(Duration::from_secs(60 * 60)),
    );
    cache.put(
        &cache_key("test/repo", "broken"),
        CachedResponse {
            status: 500,
            body: br#"{"error":"cached"}"#.to_vec(),
            stored_at: unix_now() - 30 * 60,
        },
    );

    let releases = ScriptedSource::new("releases", 200, r#"{"handler":"releases"}"#);
    let resolver = resolver_with(cache, vec![releases.clone()]);

    let resolved = resolver.resolve("test/repo", "broken").await.unwrap();
    assert_eq!(resolved.status, 500);
    assert_eq!(releases.calls(), 0, "a live error entry is still a hit");
}

// =========================================================================
// Validation
// =========================================================================

#[tokio::test]
async fn empty_repo_is_rejected() {
    let releases = ScriptedSource::new("releases", 200, "{}");
    let resolver = resolver_with(
        ReferenceCache::new(CacheConfig::default()),
        vec![releases.clone()],
    );

    let err = resolver.resolve("", "v1.0.0").await.unwrap_err();
    assert!(matches!(err, MuninnError::MissingParameter));
    assert_eq!(err.to_string(), "Missing 'repo' or 'gitRef' query parameter");
    assert_eq!(releases.calls(), 0);
}

#[tokio::test]
async fn empty_git_ref_is_rejected() {
    let releases = ScriptedSource::new("releases", 200, "{}");
    let resolver = resolver_with(
        ReferenceCache::new(CacheConfig::default()),
        vec![releases.clone()],
    );

    let err = resolver.resolve("test/repo", "").await.unwrap_err();
    assert!(matches!(err, MuninnError::MissingParameter));
    assert_eq!(releases.calls(), 0);
}

#[tokio::test]
async fn latest_is_rejected_before_any_lookup() {
    let releases = ScriptedSource::new("releases", 200, "{}");
    let resolver = resolver_with(
        ReferenceCache::new(CacheConfig::default()),
        vec![releases.clone()],
    );

    let err = resolver.resolve("test/repo", "latest").await.unwrap_err();
    assert!(matches!(err, MuninnError::MutableReference));
    assert_eq!(releases.calls(), 0);

    // A later valid request proves the rejection left no cache entry behind.
    resolver.resolve("test/repo", "v1.0.0").await.unwrap();
    assert_eq!(releases.calls(), 1);
}

#[tokio::test]
async fn latest_with_suffix_is_not_special_cased() {
    // Only the literal "latest" is rejected; "latest--stage" is a real
    // (if odd) reference whose base is "latest" only after canonicalization,
    // which happens after validation.
    let releases = ScriptedSource::new("releases", 200, r#"{"handler":"releases"}"#);
    let resolver = resolver_with(
        ReferenceCache::new(CacheConfig::default()),
        vec![releases.clone()],
    );

    let resolved = resolver.resolve("test/repo", "latest--stage").await.unwrap();
    assert_eq!(resolved.status, 200);
    assert_eq!(releases.calls(), 1);
}

// =========================================================================
// Concurrency
// =========================================================================

#[tokio::test]
async fn concurrent_requests_resolve_independently() {
    let releases = ScriptedSource::new("releases", 200, r#"{"handler":"releases"}"#);
    let resolver = Arc::new(resolver_with(
        ReferenceCache::new(CacheConfig::default()),
        vec![releases.clone()],
    ));

    let mut handles = Vec::new();
    for i in 0..8 {
        let resolver = Arc::clone(&resolver);
        handles.push(tokio::spawn(async move {
            resolver
                .resolve("test/repo", &format!("v0.0.{i}"))
                .await
                .unwrap()
        }));
    }

    for handle in handles {
        let resolved = handle.await.unwrap();
        assert_eq!(resolved.status, 200);
    }
    assert_eq!(releases.calls(), 8);
}
