//! Telemetry metric name constants.
//!
//! Centralised metric names for muninn operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `muninn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `source` — which source produced the conclusive response
//!   (e.g. "releases", "tags", "commits", or "cache" for hits)
//! - `status` — HTTP status code of the conclusive response

/// Total resolution requests that produced a conclusive response.
///
/// Labels: `source`, `status`.
pub const REQUESTS_TOTAL: &str = "muninn_requests_total";

/// Source walk duration in seconds, measured from the first lookup to the
/// conclusive response.
///
/// Labels: `source`.
pub const REQUEST_DURATION_SECONDS: &str = "muninn_request_duration_seconds";

/// Total cache hits.
pub const CACHE_HITS_TOTAL: &str = "muninn_cache_hits_total";

/// Total cache misses (including expired entries).
pub const CACHE_MISSES_TOTAL: &str = "muninn_cache_misses_total";

/// Total entries removed on read because their TTL had elapsed.
pub const CACHE_EXPIRED_TOTAL: &str = "muninn_cache_expired_total";

/// Total entries evicted to keep the cache within capacity.
pub const CACHE_EVICTIONS_TOTAL: &str = "muninn_cache_evictions_total";
