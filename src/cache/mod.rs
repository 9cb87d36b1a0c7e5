//! Caching subsystem.
//!
//! A single bounded cache, [`ReferenceCache`], maps canonical reference
//! keys (`"{repo}:{base_ref}"`) to conclusive resolution responses. It is
//! strictly LRU — capacity eviction always removes the least-recently-used
//! entry and reports it to an optional observer — and applies a
//! status-dependent expiry policy on every read: successful responses live
//! long (their targets are immutable), failures are retried sooner.
//!
//! The cache is the only shared mutable state in the crate. All operations
//! lock a single internal mutex for their own duration only; the resolver
//! never holds the lock across a source call.

pub mod response;

pub use response::{CacheConfig, CachedResponse, EvictionListener, ReferenceCache};
