//! Muninn — caching reference resolution gateway for repository hosting APIs.
//!
//! Muninn resolves a repository + git reference (release, tag, or commit
//! SHA) into a normalized "latest vs current" reference pair, walking a
//! prioritized chain of lookup sources — releases first, then tags, then
//! commits as the universal fallback — and caching each conclusive answer
//! in a bounded LRU store. Successful answers point at immutable data and
//! are cached for hours; failures expire quickly so a flaky upstream gets
//! retried without being hammered.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use muninn::cache::{CacheConfig, ReferenceCache};
//! use muninn::resolver::Resolver;
//! use muninn::sources::{CommitSource, GithubClient, ReferenceSource, ReleaseSource, TagSource};
//!
//! #[tokio::main]
//! async fn main() -> muninn::Result<()> {
//!     let client = GithubClient::new(None);
//!     let sources: Vec<Arc<dyn ReferenceSource>> = vec![
//!         Arc::new(ReleaseSource::new(client.clone())),
//!         Arc::new(TagSource::new(client.clone())),
//!         Arc::new(CommitSource::new(client)),
//!     ];
//!
//!     let cache = ReferenceCache::new(CacheConfig::default());
//!     let resolver = Resolver::new(cache, sources)?;
//!
//!     let resolved = resolver.resolve("rust-lang/rust", "1.85.0").await?;
//!     println!("{}: {} bytes", resolved.status, resolved.body.len());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod resolver;
pub mod server;
pub mod sources;
pub mod telemetry;
pub mod types;
mod version;

// Re-export main types at crate root
pub use error::{MuninnError, Result};
pub use resolver::{Resolved, Resolver};
pub use version::{GIT_BRANCH, GIT_SHA, PKG_VERSION, git_dirty, version_string};
