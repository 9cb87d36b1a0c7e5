//! Normalized reference payload types.
//!
//! Every source — releases, tags, commits — reduces its upstream payload
//! to the same [`ReferencePair`] shape, so callers never have to care
//! which lookup ultimately answered. Wire field names are part of the
//! public API and must not change.

use serde::{Deserialize, Serialize};

/// A resolved reference pair: the newest reference the repository has to
/// offer next to the one the caller asked about.
///
/// Either side may be absent when the upstream could only produce a
/// partial answer (e.g. the latest-commit listing failed but the
/// requested commit resolved).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencePair {
    /// Newest release, tag, or commit in the repository.
    pub latest: Option<ReferenceEntity>,
    /// The reference the caller asked about.
    pub current: Option<ReferenceEntity>,
}

/// A single normalized reference — a release, tag, or commit flattened to
/// the fields they all share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntity {
    /// Release tag name, tag name, or commit SHA.
    #[serde(rename = "ref")]
    pub reference: String,
    /// Browser URL for the release or commit.
    pub url: String,
    /// Release body or commit message.
    pub message: String,
    /// Login of the release author or commit author.
    pub author: String,
    /// Publication date of the release, or author date of the commit.
    pub published_at: String,
}

/// JSON error body shared by all sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error: String,
}
