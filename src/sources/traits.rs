//! Source capability contract.
//!
//! A source returns a plain `(status, body)` value instead of writing to a
//! live output stream, which keeps the contract independent of the wire
//! transport and lets the resolver inspect a response before committing to
//! it. The tri-state outcome the fallback walk operates on is *derived*
//! from the status code, not reported by the source: 2xx is a usable
//! answer, 404 falls through to the next source, anything else is a
//! conclusive upstream failure.

use async_trait::async_trait;
use serde::Serialize;

use crate::types::ErrorMessage;

/// HTTP-style result of a single source lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, forwarded to the caller byte-for-byte.
    pub body: Vec<u8>,
}

impl SourceResponse {
    /// Build a response with a JSON-encoded payload.
    pub fn json<T: Serialize>(status: u16, payload: &T) -> Self {
        match serde_json::to_vec(payload) {
            Ok(body) => Self { status, body },
            Err(_) => Self::error(500, "internal error"),
        }
    }

    /// Build a response with a JSON `{"error": ...}` body.
    pub fn error(status: u16, message: &str) -> Self {
        let body = serde_json::to_vec(&ErrorMessage {
            error: message.to_string(),
        })
        .unwrap_or_else(|_| br#"{"error":"internal error"}"#.to_vec());
        Self { status, body }
    }
}

/// Tri-state classification of a source response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeClass {
    /// 2xx — a usable answer.
    Found,
    /// 404 — this source has no answer; try the next one.
    NotFound,
    /// Anything else — a conclusive upstream failure.
    Error,
}

impl OutcomeClass {
    /// Derive the outcome class from a status code.
    pub fn classify(status: u16) -> Self {
        match status {
            200..=299 => Self::Found,
            404 => Self::NotFound,
            _ => Self::Error,
        }
    }
}

/// A lookup capability over one kind of repository reference.
///
/// Implementations fold transport failures into a 5xx [`SourceResponse`];
/// a lookup never fails out-of-band. From the resolver's point of view an
/// unreachable upstream and an explicit error status are the same thing.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    /// Source name for logging/metrics.
    fn name(&self) -> &str;

    /// Look up `git_ref` within `repo` (an `owner/name` pair).
    async fn lookup(&self, repo: &str, git_ref: &str) -> SourceResponse;
}
