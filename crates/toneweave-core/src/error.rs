//! Error taxonomy for the reply-generation engine surface.
//!
//! Only conditions a caller can act on are surfaced: missing identities
//! short-circuit before any paid external call, and upstream/generation
//! failures are retryable at the caller's discretion. Empty retrieval
//! context and unparseable generations are recovered locally and never
//! appear here.

use thiserror::Error;

/// Failure modes of [`ReplyEngine`](crate::engine::ReplyEngine) operations.
#[derive(Debug, Error)]
pub enum ReplyError {
    /// The target user does not exist. No retrieval or generation call
    /// was made.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// The conversation partner does not exist. No retrieval or generation
    /// call was made.
    #[error("partner not found: {0}")]
    PartnerNotFound(String),

    /// A context read or the embedding call failed. Retryable.
    #[error("context fetch failed: {0}")]
    Upstream(anyhow::Error),

    /// The generation service call failed or timed out. Retryable; this
    /// core never substitutes content for a failed generation.
    #[error("generation failed: {0}")]
    Generation(anyhow::Error),
}

impl ReplyError {
    /// Whether the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream(_) | Self::Generation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_not_retryable() {
        assert!(!ReplyError::UserNotFound("u1".into()).is_retryable());
        assert!(!ReplyError::PartnerNotFound("p1".into()).is_retryable());
    }

    #[test]
    fn test_upstream_is_retryable() {
        let err = ReplyError::Upstream(anyhow::anyhow!("timeout"));
        assert!(err.is_retryable());
        assert!(err.to_string().contains("timeout"));
    }
}
