// src/error.rs
//
// Error taxonomy for the poll/detect/deliver pipeline. Source and delivery
// failures are recoverable and scoped; only startup misconfiguration is
// allowed to stop the process.

use thiserror::Error;

/// A source could not produce items this cycle. Callers treat this as
/// "zero items", log it, and move on; it never aborts sibling sources.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),
}

impl SourceError {
    pub fn unavailable(reason: impl std::fmt::Display) -> Self {
        SourceError::Unavailable(reason.to_string())
    }
}

/// Outcome of a single `Transport::send` attempt.
#[derive(Debug, Clone, Error)]
pub enum SendError {
    #[error("unauthorized (check bot token)")]
    Unauthorized,
    #[error("chat not found (check channel id)")]
    ChatNotFound,
    #[error("rate limited, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },
    #[error("message too long")]
    MessageTooLong,
    #[error("network: {0}")]
    Network(String),
}

impl SendError {
    /// Transient errors are retried with backoff; the rest fail the single
    /// notification immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SendError::RateLimited { .. } | SendError::Network(_)
        )
    }
}

/// Terminal delivery outcome for one notification. A failed item is never
/// committed to the seen store, so re-detection next cycle retries it.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    #[error("delivery failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: SendError },
    #[error("permanent delivery failure: {0}")]
    Permanent(SendError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("store encode: {0}")]
    Encode(#[from] serde_json::Error),
}
