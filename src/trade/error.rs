//! Error taxonomy for the trade boundary, plus upstream failure
//! classification.

use thiserror::Error;

/// Failure classes surfaced by the trade components.
///
/// `RateLimited`, `UnknownItem`, and `QueryRejected` are recoverable inside
/// their components (backoff, relaxation, fallback); the rest propagate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TradeError {
    /// The caller's request is missing or malformed.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The upstream throttled the request.
    #[error("rate limited by the trade API")]
    RateLimited,

    /// The upstream could not resolve the name/type combination.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// The upstream rejected the query document as structurally invalid.
    #[error("query rejected: {0}")]
    QueryRejected(String),

    /// 5xx, timeout, or transport failure.
    #[error("trade API unavailable: {0}")]
    Unavailable(String),

    /// Any other upstream rejection; neither retryable nor relaxable.
    #[error("trade API error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    /// The response parsed but is missing fields the contract promises.
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}

#[derive(Debug, Clone, Copy)]
enum MessageClass {
    RateLimited,
    UnknownItem,
    QueryRejected,
}

/// Substring rules matched case-insensitively against upstream error
/// messages, first match wins. New upstream message variants belong in this
/// table, not in control flow.
const MESSAGE_RULES: &[(&str, MessageClass)] = &[
    ("rate limit", MessageClass::RateLimited),
    ("too many requests", MessageClass::RateLimited),
    ("throttled", MessageClass::RateLimited),
    ("unknown item", MessageClass::UnknownItem),
    ("item not found", MessageClass::UnknownItem),
    ("no item found", MessageClass::UnknownItem),
    ("invalid query", MessageClass::QueryRejected),
    ("malformed query", MessageClass::QueryRejected),
    ("invalid search", MessageClass::QueryRejected),
    ("unrecognized query", MessageClass::QueryRejected),
];

/// Maps an HTTP status and the upstream error message (when one was parsed)
/// onto the taxonomy.
pub fn classify(status: u16, message: Option<&str>) -> TradeError {
    if status == 429 {
        return TradeError::RateLimited;
    }

    if let Some(message) = message {
        let lowered = message.to_lowercase();
        for (needle, class) in MESSAGE_RULES {
            if lowered.contains(needle) {
                return match class {
                    MessageClass::RateLimited => TradeError::RateLimited,
                    MessageClass::UnknownItem => TradeError::UnknownItem(message.to_string()),
                    MessageClass::QueryRejected => TradeError::QueryRejected(message.to_string()),
                };
            }
        }
    }

    if status >= 500 || status == 408 {
        return TradeError::Unavailable(match message {
            Some(message) => format!("status {}: {}", status, message),
            None => format!("status {}", status),
        });
    }

    TradeError::Upstream {
        status,
        message: message.unwrap_or("no error detail").to_string(),
    }
}

impl TradeError {
    /// Transient failures worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, TradeError::RateLimited | TradeError::Unavailable(_))
    }

    /// Client-class rejections: the request will not succeed as-is, but the
    /// upstream itself is healthy.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TradeError::Validation(_)
                | TradeError::UnknownItem(_)
                | TradeError::QueryRejected(_)
                | TradeError::Upstream { .. }
        )
    }
}
