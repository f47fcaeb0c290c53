//! Error types for Glimpse.
//!
//! Every failure on the lookup path is reduced to one [`RelayError`]
//! variant. The four fetch kinds are produced by the upstream fetcher's
//! classification; everything else the orchestrator meets is folded into
//! [`RelayError::Unclassified`].

use serde::Serialize;
use thiserror::Error;

/// Result type alias using `RelayError`.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Main error type for all Glimpse operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    // ═══════════════════════════════════════════════════════════════════════════
    // FETCH ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// Connection, DNS, TLS or timeout failure talking to the upstream.
    #[error("Network error: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status.
    #[error("Upstream API returned {code}")]
    UpstreamStatus {
        /// HTTP status code returned by the upstream
        code: u16,
    },

    /// Upstream answered successfully but the body is not JSON.
    #[error("Invalid JSON response from upstream: {0}")]
    MalformedResponse(String),

    /// Upstream answered successfully but carries no user object.
    #[error("User data not found in response for '{0}'")]
    RecordNotFound(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // LOCAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// Any other fault during orchestration.
    #[error("Unclassified error: {0}")]
    Unclassified(String),

    /// The lookup key is unusable.
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The notification sink failed to deliver a message.
    #[error("Notification delivery failed: {0}")]
    Notification(String),
}

/// Stable, payload-free name of a [`RelayError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// See [`RelayError::Transport`].
    Transport,
    /// See [`RelayError::UpstreamStatus`].
    UpstreamStatus,
    /// See [`RelayError::MalformedResponse`].
    MalformedResponse,
    /// See [`RelayError::RecordNotFound`].
    RecordNotFound,
    /// See [`RelayError::Unclassified`].
    Unclassified,
    /// See [`RelayError::InvalidHandle`].
    InvalidHandle,
    /// See [`RelayError::Config`].
    Config,
    /// See [`RelayError::Notification`].
    Notification,
}

impl ErrorKind {
    /// Machine-readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "TRANSPORT_ERROR",
            ErrorKind::UpstreamStatus => "UPSTREAM_STATUS_ERROR",
            ErrorKind::MalformedResponse => "MALFORMED_RESPONSE",
            ErrorKind::RecordNotFound => "RECORD_NOT_FOUND",
            ErrorKind::Unclassified => "INTERNAL_ERROR",
            ErrorKind::InvalidHandle => "INVALID_HANDLE",
            ErrorKind::Config => "CONFIG_ERROR",
            ErrorKind::Notification => "NOTIFICATION_ERROR",
        }
    }
}

impl RelayError {
    /// Returns the payload-free kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::Transport(_) => ErrorKind::Transport,
            RelayError::UpstreamStatus { .. } => ErrorKind::UpstreamStatus,
            RelayError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            RelayError::RecordNotFound(_) => ErrorKind::RecordNotFound,
            RelayError::Unclassified(_) => ErrorKind::Unclassified,
            RelayError::InvalidHandle(_) => ErrorKind::InvalidHandle,
            RelayError::Config(_) => ErrorKind::Config,
            RelayError::Notification(_) => ErrorKind::Notification,
        }
    }

    /// Status-like severity surfaced to clients.
    ///
    /// Upstream statuses pass through unchanged; transport failures are a
    /// gateway failure; contract violations and local faults are internal.
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::Transport(_) => 502,
            RelayError::UpstreamStatus { code } => *code,
            RelayError::MalformedResponse(_) => 500,
            RelayError::RecordNotFound(_) => 404,
            RelayError::InvalidHandle(_) => 400,
            RelayError::Unclassified(_) | RelayError::Config(_) | RelayError::Notification(_) => {
                500
            }
        }
    }

    /// Returns true for the four kinds produced by upstream classification.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            RelayError::Transport(_)
                | RelayError::UpstreamStatus { .. }
                | RelayError::MalformedResponse(_)
                | RelayError::RecordNotFound(_)
        )
    }

    /// Message safe to show to an external client.
    ///
    /// Unclassified faults hide their detail; it is logged locally instead.
    pub fn public_message(&self) -> String {
        match self {
            RelayError::Unclassified(_) | RelayError::Config(_) | RelayError::Notification(_) => {
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(RelayError::Transport("refused".into()), 502; "transport is a gateway failure")]
    #[test_case(RelayError::UpstreamStatus { code: 429 }, 429; "upstream status passes through")]
    #[test_case(RelayError::UpstreamStatus { code: 404 }, 404; "upstream not found passes through")]
    #[test_case(RelayError::MalformedResponse("eof".into()), 500; "malformed is internal")]
    #[test_case(RelayError::RecordNotFound("alice".into()), 404; "missing record is not found")]
    #[test_case(RelayError::Unclassified("boom".into()), 500; "unclassified is internal")]
    #[test_case(RelayError::InvalidHandle("".into()), 400; "invalid handle is a bad request")]
    fn test_status_mapping(err: RelayError, expected: u16) {
        assert_eq!(err.status_code(), expected);
    }

    #[test]
    fn test_fetch_failure_classification() {
        assert!(RelayError::Transport("x".into()).is_fetch_failure());
        assert!(RelayError::UpstreamStatus { code: 503 }.is_fetch_failure());
        assert!(RelayError::MalformedResponse("x".into()).is_fetch_failure());
        assert!(RelayError::RecordNotFound("x".into()).is_fetch_failure());
        assert!(!RelayError::Unclassified("x".into()).is_fetch_failure());
        assert!(!RelayError::Config("x".into()).is_fetch_failure());
    }

    #[test]
    fn test_public_message_hides_internal_detail() {
        let err = RelayError::Unclassified("lock poisoned at relay.rs:42".into());
        assert_eq!(err.public_message(), "Internal Server Error");

        let err = RelayError::UpstreamStatus { code: 429 };
        assert_eq!(err.public_message(), "Upstream API returned 429");
    }

    #[test]
    fn test_kind_codes_are_distinct() {
        let kinds = [
            ErrorKind::Transport,
            ErrorKind::UpstreamStatus,
            ErrorKind::MalformedResponse,
            ErrorKind::RecordNotFound,
            ErrorKind::Unclassified,
            ErrorKind::InvalidHandle,
            ErrorKind::Config,
            ErrorKind::Notification,
        ];
        let codes: std::collections::HashSet<_> = kinds.iter().map(|k| k.code()).collect();
        assert_eq!(codes.len(), kinds.len());
    }
}
