//! Incidents reported to the notification sink.

use std::fmt;

use crate::error::RelayError;

/// A failure worth telling an operator about.
///
/// Incidents are plain values: the orchestrator and the HTTP adapter build
/// them, a sink renders and delivers them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Incident {
    /// Upstream answered with a non-success status.
    UpstreamStatus {
        /// Handle being looked up
        handle: String,
        /// Status returned by the upstream
        code: u16,
    },
    /// Upstream could not be reached.
    Transport {
        /// Handle being looked up
        handle: String,
        /// Transport error detail
        detail: String,
    },
    /// Upstream body was not JSON.
    MalformedResponse {
        /// Handle being looked up
        handle: String,
    },
    /// Upstream body carried no user object.
    RecordMissing {
        /// Handle being looked up
        handle: String,
    },
    /// A client exceeded the inbound rate limit.
    RateLimited {
        /// Client address
        client: String,
        /// Request path
        path: String,
    },
    /// An unexpected internal fault.
    Unhandled {
        /// Where it happened (handle or request path)
        context: String,
        /// Error detail
        detail: String,
    },
}

impl Incident {
    /// Builds the incident matching a failed lookup of `handle`.
    ///
    /// Returns `None` for errors that are not worth reporting (bad input,
    /// notification failures).
    pub fn from_lookup_error(handle: &str, err: &RelayError) -> Option<Self> {
        let handle = handle.to_string();
        let incident = match err {
            RelayError::UpstreamStatus { code } => Incident::UpstreamStatus { handle, code: *code },
            RelayError::Transport(detail) => Incident::Transport {
                handle,
                detail: detail.clone(),
            },
            RelayError::MalformedResponse(_) => Incident::MalformedResponse { handle },
            RelayError::RecordNotFound(_) => Incident::RecordMissing { handle },
            RelayError::Unclassified(detail) | RelayError::Config(detail) => Incident::Unhandled {
                context: handle,
                detail: detail.clone(),
            },
            RelayError::InvalidHandle(_) | RelayError::Notification(_) => return None,
        };
        Some(incident)
    }
}

impl fmt::Display for Incident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Incident::UpstreamStatus { handle, code } => {
                write!(f, "⚠️ Upstream API error for {}: {}", handle, code)
            }
            Incident::Transport { handle, detail } => {
                write!(f, "🌐 Network error while fetching {}: {}", handle, detail)
            }
            Incident::MalformedResponse { handle } => {
                write!(f, "🧩 Invalid JSON response for {}", handle)
            }
            Incident::RecordMissing { handle } => {
                write!(f, "🔍 User data not found in response for {}", handle)
            }
            Incident::RateLimited { client, path } => {
                write!(f, "🚫 Rate Limit Exceeded\nClient: {}\nPath: {}", client, path)
            }
            Incident::Unhandled { context, detail } => {
                write!(f, "🔥 Unhandled Exception\nError: {}\nContext: {}", detail, context)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incident_from_each_fetch_failure() {
        let cases = [
            RelayError::UpstreamStatus { code: 429 },
            RelayError::Transport("connection refused".into()),
            RelayError::MalformedResponse("expected value".into()),
            RelayError::RecordNotFound("alice".into()),
            RelayError::Unclassified("boom".into()),
        ];
        for err in cases {
            assert!(Incident::from_lookup_error("alice", &err).is_some(), "{err:?}");
        }
    }

    #[test]
    fn test_bad_input_is_not_reported() {
        let err = RelayError::InvalidHandle("empty".into());
        assert!(Incident::from_lookup_error("", &err).is_none());
    }

    #[test]
    fn test_incident_text_mentions_handle_and_status() {
        let incident = Incident::from_lookup_error("alice", &RelayError::UpstreamStatus { code: 429 })
            .unwrap();
        let text = incident.to_string();
        assert!(text.contains("alice"));
        assert!(text.contains("429"));
    }
}
