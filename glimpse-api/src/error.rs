//! API error handling.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tower_http::catch_panic::ResponseForPanic;

use glimpse_core::error::{ErrorKind, RelayError};
use glimpse_core::types::Incident;
use glimpse_relay::Notifier;

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: String,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(status: StatusCode, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: code.into(),
        }
    }

    /// Too many requests from one client.
    pub fn rate_limited() -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded. Try again later.",
            "RATE_LIMITED",
        )
    }

    /// The HTTP status of this error.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    status: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
                status: self.status.as_u16(),
            },
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        if err.kind() == ErrorKind::Unclassified {
            tracing::error!(error = %err, "Internal error");
        }

        let status = StatusCode::from_u16(err.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        ApiError::new(status, err.public_message(), err.kind().code())
    }
}

/// Turns a handler panic into a generic 500 and an `Unhandled` incident.
#[derive(Clone)]
pub struct PanicHandler {
    notifier: Notifier,
}

impl PanicHandler {
    /// Creates a handler reporting to `notifier`.
    pub fn new(notifier: Notifier) -> Self {
        Self { notifier }
    }
}

impl ResponseForPanic for PanicHandler {
    type ResponseBody = axum::body::Body;

    fn response_for_panic(
        &mut self,
        err: Box<dyn Any + Send + 'static>,
    ) -> axum::http::Response<Self::ResponseBody> {
        let detail = if let Some(s) = err.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = err.downcast_ref::<&str>() {
            s.to_string()
        } else {
            "unknown panic payload".to_string()
        };

        tracing::error!(error = %detail, "Request handler panicked");
        self.notifier.emit(Incident::Unhandled {
            context: "request handler".into(),
            detail,
        });

        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
            ErrorKind::Unclassified.code(),
        )
        .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_error_mapping() {
        let cases = [
            (RelayError::Transport("refused".into()), StatusCode::BAD_GATEWAY),
            (RelayError::UpstreamStatus { code: 429 }, StatusCode::TOO_MANY_REQUESTS),
            (RelayError::MalformedResponse("eof".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (RelayError::RecordNotFound("alice".into()), StatusCode::NOT_FOUND),
            (RelayError::Unclassified("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (RelayError::InvalidHandle("empty".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_unclassified_message_is_generic() {
        let err = ApiError::from(RelayError::Unclassified("mutex poisoned".into()));
        assert_eq!(err.message, "Internal Server Error");
        assert_eq!(err.code, "INTERNAL_ERROR");
    }
}
