//! Probe outcome normalization.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use common::errors::AppResult;
use common::models::BackendKind;

pub const CONNECTED_BODY: &str = "Connected successfully";
pub const FAILED_BODY: &str = "Could not connect to database";

/// Two-valued result of one connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success,
    /// Carries the raw error text; it is logged, never sent to the client.
    Failure(String),
}

impl ProbeOutcome {
    /// Collapses an adapter result into success or failure, logging failures.
    pub fn from_attempt(kind: BackendKind, attempt: AppResult<()>) -> Self {
        match attempt {
            Ok(()) => {
                tracing::info!(backend = %kind, "Connected successfully");
                ProbeOutcome::Success
            }
            Err(e) => {
                if e.is_connection_failure() {
                    tracing::error!(backend = %kind, error = %e, "Could not connect to database");
                } else {
                    tracing::warn!(backend = %kind, error = %e, "Probe failed before connecting");
                }
                ProbeOutcome::Failure(e.to_string())
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success)
    }
}

impl IntoResponse for ProbeOutcome {
    fn into_response(self) -> Response {
        match self {
            ProbeOutcome::Success => plain_text(StatusCode::OK, CONNECTED_BODY),
            ProbeOutcome::Failure(_) => plain_text(StatusCode::INTERNAL_SERVER_ERROR, FAILED_BODY),
        }
    }
}

/// Builds a response with `Content-Type: text/plain`.
pub fn plain_text(status: StatusCode, body: &'static str) -> Response {
    let mut response = (status, body).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::errors::AppError;

    #[test]
    fn test_ok_attempt_is_success() {
        let outcome = ProbeOutcome::from_attempt(BackendKind::Postgres, Ok(()));
        assert_eq!(outcome, ProbeOutcome::Success);
        assert!(outcome.is_success());
    }

    #[test]
    fn test_every_error_kind_is_failure() {
        let errors = vec![
            AppError::DatabaseConnection("password authentication failed".into()),
            AppError::MongoConnection("server selection timeout".into()),
            AppError::Config("bad".into()),
        ];
        for err in errors {
            let text = err.to_string();
            let outcome = ProbeOutcome::from_attempt(BackendKind::MySql, Err(err));
            assert_eq!(outcome, ProbeOutcome::Failure(text));
        }
    }

    #[test]
    fn test_success_response() {
        let resp = ProbeOutcome::Success.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn test_failure_response_hides_detail() {
        let resp = ProbeOutcome::Failure("secret-host refused".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/plain");
    }
}
