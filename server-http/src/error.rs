use crate::api::responses::ErrorResponse;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use shared::Error;
use tracing::error;

/// Body used for every 5xx response in hardened mode.
pub const GENERIC_SERVER_ERROR: &str = "internal error";

/// Handler error: a status code and the message sent as `{ "error": ... }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            Error::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            Error::Conflict => StatusCode::CONFLICT,
            Error::ConfigurationMissing(_) | Error::Storage(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{}: {}", self.status, self.message);
        }
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::validation("scope", "bad"), StatusCode::BAD_REQUEST),
            (Error::NotFound("poll".into()), StatusCode::NOT_FOUND),
            (Error::QuotaExceeded, StatusCode::TOO_MANY_REQUESTS),
            (Error::UpstreamUnavailable("x".into()), StatusCode::BAD_GATEWAY),
            (
                Error::ConfigurationMissing("YOUTUBE_API_KEY"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (Error::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_validation_message_names_field() {
        let err = ApiError::from(Error::validation("scope", "'x' is not valid"));

        assert!(err.message.contains("scope"));
    }
}
