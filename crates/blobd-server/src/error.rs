use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use blobd_store::StoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("missing Content-Length header")]
    MissingContentLength,

    #[error("invalid Content-Length header: {0:?}")]
    InvalidContentLength(String),

    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::MissingContentLength | Self::InvalidContentLength(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Store(e) => match e {
                StoreError::InvalidName { .. } => "invalid_name",
                StoreError::EmptyObject => "empty_object",
                StoreError::NotFound(_) => "not_found",
                StoreError::LengthMismatch { .. } => "length_mismatch",
                StoreError::StalledStream(_) => "stalled_stream",
                StoreError::Io(_) => "io",
            },
            Self::MissingContentLength => "missing_content_length",
            Self::InvalidContentLength(_) => "invalid_content_length",
            Self::Bind { .. } => "bind",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "request failed");
        } else {
            tracing::warn!(error = %self, code = self.code(), "request rejected");
        }
        let body = ErrorBody {
            error: self.to_string(),
            code: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (ServerError::Store(StoreError::EmptyObject), 400),
            (ServerError::Store(StoreError::NotFound("x".into())), 404),
            (
                ServerError::Store(StoreError::InvalidName {
                    name: "..".into(),
                    reason: "traversal".into(),
                }),
                400,
            ),
            (
                ServerError::Store(StoreError::LengthMismatch { expected: 2, actual: 1 }),
                500,
            ),
            (ServerError::Store(StoreError::Io(std::io::Error::other("disk"))), 500),
            (ServerError::MissingContentLength, 400),
            (ServerError::InvalidContentLength("abc".into()), 400),
            (ServerError::Internal("boom".into()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(err.status().as_u16(), status, "{err}");
        }
    }

    #[test]
    fn codes() {
        assert_eq!(ServerError::Store(StoreError::EmptyObject).code(), "empty_object");
        assert_eq!(ServerError::MissingContentLength.code(), "missing_content_length");
    }
}
