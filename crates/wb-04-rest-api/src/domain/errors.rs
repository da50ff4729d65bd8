//! # REST Errors
//!
//! Every failure is answered with `{"message": "..."}` and a status code:
//! 400 for bad input, 404 for unknown resources, 500 for store failures and
//! 502 when the node could not be reached.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use shared_types::{DecodeError, NodeClientError};
use thiserror::Error;
use tracing::error;
use wb_01_bill_store::StoreError;

/// Errors returned by REST handlers.
#[derive(Debug, Error)]
pub enum RestError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("node error: {0}")]
    Node(#[from] NodeClientError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DecodeError> for RestError {
    fn from(err: DecodeError) -> Self {
        RestError::BadRequest(err.to_string())
    }
}

impl RestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RestError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RestError::NotFound(_) => StatusCode::NOT_FOUND,
            RestError::Store(_) | RestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RestError::Node(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("[wb-04] {}", self);
        }
        (
            status,
            Json(ErrorBody {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}
