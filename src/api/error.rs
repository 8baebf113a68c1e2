use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use crate::{
    auth::AuthError,
    country::ImportError,
    store::StoreError,
};

/// JSON body of every failed request.
#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid data in request body")]
    Payload,
    #[error("invalid query parameter")]
    InvalidQueryParameter,
    #[error("failed to fetch countries from upstream")]
    Upstream(#[source] reqwest::Error),
    #[error(transparent)]
    Import(#[from] ImportError),
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Auth(err) => err.status(),
            Self::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Store(StoreError::Database(_)) | Self::Import(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Payload | Self::InvalidQueryParameter => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Auth(err) => err.reason(),
            Self::Store(StoreError::NotFound) => "NotFound",
            Self::Store(StoreError::Conflict(_)) => "Conflict",
            Self::Store(StoreError::Database(_)) => "Database",
            Self::Payload => "InvalidPayload",
            Self::InvalidQueryParameter => "InvalidQueryParameter",
            Self::Upstream(_) => "Upstream",
            Self::Import(_) => "Import",
        }
    }

    /// Message safe to show to the caller.
    fn public_message(&self) -> String {
        match self {
            Self::Auth(err) if err.is_internal() => "internal server error".to_string(),
            Self::Store(StoreError::Database(_)) | Self::Import(_) => {
                "internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!("Request failed ({status}): {self:?}");
        }

        let body = ErrorBody {
            error: self.public_message(),
            reason: self.reason().to_string(),
        };

        (status, Json(body)).into_response()
    }
}
