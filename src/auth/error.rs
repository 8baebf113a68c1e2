use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0}")]
    ValidationFailure(String),
    #[error("please check for missing path parameter")]
    MissingPathParameter,
    #[error("invalid path parameter")]
    InvalidPathParameter,
    #[error("missing Authorization header")]
    MissingCredential,
    #[error("invalid Authorization header")]
    MalformedCredential,
    #[error("invalid token")]
    MalformedToken,
    #[error("token is expired")]
    Expired,
    #[error("no authorization to this entity")]
    OwnershipMismatch,
    #[error("credentials do not match, please try again")]
    InvalidCredentials,
    #[error("failed to hash credential")]
    HashingFailure,
    #[error("failed to sign token")]
    SigningFailure,
}

impl AuthError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::ValidationFailure(_)
            | Self::MissingPathParameter
            | Self::InvalidPathParameter => StatusCode::BAD_REQUEST,
            Self::MissingCredential
            | Self::MalformedCredential
            | Self::MalformedToken
            | Self::Expired
            | Self::OwnershipMismatch
            | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::HashingFailure | Self::SigningFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable name, returned next to the human message.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::ValidationFailure(_) => "ValidationFailure",
            Self::MissingPathParameter => "MissingPathParameter",
            Self::InvalidPathParameter => "InvalidPathParameter",
            Self::MissingCredential => "MissingCredential",
            Self::MalformedCredential => "MalformedCredential",
            Self::MalformedToken => "MalformedToken",
            Self::Expired => "Expired",
            Self::OwnershipMismatch => "OwnershipMismatch",
            Self::InvalidCredentials => "InvalidCredentials",
            Self::HashingFailure => "HashingFailure",
            Self::SigningFailure => "SigningFailure",
        }
    }

    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::HashingFailure | Self::SigningFailure)
    }
}
