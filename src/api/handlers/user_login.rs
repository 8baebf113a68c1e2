//! Password login.
//!
//! An unknown email and a wrong password produce the same `401` body. For unknown
//! emails a throwaway digest is still verified so both paths cost one Argon2 run.

use axum::{extract::Extension, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use super::IdentityResponse;
use crate::{
    api::{ApiError, ErrorBody},
    auth::{now_unix_seconds, password, AuthError, TokenCodec},
    store::{Store, StoreError, UserStore},
};

#[derive(ToSchema, Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// # Errors
/// Missing fields are `400`; any credential mismatch is `InvalidCredentials`.
pub async fn login_user<S>(
    store: &S,
    codec: &TokenCodec,
    request: LoginRequest,
) -> Result<IdentityResponse, ApiError>
where
    S: UserStore + ?Sized,
{
    if request.email.is_empty() || request.password.is_empty() {
        return Err(AuthError::ValidationFailure("missing email or password".to_string()).into());
    }

    let record = match store.get_by_email(&request.email).await {
        Ok(record) => record,
        Err(StoreError::NotFound) => {
            debug!("login for unknown email");
            password::verify_dummy_blocking(request.password).await;
            return Err(AuthError::InvalidCredentials.into());
        }
        Err(err) => return Err(err.into()),
    };

    if !password::verify_blocking(request.password, record.password_hash).await? {
        debug!("password mismatch for user {}", record.id);
        return Err(AuthError::InvalidCredentials.into());
    }

    let jwt_token = codec.issue(record.id, now_unix_seconds())?;

    Ok(IdentityResponse {
        id: record.id,
        jwt_token,
    })
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses (
        (status = 200, description = "Login successful", body = IdentityResponse, content_type = "application/json"),
        (status = 400, description = "Missing email or password", body = ErrorBody),
        (status = 401, description = "Credentials do not match", body = ErrorBody),
    ),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn login(
    Extension(store): Extension<Arc<dyn Store>>,
    Extension(codec): Extension<Arc<TokenCodec>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Json<IdentityResponse>, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Payload);
    };

    login_user(store.as_ref(), &codec, request).await.map(Json)
}
