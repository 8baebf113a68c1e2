use axum::{extract::Extension, http::StatusCode, Json};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{IdentityResponse, UserPayload};
use crate::{
    api::{ApiError, ErrorBody},
    auth::{now_unix_seconds, password, TokenCodec},
    store::{Store, UserStore},
};

/// Validate, hash, persist and issue a token for the new user.
///
/// # Errors
/// Validation is `400`, a taken email `409`, hashing/signing/storage `500`.
pub async fn signup_user<S>(
    store: &S,
    codec: &TokenCodec,
    payload: UserPayload,
) -> Result<IdentityResponse, ApiError>
where
    S: UserStore + ?Sized,
{
    payload.validate()?;

    let digest = password::hash_blocking(payload.password.clone()).await?;
    let id = store.create(payload.into_new_user(digest)).await?;

    debug!("Created user {id}");

    let jwt_token = codec.issue(id, now_unix_seconds())?;

    Ok(IdentityResponse { id, jwt_token })
}

#[utoipa::path(
    post,
    path = "/signup",
    request_body = UserPayload,
    responses (
        (status = 201, description = "User created", body = IdentityResponse, content_type = "application/json"),
        (status = 400, description = "Missing or invalid fields", body = ErrorBody),
        (status = 409, description = "User with the specified email already exists", body = ErrorBody),
    ),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn signup(
    Extension(store): Extension<Arc<dyn Store>>,
    Extension(codec): Extension<Arc<TokenCodec>>,
    payload: Option<Json<UserPayload>>,
) -> Result<(StatusCode, Json<IdentityResponse>), ApiError> {
    let Some(Json(payload)) = payload else {
        return Err(ApiError::Payload);
    };

    debug!("signup: {:?}", payload);

    let identity = signup_user(store.as_ref(), &codec, payload).await?;

    Ok((StatusCode::CREATED, Json(identity)))
}
