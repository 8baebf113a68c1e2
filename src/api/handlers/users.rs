//! Owner-scoped user endpoints.
//!
//! Every route here sits behind `require_owner`, so the [`Owner`] extension is the
//! already validated path id.

use axum::{extract::Extension, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use super::UserPayload;
use crate::{
    api::{ApiError, ErrorBody},
    auth::{password, Owner},
    store::{Store, UserRecord, UserStore},
};

/// User as returned to clients. There is no password field.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub country_id: i64,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            country_id: record.country_id,
            email: record.email,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// # Errors
/// Validation is `400`, a missing user `404`, a taken email `409`.
pub async fn replace_user<S>(
    store: &S,
    id: i64,
    payload: UserPayload,
) -> Result<UserResponse, ApiError>
where
    S: UserStore + ?Sized,
{
    payload.validate()?;

    let digest = password::hash_blocking(payload.password.clone()).await?;
    let record = store.update(id, payload.into_new_user(digest)).await?;

    debug!("Updated user {id}");

    Ok(record.into())
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(
        ("id" = i64, Path, description = "User id"),
    ),
    responses (
        (status = 200, description = "User record", body = UserResponse),
        (status = 400, description = "Missing or invalid path id", body = ErrorBody),
        (status = 401, description = "Missing, invalid or foreign token", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[instrument(skip_all, fields(user_id = id))]
pub async fn get_user(
    Extension(Owner(id)): Extension<Owner>,
    Extension(store): Extension<Arc<dyn Store>>,
) -> Result<Json<UserResponse>, ApiError> {
    let record = UserStore::get_by_id(store.as_ref(), id).await?;

    Ok(Json(record.into()))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    params(
        ("id" = i64, Path, description = "User id"),
    ),
    request_body = UserPayload,
    responses (
        (status = 200, description = "Updated user record", body = UserResponse),
        (status = 400, description = "Invalid path id or body", body = ErrorBody),
        (status = 401, description = "Missing, invalid or foreign token", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
        (status = 409, description = "Email belongs to another user", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[instrument(skip_all, fields(user_id = id))]
pub async fn update_user(
    Extension(Owner(id)): Extension<Owner>,
    Extension(store): Extension<Arc<dyn Store>>,
    payload: Option<Json<UserPayload>>,
) -> Result<Json<UserResponse>, ApiError> {
    let Some(Json(payload)) = payload else {
        return Err(ApiError::Payload);
    };

    replace_user(store.as_ref(), id, payload).await.map(Json)
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(
        ("id" = i64, Path, description = "User id"),
    ),
    responses (
        (status = 204, description = "User deleted"),
        (status = 400, description = "Missing or invalid path id", body = ErrorBody),
        (status = 401, description = "Missing, invalid or foreign token", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[instrument(skip_all, fields(user_id = id))]
pub async fn delete_user(
    Extension(Owner(id)): Extension<Owner>,
    Extension(store): Extension<Arc<dyn Store>>,
) -> Result<StatusCode, ApiError> {
    store.delete(id).await?;

    debug!("Deleted user {id}");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, NewUser, StoreError};

    fn payload(email: &str) -> UserPayload {
        UserPayload {
            name: "Anna".to_string(),
            country_id: 2,
            email: email.to_string(),
            password: "newpassword".to_string(),
        }
    }

    async fn seed(store: &MemoryStore, email: &str) -> i64 {
        store
            .create(NewUser {
                name: "Ann".to_string(),
                country_id: 1,
                email: email.to_string(),
                password_hash: password::hash("longenough1").unwrap(),
            })
            .await
            .unwrap()
    }

    #[test]
    fn response_never_carries_password() {
        let response = UserResponse::from(UserRecord {
            id: 1,
            name: "Ann".to_string(),
            country_id: 1,
            email: "ann@x.com".to_string(),
            password_hash: "$argon2id$digest".to_string(),
            created_at: None,
            updated_at: None,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["countryId"], 1);
    }

    #[tokio::test]
    async fn replace_rehashes_password() {
        let store = MemoryStore::new();
        let id = seed(&store, "ann@x.com").await;

        let response = replace_user(&store, id, payload("anna@x.com"))
            .await
            .unwrap();
        assert_eq!(response.name, "Anna");
        assert_eq!(response.country_id, 2);

        let record = UserStore::get_by_id(&store, id).await.unwrap();
        assert!(password::verify("newpassword", &record.password_hash).unwrap());
        assert!(!password::verify("longenough1", &record.password_hash).unwrap());
    }

    #[tokio::test]
    async fn replace_validates_and_maps_store_errors() {
        let store = MemoryStore::new();
        let id = seed(&store, "ann@x.com").await;
        seed(&store, "bob@x.com").await;

        let mut invalid = payload("anna@x.com");
        invalid.name.clear();
        assert!(replace_user(&store, id, invalid).await.is_err());

        assert!(matches!(
            replace_user(&store, id, payload("bob@x.com")).await,
            Err(ApiError::Store(StoreError::Conflict(_)))
        ));
        assert!(matches!(
            replace_user(&store, 99, payload("new@x.com")).await,
            Err(ApiError::Store(StoreError::NotFound))
        ));
    }
}
