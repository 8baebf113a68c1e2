//! Ownership guard for `/users/{id}` routes.
//!
//! Flow Overview:
//! 1) Read the `id` path parameter and parse it as an integer.
//! 2) Split the `Authorization` header into exactly `<scheme> <token>`.
//! 3) Verify the token signature and expiry.
//! 4) Require the token subject to equal the path id.
//!
//! The first failing step decides the response. On success the validated id is
//! stored in the request extensions as [`Owner`] for the handler to use.

use axum::{
    extract::{rejection::RawPathParamsRejection, Extension, RawPathParams, Request},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

use super::{now_unix_seconds, AuthError, TokenCodec};
use crate::api::ApiError;

pub const OWNER_PATH_PARAM: &str = "id";

/// User id that the caller has proven ownership of.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Owner(pub i64);

/// Decide whether a request may act on the user named in its path.
///
/// # Errors
/// Returns the first failed check as an [`AuthError`].
pub fn authorize(
    codec: &TokenCodec,
    raw_id: Option<&str>,
    authorization: Option<&HeaderValue>,
    now: i64,
) -> Result<Owner, AuthError> {
    let raw_id = raw_id
        .filter(|id| !id.is_empty())
        .ok_or(AuthError::MissingPathParameter)?;
    let id: i64 = raw_id
        .parse()
        .map_err(|_| AuthError::InvalidPathParameter)?;

    let header = authorization.ok_or(AuthError::MissingCredential)?;
    let token = bearer_token(header)?;

    let claims = codec.parse(token, now)?;
    if claims.subject_id != id {
        debug!(
            subject = claims.subject_id,
            resource = id,
            "token subject does not own resource"
        );
        return Err(AuthError::OwnershipMismatch);
    }

    Ok(Owner(id))
}

/// Extract the token from an `Authorization: <scheme> <token>` value.
///
/// The scheme is required but not interpreted.
fn bearer_token(header: &HeaderValue) -> Result<&str, AuthError> {
    let value = header.to_str().map_err(|_| AuthError::MalformedCredential)?;
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if !scheme.is_empty() && !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedCredential),
    }
}

/// Middleware applied as a route layer to every owner-scoped route.
pub async fn require_owner(
    Extension(codec): Extension<Arc<TokenCodec>>,
    params: Result<RawPathParams, RawPathParamsRejection>,
    mut request: Request,
    next: Next,
) -> Response {
    // Undecodable segments (invalid UTF-8) are reported as an invalid id.
    let params = match params {
        Ok(params) => params,
        Err(rejection) => {
            debug!("rejected path parameters: {rejection}");
            return ApiError::from(AuthError::InvalidPathParameter).into_response();
        }
    };

    let raw_id = params
        .iter()
        .find(|(name, _)| *name == OWNER_PATH_PARAM)
        .map(|(_, value)| value);

    match authorize(
        &codec,
        raw_id,
        request.headers().get(AUTHORIZATION),
        now_unix_seconds(),
    ) {
        Ok(owner) => {
            request.extensions_mut().insert(owner);
            next.run(request).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    const NOW: i64 = 1_700_000_000;

    fn codec() -> TokenCodec {
        TokenCodec::new(SecretString::from("guard-secret".to_string())).unwrap()
    }

    fn bearer(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
    }

    #[test]
    fn owner_token_is_allowed() {
        let codec = codec();
        let token = codec.issue(5, NOW).unwrap();
        let header = bearer(&token);
        assert_eq!(
            authorize(&codec, Some("5"), Some(&header), NOW),
            Ok(Owner(5))
        );
    }

    #[test]
    fn path_checks_come_first() {
        let codec = codec();
        assert_eq!(
            authorize(&codec, None, None, NOW),
            Err(AuthError::MissingPathParameter)
        );
        assert_eq!(
            authorize(&codec, Some(""), None, NOW),
            Err(AuthError::MissingPathParameter)
        );
        assert_eq!(
            authorize(&codec, Some("abc"), None, NOW),
            Err(AuthError::InvalidPathParameter)
        );
    }

    #[test]
    fn missing_header_is_missing_credential() {
        assert_eq!(
            authorize(&codec(), Some("5"), None, NOW),
            Err(AuthError::MissingCredential)
        );
    }

    #[test]
    fn header_must_have_exactly_two_parts() {
        let codec = codec();
        let token = codec.issue(5, NOW).unwrap();
        for value in [
            token.clone(),
            format!("Bearer  {token}"),
            format!("Bearer {token} extra"),
            "Bearer ".to_string(),
            format!(" {token}"),
        ] {
            let header = HeaderValue::from_str(&value).unwrap();
            assert_eq!(
                authorize(&codec, Some("5"), Some(&header), NOW),
                Err(AuthError::MalformedCredential),
                "{value:?}"
            );
        }
    }

    #[test]
    fn scheme_is_not_interpreted() {
        let codec = codec();
        let token = codec.issue(5, NOW).unwrap();
        let header = HeaderValue::from_str(&format!("Token {token}")).unwrap();
        assert!(authorize(&codec, Some("5"), Some(&header), NOW).is_ok());
    }

    #[test]
    fn token_errors_propagate() {
        let codec = codec();
        let header = bearer("not.a.token");
        assert_eq!(
            authorize(&codec, Some("5"), Some(&header), NOW),
            Err(AuthError::MalformedToken)
        );

        let token = codec.issue(5, NOW).unwrap();
        let header = bearer(&token);
        assert_eq!(
            authorize(&codec, Some("5"), Some(&header), NOW + 13 * 60 * 60),
            Err(AuthError::Expired)
        );
    }

    #[test]
    fn other_subject_is_ownership_mismatch() {
        let codec = codec();
        let token = codec.issue(5, NOW).unwrap();
        let header = bearer(&token);
        assert_eq!(
            authorize(&codec, Some("7"), Some(&header), NOW),
            Err(AuthError::OwnershipMismatch)
        );
    }
}
