//! Route handlers and the request types they share.

pub mod countries;
pub mod health;
pub mod root;
pub mod user_login;
pub mod user_signup;
pub mod users;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{auth::AuthError, store::NewUser};

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[a-zA-Z0-9._]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").is_ok_and(|re| re.is_match(email))
}

/// Body of signup and full user replacement.
///
/// Absent fields deserialize to empty values so validation can name them.
#[derive(ToSchema, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPayload {
    pub name: String,
    pub country_id: i64,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for UserPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserPayload")
            .field("name", &self.name)
            .field("country_id", &self.country_id)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

impl UserPayload {
    /// Check fields in order and report the first one that is wrong.
    ///
    /// # Errors
    /// Returns `ValidationFailure` naming the offending field.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.name.is_empty() {
            return Err(AuthError::ValidationFailure(
                "user name cannot be empty".to_string(),
            ));
        }

        if self.country_id <= 0 {
            return Err(AuthError::ValidationFailure(
                "user's country cannot be empty".to_string(),
            ));
        }

        if !valid_email(&self.email) {
            return Err(AuthError::ValidationFailure(
                "user email is empty or invalid".to_string(),
            ));
        }

        if self.password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::ValidationFailure(
                "password should contain a minimum of 8 characters".to_string(),
            ));
        }

        Ok(())
    }

    /// Consume the payload, pairing its fields with an already computed digest.
    #[must_use]
    pub fn into_new_user(self, password_hash: String) -> NewUser {
        NewUser {
            name: self.name,
            country_id: self.country_id,
            email: self.email,
            password_hash,
        }
    }
}

/// Returned by signup and login.
#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct IdentityResponse {
    pub id: i64,
    #[serde(rename = "jwtToken")]
    pub jwt_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> UserPayload {
        UserPayload {
            name: "Ann".to_string(),
            country_id: 1,
            email: "ann@x.com".to_string(),
            password: "longenough1".to_string(),
        }
    }

    #[test]
    fn test_valid_email() {
        assert!(valid_email("ann@x.com"));
        assert!(valid_email("first.last_1@mail.example.org"));
        assert!(!valid_email(""));
        assert!(!valid_email("ann"));
        assert!(!valid_email("ann@x"));
        assert!(!valid_email("ann+tag@x.com"));
        assert!(!valid_email("ann@x.c"));
    }

    #[test]
    fn valid_payload_passes() {
        assert_eq!(payload().validate(), Ok(()));
    }

    #[test]
    fn first_failing_field_is_reported() {
        let mut user = payload();
        user.name.clear();
        user.country_id = 0;
        assert_eq!(
            user.validate(),
            Err(AuthError::ValidationFailure(
                "user name cannot be empty".to_string()
            ))
        );

        let mut user = payload();
        user.country_id = -3;
        user.email = "bad".to_string();
        assert_eq!(
            user.validate(),
            Err(AuthError::ValidationFailure(
                "user's country cannot be empty".to_string()
            ))
        );

        let mut user = payload();
        user.email = "bad".to_string();
        assert_eq!(
            user.validate(),
            Err(AuthError::ValidationFailure(
                "user email is empty or invalid".to_string()
            ))
        );
    }

    #[test]
    fn password_needs_eight_characters() {
        let mut user = payload();
        user.password = "1234567".to_string();
        assert!(user.validate().is_err());
        user.password = "12345678".to_string();
        assert!(user.validate().is_ok());
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let user: UserPayload = serde_json::from_str(r#"{"name":"Ann"}"#).unwrap_or_default();
        assert_eq!(user.name, "Ann");
        assert_eq!(user.country_id, 0);
        assert!(user.email.is_empty());
    }

    #[test]
    fn debug_hides_password() {
        assert!(!format!("{:?}", payload()).contains("longenough1"));
    }
}
