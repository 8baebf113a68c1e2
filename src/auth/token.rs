//! Compact `HS256` identity tokens.
//!
//! A token is `base64url(header).base64url(claims).base64url(mac)` where the MAC is
//! HMAC-SHA256 over the first two segments keyed with the service secret. Claims are
//! `{"id": <subject>, "expiry": <unix seconds>}`.
//!
//! Expiry is compared against the caller-supplied `now` with no leeway for clock skew.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::SystemTime;
use tracing::{debug, error};

use super::AuthError;

type HmacSha256 = Hmac<Sha256>;

pub const TOKEN_TTL_SECONDS: i64 = 12 * 60 * 60;
const TOKEN_ALG: &str = "HS256";
const TOKEN_TYP: &str = "JWT";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct TokenHeader {
    alg: String,
    typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: TOKEN_ALG.to_string(),
            typ: TOKEN_TYP.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    #[serde(rename = "id")]
    pub subject_id: i64,
    pub expiry: i64,
}

/// Seconds since the unix epoch, saturating on clock errors.
#[must_use]
pub fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Issues and parses tokens with the process-wide signing key.
pub struct TokenCodec {
    key: SecretString,
}

impl TokenCodec {
    /// # Errors
    /// Returns `SigningFailure` when the key is empty.
    pub fn new(key: SecretString) -> Result<Self, AuthError> {
        if key.expose_secret().is_empty() {
            error!("Token signing key is empty");
            return Err(AuthError::SigningFailure);
        }

        Ok(Self { key })
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(self.key.expose_secret().as_bytes())
            .map_err(|_| AuthError::SigningFailure)
    }

    /// Issue a token for `subject_id`, valid until `now + 12h`.
    ///
    /// # Errors
    /// Returns `SigningFailure` if the claims cannot be encoded or the MAC cannot be keyed.
    pub fn issue(&self, subject_id: i64, now: i64) -> Result<String, AuthError> {
        let claims = Claims {
            subject_id,
            expiry: now.saturating_add(TOKEN_TTL_SECONDS),
        };

        let header_b64 = b64e_json(&TokenHeader::hs256()).ok_or(AuthError::SigningFailure)?;
        let claims_b64 = b64e_json(&claims).ok_or(AuthError::SigningFailure)?;
        let signing_input = format!("{header_b64}.{claims_b64}");

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature_b64}"))
    }

    /// Verify `token` and return its claims.
    ///
    /// Subject matching is left to the caller.
    ///
    /// # Errors
    /// - `MalformedToken` if the token is not three segments, uses another algorithm,
    ///   fails signature verification or carries undecodable claims,
    /// - `Expired` if `expiry < now`.
    pub fn parse(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(AuthError::MalformedToken)?;
        let claims_b64 = parts.next().ok_or(AuthError::MalformedToken)?;
        let sig_b64 = parts.next().ok_or(AuthError::MalformedToken)?;
        if parts.next().is_some() {
            return Err(AuthError::MalformedToken);
        }

        let header: TokenHeader = b64d_json(header_b64).ok_or(AuthError::MalformedToken)?;
        if header.alg != TOKEN_ALG {
            debug!("Rejecting token with alg {}", header.alg);
            return Err(AuthError::MalformedToken);
        }

        let signature =
            Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| AuthError::MalformedToken)?;
        let mut mac = self.mac()?;
        mac.update(format!("{header_b64}.{claims_b64}").as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::MalformedToken)?;

        let claims: Claims = b64d_json(claims_b64).ok_or(AuthError::MalformedToken)?;
        if claims.expiry < now {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").field("key", &"***").finish()
    }
}

fn b64e_json<T: Serialize>(value: &T) -> Option<String> {
    let json = serde_json::to_vec(value).ok()?;
    Some(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Option<T> {
    let bytes = Base64UrlUnpadded::decode_vec(s).ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn codec(key: &str) -> TokenCodec {
        TokenCodec::new(SecretString::from(key.to_string())).unwrap()
    }

    #[test]
    fn issue_then_parse_returns_subject_and_expiry() {
        let codec = codec("test-secret");
        let token = codec.issue(42, NOW).unwrap();
        let claims = codec.parse(&token, NOW).unwrap();
        assert_eq!(claims.subject_id, 42);
        assert_eq!(claims.expiry, NOW + TOKEN_TTL_SECONDS);
    }

    #[test]
    fn issue_is_deterministic() {
        let codec = codec("test-secret");
        assert_eq!(codec.issue(7, NOW).unwrap(), codec.issue(7, NOW).unwrap());
        assert_ne!(codec.issue(7, NOW).unwrap(), codec.issue(8, NOW).unwrap());
    }

    #[test]
    fn expiry_boundary_has_no_grace_window() {
        let codec = codec("test-secret");
        let token = codec.issue(1, NOW).unwrap();
        assert!(codec.parse(&token, NOW + TOKEN_TTL_SECONDS).is_ok());
        assert_eq!(
            codec.parse(&token, NOW + TOKEN_TTL_SECONDS + 1),
            Err(AuthError::Expired)
        );
    }

    #[test]
    fn wrong_key_is_malformed() {
        let token = codec("key-one").issue(1, NOW).unwrap();
        assert_eq!(
            codec("key-two").parse(&token, NOW),
            Err(AuthError::MalformedToken)
        );
    }

    #[test]
    fn tampered_claims_are_malformed() {
        let codec = codec("test-secret");
        let token = codec.issue(5, NOW).unwrap();
        let forged = b64e_json(&Claims {
            subject_id: 7,
            expiry: NOW + TOKEN_TTL_SECONDS,
        })
        .unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = &forged;
        assert_eq!(
            codec.parse(&parts.join("."), NOW),
            Err(AuthError::MalformedToken)
        );
    }

    #[test]
    fn structure_errors_are_malformed() {
        let codec = codec("test-secret");
        for token in ["", "abc", "a.b", "a.b.c.d", "!!.@@.##"] {
            assert_eq!(
                codec.parse(token, NOW),
                Err(AuthError::MalformedToken),
                "{token}"
            );
        }
    }

    #[test]
    fn other_algorithms_are_rejected() {
        let codec = codec("test-secret");
        let header = b64e_json(&TokenHeader {
            alg: "none".to_string(),
            typ: TOKEN_TYP.to_string(),
        })
        .unwrap();
        let claims = b64e_json(&Claims {
            subject_id: 1,
            expiry: NOW + 60,
        })
        .unwrap();
        let token = format!("{header}.{claims}.");
        assert_eq!(codec.parse(&token, NOW), Err(AuthError::MalformedToken));
    }

    #[test]
    fn claims_use_short_field_names() {
        let token = codec("test-secret").issue(9, NOW).unwrap();
        let claims_b64 = token.split('.').nth(1).unwrap();
        let raw: serde_json::Value = b64d_json(claims_b64).unwrap();
        assert_eq!(raw["id"], 9);
        assert_eq!(raw["expiry"], NOW + TOKEN_TTL_SECONDS);
    }

    #[test]
    fn empty_key_is_refused() {
        let result = TokenCodec::new(SecretString::from(String::new()));
        assert!(matches!(result, Err(AuthError::SigningFailure)));
    }

    #[test]
    fn debug_hides_key() {
        let rendered = format!("{:?}", codec("super-secret"));
        assert!(!rendered.contains("super-secret"));
    }
}
