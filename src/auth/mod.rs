//! Credential hashing, token codec and the ownership guard.
//!
//! Nothing in here keeps mutable state. The only shared value is the signing key,
//! owned by [`TokenCodec`] and handed around behind an `Arc`.

mod error;
pub mod guard;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use guard::{authorize, require_owner, Owner};
pub use token::{now_unix_seconds, Claims, TokenCodec, TOKEN_TTL_SECONDS};
