//! # Worldpass (users, countries and ownership-scoped tokens)
//!
//! `worldpass` serves user and country resources over HTTP. Users sign up with a
//! password and receive a signed bearer token; the token only grants access to the
//! user record it was issued for.
//!
//! ## Authentication
//!
//! Passwords are hashed with **Argon2id** and never stored or returned in plaintext.
//! Signup and login both answer with a compact `HS256` token holding the user id and
//! an absolute expiry twelve hours after issuance. Tokens are stateless: there is no
//! session table, no revocation list and no refresh flow.
//!
//! ## Authorization
//!
//! Every `/users/{id}` route sits behind a single middleware that checks, in order,
//! the path id, the `Authorization` header, the token signature and expiry, and
//! finally that the token subject equals the path id. Login never reveals whether an
//! email is registered.
//!
//! ## Countries
//!
//! Country records can be listed or filtered by code, name or id. `/rest-countries`
//! pulls the public REST Countries catalogue and hands the result to a background
//! importer whose completion can be awaited.

pub mod api;
pub mod auth;
pub mod cli;
pub mod country;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
