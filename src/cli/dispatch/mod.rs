use crate::cli::{
    actions::{server::Args, Action},
    commands,
};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches
        .get_one::<u16>(commands::ARG_PORT)
        .copied()
        .unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(commands::ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;
    let secret_key = matches
        .get_one::<String>(commands::ARG_SECRET_KEY)
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --secret-key")?;
    let rest_countries_url = matches
        .get_one::<String>(commands::ARG_REST_COUNTRIES_URL)
        .cloned()
        .unwrap_or_else(|| crate::country::DEFAULT_REST_COUNTRIES_URL.to_string());

    Ok(Action::Server(Args {
        port,
        dsn,
        secret_key,
        rest_countries_url,
    }))
}
