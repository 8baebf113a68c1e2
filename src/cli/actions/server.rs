use crate::{
    api::{self, AppContext},
    auth::TokenCodec,
    country::RestCountriesClient,
    store::PgStore,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub secret_key: SecretString,
    pub rest_countries_url: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the secret key is empty, the database is unreachable,
/// or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    // A bad key must stop startup before anything else happens.
    let codec = TokenCodec::new(args.secret_key).context("Invalid secret key")?;

    let dsn = Url::parse(&args.dsn).context("Invalid database connection string")?;

    let countries = RestCountriesClient::new(&args.rest_countries_url)?;
    debug!("REST Countries endpoint: {}", countries.all_url());

    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(dsn.as_str())
        .await
        .context("Failed to connect to database")?;

    let store = PgStore::new(pool);
    store
        .ensure_schema()
        .await
        .context("Failed to apply database schema")?;

    info!("Database ready");

    let ctx = AppContext::new(Arc::new(store), codec, countries);

    api::new(args.port, ctx).await
}
