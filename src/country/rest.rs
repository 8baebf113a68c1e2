//! Client for the public REST Countries catalogue.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;
use utoipa::ToSchema;

use crate::{store::NewCountry, APP_USER_AGENT};

pub const DEFAULT_REST_COUNTRIES_URL: &str = "https://restcountries.com";

// `/v3.1/all` refuses requests without a field list.
const ALL_COUNTRIES_PATH: &str = "v3.1/all?fields=name,cca2,capital,region,subregion";

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaCountryName {
    #[serde(default)]
    pub common: String,
    #[serde(default)]
    pub official: String,
}

/// One upstream entry, reduced to the attributes the service keeps.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaCountry {
    #[serde(default)]
    pub name: MetaCountryName,
    #[serde(default)]
    pub cca2: String,
    #[serde(default)]
    pub capital: Vec<String>,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub subregion: String,
}

impl From<&MetaCountry> for NewCountry {
    fn from(meta: &MetaCountry) -> Self {
        Self {
            common_name: meta.name.common.clone(),
            official_name: meta.name.official.clone(),
            country_code: meta.cca2.clone(),
            capital: meta.capital.first().cloned().unwrap_or_default(),
            region: meta.region.clone(),
            sub_region: meta.subregion.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RestCountriesClient {
    client: Client,
    all_url: Url,
}

impl RestCountriesClient {
    /// # Errors
    /// Returns an error if `base_url` is not a valid URL or the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
            .with_context(|| format!("Invalid REST Countries URL: {base_url}"))?;
        let all_url = base
            .join(ALL_COUNTRIES_PATH)
            .context("Failed to build REST Countries URL")?;

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, all_url })
    }

    #[must_use]
    pub fn all_url(&self) -> &Url {
        &self.all_url
    }

    /// Fetch every country from upstream.
    ///
    /// # Errors
    /// Returns the transport, status or decoding error from `reqwest`.
    #[instrument(skip(self), fields(url = %self.all_url))]
    pub async fn fetch_all(&self) -> Result<Vec<MetaCountry>, reqwest::Error> {
        let countries: Vec<MetaCountry> = self
            .client
            .get(self.all_url.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!("Fetched {} countries", countries.len());

        Ok(countries)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn maps_first_capital_only() {
        let meta: MetaCountry = serde_json::from_str(
            r#"{
                "name": {"common": "South Africa", "official": "Republic of South Africa"},
                "cca2": "ZA",
                "capital": ["Pretoria", "Bloemfontein", "Cape Town"],
                "region": "Africa",
                "subregion": "Southern Africa"
            }"#,
        )
        .unwrap();

        let country = NewCountry::from(&meta);
        assert_eq!(country.common_name, "South Africa");
        assert_eq!(country.official_name, "Republic of South Africa");
        assert_eq!(country.country_code, "ZA");
        assert_eq!(country.capital, "Pretoria");
        assert_eq!(country.sub_region, "Southern Africa");
    }

    #[test]
    fn missing_attributes_default_to_empty() {
        let meta: MetaCountry =
            serde_json::from_str(r#"{"name": {"common": "Antarctica"}, "cca2": "AQ"}"#).unwrap();

        let country = NewCountry::from(&meta);
        assert_eq!(country.capital, "");
        assert_eq!(country.official_name, "");
        assert_eq!(country.region, "");
    }

    #[test]
    fn all_url_is_built_from_base() {
        let client = RestCountriesClient::new("http://127.0.0.1:9000").unwrap();
        assert_eq!(client.all_url().path(), "/v3.1/all");
        assert_eq!(client.all_url().host_str(), Some("127.0.0.1"));

        let client = RestCountriesClient::new("https://restcountries.com/").unwrap();
        assert_eq!(
            client.all_url().as_str(),
            "https://restcountries.com/v3.1/all?fields=name,cca2,capital,region,subregion"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(RestCountriesClient::new("not a url").is_err());
    }
}
