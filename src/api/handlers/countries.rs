use axum::{
    extract::{Extension, Query},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::IntoParams;

use crate::{
    api::{ApiError, ErrorBody},
    country::{CountryImporter, MetaCountry, RestCountriesClient},
    store::{Country, CountryStore, NewCountry, Store},
};

/// Optional filters for `/countries`. The first non-empty one wins: `code`, then
/// `name`, then `id`.
#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct CountryFilter {
    /// Two-letter country code
    pub code: Option<String>,
    /// Common name
    pub name: Option<String>,
    /// Numeric id
    pub id: Option<String>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// # Errors
/// `404` when a filter matches nothing, `400` for a non-integer `id`.
pub async fn find_countries<S>(store: &S, filter: &CountryFilter) -> Result<Vec<Country>, ApiError>
where
    S: CountryStore + ?Sized,
{
    if let Some(code) = non_empty(filter.code.as_ref()) {
        return Ok(vec![store.get_by_code(code).await?]);
    }

    if let Some(name) = non_empty(filter.name.as_ref()) {
        return Ok(vec![store.get_by_name(name).await?]);
    }

    let Some(id) = non_empty(filter.id.as_ref()) else {
        return Ok(store.get_all().await?);
    };

    let id: i64 = id.parse().map_err(|_| ApiError::InvalidQueryParameter)?;

    Ok(vec![store.get_by_id(id).await?])
}

#[utoipa::path(
    get,
    path = "/countries",
    params(CountryFilter),
    responses (
        (status = 200, description = "Matching countries", body = [Country]),
        (status = 400, description = "Non-integer id", body = ErrorBody),
        (status = 404, description = "No country matches the filter", body = ErrorBody),
    ),
    tag = "countries"
)]
#[instrument(skip_all)]
pub async fn list_countries(
    Extension(store): Extension<Arc<dyn Store>>,
    Query(filter): Query<CountryFilter>,
) -> Result<Json<Vec<Country>>, ApiError> {
    find_countries(store.as_ref(), &filter).await.map(Json)
}

#[utoipa::path(
    get,
    path = "/rest-countries",
    responses (
        (status = 200, description = "Countries fetched from REST Countries; storing them continues in the background", body = [MetaCountry]),
        (status = 502, description = "REST Countries could not be reached or decoded", body = ErrorBody),
    ),
    tag = "countries"
)]
#[instrument(skip_all)]
pub async fn rest_countries(
    Extension(client): Extension<Arc<RestCountriesClient>>,
    Extension(importer): Extension<CountryImporter>,
) -> Result<Json<Vec<MetaCountry>>, ApiError> {
    let countries = client.fetch_all().await.map_err(ApiError::Upstream)?;

    let batch: Vec<NewCountry> = countries.iter().map(NewCountry::from).collect();
    debug!("Queueing {} countries for import", batch.len());

    // Completion is logged by the importer.
    drop(importer.submit(batch));

    Ok(Json(countries))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError};

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_many(vec![
                NewCountry {
                    common_name: "Chile".to_string(),
                    official_name: "Republic of Chile".to_string(),
                    country_code: "CL".to_string(),
                    capital: "Santiago".to_string(),
                    region: "Americas".to_string(),
                    sub_region: "South America".to_string(),
                },
                NewCountry {
                    common_name: "Peru".to_string(),
                    official_name: "Republic of Peru".to_string(),
                    country_code: "PE".to_string(),
                    capital: "Lima".to_string(),
                    region: "Americas".to_string(),
                    sub_region: "South America".to_string(),
                },
            ])
            .await
            .unwrap();
        store
    }

    fn filter(code: Option<&str>, name: Option<&str>, id: Option<&str>) -> CountryFilter {
        CountryFilter {
            code: code.map(str::to_string),
            name: name.map(str::to_string),
            id: id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn no_filter_returns_everything() {
        let store = seeded().await;
        let all = find_countries(&store, &CountryFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let all = find_countries(&store, &filter(Some(""), Some(""), Some("")))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn code_wins_over_name_and_id() {
        let store = seeded().await;
        let found = find_countries(&store, &filter(Some("PE"), Some("Chile"), Some("x")))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].common_name, "Peru");
    }

    #[tokio::test]
    async fn name_wins_over_id() {
        let store = seeded().await;
        let found = find_countries(&store, &filter(None, Some("Chile"), Some("2")))
            .await
            .unwrap();
        assert_eq!(found[0].country_code, "CL");
    }

    #[tokio::test]
    async fn id_must_be_an_integer() {
        let store = seeded().await;
        assert!(matches!(
            find_countries(&store, &filter(None, None, Some("two"))).await,
            Err(ApiError::InvalidQueryParameter)
        ));
        let found = find_countries(&store, &filter(None, None, Some("2")))
            .await
            .unwrap();
        assert_eq!(found[0].country_code, "PE");
    }

    #[tokio::test]
    async fn unknown_filter_is_not_found() {
        let store = seeded().await;
        assert!(matches!(
            find_countries(&store, &filter(Some("ZZ"), None, None)).await,
            Err(ApiError::Store(StoreError::NotFound))
        ));
    }
}
