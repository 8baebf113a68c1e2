//! Country catalogue: upstream client and background import.

mod import;
mod rest;

pub use import::{CountryImporter, ImportError, ImportTicket};
pub use rest::{MetaCountry, MetaCountryName, RestCountriesClient, DEFAULT_REST_COUNTRIES_URL};
