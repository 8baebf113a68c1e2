//! Persistence for users and countries.
//!
//! Handlers only see the [`UserStore`] and [`CountryStore`] traits. [`PgStore`]
//! backs the running service; [`MemoryStore`] keeps everything in process and is
//! what the HTTP tests run against.

use async_trait::async_trait;
use thiserror::Error;

mod memory;
mod models;
mod postgres;

pub use memory::MemoryStore;
pub use models::{Country, NewCountry, NewUser, UserRecord};
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user and return its new id.
    async fn create(&self, user: NewUser) -> Result<i64, StoreError>;
    async fn get_by_id(&self, id: i64) -> Result<UserRecord, StoreError>;
    async fn get_by_email(&self, email: &str) -> Result<UserRecord, StoreError>;
    /// Replace every mutable field of user `id`.
    async fn update(&self, id: i64, user: NewUser) -> Result<UserRecord, StoreError>;
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

#[async_trait]
pub trait CountryStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Country>, StoreError>;
    async fn get_by_id(&self, id: i64) -> Result<Country, StoreError>;
    async fn get_by_code(&self, code: &str) -> Result<Country, StoreError>;
    async fn get_by_name(&self, name: &str) -> Result<Country, StoreError>;
    /// Insert countries whose code is not stored yet; existing codes are left untouched.
    /// Returns how many countries were stored by this call.
    async fn create_many(&self, countries: Vec<NewCountry>) -> Result<usize, StoreError>;
}

/// Everything the HTTP layer needs from a backend.
#[async_trait]
pub trait Store: UserStore + CountryStore {
    /// Cheap liveness probe for `/health`.
    async fn ping(&self) -> Result<(), StoreError>;
}
