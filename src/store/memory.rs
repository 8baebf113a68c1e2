//! In-process store used by tests and local experiments.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{
    Country, CountryStore, NewCountry, NewUser, Store, StoreError, UserRecord, UserStore,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, UserRecord>,
    countries: BTreeMap<i64, Country>,
    next_user_id: i64,
    next_country_id: i64,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|user| user.email == email && Some(user.id) != except)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

fn duplicate_email() -> StoreError {
    StoreError::Conflict("user with the specified email already exists".to_string())
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<i64, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&user.email, None) {
            return Err(duplicate_email());
        }

        tables.next_user_id += 1;
        let id = tables.next_user_id;
        tables.users.insert(
            id,
            UserRecord {
                id,
                name: user.name,
                country_id: user.country_id,
                email: user.email,
                password_hash: user.password_hash,
                created_at: None,
                updated_at: None,
            },
        );

        Ok(id)
    }

    async fn get_by_id(&self, id: i64) -> Result<UserRecord, StoreError> {
        let tables = self.tables.read().await;
        tables.users.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<UserRecord, StoreError> {
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|user| user.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, id: i64, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        if tables.email_taken(&user.email, Some(id)) {
            return Err(duplicate_email());
        }

        let record = tables.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        record.name = user.name;
        record.country_id = user.country_id;
        record.email = user.email;
        record.password_hash = user.password_hash;

        Ok(record.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl CountryStore for MemoryStore {
    async fn get_all(&self) -> Result<Vec<Country>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.countries.values().cloned().collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Country, StoreError> {
        let tables = self.tables.read().await;
        tables.countries.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn get_by_code(&self, code: &str) -> Result<Country, StoreError> {
        let tables = self.tables.read().await;
        tables
            .countries
            .values()
            .find(|country| country.country_code == code)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_name(&self, name: &str) -> Result<Country, StoreError> {
        let tables = self.tables.read().await;
        tables
            .countries
            .values()
            .find(|country| country.common_name == name)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create_many(&self, countries: Vec<NewCountry>) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().await;
        let mut stored = 0;

        for country in countries {
            let known = tables
                .countries
                .values()
                .any(|existing| existing.country_code == country.country_code);
            if known {
                continue;
            }

            tables.next_country_id += 1;
            let id = tables.next_country_id;
            tables.countries.insert(id, country.with_id(id));
            stored += 1;
        }

        Ok(stored)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
