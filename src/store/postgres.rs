//! Postgres-backed store (schema in `sql/schema.sql`).

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Connection, PgPool, Row};
use tracing::{info_span, Instrument};

use super::{
    Country, CountryStore, NewCountry, NewUser, Store, StoreError, UserRecord, UserStore,
};

const USER_COLUMNS: &str = r#"
    id,
    name,
    country_id,
    email,
    password,
    to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
    to_char(updated_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at
"#;

/// Idempotent DDL for both tables.
pub const SCHEMA: &str = include_str!("../../sql/schema.sql");

const COUNTRY_COLUMNS: &str =
    "id, common_name, official_name, country_code, capital, region, sub_region";

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create missing tables and indexes.
    ///
    /// # Errors
    /// Returns the database error if any statement fails.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn map_write_error(err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::Conflict("user with the specified email already exists".to_string())
    } else {
        StoreError::Database(err)
    }
}

fn user_from_row(row: &PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        name: row.get("name"),
        country_id: row.get("country_id"),
        email: row.get("email"),
        password_hash: row.get("password"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn country_from_row(row: &PgRow) -> Country {
    Country {
        id: row.get("id"),
        common_name: row.get("common_name"),
        official_name: row.get("official_name"),
        country_code: row.get("country_code"),
        capital: row.get("capital"),
        region: row.get("region"),
        sub_region: row.get("sub_region"),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create(&self, user: NewUser) -> Result<i64, StoreError> {
        let row = sqlx::query(
            "INSERT INTO users (name, country_id, email, password) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&user.name)
        .bind(user.country_id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(row.get("id"))
    }

    async fn get_by_id(&self, id: i64) -> Result<UserRecord, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| user_from_row(&row))
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<UserRecord, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| user_from_row(&row))
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, id: i64, user: NewUser) -> Result<UserRecord, StoreError> {
        let query = format!(
            r"
            UPDATE users
            SET name = $1, country_id = $2, email = $3, password = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING {USER_COLUMNS}
            "
        );
        sqlx::query(&query)
            .bind(&user.name)
            .bind(user.country_id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?
            .map(|row| user_from_row(&row))
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }
}

#[async_trait]
impl CountryStore for PgStore {
    async fn get_all(&self) -> Result<Vec<Country>, StoreError> {
        let query = format!("SELECT {COUNTRY_COLUMNS} FROM countries ORDER BY id");
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(country_from_row).collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Country, StoreError> {
        let query = format!("SELECT {COUNTRY_COLUMNS} FROM countries WHERE id = $1");
        sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| country_from_row(&row))
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_code(&self, code: &str) -> Result<Country, StoreError> {
        let query = format!("SELECT {COUNTRY_COLUMNS} FROM countries WHERE country_code = $1");
        sqlx::query(&query)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| country_from_row(&row))
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_name(&self, name: &str) -> Result<Country, StoreError> {
        let query =
            format!("SELECT {COUNTRY_COLUMNS} FROM countries WHERE common_name = $1 LIMIT 1");
        sqlx::query(&query)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| country_from_row(&row))
            .ok_or(StoreError::NotFound)
    }

    async fn create_many(&self, countries: Vec<NewCountry>) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut stored: u64 = 0;

        for country in &countries {
            let result = sqlx::query(
                r"
                INSERT INTO countries
                    (common_name, official_name, country_code, capital, region, sub_region)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (country_code) DO NOTHING
                ",
            )
            .bind(&country.common_name)
            .bind(&country.official_name)
            .bind(&country.country_code)
            .bind(&country.capital)
            .bind(&country.region)
            .bind(&country.sub_region)
            .execute(&mut *tx)
            .await?;
            // Zero when the code already exists.
            stored += result.rows_affected();
        }

        tx.commit().await?;

        Ok(usize::try_from(stored).unwrap_or(usize::MAX))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self.pool.acquire().instrument(acquire_span).await?;

        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping().instrument(ping_span).await?;

        Ok(())
    }
}
