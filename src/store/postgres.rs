use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgPool, PgPoolOptions};

use super::ContactStore;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::model::{like_pattern, Contact, ContactInput};
use crate::schema;

#[derive(Debug, Clone)]
pub struct PgContactStore {
    pool: PgPool,
}

impl PgContactStore {
    pub async fn connect(config: &Config) -> sqlx::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactStore for PgContactStore {
    async fn ensure_schema(&self) -> Result<()> {
        for statement in schema::POSTGRES {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn create(&self, contact: &ContactInput) -> Result<Contact> {
        let inserted = sqlx::query_as::<_, Contact>(
            "INSERT INTO contacts \
                (first_name, last_name, email, phone_number, birth_date, additional_data) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, first_name, last_name, email, phone_number, birth_date, additional_data",
        )
        .bind(&contact.first_name)
        .bind(&contact.last_name)
        .bind(&contact.email)
        .bind(&contact.phone_number)
        .bind(contact.birth_date)
        .bind(&contact.additional_data)
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }

    async fn get(&self, id: i64) -> Result<Contact> {
        let contact = sqlx::query_as::<_, Contact>(
            "SELECT id, first_name, last_name, email, phone_number, birth_date, additional_data \
             FROM contacts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        contact.ok_or(ApiError::NotFound)
    }

    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Contact>> {
        let contacts = sqlx::query_as::<_, Contact>(
            "SELECT id, first_name, last_name, email, phone_number, birth_date, additional_data \
             FROM contacts ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;

        Ok(contacts)
    }

    async fn update(&self, id: i64, contact: &ContactInput) -> Result<Contact> {
        let updated = sqlx::query_as::<_, Contact>(
            "UPDATE contacts SET \
                first_name = $1, last_name = $2, email = $3, phone_number = $4, \
                birth_date = $5, additional_data = $6 \
             WHERE id = $7 \
             RETURNING id, first_name, last_name, email, phone_number, birth_date, additional_data",
        )
        .bind(&contact.first_name)
        .bind(&contact.last_name)
        .bind(&contact.email)
        .bind(&contact.phone_number)
        .bind(contact.birth_date)
        .bind(&contact.additional_data)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or(ApiError::NotFound)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<Contact>> {
        let contacts = sqlx::query_as::<_, Contact>(
            r"SELECT id, first_name, last_name, email, phone_number, birth_date, additional_data
              FROM contacts
              WHERE first_name ILIKE $1 ESCAPE '\'
                 OR last_name ILIKE $1 ESCAPE '\'
                 OR email ILIKE $1 ESCAPE '\'
              ORDER BY id",
        )
        .bind(like_pattern(query))
        .fetch_all(&self.pool)
        .await?;

        Ok(contacts)
    }

    async fn birth_dates_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Contact>> {
        let contacts = sqlx::query_as::<_, Contact>(
            "SELECT id, first_name, last_name, email, phone_number, birth_date, additional_data \
             FROM contacts WHERE birth_date >= $1 AND birth_date <= $2 ORDER BY id",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(contacts)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
