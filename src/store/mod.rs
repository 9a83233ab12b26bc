//! Persistence for contacts.
//!
//! Handlers only see [`ContactStore`]; the concrete backend is picked from the
//! `DATABASE_URL` scheme by [`connect`]. Every call checks a connection out of
//! the pool for the duration of one statement and returns it on drop.

mod postgres;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::config::Config;
use crate::error::Result;
use crate::model::{Contact, ContactInput};

pub use postgres::PgContactStore;
pub use sqlite::SqliteContactStore;

#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Creates the `contacts` table and its indexes if they do not exist.
    async fn ensure_schema(&self) -> Result<()>;

    async fn create(&self, contact: &ContactInput) -> Result<Contact>;

    async fn get(&self, id: i64) -> Result<Contact>;

    /// Contacts ordered by id.
    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Contact>>;

    /// Replaces every field of the row.
    async fn update(&self, id: i64, contact: &ContactInput) -> Result<Contact>;

    async fn delete(&self, id: i64) -> Result<()>;

    /// Case-insensitive substring match on first name, last name or email.
    async fn search(&self, query: &str) -> Result<Vec<Contact>>;

    /// Contacts whose birth date lies in `[from, to]`, both ends inclusive.
    async fn birth_dates_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Contact>>;

    /// Round-trips a trivial query.
    async fn ping(&self) -> Result<()>;
}

/// Opens a pool for the configured backend and makes sure the schema exists.
pub async fn connect(config: &Config) -> anyhow::Result<Arc<dyn ContactStore>> {
    let url = config.database_url.as_str();
    let store: Arc<dyn ContactStore> = if url.starts_with("postgres://")
        || url.starts_with("postgresql://")
    {
        Arc::new(PgContactStore::connect(config).await?)
    } else if url.starts_with("sqlite:") {
        Arc::new(SqliteContactStore::connect(config).await?)
    } else {
        anyhow::bail!("DATABASE_URL must start with postgres:// or sqlite:");
    };

    store.ensure_schema().await?;
    Ok(store)
}
