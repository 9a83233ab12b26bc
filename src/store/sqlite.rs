use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use super::ContactStore;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::model::{Contact, ContactInput};
use crate::schema;

/// Embedded backend for local runs and tests.
#[derive(Debug, Clone)]
pub struct SqliteContactStore {
    pool: SqlitePool,
}

impl SqliteContactStore {
    pub async fn connect(config: &Config) -> sqlx::Result<Self> {
        let url = config.database_url.as_str();
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // An in-memory database lives and dies with its connection.
        let pool_options = if is_memory_url(url) {
            memory_pool_options()
        } else {
            SqlitePoolOptions::new().max_connections(config.max_connections)
        };
        let pool = pool_options
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await?;

        Ok(Self::new(pool))
    }

    /// A private in-memory database with the schema applied.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = memory_pool_options().connect_with(options).await?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

fn memory_pool_options() -> SqlitePoolOptions {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
}

#[async_trait]
impl ContactStore for SqliteContactStore {
    async fn ensure_schema(&self) -> Result<()> {
        for statement in schema::SQLITE {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn create(&self, contact: &ContactInput) -> Result<Contact> {
        let inserted = sqlx::query_as::<_, Contact>(
            "INSERT INTO contacts \
                (first_name, last_name, email, phone_number, birth_date, additional_data) \
             VALUES (?, ?, ?, ?, ?, ?) \
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
        sqlx::query_as::<_, Contact>(
            "SELECT id, first_name, last_name, email, phone_number, birth_date, additional_data \
             FROM contacts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound)
    }

    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Contact>> {
        let contacts = sqlx::query_as::<_, Contact>(
            "SELECT id, first_name, last_name, email, phone_number, birth_date, additional_data \
             FROM contacts ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;

        Ok(contacts)
    }

    async fn update(&self, id: i64, contact: &ContactInput) -> Result<Contact> {
        sqlx::query_as::<_, Contact>(
            "UPDATE contacts SET \
                first_name = ?, last_name = ?, email = ?, phone_number = ?, \
                birth_date = ?, additional_data = ? \
             WHERE id = ? \
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
        .await?
        .ok_or(ApiError::NotFound)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<Contact>> {
        // SQLite's LIKE only folds ASCII, so the match runs here.
        let needle = query.to_lowercase();
        let contacts = sqlx::query_as::<_, Contact>(
            "SELECT id, first_name, last_name, email, phone_number, birth_date, additional_data \
             FROM contacts ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(contacts
            .into_iter()
            .filter(|contact| contact.matches_lowercase(&needle))
            .collect())
    }

    async fn birth_dates_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Contact>> {
        let contacts = sqlx::query_as::<_, Contact>(
            "SELECT id, first_name, last_name, email, phone_number, birth_date, additional_data \
             FROM contacts WHERE birth_date >= ? AND birth_date <= ? ORDER BY id",
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

#[cfg(test)]
mod tests {
    use super::*;

    fn input(first: &str, last: &str, email: &str, birth_date: &str) -> ContactInput {
        ContactInput {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
            phone_number: "123".to_string(),
            birth_date: birth_date.parse().unwrap(),
            additional_data: None,
        }
    }

    async fn store() -> SqliteContactStore {
        SqliteContactStore::in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn create_assigns_fresh_ids() {
        let store = store().await;

        let ann = store
            .create(&input("Ann", "Lee", "ann@x.com", "1990-01-01"))
            .await
            .unwrap();
        let bob = store
            .create(&input("Bob", "Ray", "bob@x.com", "1985-06-15"))
            .await
            .unwrap();

        assert_eq!(ann.id, 1);
        assert_eq!(bob.id, 2);
        assert_eq!(store.get(ann.id).await.unwrap(), ann);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = store().await;
        store
            .create(&input("Ann", "Lee", "ann@x.com", "1990-01-01"))
            .await
            .unwrap();

        let err = store
            .create(&input("Other", "Ann", "ann@x.com", "1991-01-01"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        let store = store().await;
        let ann = store
            .create(&input("Ann", "Lee", "ann@x.com", "1990-01-01"))
            .await
            .unwrap();
        store.delete(ann.id).await.unwrap();

        let bob = store
            .create(&input("Bob", "Ray", "bob@x.com", "1985-06-15"))
            .await
            .unwrap();
        assert_ne!(bob.id, ann.id);
        assert!(matches!(store.get(ann.id).await, Err(ApiError::NotFound)));
        assert!(matches!(store.delete(ann.id).await, Err(ApiError::NotFound)));
    }

    #[tokio::test]
    async fn update_replaces_all_fields() {
        let store = store().await;
        let mut original = input("Ann", "Lee", "ann@x.com", "1990-01-01");
        original.additional_data = Some("met at work".to_string());
        let created = store.create(&original).await.unwrap();

        let replacement = input("Anne", "Leigh", "anne@x.com", "1990-02-02");
        let updated = store.update(created.id, &replacement).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.first_name, "Anne");
        assert_eq!(updated.email, "anne@x.com");
        assert_eq!(updated.additional_data, None);
        assert_eq!(store.get(created.id).await.unwrap(), updated);

        let missing = store.update(999, &replacement).await.unwrap_err();
        assert!(matches!(missing, ApiError::NotFound));
    }

    #[tokio::test]
    async fn update_onto_another_email_is_a_conflict() {
        let store = store().await;
        store
            .create(&input("Ann", "Lee", "ann@x.com", "1990-01-01"))
            .await
            .unwrap();
        let bob = store
            .create(&input("Bob", "Ray", "bob@x.com", "1985-06-15"))
            .await
            .unwrap();

        let err = store
            .update(bob.id, &input("Bob", "Ray", "ann@x.com", "1985-06-15"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_pages_in_id_order() {
        let store = store().await;
        for i in 0..5 {
            store
                .create(&input("N", "M", &format!("n{i}@x.com"), "1990-01-01"))
                .await
                .unwrap();
        }

        let page: Vec<i64> = store
            .list(1, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(page, vec![2, 3]);
        assert!(store.list(10, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_literal() {
        let store = store().await;
        store
            .create(&input("Ann", "Lee", "ann@x.com", "1990-01-01"))
            .await
            .unwrap();
        store
            .create(&input("Bob", "McAnnally", "bob@y.org", "1985-06-15"))
            .await
            .unwrap();
        store
            .create(&input("Cy", "Doe", "cy_100%@z.net", "1970-03-03"))
            .await
            .unwrap();

        let names = |contacts: Vec<Contact>| -> Vec<String> {
            contacts.into_iter().map(|c| c.first_name).collect()
        };

        assert_eq!(names(store.search("").await.unwrap()).len(), 3);
        assert_eq!(names(store.search("ANN").await.unwrap()), vec!["Ann", "Bob"]);
        assert_eq!(names(store.search("y.ORG").await.unwrap()), vec!["Bob"]);
        assert_eq!(names(store.search("_100%").await.unwrap()), vec!["Cy"]);
        assert!(store.search("%%").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_folds_non_ascii_case() {
        let store = store().await;
        store
            .create(&input("Émile", "Zola", "ez@x.fr", "1840-04-02"))
            .await
            .unwrap();
        store
            .create(&input("Victor", "ÅSTRÖM", "va@x.se", "1802-02-26"))
            .await
            .unwrap();

        let hits = store.search("émile").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].first_name, "Émile");

        let hits = store.search("åström").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].first_name, "Victor");
    }

    #[tokio::test]
    async fn birth_date_window_is_inclusive() {
        let store = store().await;
        for (i, date) in ["2024-05-01", "2024-05-04", "2024-05-08", "2024-05-09"]
            .iter()
            .enumerate()
        {
            store
                .create(&input("N", "M", &format!("n{i}@x.com"), date))
                .await
                .unwrap();
        }

        let from = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 5, 8).unwrap();
        let dates: Vec<String> = store
            .birth_dates_between(from, to)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.birth_date.to_string())
            .collect();

        assert_eq!(dates, vec!["2024-05-01", "2024-05-04", "2024-05-08"]);
    }
}
