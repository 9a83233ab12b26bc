use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{ApiError, Result};

pub const DEFAULT_LIMIT: i64 = 10;

/// A stored row of the `contacts` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Contact {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub birth_date: NaiveDate,
    pub additional_data: Option<String>,
}

/// Request body for create and update. Update replaces every field,
/// so an absent `additional_data` clears the stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub additional_data: Option<String>,
}

impl Contact {
    /// Case-insensitive substring match on first name, last name or email.
    /// `needle` must already be lowercased.
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        [&self.first_name, &self.last_name, &self.email]
            .into_iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl ListParams {
    /// Returns `(skip, limit)` with defaults applied.
    pub fn resolve(&self) -> Result<(i64, i64)> {
        let skip = self.skip.unwrap_or(0);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if skip < 0 {
            return Err(ApiError::validation("skip must be greater than or equal to 0"));
        }
        if limit <= 0 {
            return Err(ApiError::validation("limit must be greater than 0"));
        }
        Ok((skip, limit))
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
}

/// Escapes LIKE wildcards so the user's text is matched literally,
/// wrapped for a substring match. Pair with `ESCAPE '\'`.
pub fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ContactInput {
        ContactInput {
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            email: "ann@x.com".to_string(),
            phone_number: "123".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            additional_data: None,
        }
    }

    #[test]
    fn matching_folds_unicode_case() {
        let contact = Contact {
            id: 1,
            first_name: "Émile".to_string(),
            last_name: "Zola".to_string(),
            email: "emile@paris.fr".to_string(),
            phone_number: "1".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1840, 4, 2).unwrap(),
            additional_data: None,
        };

        assert!(contact.matches_lowercase("émile"));
        assert!(contact.matches_lowercase("zol"));
        assert!(contact.matches_lowercase("@paris"));
        assert!(contact.matches_lowercase(""));
        assert!(!contact.matches_lowercase("hugo"));
    }

    #[test]
    fn additional_data_defaults_to_none() {
        let json = r#"{
            "first_name": "Ann",
            "last_name": "Lee",
            "email": "ann@x.com",
            "phone_number": "123",
            "birth_date": "1990-01-01"
        }"#;
        let parsed: ContactInput = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, input());
    }

    #[test]
    fn malformed_birth_date_is_rejected() {
        let json = r#"{
            "first_name": "Ann",
            "last_name": "Lee",
            "email": "ann@x.com",
            "phone_number": "123",
            "birth_date": "1990-13-01"
        }"#;
        assert!(serde_json::from_str::<ContactInput>(json).is_err());
    }

    #[test]
    fn list_params_defaults_and_bounds() {
        assert_eq!(ListParams::default().resolve().unwrap(), (0, DEFAULT_LIMIT));

        let negative_skip = ListParams {
            skip: Some(-1),
            limit: None,
        };
        assert!(negative_skip.resolve().is_err());

        let zero_limit = ListParams {
            skip: None,
            limit: Some(0),
        };
        assert!(zero_limit.resolve().is_err());
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(""), "%%");
        assert_eq!(like_pattern("ann"), "%ann%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
