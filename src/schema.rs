//! `contacts` table definitions, applied at startup when absent.

pub const POSTGRES: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS contacts (
        id BIGSERIAL PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        phone_number TEXT NOT NULL,
        birth_date DATE NOT NULL,
        additional_data TEXT
    )"#,
    "CREATE INDEX IF NOT EXISTS ix_contacts_first_name ON contacts (first_name)",
    "CREATE INDEX IF NOT EXISTS ix_contacts_last_name ON contacts (last_name)",
];

pub const SQLITE: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS contacts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        phone_number TEXT NOT NULL,
        birth_date DATE NOT NULL,
        additional_data TEXT
    )"#,
    "CREATE INDEX IF NOT EXISTS ix_contacts_first_name ON contacts (first_name)",
    "CREATE INDEX IF NOT EXISTS ix_contacts_last_name ON contacts (last_name)",
];
