//! Contact book HTTP service.
//!
//! A single `contacts` table exposed over a small JSON API: CRUD, a
//! case-insensitive search and an upcoming-birthdays query. The store is
//! handed to the router explicitly, see [`store::ContactStore`].

pub mod config;
pub mod error;
pub mod model;
pub mod routes;
pub mod schema;
pub mod store;

pub use config::Config;
pub use error::{ApiError, Result};
pub use model::{Contact, ContactInput};
pub use routes::{app, AppState};
pub use store::{connect, ContactStore};
