use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{Days, Local, NaiveDate};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, Result};
use crate::model::{Contact, ContactInput, ListParams, SearchParams};
use crate::store::ContactStore;

pub const BIRTHDAY_WINDOW_DAYS: u64 = 7;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContactStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn ContactStore>) -> Self {
        Self { store }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/contacts", get(list_contacts).post(create_contact))
        .route("/contacts/", get(list_contacts).post(create_contact))
        .route("/contacts/search", get(search_contacts))
        .route("/contacts/search/", get(search_contacts))
        .route("/contacts/birthdays", get(upcoming_birthdays))
        .route("/contacts/birthdays/", get(upcoming_birthdays))
        .route(
            "/contacts/:id",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

fn contact_body(
    payload: std::result::Result<Json<ContactInput>, JsonRejection>,
) -> Result<ContactInput> {
    let Json(contact) = payload.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    Ok(contact)
}

fn contact_id(path: std::result::Result<Path<i64>, PathRejection>) -> Result<i64> {
    path.map(|Path(id)| id)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(err) => {
            tracing::warn!(error = %err, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}

async fn create_contact(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ContactInput>, JsonRejection>,
) -> Result<Json<Contact>> {
    let contact = contact_body(payload)?;
    let created = state.store.create(&contact).await?;
    tracing::info!(id = created.id, "contact created");
    Ok(Json(created))
}

async fn list_contacts(
    State(state): State<AppState>,
    params: std::result::Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Contact>>> {
    let Query(params) = params.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    let (skip, limit) = params.resolve()?;
    Ok(Json(state.store.list(skip, limit).await?))
}

async fn get_contact(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Contact>> {
    let id = contact_id(id)?;
    Ok(Json(state.store.get(id).await?))
}

async fn update_contact(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<ContactInput>, JsonRejection>,
) -> Result<Json<Contact>> {
    let id = contact_id(id)?;
    let contact = contact_body(payload)?;
    let updated = state.store.update(id, &contact).await?;
    tracing::info!(id, "contact updated");
    Ok(Json(updated))
}

async fn delete_contact(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<serde_json::Value>> {
    let id = contact_id(id)?;
    state.store.delete(id).await?;
    tracing::info!(id, "contact deleted");
    Ok(Json(json!({ "message": "Contact deleted successfully" })))
}

async fn search_contacts(
    State(state): State<AppState>,
    params: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<Contact>>> {
    let Query(params) = params.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    Ok(Json(state.store.search(&params.query).await?))
}

/// Birth dates are compared as full dates, year included.
async fn upcoming_birthdays(State(state): State<AppState>) -> Result<Json<Vec<Contact>>> {
    let (from, to) = birthday_window(Local::now().date_naive());
    Ok(Json(state.store.birth_dates_between(from, to).await?))
}

pub fn birthday_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let end = today
        .checked_add_days(Days::new(BIRTHDAY_WINDOW_DAYS))
        .unwrap_or(NaiveDate::MAX);
    (today, end)
}
