use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use models::BucketKind;
use serde::Deserialize;
use std::sync::Arc;

use crate::{repository::SeriesRepository, Result};

pub type RepositoryState = Arc<dyn SeriesRepository>;

/// GET /api/data
/// Returns the full snapshot series
pub async fn get_series(State(repo): State<RepositoryState>) -> Result<impl IntoResponse> {
    let series = repo.fetch_all().await?;
    Ok(Json(series))
}

/// Body of PUT /api/data/entry
#[derive(Debug, Deserialize)]
pub struct EntryUpdate {
    pub date: String,
    #[serde(rename = "type")]
    pub kind: BucketKind,
    pub category: String,
    pub value: f64,
}

/// PUT /api/data/entry
/// Updates a single cell of one record
pub async fn update_entry(
    State(repo): State<RepositoryState>,
    Json(req): Json<EntryUpdate>,
) -> Result<impl IntoResponse> {
    repo.set_value(&req.date, req.kind, &req.category, req.value)
        .await?;
    Ok(Json(serde_json::json!({
        "message": "Entry updated successfully"
    })))
}

/// Body of the category add/remove endpoints
#[derive(Debug, Deserialize)]
pub struct CategoryChange {
    #[serde(rename = "type")]
    pub kind: BucketKind,
    pub category: String,
}

/// POST /api/data/category
/// Adds a new category to every record, initialized to zero
pub async fn add_category(
    State(repo): State<RepositoryState>,
    Json(req): Json<CategoryChange>,
) -> Result<impl IntoResponse> {
    repo.add_category(req.kind, &req.category).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Category added successfully"
        })),
    ))
}

/// DELETE /api/data/category
/// Removes a category from every record
pub async fn remove_category(
    State(repo): State<RepositoryState>,
    Json(req): Json<CategoryChange>,
) -> Result<impl IntoResponse> {
    repo.remove_category(req.kind, &req.category).await?;
    Ok(Json(serde_json::json!({
        "message": "Category removed successfully"
    })))
}

/// POST /api/data/month
/// Appends the next month, carrying over the last record's balances
pub async fn append_month(State(repo): State<RepositoryState>) -> Result<impl IntoResponse> {
    let record = repo.append_month().await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /api/data/reset
/// Resets the series to the baseline captured at startup
pub async fn reset_series(State(repo): State<RepositoryState>) -> Result<impl IntoResponse> {
    repo.reset().await?;
    Ok(Json(serde_json::json!({
        "message": "Data reset successfully"
    })))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "net-worth-api"
    }))
}
