use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use backend_api::{create_router, MemorySeriesRepository};
use http_body_util::BodyExt;
use models::MonthlyRecord;
use serde_json::{json, Value};
use snapshot_store::{default_baseline, SnapshotStore};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let store = SnapshotStore::new(default_baseline());
    create_router(Arc::new(MemorySeriesRepository::new(store)))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn fetch_series(app: &Router) -> Vec<MonthlyRecord> {
    let response = app.clone().oneshot(get("/api/data")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    serde_json::from_value(body_json(response).await).unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let response = app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn get_data_returns_the_seeded_series() {
    let app = app();
    let series = fetch_series(&app).await;

    assert_eq!(series.len(), 2);
    assert_eq!(series[0].date, "31/01/24");
    assert_eq!(series[1].date, "29/02/24");
    assert_eq!(series[0].assets["Stocks"], 82_000.0);
}

#[tokio::test]
async fn update_entry_changes_one_cell() {
    let app = app();
    let request = json_request(
        Method::PUT,
        "/api/data/entry",
        json!({"date": "31/01/24", "type": "assets", "category": "Stocks", "value": 90_000.0}),
    );

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let series = fetch_series(&app).await;
    assert_eq!(series[0].assets["Stocks"], 90_000.0);
    assert_eq!(series[1].assets["Stocks"], 85_000.0);
}

#[tokio::test]
async fn update_entry_unknown_date_is_not_found() {
    let app = app();
    let request = json_request(
        Method::PUT,
        "/api/data/entry",
        json!({"date": "31/12/99", "type": "assets", "category": "Stocks", "value": 1.0}),
    );

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert!(body["error"].is_string());

    // Series untouched.
    let series = fetch_series(&app).await;
    assert_eq!(series[0].assets["Stocks"], 82_000.0);
}

#[tokio::test]
async fn add_category_applies_to_every_record() {
    let app = app();
    let request = json_request(
        Method::POST,
        "/api/data/category",
        json!({"type": "assets", "category": "Crypto"}),
    );

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    for record in fetch_series(&app).await {
        assert_eq!(record.assets["Crypto"], 0.0);
    }
}

#[tokio::test]
async fn add_duplicate_category_is_a_conflict() {
    let app = app();
    let request = json_request(
        Method::POST,
        "/api/data/category",
        json!({"type": "assets", "category": "Stocks"}),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn remove_category_is_idempotent_over_http() {
    let app = app();
    let body = json!({"type": "liabilities", "category": "Car Loan"});

    let first = app
        .clone()
        .oneshot(json_request(Method::DELETE, "/api/data/category", body.clone()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .clone()
        .oneshot(json_request(Method::DELETE, "/api/data/category", body))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);

    for record in fetch_series(&app).await {
        assert!(!record.liabilities.contains_key("Car Loan"));
    }
}

#[tokio::test]
async fn append_month_returns_the_new_record() {
    let app = app();
    let response = app
        .clone()
        .oneshot(empty_request(Method::POST, "/api/data/month"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let record: MonthlyRecord = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(record.date, "31/03/24");
    assert_eq!(record.assets["Stocks"], 85_000.0);

    assert_eq!(fetch_series(&app).await.len(), 3);
}

#[tokio::test]
async fn append_month_on_empty_series_is_bad_request() {
    let store = SnapshotStore::new(vec![]);
    let app = create_router(Arc::new(MemorySeriesRepository::new(store)));

    let response = app
        .oneshot(empty_request(Method::POST, "/api/data/month"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reset_restores_the_seeded_series() {
    let app = app();

    let added = app
        .clone()
        .oneshot(empty_request(Method::POST, "/api/data/month"))
        .await
        .unwrap();
    assert_eq!(added.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(empty_request(Method::POST, "/api/data/reset"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let series = fetch_series(&app).await;
    assert_eq!(series.len(), 2);
    assert_eq!(series, default_baseline());
}
