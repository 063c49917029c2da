//! Client-side cache over the snapshot API.
//!
//! The series is held as immutable revisions: a single-cell edit publishes a
//! new revision immediately and then sends the update, and a rejected or
//! failed send restores the revision captured before the edit. Operations
//! that change the record shape (category add/remove, month append, reset)
//! instead refetch the authoritative series after the call, since
//! reconciling a shape change incrementally is error-prone.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use models::{BucketKind, DerivedRecord, MonthlyRecord};
use serde::Deserialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("category name cannot be empty or a duplicate: '{0}'")]
    InvalidCategory(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// The remote snapshot API, as seen by the client.
#[async_trait]
pub trait SeriesApi: Send + Sync {
    async fn fetch_series(&self) -> Result<Vec<MonthlyRecord>>;
    async fn update_entry(
        &self,
        date: &str,
        kind: BucketKind,
        category: &str,
        value: f64,
    ) -> Result<()>;
    async fn add_category(&self, kind: BucketKind, category: &str) -> Result<()>;
    async fn remove_category(&self, kind: BucketKind, category: &str) -> Result<()>;
    async fn append_month(&self) -> Result<()>;
    async fn reset(&self) -> Result<()>;
}

/// Error payload of a rejected request. The API reports `error`; older
/// message-style payloads are accepted too.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP implementation of [`SeriesApi`].
pub struct HttpSeriesApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSeriesApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body
                .error
                .or(body.message)
                .unwrap_or_else(|| "unknown error".to_string()),
            Err(_) => "unknown error".to_string(),
        };
        Err(ClientError::Rejected { status, message })
    }
}

#[async_trait]
impl SeriesApi for HttpSeriesApi {
    async fn fetch_series(&self) -> Result<Vec<MonthlyRecord>> {
        let response =
            Self::check(self.http.get(self.url("/api/data")).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn update_entry(
        &self,
        date: &str,
        kind: BucketKind,
        category: &str,
        value: f64,
    ) -> Result<()> {
        let body = serde_json::json!({
            "date": date,
            "type": kind,
            "category": category,
            "value": value,
        });
        Self::check(
            self.http
                .put(self.url("/api/data/entry"))
                .json(&body)
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    async fn add_category(&self, kind: BucketKind, category: &str) -> Result<()> {
        let body = serde_json::json!({ "type": kind, "category": category });
        Self::check(
            self.http
                .post(self.url("/api/data/category"))
                .json(&body)
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    async fn remove_category(&self, kind: BucketKind, category: &str) -> Result<()> {
        let body = serde_json::json!({ "type": kind, "category": category });
        Self::check(
            self.http
                .delete(self.url("/api/data/category"))
                .json(&body)
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    async fn append_month(&self) -> Result<()> {
        Self::check(self.http.post(self.url("/api/data/month")).send().await?).await?;
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        Self::check(self.http.post(self.url("/api/data/reset")).send().await?).await?;
        Ok(())
    }
}

/// Client-side series cache with optimistic single-cell edits.
pub struct SeriesClient {
    api: Arc<dyn SeriesApi>,
    current: Arc<Vec<MonthlyRecord>>,
}

impl SeriesClient {
    /// Fetches the authoritative series and builds a client over it.
    pub async fn connect(api: Arc<dyn SeriesApi>) -> Result<Self> {
        let series = api.fetch_series().await?;
        Ok(Self {
            api,
            current: Arc::new(series),
        })
    }

    /// The cached series.
    pub fn series(&self) -> &[MonthlyRecord] {
        &self.current
    }

    /// Derived metrics over the cached series.
    pub fn derived(&self) -> Vec<DerivedRecord> {
        metrics_engine::aggregate(&self.current)
    }

    /// Sorted asset category names across the cached series.
    pub fn asset_categories(&self) -> Vec<String> {
        self.categories(BucketKind::Assets)
    }

    /// Sorted liability category names across the cached series.
    pub fn liability_categories(&self) -> Vec<String> {
        self.categories(BucketKind::Liabilities)
    }

    fn categories(&self, kind: BucketKind) -> Vec<String> {
        let set: BTreeSet<String> = self
            .current
            .iter()
            .flat_map(|r| r.bucket(kind).keys().cloned())
            .collect();
        set.into_iter().collect()
    }

    /// Applies a single-cell edit optimistically.
    ///
    /// The raw input is normalized first: an empty string means zero, and a
    /// non-numeric value discards the edit without touching anything. The
    /// edit is published locally before the update is sent; if the server
    /// rejects it or the call fails, the pre-edit revision is restored and
    /// the error returned.
    pub async fn edit_cell(
        &mut self,
        date: &str,
        kind: BucketKind,
        category: &str,
        raw_value: &str,
    ) -> Result<()> {
        let trimmed = raw_value.trim();
        let value = if trimmed.is_empty() {
            0.0
        } else {
            match trimmed.parse::<f64>() {
                Ok(v) => v,
                Err(_) => return Ok(()),
            }
        };

        let rollback = Arc::clone(&self.current);

        let mut next: Vec<MonthlyRecord> = self.current.as_ref().clone();
        if let Some(record) = next.iter_mut().find(|r| r.date == date) {
            record.bucket_mut(kind).insert(category.to_string(), value);
        }
        self.current = Arc::new(next);

        if let Err(err) = self.api.update_entry(date, kind, category, value).await {
            tracing::debug!(%date, %kind, category, "update rejected, rolling back");
            self.current = rollback;
            return Err(err);
        }
        Ok(())
    }

    /// Adds a category everywhere, then refetches the authoritative series.
    ///
    /// An empty or duplicate name is rejected locally, before any call.
    pub async fn add_category(&mut self, kind: BucketKind, category: &str) -> Result<()> {
        let name = category.trim();
        if name.is_empty() || self.categories(kind).iter().any(|c| c == name) {
            return Err(ClientError::InvalidCategory(category.to_string()));
        }
        self.api.add_category(kind, name).await?;
        self.refetch().await
    }

    /// Removes a category everywhere, then refetches the authoritative series.
    pub async fn remove_category(&mut self, kind: BucketKind, category: &str) -> Result<()> {
        self.api.remove_category(kind, category).await?;
        self.refetch().await
    }

    /// Appends the next month, then refetches the authoritative series.
    pub async fn append_month(&mut self) -> Result<()> {
        self.api.append_month().await?;
        self.refetch().await
    }

    /// Resets the store to its baseline, then refetches.
    pub async fn reset(&mut self) -> Result<()> {
        self.api.reset().await?;
        self.refetch().await
    }

    async fn refetch(&mut self) -> Result<()> {
        let series = self.api.fetch_series().await?;
        self.current = Arc::new(series);
        Ok(())
    }
}
