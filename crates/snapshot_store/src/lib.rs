//! Authoritative monthly snapshot series.
//!
//! The store owns the ordered series and keeps the category schema identical
//! across every record: a category add or remove is applied to the whole
//! series as one transform, never record by record, so a reader can never
//! observe a category present in some months but not others.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use chrono::{Datelike, Months, NaiveDate};
use models::{BucketKind, MonthlyRecord};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no record found for date {0}")]
    RecordNotFound(String),

    #[error("category '{0}' does not exist")]
    CategoryNotFound(String),

    #[error("category '{0}' already exists")]
    CategoryExists(String),

    #[error("cannot append a month to an empty series")]
    EmptySeries,

    #[error("invalid series date '{0}': expected DD/MM/YY")]
    InvalidDate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parses a `DD/MM/YY` series date; the two-digit year means `2000 + YY`.
pub fn parse_series_date(s: &str) -> Result<NaiveDate> {
    let invalid = || StoreError::InvalidDate(s.to_string());
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() != 3 {
        return Err(invalid());
    }
    let day: u32 = parts[0].parse().map_err(|_| invalid())?;
    let month: u32 = parts[1].parse().map_err(|_| invalid())?;
    let year: i32 = parts[2].parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(2000 + year, month, day).ok_or_else(invalid)
}

/// Formats a date back into the `DD/MM/YY` series label.
pub fn format_series_date(date: NaiveDate) -> String {
    format!(
        "{:02}/{:02}/{:02}",
        date.day(),
        date.month(),
        date.year() % 100
    )
}

/// Last day of the calendar month following `date`'s month.
///
/// Two steps: add one month (the day clamps to what the shorter month
/// allows), then snap to that month's end, so snapshots stay on month
/// boundaries regardless of month length. `31/01/24` rolls to `29/02/24`.
fn next_month_end(date: NaiveDate) -> Result<NaiveDate> {
    let overflow = || StoreError::InvalidDate(date.to_string());
    let next = date.checked_add_months(Months::new(1)).ok_or_else(overflow)?;
    let first_of_following = if next.month() == 12 {
        NaiveDate::from_ymd_opt(next.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(next.year(), next.month() + 1, 1)
    }
    .ok_or_else(overflow)?;
    first_of_following.pred_opt().ok_or_else(overflow)
}

/// Authoritative holder of the monthly snapshot series.
///
/// The baseline captured at construction is immutable; `reset` restores a
/// deep copy of it.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    baseline: Vec<MonthlyRecord>,
    series: Vec<MonthlyRecord>,
}

impl SnapshotStore {
    pub fn new(baseline: Vec<MonthlyRecord>) -> Self {
        let series = baseline.clone();
        Self { baseline, series }
    }

    /// The full series, in insertion order.
    pub fn records(&self) -> &[MonthlyRecord] {
        &self.series
    }

    /// Updates a single cell of one record.
    ///
    /// The category must already exist in the bucket: creating it here would
    /// give that one record a wider schema than the rest of the series.
    pub fn set_value(
        &mut self,
        date: &str,
        kind: BucketKind,
        category: &str,
        value: f64,
    ) -> Result<()> {
        let record = self
            .series
            .iter_mut()
            .find(|r| r.date == date)
            .ok_or_else(|| StoreError::RecordNotFound(date.to_string()))?;
        let cell = record
            .bucket_mut(kind)
            .get_mut(category)
            .ok_or_else(|| StoreError::CategoryNotFound(category.to_string()))?;
        *cell = value;
        Ok(())
    }

    /// Category names present in the given bucket anywhere in the series.
    pub fn categories(&self, kind: BucketKind) -> BTreeSet<String> {
        self.series
            .iter()
            .flat_map(|r| r.bucket(kind).keys().cloned())
            .collect()
    }

    /// Adds a category to every record's bucket, initialized to zero.
    ///
    /// The updated series is built in full before it replaces the current
    /// one, so no partially-updated schema is ever observable.
    pub fn add_category(&mut self, kind: BucketKind, category: &str) -> Result<()> {
        if self.categories(kind).contains(category) {
            return Err(StoreError::CategoryExists(category.to_string()));
        }
        let mut next = self.series.clone();
        for record in &mut next {
            record.bucket_mut(kind).insert(category.to_string(), 0.0);
        }
        self.series = next;
        Ok(())
    }

    /// Removes a category from every record's bucket. Removing a category
    /// that does not exist anywhere is a no-op.
    pub fn remove_category(&mut self, kind: BucketKind, category: &str) {
        let mut next = self.series.clone();
        for record in &mut next {
            record.bucket_mut(kind).remove(category);
        }
        self.series = next;
    }

    /// Appends the next month: dated the last day of the calendar month
    /// after the last record's month, with the last record's balances
    /// carried over. Returns a clone of the new record.
    pub fn append_month(&mut self) -> Result<MonthlyRecord> {
        let last = self.series.last().ok_or(StoreError::EmptySeries)?;
        let last_date = parse_series_date(&last.date)?;
        let mut record = last.clone();
        record.date = format_series_date(next_month_end(last_date)?);
        self.series.push(record.clone());
        Ok(record)
    }

    /// Replaces the series with a deep copy of the baseline.
    pub fn reset(&mut self) {
        self.series = self.baseline.clone();
    }
}

/// Loads a baseline series from a JSON file holding an array of records.
pub fn load_baseline(path: &Path) -> Result<Vec<MonthlyRecord>> {
    let raw = fs::read_to_string(path)?;
    let records: Vec<MonthlyRecord> = serde_json::from_str(&raw)?;
    Ok(records)
}

/// Built-in two-month demo dataset, used when no baseline file exists.
pub fn default_baseline() -> Vec<MonthlyRecord> {
    fn month(date: &str, assets: &[(&str, f64)], liabilities: &[(&str, f64)]) -> MonthlyRecord {
        MonthlyRecord {
            date: date.to_string(),
            assets: assets.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            liabilities: liabilities.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    vec![
        month(
            "31/01/24",
            &[
                ("Mutual Funds", 50_000.0),
                ("Stocks", 82_000.0),
                ("Retirement Fund", 205_000.0),
                ("Savings Account", 100_000.0),
                ("Real Estate", 5_000_000.0),
            ],
            &[
                ("Home Loan", 2_995_000.0),
                ("Car Loan", 195_000.0),
                ("Credit Card Debt", 25_000.0),
            ],
        ),
        month(
            "29/02/24",
            &[
                ("Mutual Funds", 53_000.0),
                ("Stocks", 85_000.0),
                ("Retirement Fund", 210_000.0),
                ("Savings Account", 102_000.0),
                ("Real Estate", 5_000_000.0),
            ],
            &[
                ("Home Loan", 2_990_000.0),
                ("Car Loan", 190_000.0),
                ("Credit Card Debt", 18_000.0),
            ],
        ),
    ]
}
