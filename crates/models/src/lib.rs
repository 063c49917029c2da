use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Which side of the balance sheet a category lives on.
///
/// Serialized lowercase so it matches the `type` field of the HTTP API
/// (`"assets"` / `"liabilities"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketKind {
    Assets,
    Liabilities,
}

impl BucketKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketKind::Assets => "assets",
            BucketKind::Liabilities => "liabilities",
        }
    }
}

impl fmt::Display for BucketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One monthly snapshot: every asset and liability balance for a month.
///
/// `date` is a `DD/MM/YY` label, unique within a series; the series keeps
/// insertion order and is never re-sorted. Both maps default to empty so a
/// record missing a bucket on the wire still deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    pub date: String,
    #[serde(default)]
    pub assets: HashMap<String, f64>,
    #[serde(default)]
    pub liabilities: HashMap<String, f64>,
}

impl MonthlyRecord {
    pub fn bucket(&self, kind: BucketKind) -> &HashMap<String, f64> {
        match kind {
            BucketKind::Assets => &self.assets,
            BucketKind::Liabilities => &self.liabilities,
        }
    }

    pub fn bucket_mut(&mut self, kind: BucketKind) -> &mut HashMap<String, f64> {
        match kind {
            BucketKind::Assets => &mut self.assets,
            BucketKind::Liabilities => &mut self.liabilities,
        }
    }
}

/// A monthly record plus the running metrics computed over the series.
///
/// Produced fresh on every aggregation pass, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedRecord {
    pub date: String,
    pub assets: HashMap<String, f64>,
    pub liabilities: HashMap<String, f64>,
    pub total_asset: f64,
    pub total_liability: f64,
    pub net: f64,
    pub diff_in_total_asset: f64,
    pub diff_in_net: f64,
    pub percentage_change: f64,
    /// Alias of `net`; the dashboard shows it as its own column.
    pub my_assets: f64,
}

/// One advisory insight from the AI assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub title: String,
    pub explanation: String,
    pub suggestion: String,
}
