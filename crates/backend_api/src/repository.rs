use async_trait::async_trait;
use models::{BucketKind, MonthlyRecord};
use snapshot_store::SnapshotStore;
use tokio::sync::RwLock;

use crate::error::Result;

/// Repository trait for the snapshot series
/// This abstraction keeps the handlers independent of where the series
/// lives, so the in-memory store could be swapped for a database-backed one
#[async_trait]
pub trait SeriesRepository: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<MonthlyRecord>>;
    async fn set_value(
        &self,
        date: &str,
        kind: BucketKind,
        category: &str,
        value: f64,
    ) -> Result<()>;
    async fn add_category(&self, kind: BucketKind, category: &str) -> Result<()>;
    async fn remove_category(&self, kind: BucketKind, category: &str) -> Result<()>;
    async fn append_month(&self) -> Result<MonthlyRecord>;
    async fn reset(&self) -> Result<()>;
}

/// In-memory implementation backed by [`SnapshotStore`].
///
/// Every mutation holds the write lock for its whole transform, so a reader
/// sees each operation either fully applied or not at all.
pub struct MemorySeriesRepository {
    store: RwLock<SnapshotStore>,
}

impl MemorySeriesRepository {
    pub fn new(store: SnapshotStore) -> Self {
        Self {
            store: RwLock::new(store),
        }
    }
}

#[async_trait]
impl SeriesRepository for MemorySeriesRepository {
    async fn fetch_all(&self) -> Result<Vec<MonthlyRecord>> {
        Ok(self.store.read().await.records().to_vec())
    }

    async fn set_value(
        &self,
        date: &str,
        kind: BucketKind,
        category: &str,
        value: f64,
    ) -> Result<()> {
        self.store
            .write()
            .await
            .set_value(date, kind, category, value)?;
        Ok(())
    }

    async fn add_category(&self, kind: BucketKind, category: &str) -> Result<()> {
        self.store.write().await.add_category(kind, category)?;
        Ok(())
    }

    async fn remove_category(&self, kind: BucketKind, category: &str) -> Result<()> {
        self.store.write().await.remove_category(kind, category);
        Ok(())
    }

    async fn append_month(&self) -> Result<MonthlyRecord> {
        let record = self.store.write().await.append_month()?;
        Ok(record)
    }

    async fn reset(&self) -> Result<()> {
        self.store.write().await.reset();
        Ok(())
    }
}
