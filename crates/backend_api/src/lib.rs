pub mod error;
pub mod handlers;
pub mod repository;
pub mod router;

pub use error::{ApiError, Result};
pub use repository::{MemorySeriesRepository, SeriesRepository};
pub use router::create_router;
