use backend_api::{create_router, MemorySeriesRepository};
use snapshot_store::{default_baseline, load_baseline, SnapshotStore};
use std::net::SocketAddr;
use std::sync::Arc;
use std::{env, path::PathBuf};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backend_api=debug,tower_http=debug,axum=trace".into()),
        )
        .init();

    // Parse environment variables (with sane defaults)
    let baseline_path = PathBuf::from(
        env::var("BASELINE_PATH").unwrap_or_else(|_| "baseline.json".to_string()),
    );
    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "3001".to_string())
        .parse()
        .unwrap_or(3001);

    let baseline = if baseline_path.exists() {
        tracing::info!("Seeding the store from {}", baseline_path.display());
        load_baseline(&baseline_path)?
    } else {
        tracing::warn!(
            "Baseline file not found at {}; seeding the store with the built-in demo dataset",
            baseline_path.display()
        );
        default_baseline()
    };

    let repo = Arc::new(MemorySeriesRepository::new(SnapshotStore::new(baseline)));
    let app = create_router(repo);

    let addr = format!("{}:{}", host, port).parse::<SocketAddr>()?;
    tracing::info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
