use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use plantdoc_server::auth::{JwtConfig, PgUserRepository};
use plantdoc_server::config::Config;
use plantdoc_server::db::create_pool;
use plantdoc_server::diseases::catalog::default_catalog;
use plantdoc_server::diseases::{DiseaseRepository, PgDiseaseRepository};
use plantdoc_server::ml::HttpMlService;
use plantdoc_server::predictions::PgPredictionRepository;
use plantdoc_server::storage::PublicDisk;
use plantdoc_server::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting plant disease API server...");

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url)?;

    let diseases = Arc::new(PgDiseaseRepository::new(pool.clone()));
    let seeded = diseases.seed(default_catalog()).await?;
    if seeded > 0 {
        info!("Seeded disease catalog with {} rows", seeded);
    }

    tokio::fs::create_dir_all(&config.storage_root).await?;
    let storage = PublicDisk::new(&config.storage_root, config.storage_url());

    let state = AppState {
        jwt: JwtConfig::new(
            &config.jwt_secret,
            config.access_token_minutes,
            config.refresh_token_days,
        ),
        users: Arc::new(PgUserRepository::new(pool.clone())),
        diseases,
        predictions: Arc::new(PgPredictionRepository::new(pool)),
        ml: Arc::new(HttpMlService::new(config.ml.clone())?),
        storage: Arc::new(storage),
        config: Arc::new(config),
    };

    let addr = state.config.addr;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
