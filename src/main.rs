use std::net::SocketAddr;
use std::sync::Arc;

use candidate_tracker::{
    config::{get_config, init_config, LogFormat, StorageBackend},
    database::pool::{create_pool, run_migrations},
    middleware::cors::cors_layer,
    repositories::{CandidateRepository, InMemoryCandidateRepository, PgCandidateRepository},
    routes, AppState,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    let repository: Arc<dyn CandidateRepository> = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = create_pool(config).await?;
            run_migrations(&pool).await?;
            info!("Connected to Postgres, migrations applied");
            Arc::new(PgCandidateRepository::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory candidate store; data is lost on restart");
            Arc::new(InMemoryCandidateRepository::new())
        }
    };

    let app = routes::build_router(
        AppState::new(repository),
        cors_layer(config.cors_allowed_origin.as_deref())?,
        config.request_body_limit,
    );

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    info!("Health check: http://{}/health", addr);
    info!("Candidates API: http://{}/candidates", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
