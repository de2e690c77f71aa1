mod application;
mod domain;
mod infrastructure;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use application::phase_service::PhaseImagingService;
use infrastructure::axum_handler::AppState;
use infrastructure::config::ServerConfig;
use infrastructure::image_processor::DefaultImageProcessor;
use infrastructure::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    // 依存関係の組み立て (処理はすべてリクエスト単位、共有状態はない)
    let image_processor = Arc::new(DefaultImageProcessor::new());
    let phase_service = Arc::new(PhaseImagingService::new(image_processor));
    let state = Arc::new(AppState { phase_service });

    let app = build_router(state, &config);

    // サーバーの開始
    let addr = config.socket_addr();
    tracing::info!(%addr, max_upload_bytes = config.max_upload_bytes, "MedTech Image Processor listening");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
