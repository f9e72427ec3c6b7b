//! custody-vault 主入口

use std::sync::Arc;

use anyhow::Result;
use custody_vault::{
    api,
    app_state::AppState,
    config::{Config, StorageBackend},
    infrastructure::{db, logging},
};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载 .env 与配置文件（环境变量优先）
    dotenvy::dotenv().ok();
    let config_path = std::env::var("CONFIG_PATH").ok();
    let config = Config::from_env_and_file(config_path.as_deref())?;
    config.validate()?;

    // 2. 初始化日志
    logging::init_logging(&config.logging)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = ?config.storage.backend,
        "starting custody-vault"
    );

    // 3. 存储
    let state = match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage, records are lost on restart");
            AppState::in_memory(config.clone())
        }
        StorageBackend::Postgres => {
            let pool = db::init_pool(&config.storage).await?;
            tracing::info!("database connected");
            if config.storage.run_migrations {
                db::run_migrations(&pool).await?;
            } else {
                tracing::info!("database migrations skipped");
            }
            AppState::with_postgres(config.clone(), pool)
        }
    };

    // 4. 启动 HTTP 服务
    let app = api::routes(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    tracing::info!("server listening on http://{}", config.server.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
