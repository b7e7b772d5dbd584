//! Library API 서버 진입점.
//!
//! 설정 로드, 로깅 초기화, 서명 키 해석, 저장소 연결 후 HTTP 서버를 시작합니다.

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};

use library_api::bootstrap::{open_store, seed_admin};
use library_api::{create_router, AppState, TokenCodec};
use library_core::{init_logging, AppConfig, LogConfig, SigningKey};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default().context("failed to load configuration")?;

    init_logging(LogConfig::from(&config.logging))
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    info!("Starting Library API server...");

    let key = SigningKey::resolve(
        config.auth.jwt_secret.as_ref(),
        |name| std::env::var(name).ok(),
        config.auth.environment,
    )?;
    info!(origin = %key.origin(), "Signing key resolved");

    let codec = TokenCodec::new(&key, config.auth.token_ttl()?);

    let store = open_store(&config.database, |name| std::env::var(name).ok()).await?;
    info!(backend = store.backend(), "Storage initialized");

    if let Some(seed) = &config.seed_admin {
        seed_admin(store.as_ref(), seed).await?;
    }

    let state = Arc::new(AppState::new(codec, store));
    info!(version = %state.version, "Application state initialized");

    let app = create_router(state, &config.server.cors_origins);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| {
            error!(
                %addr,
                error = %e,
                "Failed to bind. Check server.host and server.port"
            );
            e
        })?;
    info!(%addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM을 수신하면 반환합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
