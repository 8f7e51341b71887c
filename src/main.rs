mod handlers;
mod models;
mod services;
mod utils;

use anyhow::Context;
use handlers::AppState;
use services::ai_config::AppConfig;
use services::ai_providers::{DeepSeekProvider, ModelConfig};
use services::ai_service::AIService;
use services::rate_limiter::{MemoryCountingStore, RateLimiter};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::logger::init_logger();

    let config = AppConfig::load().context("加载配置失败")?;
    tracing::info!(api_key = %config.masked_api_key(), model = %config.model, base_url = %config.base_url, "配置加载完成");
    if config.api_key.is_none() {
        tracing::warn!("DEEPSEEK_API_KEY 未设置，模型调用将会失败");
    }

    let provider = DeepSeekProvider::new(
        config.api_key.clone().unwrap_or_default(),
        config.base_url.clone(),
        ModelConfig {
            model: config.model.clone(),
            ..ModelConfig::default()
        },
        config.request_timeout_duration(),
    )
    .context("初始化 DeepSeek 客户端失败")?;

    let state = AppState {
        ai: Arc::new(AIService::new(Arc::new(provider))),
        limiter: Arc::new(RateLimiter::new(
            Arc::new(MemoryCountingStore::daily()),
            config.daily_limit,
        )),
    };
    let router = handlers::build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("绑定地址失败: {}", addr))?;
    tracing::info!("服务器启动成功! 运行于 http://localhost:{}", config.port);
    tracing::info!("状态检查: http://localhost:{}/status", config.port);
    tracing::info!("API测试: http://localhost:{}/test-api", config.port);

    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP 服务异常退出")?;

    tracing::info!("服务器已关闭");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("收到关闭信号，准备关闭服务器");
}
