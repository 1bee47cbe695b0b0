//! Search Insight Service
//!
//! 使用 axum 构建的微服务：分析搜索查询、为主题生成关键词。
//! 优先调用 Cohere 生成 API，不可用或失败时降级为确定性的分词结果。

use anyhow::Context;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod error;
mod llm;
mod models;
mod services;
mod state;
mod utils;

use api::create_app;
use config::AppConfig;
use state::create_shared_state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 不存在时忽略
    dotenvy::dotenv().ok();

    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "search_insight_service=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting search insight service...");

    let config = AppConfig::load();
    let port = config.port;
    let state = create_shared_state(&config);

    let app = create_app(state);

    // 监听所有网卡
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server listening on: {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
