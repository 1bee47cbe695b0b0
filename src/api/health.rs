//! 健康检查端点

use axum::{extract::State, routing::get, Json, Router};
use chrono::{Local, SecondsFormat};
use std::sync::Arc;

use crate::models::HealthResponse;
use crate::state::AppState;

/// 健康检查处理器
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        cohere_available: state.cohere_available(),
        timestamp: Local::now().to_rfc3339_opts(SecondsFormat::Micros, false),
    })
}

/// 创建健康检查路由
pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}
