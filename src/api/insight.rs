//! 查询分析与关键词生成端点

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{
    AnalyzeQueryRequest, GenerateKeywordsRequest, InsightResponse, KeywordSet, QueryAnalysis,
};
use crate::state::AppState;

/// 空值判定：缺失、null、false、0、空白字符串、空数组、空对象
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// 校验必填文本字段
///
/// 空值返回 400；非空但不是字符串的值无法处理，按内部错误返回 500
fn require_field(value: Option<Value>, field: &str) -> AppResult<String> {
    match value {
        Some(value) if !is_blank(&value) => match value {
            Value::String(text) => Ok(text),
            other => {
                let message = format!("{} must be a string, got {}", field, other);
                error!("Invalid request: {}", message);
                Err(AppError::Internal(message))
            }
        },
        _ => {
            warn!("Rejected request: {} is required", field);
            Err(AppError::BadRequest(format!("{} is required", field)))
        }
    }
}

/// 解包请求体，失败时记录日志
fn unwrap_body<T>(payload: Result<Json<T>, JsonRejection>, handler: &str) -> AppResult<T> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        error!("Error in {}: {}", handler, rejection.body_text());
        AppError::from(rejection)
    })
}

/// 分析搜索查询
async fn analyze_query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeQueryRequest>, JsonRejection>,
) -> AppResult<Json<InsightResponse<QueryAnalysis>>> {
    let req = unwrap_body(payload, "analyze_query")?;
    let query = require_field(req.query, "query")?;

    let response = state.insight.analyze_query(&query).await;
    info!("Query analyzed: fallback={}", response.is_fallback());
    Ok(Json(response))
}

/// 生成搜索关键词
async fn generate_keywords(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateKeywordsRequest>, JsonRejection>,
) -> AppResult<Json<InsightResponse<KeywordSet>>> {
    let req = unwrap_body(payload, "generate_keywords")?;
    let topic = require_field(req.topic, "topic")?;

    let response = state.insight.generate_keywords(&topic).await;
    info!("Keywords generated: fallback={}", response.is_fallback());
    Ok(Json(response))
}

/// 创建洞察路由
pub fn insight_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/analyze-query", post(analyze_query))
        .route("/generate-keywords", post(generate_keywords))
}
