//! REST API 请求/响应模型

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 查询分析请求
#[derive(Debug, Deserialize)]
pub struct AnalyzeQueryRequest {
    #[serde(default)]
    pub query: Option<Value>,
}

/// 关键词生成请求
#[derive(Debug, Deserialize)]
pub struct GenerateKeywordsRequest {
    #[serde(default)]
    pub topic: Option<Value>,
}

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub cohere_available: bool,
    pub timestamp: String,
}
