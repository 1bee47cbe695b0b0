//! 查询分析与关键词生成服务
//!
//! 先尝试外部模型；未配置客户端或调用/解析出现任何错误时，完整降级到
//! [`fallback`](super::fallback) 的确定性结果。不做重试。

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error};

use super::fallback::{fallback_analysis, fallback_keywords};
use super::prompt_service::{
    build_analysis_prompt, build_keywords_prompt, ANALYSIS_MAX_TOKENS, GENERATION_TEMPERATURE,
    KEYWORDS_MAX_TOKENS,
};
use crate::llm::{GenerateOptions, LlmError, TextGenerator};
use crate::models::{InsightResponse, KeywordSet, QueryAnalysis};

/// 把模型文本严格解析为 JSON 对象
///
/// 只去除首尾空白，不尝试从代码块或多余文本中提取
pub fn parse_json_object(text: &str) -> Result<Map<String, Value>, LlmError> {
    match serde_json::from_str::<Value>(text.trim())? {
        Value::Object(object) => Ok(object),
        _ => Err(LlmError::NotAnObject),
    }
}

/// 查询洞察服务
#[derive(Clone)]
pub struct InsightService {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl InsightService {
    /// 创建服务，`generator` 为 `None` 时始终走降级路径
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    /// 是否配置了外部生成客户端
    pub fn is_ai_available(&self) -> bool {
        self.generator.is_some()
    }

    /// 分析搜索查询
    pub async fn analyze_query(&self, query: &str) -> InsightResponse<QueryAnalysis> {
        let Some(generator) = self.generator.as_deref() else {
            return InsightResponse::Fallback(fallback_analysis(query));
        };

        let prompt = build_analysis_prompt(query);
        let options = GenerateOptions::new(ANALYSIS_MAX_TOKENS, GENERATION_TEMPERATURE);

        match Self::request_json(generator, &prompt, options).await {
            Ok(object) => InsightResponse::generated(object),
            Err(e) => {
                error!("Cohere API error: {}", e);
                InsightResponse::Fallback(fallback_analysis(query))
            }
        }
    }

    /// 为主题生成搜索关键词
    pub async fn generate_keywords(&self, topic: &str) -> InsightResponse<KeywordSet> {
        let Some(generator) = self.generator.as_deref() else {
            return InsightResponse::Fallback(fallback_keywords(topic));
        };

        let prompt = build_keywords_prompt(topic);
        let options = GenerateOptions::new(KEYWORDS_MAX_TOKENS, GENERATION_TEMPERATURE);

        match Self::request_json(generator, &prompt, options).await {
            Ok(object) => InsightResponse::generated(object),
            Err(e) => {
                error!("Cohere API error: {}", e);
                InsightResponse::Fallback(fallback_keywords(topic))
            }
        }
    }

    /// 调用模型并解析为 JSON 对象
    async fn request_json(
        generator: &dyn TextGenerator,
        prompt: &str,
        options: GenerateOptions,
    ) -> Result<Map<String, Value>, LlmError> {
        debug!("Requesting structured output from model={}", generator.model());
        let text = generator.generate(prompt, options).await?;
        parse_json_object(&text)
    }
}
