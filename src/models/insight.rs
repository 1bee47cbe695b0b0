//! 查询分析与关键词结果模型

use serde::Serialize;
use serde_json::{Map, Value};

/// 查询意图类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentType {
    Question,
    Definition,
    Comparison,
    Tutorial,
    General,
}

/// 查询的时间语境
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchContext {
    #[serde(rename = "atual")]
    Atual,
    #[serde(rename = "histórico")]
    Historico,
    #[serde(rename = "geral")]
    Geral,
}

/// 查询分析结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryAnalysis {
    pub main_topic: String,
    pub subtopics: Vec<String>,
    pub intent_type: IntentType,
    pub keywords: Vec<String>,
    pub context: SearchContext,
    pub fallback: bool,
}

/// 关键词集合
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordSet {
    pub primary: Vec<String>,
    pub related: Vec<String>,
    pub synonyms: Vec<String>,
    pub english: Vec<String>,
    pub fallback: bool,
}

/// 对外返回的结果
///
/// `Generated` 为模型返回的 JSON 对象（已写入 `fallback: false`，其余字段原样透传），
/// `Fallback` 为降级引擎构造的强类型结果。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InsightResponse<T> {
    Generated(Map<String, Value>),
    Fallback(T),
}

impl<T> InsightResponse<T> {
    /// 把模型输出包装为结果，并标记 `fallback: false`
    pub fn generated(mut object: Map<String, Value>) -> Self {
        object.insert("fallback".to_string(), Value::Bool(false));
        InsightResponse::Generated(object)
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, InsightResponse::Fallback(_))
    }
}
