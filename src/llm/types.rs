//! LLM 类型定义

/// 生成选项
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerateOptions {
    /// 最大输出 token 数
    pub max_tokens: u32,
    /// 温度参数
    pub temperature: f64,
}

impl GenerateOptions {
    pub fn new(max_tokens: u32, temperature: f64) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }
}

/// LLM 错误类型
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// HTTP 请求错误
    #[error("HTTP 请求失败: {0}")]
    HttpError(reqwest::Error),

    /// API 返回错误
    #[error("API 错误 ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// 超时错误
    #[error("请求超时")]
    Timeout,

    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// JSON 解析错误
    #[error("JSON 解析失败: {0}")]
    JsonError(#[from] serde_json::Error),

    /// 没有返回任何生成结果
    #[error("响应中没有生成结果")]
    EmptyGeneration,

    /// 生成内容是合法 JSON，但不是对象
    #[error("生成内容不是 JSON 对象")]
    NotAnObject,
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::HttpError(e)
        }
    }
}

impl LlmError {
    /// 错误类别名，用于请求日志
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::HttpError(_) => "http",
            LlmError::ApiError { .. } => "api",
            LlmError::Timeout => "timeout",
            LlmError::ConfigError(_) => "config",
            LlmError::JsonError(_) => "json",
            LlmError::EmptyGeneration => "empty_generation",
            LlmError::NotAnObject => "not_an_object",
        }
    }

    /// 上游返回的 HTTP 状态码（若有）
    pub fn status_code(&self) -> Option<u16> {
        match self {
            LlmError::ApiError { status, .. } => Some(*status),
            LlmError::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
