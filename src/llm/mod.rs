//! LLM 模块
//!
//! 提供文本生成客户端抽象及 Cohere generate API 实现。

mod client;
mod cohere;
mod format;
mod types;

pub use client::TextGenerator;
pub use cohere::CohereClient;
pub use types::*;
