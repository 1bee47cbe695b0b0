//! 文本生成客户端抽象

use async_trait::async_trait;

use super::types::{GenerateOptions, LlmError};

/// 文本生成器
///
/// 输入提示词，返回模型生成的原始文本。服务层只依赖此 trait，
/// 测试中可替换为模拟实现。
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// 单次生成，不做重试
    async fn generate(&self, prompt: &str, options: GenerateOptions) -> Result<String, LlmError>;

    /// 使用的模型名称
    fn model(&self) -> &str;
}
