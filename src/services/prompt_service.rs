//! Prompt 构建
//!
//! 两个固定的指令模板，要求模型只返回 JSON。

/// 查询分析的最大输出 token 数
pub const ANALYSIS_MAX_TOKENS: u32 = 500;

/// 关键词生成的最大输出 token 数
pub const KEYWORDS_MAX_TOKENS: u32 = 300;

/// 低温度，输出更稳定、更贴合格式
pub const GENERATION_TEMPERATURE: f64 = 0.3;

/// 构建查询分析提示词
pub fn build_analysis_prompt(query: &str) -> String {
    format!(
        r#"Analise esta consulta de pesquisa e retorne um JSON com:
{{
  "mainTopic": "tópico principal",
  "subtopics": ["subtópico1", "subtópico2"],
  "intentType": "question|definition|comparison|tutorial|general",
  "keywords": ["palavra1", "palavra2", "palavra3"],
  "context": "atual|histórico|geral"
}}

Consulta: "{}"

Responda apenas com o JSON, sem texto adicional."#,
        query
    )
}

/// 构建关键词生成提示词
pub fn build_keywords_prompt(topic: &str) -> String {
    format!(
        r#"Gere palavras-chave para busca web sobre: "{}"
Retorne um JSON com:
{{
  "primary": ["palavra-chave principal 1", "palavra-chave principal 2"],
  "related": ["termo relacionado 1", "termo relacionado 2"],
  "synonyms": ["sinônimo 1", "sinônimo 2"],
  "english": ["english term 1", "english term 2"]
}}

Responda apenas com o JSON, sem texto adicional."#,
        topic
    )
}
