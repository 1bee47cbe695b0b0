//! 降级引擎
//!
//! 不依赖外部 API 的确定性分析：按空白切分、转小写、保留长度大于 2 的词。
//! 长度按字符计算，而非字节。

use crate::models::{IntentType, KeywordSet, QueryAnalysis, SearchContext};

/// 最短保留词长（不含）
const MIN_TOKEN_CHARS: usize = 2;

/// 切分并过滤词
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(str::to_lowercase)
        .filter(|word| word.chars().count() > MIN_TOKEN_CHARS)
        .collect()
}

/// 取前 n 个，不足时返回全部
fn take_slice(words: &[String], start: usize, end: usize) -> Vec<String> {
    let end = end.min(words.len());
    let start = start.min(end);
    words[start..end].to_vec()
}

/// 查询分析降级
pub fn fallback_analysis(query: &str) -> QueryAnalysis {
    let keywords = tokenize(query);
    QueryAnalysis {
        main_topic: query.to_string(),
        subtopics: take_slice(&keywords, 0, 3),
        intent_type: IntentType::General,
        keywords: take_slice(&keywords, 0, 5),
        context: SearchContext::Atual,
        fallback: true,
    }
}

/// 关键词生成降级
pub fn fallback_keywords(topic: &str) -> KeywordSet {
    let words = tokenize(topic);
    KeywordSet {
        primary: take_slice(&words, 0, 2),
        related: take_slice(&words, 2, 4),
        synonyms: Vec::new(),
        english: Vec::new(),
        fallback: true,
    }
}
