//! 生成请求日志记录器
//!
//! 将每次外部生成调用记录到 JSONL 文件，便于调试和分析。
//! 写入失败只会被忽略，不影响请求本身。

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

use crate::llm::GenerateOptions;

/// 默认保留的最大条目数
const DEFAULT_MAX_ENTRIES: usize = 1000;

/// 请求日志条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// 请求 ID
    pub request_id: String,
    /// 时间戳
    pub timestamp: DateTime<Utc>,
    /// 端点 URL
    pub endpoint: String,
    /// API 密钥（脱敏）
    pub api_key_masked: String,
    /// 模型名称
    pub model: String,
    /// 提示词预览
    pub prompt_preview: String,
    /// 最大 token 数
    pub max_tokens: u32,
    /// 温度参数
    pub temperature: f64,
    /// 超时时间（秒）
    pub timeout: u64,
    /// 状态：pending / success / error
    pub status: String,
    /// 持续时间（毫秒）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// 响应长度
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_length: Option<usize>,
    /// 响应预览
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_preview: Option<String>,
    /// 错误类型
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// 错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// HTTP 状态码
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

/// 一次生成调用的请求信息
#[derive(Debug, Clone, Copy)]
pub struct RequestInfo<'a> {
    pub request_id: &'a str,
    pub endpoint: &'a str,
    pub model: &'a str,
    pub api_key: &'a str,
    pub prompt: &'a str,
    pub options: GenerateOptions,
    /// 超时时间（秒）
    pub timeout: u64,
}

/// 已打开的日志文件及其当前行数
struct LogFile {
    file: File,
    lines: usize,
}

/// 请求日志记录器
///
/// 行数达到 `2 * max_entries` 时压缩为最近的 `max_entries` 条
pub struct RequestLogger {
    log_path: PathBuf,
    max_entries: usize,
    file: Mutex<Option<LogFile>>,
}

impl RequestLogger {
    /// 创建新的日志记录器，日志写入 `log_dir/generation_requests.jsonl`
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let log_dir = log_dir.into();
        let _ = fs::create_dir_all(&log_dir);

        Self {
            log_path: log_dir.join("generation_requests.jsonl"),
            max_entries: DEFAULT_MAX_ENTRIES,
            file: Mutex::new(None),
        }
    }

    #[cfg(test)]
    fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// 日志文件路径
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// 生成请求 ID
    pub fn generate_request_id() -> String {
        Uuid::new_v4().simple().to_string()[..8].to_string()
    }

    /// API 密钥脱敏
    pub fn mask_api_key(api_key: &str) -> String {
        let chars: Vec<char> = api_key.chars().collect();
        if chars.len() <= 8 {
            "*".repeat(chars.len())
        } else {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        }
    }

    /// 按字符截断
    fn truncate(s: &str, max_chars: usize) -> String {
        match s.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}...", &s[..idx]),
            None => s.to_string(),
        }
    }

    /// 创建待完成的日志条目
    pub fn start_entry(&self, info: &RequestInfo<'_>) -> LogEntry {
        LogEntry {
            request_id: info.request_id.to_string(),
            timestamp: Utc::now(),
            endpoint: info.endpoint.to_string(),
            api_key_masked: Self::mask_api_key(info.api_key),
            model: info.model.to_string(),
            prompt_preview: Self::truncate(info.prompt, 200),
            max_tokens: info.options.max_tokens,
            temperature: info.options.temperature,
            timeout: info.timeout,
            status: "pending".to_string(),
            duration_ms: None,
            response_length: None,
            response_preview: None,
            error_type: None,
            error_message: None,
            status_code: None,
        }
    }

    /// 记录成功
    pub fn log_success(&self, mut entry: LogEntry, start_time: Instant, response: &str) {
        entry.status = "success".to_string();
        entry.duration_ms = Some(start_time.elapsed().as_millis() as u64);
        entry.response_length = Some(response.chars().count());
        entry.response_preview = Some(Self::truncate(response, 300));
        self.write_entry(&entry);
    }

    /// 记录错误
    pub fn log_error(
        &self,
        mut entry: LogEntry,
        start_time: Instant,
        error_type: &str,
        error_message: &str,
        status_code: Option<u16>,
    ) {
        entry.status = "error".to_string();
        entry.duration_ms = Some(start_time.elapsed().as_millis() as u64);
        entry.error_type = Some(error_type.to_string());
        entry.error_message = Some(Self::truncate(error_message, 500));
        entry.status_code = status_code;
        self.write_entry(&entry);
    }

    /// 打开日志文件并统计已有行数
    fn open_log_file(&self) -> Option<LogFile> {
        let lines = File::open(&self.log_path)
            .map(|f| BufReader::new(f).lines().count())
            .unwrap_or(0);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .ok()?;
        Some(LogFile { file, lines })
    }

    /// 写入日志条目
    fn write_entry(&self, entry: &LogEntry) {
        let Ok(json) = serde_json::to_string(entry) else {
            return;
        };

        let mut file_guard = self.file.lock();

        // 懒加载文件
        if file_guard.is_none() {
            *file_guard = self.open_log_file();
        }

        let Some(log_file) = file_guard.as_mut() else {
            return;
        };

        if writeln!(log_file.file, "{}", json).is_ok() {
            let _ = log_file.file.flush();
            log_file.lines += 1;
        }

        if log_file.lines >= self.max_entries.saturating_mul(2) {
            log_file.lines = self.compact();
        }
    }

    /// 只保留最近的 max_entries 条，返回保留的行数
    fn compact(&self) -> usize {
        let Ok(file) = File::open(&self.log_path) else {
            return 0;
        };
        let lines: Vec<String> = BufReader::new(file).lines().map_while(Result::ok).collect();

        let keep_from = lines.len().saturating_sub(self.max_entries);
        let keep_lines = &lines[keep_from..];
        if let Ok(mut file) = File::create(&self.log_path) {
            for line in keep_lines {
                let _ = writeln!(file, "{}", line);
            }
        }
        keep_lines.len()
    }
}
