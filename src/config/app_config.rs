//! 应用配置管理
//!
//! 配置在启动时加载一次：默认值 ← config.json ← 环境变量（含 .env）。
//! 加载完成后以 `Arc<AppConfig>` 注入各处理器，运行期间不再修改。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 获取配置文件路径
///
/// 优先使用 `CONFIG_PATH`，否则为可执行文件同级目录下的 config.json
fn get_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("CONFIG_PATH") {
        return PathBuf::from(path);
    }

    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.json")
}

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Cohere API 密钥，缺失时进入降级模式
    #[serde(default)]
    pub cohere_api_key: Option<String>,

    /// Cohere API 基础 URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// 生成模型名称
    #[serde(default = "default_model")]
    pub model: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 外部调用超时（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// 生成请求日志目录，未设置时不记录
    #[serde(default)]
    pub request_log_dir: Option<PathBuf>,
}

fn default_base_url() -> String {
    "https://api.cohere.ai".to_string()
}

fn default_model() -> String {
    "command-r-plus".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cohere_api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            request_log_dir: None,
        }
    }
}

/// 从文件加载配置
fn load_config_from_file(path: &Path) -> Option<AppConfig> {
    if !path.exists() {
        return None;
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            Some(config)
        }
        Err(e) => {
            warn!("Invalid config file {}: {}", path.display(), e);
            None
        }
    }
}

/// 解析数值型环境变量，失败时保留原值
fn parse_or_keep<T: std::str::FromStr>(name: &str, raw: Option<String>, current: T) -> T {
    match raw {
        Some(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("Ignoring invalid {}={:?}", name, value);
                current
            }
        },
        None => current,
    }
}

impl AppConfig {
    /// 加载配置（文件 + 进程环境变量）
    pub fn load() -> Self {
        let mut config = Self::from_file(&get_config_path());
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// 从指定文件加载，文件不存在或无效时使用默认值
    pub fn from_file(path: &Path) -> Self {
        load_config_from_file(path).unwrap_or_default()
    }

    /// 使用环境变量覆盖配置项
    ///
    /// `lookup` 抽象了环境变量读取，便于测试
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("COHERE_API_KEY") {
            self.cohere_api_key = Some(key);
        }
        if let Some(base_url) = lookup("COHERE_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(model) = lookup("COHERE_MODEL") {
            self.model = model;
        }
        if let Some(dir) = lookup("REQUEST_LOG_DIR") {
            self.request_log_dir = Some(PathBuf::from(dir));
        }
        self.port = parse_or_keep("PORT", lookup("PORT"), self.port);
        self.timeout_secs =
            parse_or_keep("COHERE_TIMEOUT_SECS", lookup("COHERE_TIMEOUT_SECS"), self.timeout_secs);
    }

    /// 有效的 API 密钥（空白视为未配置）
    pub fn api_key(&self) -> Option<&str> {
        self.cohere_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.base_url, "https://api.cohere.ai");
        assert_eq!(config.model, "command-r-plus");
        assert_eq!(config.port, 5000);
        assert_eq!(config.timeout_secs, 10);
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_env_overrides() {
        let env = env_of(&[
            ("COHERE_API_KEY", "secret-key"),
            ("COHERE_MODEL", "command-r"),
            ("PORT", "8080"),
            ("COHERE_TIMEOUT_SECS", "3"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).cloned());

        assert_eq!(config.api_key(), Some("secret-key"));
        assert_eq!(config.model, "command-r");
        assert_eq!(config.port, 8080);
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn test_invalid_port_keeps_previous() {
        let env = env_of(&[("PORT", "not-a-port")]);
        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).cloned());
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn test_blank_key_is_absent() {
        let env = env_of(&[("COHERE_API_KEY", "   ")]);
        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).cloned());
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"cohere_api_key": "from-file", "port": 7000}}"#).unwrap();

        let config = AppConfig::from_file(file.path());
        assert_eq!(config.api_key(), Some("from-file"));
        assert_eq!(config.port, 7000);
        assert_eq!(config.model, "command-r-plus");
    }

    #[test]
    fn test_invalid_file_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let config = AppConfig::from_file(file.path());
        assert!(config.api_key().is_none());
        assert_eq!(config.port, 5000);
    }
}
