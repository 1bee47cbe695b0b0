//! 应用状态管理
//!
//! 启动时根据配置构建一次，之后只读，通过 axum `State` 注入各处理器。

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::llm::{CohereClient, TextGenerator};
use crate::services::InsightService;
use crate::utils::RequestLogger;

/// 应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// 查询洞察服务
    pub insight: InsightService,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self {
            insight: InsightService::new(generator),
        }
    }

    /// 外部生成客户端是否可用
    pub fn cohere_available(&self) -> bool {
        self.insight.is_ai_available()
    }
}

/// 根据配置创建生成客户端
///
/// 未配置密钥或创建失败时返回 `None`，进程在整个生命周期内使用降级模式
pub fn build_generator(config: &AppConfig) -> Option<Arc<dyn TextGenerator>> {
    let Some(api_key) = config.api_key() else {
        warn!("COHERE_API_KEY not found, using fallback mode");
        return None;
    };

    let client = match CohereClient::new(api_key, &config.base_url, &config.model, config.timeout_secs) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create Cohere client, using fallback mode: {}", e);
            return None;
        }
    };

    let client = match &config.request_log_dir {
        Some(dir) => {
            let logger = RequestLogger::new(dir);
            info!("Generation requests logged to {}", logger.log_path().display());
            client.with_request_logger(Arc::new(logger))
        }
        None => client,
    };

    info!("Cohere client configured: model={}", config.model);
    Some(Arc::new(client))
}

/// 创建可共享的应用状态
pub fn create_shared_state(config: &AppConfig) -> Arc<AppState> {
    Arc::new(AppState::new(build_generator(config)))
}
