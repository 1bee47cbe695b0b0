//! Cohere generate API 客户端

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::client::TextGenerator;
use super::format::build_generate_endpoint;
use super::types::{GenerateOptions, LlmError};
use crate::utils::{LogEntry, RequestInfo, RequestLogger};

/// generate 请求载荷
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f64,
}

/// generate 响应
#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    generations: Vec<Generation>,
}

#[derive(Deserialize, Debug)]
struct Generation {
    text: String,
}

/// 从响应体中取出第一条生成文本
fn parse_generate_response(body: &str) -> Result<String, LlmError> {
    let response: GenerateResponse = serde_json::from_str(body)?;
    response
        .generations
        .into_iter()
        .next()
        .map(|g| g.text)
        .ok_or(LlmError::EmptyGeneration)
}

/// Cohere 客户端
///
/// 启动时创建一次，之后只读，可在请求间共享
pub struct CohereClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    timeout_secs: u64,
    request_logger: Option<Arc<RequestLogger>>,
}

impl CohereClient {
    /// 创建新的 Cohere 客户端
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::ConfigError("API Key is required".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(5)))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(LlmError::HttpError)?;

        Ok(Self {
            client,
            api_key,
            endpoint: build_generate_endpoint(base_url),
            model: model.into(),
            timeout_secs,
            request_logger: None,
        })
    }

    /// 附加请求日志记录器
    pub fn with_request_logger(mut self, logger: Arc<RequestLogger>) -> Self {
        self.request_logger = Some(logger);
        self
    }

    async fn send(&self, prompt: &str, options: GenerateOptions) -> Result<String, LlmError> {
        let payload = GenerateRequest {
            model: &self.model,
            prompt,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let preview: String = body.chars().take(500).collect();
            error!("Cohere API error: status={}, body={}", status.as_u16(), preview);
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        parse_generate_response(&body)
    }
}

/// 在阻塞线程池中写入请求日志
async fn record_outcome(
    logger: Arc<RequestLogger>,
    entry: LogEntry,
    start_time: Instant,
    result: &Result<String, LlmError>,
) {
    let outcome = match result {
        Ok(text) => Ok(text.clone()),
        Err(e) => Err((e.kind(), e.to_string(), e.status_code())),
    };

    let written = tokio::task::spawn_blocking(move || match outcome {
        Ok(text) => logger.log_success(entry, start_time, &text),
        Err((kind, message, status)) => logger.log_error(entry, start_time, kind, &message, status),
    })
    .await;

    if let Err(e) = written {
        warn!("Failed to write generation request log: {}", e);
    }
}

#[async_trait]
impl TextGenerator for CohereClient {
    async fn generate(&self, prompt: &str, options: GenerateOptions) -> Result<String, LlmError> {
        let request_id = RequestLogger::generate_request_id();
        let start_time = Instant::now();
        let entry = self.request_logger.as_ref().map(|logger| {
            logger.start_entry(&RequestInfo {
                request_id: &request_id,
                endpoint: &self.endpoint,
                model: &self.model,
                api_key: &self.api_key,
                prompt,
                options,
                timeout: self.timeout_secs,
            })
        });

        debug!(
            "Cohere request: id={}, endpoint={}, model={}, max_tokens={}",
            request_id, self.endpoint, self.model, options.max_tokens
        );

        let result = self.send(prompt, options).await;

        match &result {
            Ok(text) => info!(
                "Cohere request completed: id={}, duration_ms={}, length={}",
                request_id,
                start_time.elapsed().as_millis(),
                text.len()
            ),
            Err(e) => debug!("Cohere request failed: id={}, error={}", request_id, e),
        }

        if let (Some(logger), Some(entry)) = (self.request_logger.clone(), entry) {
            record_outcome(logger, entry, start_time, &result).await;
        }

        result
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    use crate::models::InsightResponse;
    use crate::services::fallback::fallback_analysis;
    use crate::services::InsightService;

    /// 读取一个完整的 HTTP 请求（请求头 + Content-Length 指定的正文）
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// 启动只处理一个连接的本地服务，延迟 `delay` 后返回固定响应
    async fn spawn_server(
        status_line: &'static str,
        body: &'static str,
        delay: Duration,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            tokio::time::sleep(delay).await;

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
            request
        });

        (base_url, handle)
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let result = CohereClient::new("  ", "https://api.cohere.ai", "command-r-plus", 10);
        assert!(matches!(result, Err(LlmError::ConfigError(_))));
    }

    #[test]
    fn test_client_endpoint_and_model() {
        let client = CohereClient::new("key", "https://api.cohere.ai/", "command-r-plus", 10).unwrap();
        assert_eq!(client.endpoint, "https://api.cohere.ai/v1/generate");
        assert_eq!(client.model(), "command-r-plus");
    }

    #[test]
    fn test_request_payload() {
        let payload = GenerateRequest {
            model: "command-r-plus",
            prompt: "olá",
            max_tokens: 500,
            temperature: 0.3,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["model"], "command-r-plus");
        assert_eq!(value["prompt"], "olá");
        assert_eq!(value["max_tokens"], 500);
        assert_eq!(value["temperature"], 0.3);
    }

    #[test]
    fn test_parse_generate_response() {
        let body = r#"{"id":"x","generations":[{"id":"g1","text":" {\"a\":1} "}],"prompt":"p"}"#;
        assert_eq!(parse_generate_response(body).unwrap(), " {\"a\":1} ");
    }

    #[test]
    fn test_parse_generate_response_errors() {
        assert!(matches!(
            parse_generate_response(r#"{"generations":[]}"#),
            Err(LlmError::EmptyGeneration)
        ));
        assert!(matches!(
            parse_generate_response("<html>bad gateway</html>"),
            Err(LlmError::JsonError(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_sends_bearer_and_payload() {
        let (base_url, server) = spawn_server(
            "200 OK",
            r#"{"id":"x","generations":[{"id":"g1","text":"{\"mainTopic\":\"rust\"}"}]}"#,
            Duration::ZERO,
        )
        .await;
        let log_dir = TempDir::new().unwrap();
        let client = CohereClient::new("test-key-123456", &base_url, "command-r-plus", 5)
            .unwrap()
            .with_request_logger(Arc::new(RequestLogger::new(log_dir.path())));

        let text = client
            .generate("Consulta: \"rust\"", GenerateOptions::new(500, 0.3))
            .await
            .unwrap();
        assert_eq!(text, "{\"mainTopic\":\"rust\"}");

        let request = server.await.unwrap();
        let lowered = request.to_lowercase();
        assert!(lowered.starts_with("post /v1/generate "));
        assert!(lowered.contains("authorization: bearer test-key-123456"));

        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        let payload: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(payload["model"], "command-r-plus");
        assert_eq!(payload["prompt"], "Consulta: \"rust\"");
        assert_eq!(payload["max_tokens"], 500);
        assert_eq!(payload["temperature"], 0.3);

        let log = std::fs::read_to_string(log_dir.path().join("generation_requests.jsonl")).unwrap();
        let entry: serde_json::Value = serde_json::from_str(log.lines().next().unwrap()).unwrap();
        assert_eq!(entry["status"], "success");
        assert_eq!(entry["api_key_masked"], "test...3456");
    }

    #[tokio::test]
    async fn test_non_success_status_is_api_error() {
        let (base_url, _server) = spawn_server(
            "429 Too Many Requests",
            r#"{"message":"rate limited"}"#,
            Duration::ZERO,
        )
        .await;
        let client = CohereClient::new("test-key", &base_url, "command-r-plus", 5).unwrap();

        let err = client
            .generate("prompt", GenerateOptions::new(300, 0.3))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::ApiError { status: 429, .. }));
        assert_eq!(err.kind(), "api");
        assert_eq!(err.status_code(), Some(429));
    }

    #[tokio::test]
    async fn test_stalled_server_times_out() {
        let (base_url, _server) =
            spawn_server("200 OK", r#"{"generations":[]}"#, Duration::from_secs(5)).await;
        let client = CohereClient::new("test-key", &base_url, "command-r-plus", 1).unwrap();

        let err = client
            .generate("prompt", GenerateOptions::new(500, 0.3))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Timeout));
        assert_eq!(err.kind(), "timeout");
    }

    #[tokio::test]
    async fn test_timeout_leads_to_fallback() {
        let (base_url, _server) =
            spawn_server("200 OK", r#"{"generations":[]}"#, Duration::from_secs(5)).await;
        let client = CohereClient::new("test-key", &base_url, "command-r-plus", 1).unwrap();
        let generator: Arc<dyn TextGenerator> = Arc::new(client);
        let service = InsightService::new(Some(generator));

        let response = service.analyze_query("alpha beta gamma").await;
        assert_eq!(
            response,
            InsightResponse::Fallback(fallback_analysis("alpha beta gamma"))
        );
    }
}
