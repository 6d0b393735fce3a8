//! HTTP Simplifier Client - 调用 KlarText API 批量简化接口
//!
//! 外部 API:
//! POST {base_url}/v1/simplify/batch
//! Request: {"texts": [...], "target_lang": "de", "level": "easy"}
//! Response: {"results": [{"index", "simplified_text", "error", "warnings"}],
//!            "batch_id", "successful_count", "failed_count"}
//! 错误响应: {"detail": "..."}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{BatchRequest, SimplifierPort, SimplifyError};
use crate::domain::{BatchEntry, EntryFailure};

#[derive(Debug, Serialize)]
struct BatchHttpRequest<'a> {
    texts: &'a [String],
    target_lang: &'static str,
    level: &'static str,
}

#[derive(Debug, Deserialize)]
struct BatchHttpResponse {
    results: Vec<BatchItemResult>,
    #[serde(default)]
    batch_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BatchItemResult {
    index: usize,
    #[serde(default)]
    simplified_text: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    warnings: Vec<String>,
}

/// FastAPI 错误体，detail 可能是字符串或校验错误列表
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// HTTP Simplifier 客户端配置
#[derive(Debug, Clone)]
pub struct HttpSimplifierClientConfig {
    /// API 基础 URL
    pub base_url: String,
    /// 传输层超时（秒），单批超时由 Dispatcher 控制
    pub timeout_secs: u64,
}

impl Default for HttpSimplifierClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 90,
        }
    }
}

impl HttpSimplifierClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP Simplifier 客户端
pub struct HttpSimplifierClient {
    client: Client,
    config: HttpSimplifierClientConfig,
}

impl HttpSimplifierClient {
    pub fn new(config: HttpSimplifierClientConfig) -> Result<Self, SimplifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SimplifyError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn batch_url(&self) -> String {
        format!("{}/v1/simplify/batch", self.config.base_url.trim_end_matches('/'))
    }

    fn health_url(&self) -> String {
        format!("{}/healthz", self.config.base_url.trim_end_matches('/'))
    }
}

/// 按 index 排列结果；数量、下标不一致时整批视为无效
fn align_results(
    expected: usize,
    results: Vec<BatchItemResult>,
) -> Result<Vec<BatchEntry>, SimplifyError> {
    if results.len() != expected {
        return Err(SimplifyError::InvalidResponse(format!(
            "expected {} results, got {}",
            expected,
            results.len()
        )));
    }

    let mut slots: Vec<Option<BatchEntry>> = vec![None; expected];
    for item in results {
        if !item.warnings.is_empty() {
            tracing::debug!(index = item.index, warnings = ?item.warnings, "Simplifier warnings");
        }
        let entry = match (item.simplified_text, item.error) {
            (Some(text), _) => BatchEntry::Simplified(text),
            (None, Some(error)) => BatchEntry::Failed(EntryFailure::Rejected(error)),
            (None, None) => BatchEntry::Failed(EntryFailure::InvalidResponse(
                "result without text or error".to_string(),
            )),
        };
        match slots.get_mut(item.index) {
            Some(slot) if slot.is_none() => *slot = Some(entry),
            _ => {
                return Err(SimplifyError::InvalidResponse(format!(
                    "unexpected result index {}",
                    item.index
                )))
            }
        }
    }

    // 长度一致且无重复下标时所有位置都已填充
    slots
        .into_iter()
        .map(|slot| slot.ok_or_else(|| SimplifyError::InvalidResponse("missing result".into())))
        .collect()
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.to_string(),
    }
}

#[async_trait]
impl SimplifierPort for HttpSimplifierClient {
    async fn simplify_batch(&self, request: &BatchRequest) -> Result<Vec<BatchEntry>, SimplifyError> {
        let http_request = BatchHttpRequest {
            texts: &request.texts,
            target_lang: request.target_lang.as_str(),
            level: request.level.as_str(),
        };

        tracing::debug!(
            url = %self.batch_url(),
            items = request.len(),
            target_lang = http_request.target_lang,
            level = http_request.level,
            "Sending simplify batch request"
        );

        let response = self
            .client
            .post(self.batch_url())
            .json(&http_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SimplifyError::Timeout
                } else if e.is_connect() {
                    SimplifyError::NetworkError(format!("Cannot connect to simplifier: {}", e))
                } else {
                    SimplifyError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SimplifyError::ServiceError {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let body: BatchHttpResponse = response
            .json()
            .await
            .map_err(|e| SimplifyError::InvalidResponse(format!("Failed to parse body: {}", e)))?;

        let batch_id = body.batch_id.unwrap_or_default();
        let entries = align_results(request.len(), body.results)?;

        tracing::info!(
            batch_id = %batch_id,
            items = entries.len(),
            succeeded = entries.iter().filter(|e| e.is_success()).count(),
            "Simplify batch completed"
        );

        Ok(entries)
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Level, TargetLang};
    use axum::{http::StatusCode, routing::{get, post}, Json, Router};
    use serde_json::{json, Value};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn request(texts: &[&str]) -> BatchRequest {
        BatchRequest::new(
            texts.iter().map(|t| t.to_string()).collect(),
            TargetLang::De,
            Level::Easy,
        )
    }

    #[test]
    fn test_config_builder() {
        let config = HttpSimplifierClientConfig::new("http://example.com:9000").with_timeout(30);
        assert_eq!(config.base_url, "http://example.com:9000");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_error_message_parsing() {
        assert_eq!(
            error_message(r#"{"detail":"Maximum 10 texts per batch."}"#),
            "Maximum 10 texts per batch."
        );
        assert!(error_message(r#"{"detail":[{"loc":["body","level"]}]}"#).contains("level"));
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[tokio::test]
    async fn test_results_reordered_by_index() {
        let app = Router::new().route(
            "/v1/simplify/batch",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["target_lang"], "de");
                assert_eq!(body["level"], "easy");
                let texts = body["texts"].as_array().unwrap().clone();
                let mut results: Vec<Value> = texts
                    .iter()
                    .enumerate()
                    .map(|(i, t)| {
                        if i == 1 {
                            json!({"index": i, "simplified_text": null,
                                   "error": "Text too short to simplify (minimum 10 characters)"})
                        } else {
                            json!({"index": i, "simplified_text": t.as_str().unwrap().to_uppercase(),
                                   "error": null, "warnings": []})
                        }
                    })
                    .collect();
                results.reverse();
                Json(json!({"results": results, "batch_id": "batch_test",
                            "successful_count": 2, "failed_count": 1}))
            }),
        );
        let base_url = serve(app).await;
        let client = HttpSimplifierClient::new(HttpSimplifierClientConfig::new(base_url)).unwrap();

        let entries = client
            .simplify_batch(&request(&["erster Text hier", "kurz", "dritter Text hier"]))
            .await
            .unwrap();

        assert_eq!(entries[0], BatchEntry::Simplified("ERSTER TEXT HIER".into()));
        assert!(matches!(&entries[1], BatchEntry::Failed(EntryFailure::Rejected(msg)) if msg.contains("too short")));
        assert_eq!(entries[2], BatchEntry::Simplified("DRITTER TEXT HIER".into()));
    }

    #[tokio::test]
    async fn test_non_2xx_maps_to_service_error() {
        let app = Router::new().route(
            "/v1/simplify/batch",
            post(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({"detail": "Rate limit exceeded"})),
                )
            }),
        );
        let base_url = serve(app).await;
        let client = HttpSimplifierClient::new(HttpSimplifierClientConfig::new(base_url)).unwrap();

        let err = client
            .simplify_batch(&request(&["ein Text zum Testen"]))
            .await
            .unwrap_err();

        match err {
            SimplifyError::ServiceError { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Rate limit exceeded");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_short_results_array_is_invalid() {
        let app = Router::new().route(
            "/v1/simplify/batch",
            post(|| async {
                Json(json!({"results": [{"index": 0, "simplified_text": "eins"}],
                            "batch_id": "b", "successful_count": 1, "failed_count": 0}))
            }),
        );
        let base_url = serve(app).await;
        let client = HttpSimplifierClient::new(HttpSimplifierClientConfig::new(base_url)).unwrap();

        let err = client
            .simplify_batch(&request(&["erster Text hier", "zweiter Text hier"]))
            .await
            .unwrap_err();
        assert!(matches!(err, SimplifyError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = Router::new().route("/healthz", get(|| async { Json(json!({"ok": true})) }));
        let base_url = serve(app).await;
        let client = HttpSimplifierClient::new(HttpSimplifierClientConfig::new(base_url)).unwrap();
        assert!(client.health_check().await);

        let unreachable =
            HttpSimplifierClient::new(HttpSimplifierClientConfig::new("http://127.0.0.1:1")).unwrap();
        assert!(!unreachable.health_check().await);
        let err = unreachable
            .simplify_batch(&request(&["ein Text zum Testen"]))
            .await
            .unwrap_err();
        assert!(matches!(err, SimplifyError::NetworkError(_)));
    }
}
