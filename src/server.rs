//! Web服务器模块
//!
//! 翻译服务的HTTP边界：薄胶水层，负责请求验证与JSON编解码。
//! 所有输入验证错误都在这里以400返回，绝不进入自动化核心。

// 标准库导入
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

// 第三方crate导入
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::error;

// 本地模块导入
use crate::api_constants::{remote_config, service_config};
use crate::translator::AutoTranslator;
use crate::utils::round_processing_time;

/// 应用状态
pub struct AppState {
    pub translator: AutoTranslator,
    pub headless: bool,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(translator: AutoTranslator, headless: bool) -> Self {
        Self {
            translator,
            headless,
            started_at: Utc::now(),
        }
    }
}

/// 组装路由
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/translate", post(translate))
        .route("/translate/batch", post(translate_batch))
        .route("/mapping", get(get_mapping).post(add_mapping))
        .route("/mapping/:word", delete(delete_mapping))
        .route("/status", get(status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 单条翻译响应
#[derive(Serialize)]
pub struct TranslateResponse {
    pub original: String,
    pub translated: String,
    pub source_lang: String,
    pub target_lang: String,
    pub processing_time: f64,
}

/// 批量翻译响应
#[derive(Serialize)]
pub struct BatchResponse {
    pub results: HashMap<String, String>,
    pub count: usize,
    pub processing_time: f64,
}

/// 服务状态响应（静态能力描述）
#[derive(Serialize)]
pub struct StatusResponse {
    pub service: &'static str,
    pub status: &'static str,
    pub automation_enabled: bool,
    pub headless_mode: bool,
    pub max_batch_size: usize,
    pub started_at: String,
}

type HandlerError = (StatusCode, Json<Value>);

fn bad_request(message: &str) -> HandlerError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn internal_error(message: String) -> HandlerError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
}

/// 从请求体中解析必填的text字段
fn parse_translate_text(body: &Value) -> Result<&str, &'static str> {
    match body.get("text").and_then(Value::as_str) {
        Some(text) => Ok(text),
        None => Err("Text is required"),
    }
}

/// 从请求体中解析批量文本数组
fn parse_batch_texts(body: &Value) -> Result<Vec<String>, String> {
    let Some(items) = body.get("texts").and_then(Value::as_array) else {
        return Err("texts array is required".to_string());
    };

    if items.len() > service_config::MAX_BATCH_SIZE {
        return Err(format!(
            "Maximum {} texts per batch",
            service_config::MAX_BATCH_SIZE
        ));
    }

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| "texts entries must be strings".to_string())
        })
        .collect()
}

/// 健康检查处理器
async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": service_config::SERVICE_NAME,
    }))
}

/// 单条翻译处理器
async fn translate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<TranslateResponse>, HandlerError> {
    let text = parse_translate_text(&body).map_err(bad_request)?;
    let source_lang = body
        .get("source_lang")
        .and_then(Value::as_str)
        .unwrap_or(remote_config::SOURCE_LANG);
    let target_lang = body
        .get("target_lang")
        .and_then(Value::as_str)
        .unwrap_or(remote_config::TARGET_LANG);

    let start = Instant::now();
    let translated = state.translator.translate(text).await.map_err(|e| {
        error!("❌ 翻译失败: {}", e);
        internal_error(format!("Translation failed: {}", e))
    })?;

    Ok(Json(TranslateResponse {
        original: text.to_string(),
        translated,
        source_lang: source_lang.to_string(),
        target_lang: target_lang.to_string(),
        processing_time: round_processing_time(start.elapsed()),
    }))
}

/// 批量翻译处理器
async fn translate_batch(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<BatchResponse>, HandlerError> {
    let texts = parse_batch_texts(&body).map_err(|msg| bad_request(&msg))?;

    let start = Instant::now();
    let results = state.translator.translate_batch(&texts).await;

    Ok(Json(BatchResponse {
        results,
        count: texts.len(),
        processing_time: round_processing_time(start.elapsed()),
    }))
}

/// 词表整表查询处理器
async fn get_mapping(State(state): State<Arc<AppState>>) -> Json<Value> {
    let snapshot = state.translator.mapping_snapshot().await;
    Json(json!(snapshot))
}

/// 词表新增/更新处理器
async fn add_mapping(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, HandlerError> {
    let english = body
        .get("english")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_request("english field is required"))?;
    let urdu = body
        .get("urdu")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_request("urdu field is required"))?;

    state
        .translator
        .add_mapping(english, urdu)
        .await
        .map_err(|e| internal_error(format!("Failed to save mapping: {}", e)))?;

    Ok(Json(json!({
        "message": "mapping added",
        "english": english.to_lowercase(),
        "urdu": urdu,
    })))
}

/// 词表删除处理器
async fn delete_mapping(
    State(state): State<Arc<AppState>>,
    Path(word): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    let removed = state
        .translator
        .remove_mapping(&word)
        .await
        .map_err(|e| internal_error(format!("Failed to save mapping: {}", e)))?;

    if removed {
        Ok(Json(json!({
            "message": "mapping deleted",
            "word": word.to_lowercase(),
        })))
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Mapping not found" })),
        ))
    }
}

/// 服务状态处理器
async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        service: "translation-service",
        status: "running",
        automation_enabled: true,
        headless_mode: state.headless,
        max_batch_size: service_config::MAX_BATCH_SIZE,
        started_at: state.started_at.to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MappingStore;
    use crate::translator::stub::{StubBehavior, StubFallback};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_router(behavior: StubBehavior) -> Router {
        let mut mapping = MappingStore::in_memory();
        mapping.upsert("mohalla", "محلہ").unwrap();
        let translator = AutoTranslator::with_stub(mapping, StubFallback::new(behavior));
        build_router(Arc::new(AppState::new(translator, true)))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(uri: &str, method: &str, payload: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap()
    }

    #[test]
    fn test_translate_text_validation() {
        assert_eq!(
            parse_translate_text(&json!({"text": "hello"})),
            Ok("hello")
        );
        assert!(parse_translate_text(&json!({})).is_err());
        assert!(parse_translate_text(&json!({"text": 42})).is_err());
    }

    #[test]
    fn test_batch_validation() {
        assert_eq!(
            parse_batch_texts(&json!({"texts": ["a", "b"]})).unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(parse_batch_texts(&json!({})).is_err());
        assert!(parse_batch_texts(&json!({"texts": "not an array"})).is_err());
        assert!(parse_batch_texts(&json!({"texts": [1, 2]})).is_err());

        // 超出条目上限
        let oversized: Vec<&str> = vec!["x"; service_config::MAX_BATCH_SIZE + 1];
        assert!(parse_batch_texts(&json!({ "texts": oversized })).is_err());
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let router = test_router(StubBehavior::Translate);
        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "translation");
    }

    #[tokio::test]
    async fn test_translate_missing_text_returns_400() {
        let router = test_router(StubBehavior::Translate);
        let response = router
            .oneshot(json_request("/translate", "POST", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Text is required");
    }

    #[tokio::test]
    async fn test_translate_applies_mapping_and_fallback() {
        let router = test_router(StubBehavior::Translate);
        let response = router
            .oneshot(json_request(
                "/translate",
                "POST",
                json!({"text": "Mohalla Aminabad"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["original"], "Mohalla Aminabad");
        assert_eq!(body["translated"], "محلہ <Aminabad>");
        assert_eq!(body["source_lang"], "en");
        assert_eq!(body["target_lang"], "ur");
        assert!(body["processing_time"].is_number());
    }

    #[tokio::test]
    async fn test_batch_oversized_returns_400() {
        let router = test_router(StubBehavior::Translate);
        let oversized: Vec<String> = (0..11).map(|i| format!("item {}", i)).collect();
        let response = router
            .oneshot(json_request(
                "/translate/batch",
                "POST",
                json!({ "texts": oversized }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_batch_returns_count_and_results() {
        let router = test_router(StubBehavior::Echo);
        let response = router
            .oneshot(json_request(
                "/translate/batch",
                "POST",
                json!({"texts": ["one", "two"]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["count"], 2);
        assert_eq!(body["results"]["one"], "one");
        assert_eq!(body["results"]["two"], "two");
    }

    #[tokio::test]
    async fn test_mapping_crud_roundtrip() {
        let router = test_router(StubBehavior::Translate);

        // 新增
        let response = router
            .clone()
            .oneshot(json_request(
                "/mapping",
                "POST",
                json!({"english": "Bazaar", "urdu": "بازار"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // 查询整表（键为小写）
        let response = router
            .clone()
            .oneshot(Request::get("/mapping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["bazaar"], "بازار");

        // 删除
        let response = router
            .clone()
            .oneshot(
                Request::delete("/mapping/bazaar")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // 再次删除返回404
        let response = router
            .oneshot(
                Request::delete("/mapping/bazaar")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_mapping_missing_fields_return_400() {
        let router = test_router(StubBehavior::Translate);
        let response = router
            .clone()
            .oneshot(json_request("/mapping", "POST", json!({"english": "x"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = router
            .oneshot(json_request("/mapping", "POST", json!({"urdu": "ﺱ"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_status_reports_capabilities() {
        let router = test_router(StubBehavior::Translate);
        let response = router
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["service"], "translation-service");
        assert_eq!(body["status"], "running");
        assert_eq!(body["automation_enabled"], true);
        assert_eq!(body["headless_mode"], true);
        assert_eq!(body["max_batch_size"], 10);
    }
}
