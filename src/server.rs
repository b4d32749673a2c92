use anyhow::{Context, Result};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::handlers::IngredientPipeline;
use crate::models::ApiResponse;

pub struct AppState {
    pub pipeline: IngredientPipeline,
}

pub fn create_router(pipeline: IngredientPipeline, max_upload_bytes: usize) -> Router {
    let state = Arc::new(AppState { pipeline });

    Router::new()
        .route("/", get(root_handler))
        .route("/api/create/image", post(create_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

pub async fn serve(config: &Config, pipeline: IngredientPipeline) -> Result<()> {
    let app = create_router(pipeline, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server_addr))?;
    log::info!("🌐 AI service listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    log::info!("🛑 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("❌ Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("🛑 Shutting down...");
}

async fn root_handler() -> Json<ApiResponse> {
    Json(ApiResponse::Message {
        message: "AI Service is running".to_string(),
    })
}

/// Every outcome is a 200 with either `{"text": [...]}` or `{"error": "..."}`.
async fn create_image(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Json<ApiResponse> {
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            log::warn!("⚠️ Rejected upload: {}", rejection.body_text());
            return Json(ApiResponse::error(rejection.body_text()));
        }
    };

    let content = match read_upload(multipart).await {
        Ok(Some(content)) => content,
        Ok(None) => {
            log::warn!("⚠️ Upload request without a file");
            return Json(ApiResponse::error("No file uploaded"));
        }
        Err(e) => {
            log::error!("❌ Failed to read upload: {}", e);
            return Json(ApiResponse::error(e.body_text()));
        }
    };

    match state.pipeline.process(&content).await {
        Ok(text) => Json(ApiResponse::Text { text }),
        Err(e) => {
            log::error!("❌ Error processing image: {}", e);
            Json(ApiResponse::error(e.to_string()))
        }
    }
}

/// Bytes of the `file` field, or of the first field that carries a file name.
async fn read_upload(mut multipart: Multipart) -> Result<Option<Vec<u8>>, MultipartError> {
    let mut fallback = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            return Ok(Some(field.bytes().await?.to_vec()));
        }
        if fallback.is_none() && field.file_name().is_some() {
            fallback = Some(field.bytes().await?.to_vec());
        }
    }

    Ok(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::pipeline::tests::MockExtractor;
    use crate::services::normalizer::tests::rgba_png_bytes;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const BOUNDARY: &str = "X-INGREDIENT-BOUNDARY";

    fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/create/image")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_root_liveness() {
        let router = create_router(IngredientPipeline::new(MockExtractor::ok(&[])), 1024);
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let (status, body) = json_body(router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "AI Service is running"}));
    }

    #[tokio::test]
    async fn test_upload_valid_image() {
        let mock = MockExtractor::ok(&["Cà chua", "Cà rốt", "Hành lá"]);
        let router = create_router(IngredientPipeline::new(mock.clone()), 1024 * 1024);

        let body = multipart_body("file", "dish.png", &rgba_png_bytes());
        let (status, body) = json_body(router, upload_request(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"text": ["Cà chua", "Cà rốt", "Hành lá"]}));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_upload_non_image() {
        let mock = MockExtractor::ok(&["Muối"]);
        let router = create_router(IngredientPipeline::new(mock.clone()), 1024 * 1024);

        let body = multipart_body("file", "notes.txt", b"just some text");
        let (status, body) = json_body(router, upload_request(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"error": "Failed to process image"}));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_is_reported_in_band() {
        let mock = MockExtractor::failing("quota exceeded");
        let router = create_router(IngredientPipeline::new(mock), 1024 * 1024);

        let body = multipart_body("file", "dish.png", &rgba_png_bytes());
        let (status, body) = json_body(router, upload_request(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"error": "model API error (500): quota exceeded"}));
    }

    #[tokio::test]
    async fn test_upload_under_another_field_name() {
        let mock = MockExtractor::ok(&["Tỏi"]);
        let router = create_router(IngredientPipeline::new(mock), 1024 * 1024);

        let body = multipart_body("image", "dish.png", &rgba_png_bytes());
        let (_, body) = json_body(router, upload_request(body)).await;

        assert_eq!(body, json!({"text": ["Tỏi"]}));
    }

    #[tokio::test]
    async fn test_upload_without_file() {
        let router = create_router(IngredientPipeline::new(MockExtractor::ok(&[])), 1024);
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"note\"\r\n\r\n\
             hello\r\n--{BOUNDARY}--\r\n"
        );

        let (status, body) = json_body(router, upload_request(body.into_bytes())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"error": "No file uploaded"}));
    }

    #[tokio::test]
    async fn test_non_multipart_request() {
        let router = create_router(IngredientPipeline::new(MockExtractor::ok(&[])), 1024);
        let request = Request::builder()
            .method("POST")
            .uri("/api/create/image")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let (status, body) = json_body(router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let router = create_router(IngredientPipeline::new(MockExtractor::ok(&[])), 1024);
        let request = Request::builder()
            .uri("/")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
    }
}
