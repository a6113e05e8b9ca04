pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::tailoring::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Scoring works offline; everything else calls the model or pdflatex
        .route("/api/v1/score", post(handlers::handle_score))
        .route("/api/v1/signals", post(handlers::handle_signals))
        .route("/api/v1/tailor", post(handlers::handle_tailor))
        .route("/api/v1/render", post(handlers::handle_render))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::signals::CategoryWeights;
    use crate::tailoring::pipeline::tests::{
        ScriptedGenerator, RESUME, REWRITE_REPLY, SIGNALS_REPLY,
    };
    use crate::tailoring::TailoringPipeline;

    fn app(replies: &[&str]) -> (Router, Arc<ScriptedGenerator>) {
        let llm = Arc::new(ScriptedGenerator::new(replies));
        let weights = Arc::new(CategoryWeights::default());
        let state = AppState {
            pipeline: TailoringPipeline::new(llm.clone(), weights.clone()),
            weights,
            config: Config {
                pdflatex_bin: "autoresume-test-missing-pdflatex".to_string(),
                ..Config::default()
            },
        };
        (build_router(state), llm)
    }

    async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (router, _) = app(&[]);
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["service"], "autoresume");
    }

    #[tokio::test]
    async fn test_score_ranks_without_model() {
        let (router, llm) = app(&[]);
        let (status, body) = post_json(
            router,
            "/api/v1/score",
            json!({
                "weights": {"backend": 2.0, "leadership": 1.0},
                "profile": {"backend": 5.0, "leadership": 8.0},
                "bullets": [
                    {"text": "A", "tags": ["backend"]},
                    {"text": "B", "tags": ["leadership"]},
                    {"text": "C", "tags": ["backend", "leadership"]}
                ],
                "budget": {"kind": "max_count", "limit": 2}
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let ranked: Vec<&str> = body["ranked"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["bullet"]["text"].as_str().unwrap())
            .collect();
        assert_eq!(ranked, ["C", "A", "B"]);
        assert_eq!(body["selection"]["selected"].as_array().unwrap().len(), 2);
        assert!(llm.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_score_unknown_tag_is_unprocessable() {
        let (router, _) = app(&[]);
        let (status, body) = post_json(
            router,
            "/api/v1/score",
            json!({
                "profile": {"backend": 5.0},
                "bullets": [{"text": "A", "tags": ["astrology"]}]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "INVALID_CONFIGURATION");
    }

    #[tokio::test]
    async fn test_signals_returns_profile() {
        let (router, _) = app(&[SIGNALS_REPLY]);
        let (status, body) =
            post_json(router, "/api/v1/signals", json!({"jd_text": "Go backend role"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["profile"]["backend"], 9.0);
        assert_eq!(body["signals"]["top_keywords"][0], "Go");
    }

    #[tokio::test]
    async fn test_signals_empty_jd_is_bad_request() {
        let (router, _) = app(&[]);
        let (status, body) = post_json(router, "/api/v1/signals", json!({"jd_text": "  "})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_tailor_returns_report() {
        let tags = r#"{"tagged_bullets": [
            {"bullet_text": "Built a Go REST API backed by PostgreSQL", "tags": ["backend"]}
        ]}"#;
        let (router, _) = app(&[SIGNALS_REPLY, tags, REWRITE_REPLY]);
        let (status, body) = post_json(
            router,
            "/api/v1/tailor",
            json!({"jd_text": "Go backend role", "resume_latex": RESUME}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ranked"][0]["score"], 9.0);
        assert_eq!(body["untagged_fallback"], false);
        assert!(body["tailored_latex"]
            .as_str()
            .unwrap()
            .starts_with("\\documentclass"));
    }

    #[tokio::test]
    async fn test_tailor_model_failure_is_bad_gateway() {
        // No scripted replies: the first model call fails.
        let (router, _) = app(&[]);
        let (status, body) = post_json(
            router,
            "/api/v1/tailor",
            json!({"jd_text": "Go backend role", "resume_latex": RESUME}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "LLM_ERROR");
    }

    #[tokio::test]
    async fn test_render_missing_compiler_is_render_error() {
        let (router, _) = app(&[]);
        let (status, body) = post_json(
            router,
            "/api/v1/render",
            json!({"latex": RESUME, "company": "Acme"}),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "RENDER_ERROR");
    }
}
