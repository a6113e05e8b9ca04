//! Axum route handlers for the scoring, analysis, tailoring, and render API.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::render::render_pdf;
use crate::scoring::{run_score_request, JobSignalProfile, ScoreRequest, ScoreResponse};
use crate::signals::JobSignals;
use crate::state::AppState;
use crate::tailoring::{TailorReport, TailorRequest};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignalsRequest {
    pub jd_text: String,
}

#[derive(Debug, Serialize)]
pub struct SignalsResponse {
    pub signals: JobSignals,
    pub profile: JobSignalProfile,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub latex: String,
    pub company: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/score
///
/// Pure scoring: no model call. Uses the server's weights unless the body has its own.
pub async fn handle_score(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    let response = run_score_request(&request, &state.weights, None)?;
    Ok(Json(response))
}

/// POST /api/v1/signals
///
/// Analyzes a job description and returns its signals and scoring profile.
pub async fn handle_signals(
    State(state): State<AppState>,
    Json(request): Json<SignalsRequest>,
) -> Result<Json<SignalsResponse>, AppError> {
    let signals = state.pipeline.analyze(&request.jd_text).await?;
    let profile = signals.profile();
    Ok(Json(SignalsResponse { signals, profile }))
}

/// POST /api/v1/tailor
///
/// Full pipeline. Returns the rewritten LaTeX; compile it with /api/v1/render.
pub async fn handle_tailor(
    State(state): State<AppState>,
    Json(request): Json<TailorRequest>,
) -> Result<Json<TailorReport>, AppError> {
    if request.jd_text.trim().is_empty() {
        return Err(AppError::Validation("jd_text cannot be empty".to_string()));
    }
    let report = state.pipeline.run(request).await?;
    Ok(Json(report))
}

/// POST /api/v1/render
///
/// Compiles LaTeX with pdflatex and returns the PDF as an attachment.
pub async fn handle_render(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Result<Response, AppError> {
    if request.latex.trim().is_empty() {
        return Err(AppError::Validation("latex cannot be empty".to_string()));
    }

    let rendered = render_pdf(&request.latex, &request.company, &state.config.pdflatex_bin).await?;
    if !rendered.clean {
        warn!("Rendered {} with pdflatex warnings", rendered.job_name);
    }

    let disposition = format!("attachment; filename=\"{}.pdf\"", rendered.job_name);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        rendered.bytes,
    )
        .into_response())
}
