//! Tailoring Pipeline — orchestrates a full run.
//!
//! Flow: analyze JD → tag bullets → score + select → rewrite LaTeX.
//!
//! Compilation to PDF is a separate step (`render`) so callers can review the
//! rewritten source before committing to it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::bullets::{extract_resume_items, tag_bullets};
use crate::errors::AppError;
use crate::llm_client::TextGenerator;
use crate::scoring::{score_bullets, select_bullets, ResumeBullet, ScoredBullet, Selection, SelectionBudget};
use crate::signals::{analyze_job_description, CategoryWeights, JobSignals};
use crate::tailoring::rewriter::rewrite_resume;

/// Input to one tailoring run.
#[derive(Debug, Clone, Deserialize)]
pub struct TailorRequest {
    pub jd_text: String,
    pub resume_latex: String,
    #[serde(default)]
    pub budget: SelectionBudget,
}

/// Everything a run produced, in the order it was produced.
#[derive(Debug, Clone, Serialize)]
pub struct TailorReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub signals: JobSignals,
    pub ranked: Vec<ScoredBullet>,
    pub selection: Selection,
    /// True when tagging produced nothing and bullets were scored untagged.
    pub untagged_fallback: bool,
    pub tailored_latex: String,
}

/// Holds the model backend and the run's category weights.
#[derive(Clone)]
pub struct TailoringPipeline {
    llm: Arc<dyn TextGenerator>,
    weights: Arc<CategoryWeights>,
}

impl TailoringPipeline {
    pub fn new(llm: Arc<dyn TextGenerator>, weights: Arc<CategoryWeights>) -> Self {
        Self { llm, weights }
    }

    /// Analyzes a JD on its own (no resume needed).
    pub async fn analyze(&self, jd_text: &str) -> Result<JobSignals, AppError> {
        analyze_job_description(jd_text, self.llm.as_ref()).await
    }

    /// Runs the full pipeline.
    pub async fn run(&self, request: TailorRequest) -> Result<TailorReport, AppError> {
        let run_id = Uuid::new_v4();
        self.run_inner(run_id, request)
            .instrument(info_span!("tailor", %run_id))
            .await
    }

    async fn run_inner(&self, run_id: Uuid, request: TailorRequest) -> Result<TailorReport, AppError> {
        if request.resume_latex.trim().is_empty() {
            return Err(AppError::Validation(
                "Resume source cannot be empty".to_string(),
            ));
        }
        let llm = self.llm.as_ref();

        // Step 1: JD signals
        info!("[1/4] Extracting and weighting JD signals...");
        let signals = analyze_job_description(&request.jd_text, llm).await?;
        info!(
            "Top clusters: {}",
            signals.top_signals(5).join(", ")
        );
        if !signals.top_keywords.is_empty() {
            info!("Target keywords: {}", signals.top_keywords.join(", "));
        }
        if !signals.domain_phrases.is_empty() {
            info!("Domain phrases: {}", signals.domain_phrases.join(", "));
        }

        // Step 2: Tag bullets
        info!("[2/4] Semantically tagging resume bullets...");
        let mut bullets = tag_bullets(&request.resume_latex, llm, &self.weights).await?;
        let untagged_fallback = bullets.is_empty();
        if untagged_fallback {
            warn!("No tagged bullets returned. Tailoring will be more generic.");
            bullets = extract_resume_items(&request.resume_latex)
                .into_iter()
                .map(|text| ResumeBullet { text, tags: Vec::new() })
                .collect();
        }
        info!("Tagged {} bullets", bullets.len());

        // Step 3: Score + select
        info!("[3/4] Computing alignment scores...");
        let profile = signals.profile();
        let ranked = score_bullets(&profile, &self.weights, &bullets)?;
        let selection = select_bullets(&ranked, request.budget);
        info!(
            "Selected {} of {} bullets ({} chars)",
            selection.selected.len(),
            ranked.len(),
            selection.total_length
        );

        // Step 4: Rewrite
        info!("[4/4] Rewriting LaTeX around the ranked bullets...");
        let tailored_latex =
            rewrite_resume(&signals, &ranked, &selection, &request.resume_latex, llm).await?;

        Ok(TailorReport {
            run_id,
            generated_at: Utc::now(),
            signals,
            ranked,
            selection,
            untagged_fallback,
            tailored_latex,
        })
    }
}
