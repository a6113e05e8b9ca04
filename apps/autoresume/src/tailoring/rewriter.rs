//! Resume Rewriter — asks the model to rewrite the LaTeX document around the ranked
//! bullets and JD signals, then cleans the reply down to a compilable document.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::errors::AppError;
use crate::llm_client::prompts::{fill_template, TRUTHFULNESS_INSTRUCTION};
use crate::llm_client::{ResponseFormat, TextGenerator};
use crate::scoring::{ScoredBullet, Selection};
use crate::signals::catalogue::SignalCategory;
use crate::signals::JobSignals;
use crate::tailoring::prompts::{REWRITE_PROMPT_TEMPLATE, REWRITE_SYSTEM};

/// How many top signals and keywords are spelled out in the prompt.
const TOP_SIGNAL_COUNT: usize = 5;
const TOP_KEYWORD_COUNT: usize = 10;

/// One bullet as the model sees it.
#[derive(Debug, Serialize)]
struct BulletContext<'a> {
    bullet_text: &'a str,
    tags: &'a [SignalCategory],
    alignment_score: f64,
    selected: bool,
}

/// Fills the rewrite template.
pub fn build_rewrite_prompt(
    signals: &JobSignals,
    ranked: &[ScoredBullet],
    selection: &Selection,
    resume_latex: &str,
) -> Result<String, AppError> {
    let context: Vec<BulletContext<'_>> = ranked
        .iter()
        .map(|s| BulletContext {
            bullet_text: &s.bullet.text,
            tags: &s.bullet.tags,
            alignment_score: s.score,
            selected: selection.contains_position(s.position),
        })
        .collect();

    let bullets_json = serde_json::to_string_pretty(&context)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize bullets: {e}")))?;

    let top_keywords: Vec<&str> = signals
        .top_keywords
        .iter()
        .take(TOP_KEYWORD_COUNT)
        .map(String::as_str)
        .collect();

    let prompt = fill_template(
        REWRITE_PROMPT_TEMPLATE,
        &[
            ("truthfulness_instruction", TRUTHFULNESS_INSTRUCTION),
            ("top_signals", signals.top_signals(TOP_SIGNAL_COUNT).join(", ").as_str()),
            ("top_keywords", top_keywords.join(", ").as_str()),
            ("domain_phrases", signals.domain_phrases.join(", ").as_str()),
            ("bullets_json", bullets_json.as_str()),
            ("resume_latex", resume_latex),
        ],
    );
    Ok(prompt)
}

/// Runs the rewrite and returns cleaned LaTeX.
pub async fn rewrite_resume(
    signals: &JobSignals,
    ranked: &[ScoredBullet],
    selection: &Selection,
    resume_latex: &str,
    llm: &dyn TextGenerator,
) -> Result<String, AppError> {
    let prompt = build_rewrite_prompt(signals, ranked, selection, resume_latex)?;

    let reply = llm
        .generate(&prompt, REWRITE_SYSTEM, ResponseFormat::Text)
        .await
        .map_err(|e| AppError::Llm(format!("Resume rewrite failed: {e}")))?;

    let latex = clean_latex_output(&reply);
    if latex.is_empty() {
        return Err(AppError::Llm(
            "Resume rewrite returned no LaTeX".to_string(),
        ));
    }
    Ok(latex)
}

/// Keeps the `\documentclass … \end{document}` span when present and strips
/// markdown fences.
pub fn clean_latex_output(text: &str) -> String {
    static DOCUMENT: OnceLock<Regex> = OnceLock::new();
    let document = DOCUMENT.get_or_init(|| {
        Regex::new(r"(?s)\\documentclass.*?\\end\{document\}").expect("valid regex")
    });

    let span = document.find(text).map(|m| m.as_str()).unwrap_or(text);
    span.replace("```latex", "")
        .replace("```", "")
        .trim()
        .to_string()
}
