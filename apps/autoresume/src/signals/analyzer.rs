//! JD Signal Analyzer — turns raw job-description text into per-cluster weights,
//! top signals, keywords, and domain phrases.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::AppError;
use crate::llm_client::prompts::fill_template;
use crate::llm_client::{call_json, TextGenerator};
use crate::scoring::JobSignalProfile;
use crate::signals::catalogue::{catalogue_definitions, catalogue_names, SignalCategory};
use crate::signals::prompts::{JD_SIGNALS_PROMPT_TEMPLATE, JD_SIGNALS_SYSTEM};

/// Upper bound of the 0–10 weighting scale the model is asked to use.
pub const MAX_SIGNAL_WEIGHT: f64 = 10.0;

/// Full structured output of JD analysis. Every field tolerates being absent or null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSignals {
    #[serde(default, deserialize_with = "null_as_default")]
    pub signal_weights: BTreeMap<SignalCategory, f64>,
    #[serde(
        rename = "top_5_signals",
        default,
        deserialize_with = "null_as_default"
    )]
    pub top_signals: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub top_keywords: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub domain_phrases: Vec<String>,
}

impl JobSignals {
    /// The scoring profile: weights clamped to the 0–10 scale, non-finite values dropped.
    pub fn profile(&self) -> JobSignalProfile {
        JobSignalProfile::from_pairs(
            self.signal_weights
                .iter()
                .filter(|(_, w)| w.is_finite())
                .map(|(c, w)| (c.clone(), w.clamp(0.0, MAX_SIGNAL_WEIGHT))),
        )
    }

    /// The `n` strongest signals. Uses the model's own list when it gave one,
    /// otherwise ranks `signal_weights` (ties broken by name).
    pub fn top_signals(&self, n: usize) -> Vec<String> {
        if !self.top_signals.is_empty() {
            return self.top_signals.iter().take(n).cloned().collect();
        }

        let mut ranked: Vec<(&SignalCategory, f64)> = self
            .signal_weights
            .iter()
            .filter(|(_, w)| w.is_finite() && **w > 0.0)
            .map(|(c, w)| (c, *w))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
            .into_iter()
            .take(n)
            .map(|(c, _)| c.to_string())
            .collect()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Builds the analysis prompt for a job description.
pub fn build_signals_prompt(jd_text: &str) -> String {
    fill_template(
        JD_SIGNALS_PROMPT_TEMPLATE,
        &[
            ("cluster_list", catalogue_names().as_str()),
            ("cluster_definitions", catalogue_definitions().as_str()),
            ("jd_text", jd_text),
        ],
    )
}

/// Analyzes a job description with the model and returns its `JobSignals`.
pub async fn analyze_job_description(
    jd_text: &str,
    llm: &dyn TextGenerator,
) -> Result<JobSignals, AppError> {
    if jd_text.trim().is_empty() {
        return Err(AppError::Validation(
            "Job description cannot be empty".to_string(),
        ));
    }

    let prompt = build_signals_prompt(jd_text);
    call_json::<JobSignals>(llm, &prompt, JD_SIGNALS_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("JD signal extraction failed: {e}")))
}
