//! Offline scoring request — the JSON document accepted by `autoresume score` and
//! `POST /api/v1/score`.

use serde::{Deserialize, Serialize};

use crate::scoring::scorer::{score_bullets, JobSignalProfile, ResumeBullet, ScoredBullet, ScoringError};
use crate::scoring::selection::{select_bullets, Selection, SelectionBudget};
use crate::signals::catalogue::CategoryWeights;

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreRequest {
    /// Falls back to the configured weights when absent.
    #[serde(default)]
    pub weights: Option<CategoryWeights>,
    pub profile: JobSignalProfile,
    #[serde(default)]
    pub bullets: Vec<ResumeBullet>,
    #[serde(default)]
    pub budget: Option<SelectionBudget>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreResponse {
    pub ranked: Vec<ScoredBullet>,
    pub selection: Selection,
}

/// Scores and selects. `budget_override` wins over the request's own budget.
pub fn run_score_request(
    request: &ScoreRequest,
    default_weights: &CategoryWeights,
    budget_override: Option<SelectionBudget>,
) -> Result<ScoreResponse, ScoringError> {
    let weights = request.weights.as_ref().unwrap_or(default_weights);
    let ranked = score_bullets(&request.profile, weights, &request.bullets)?;
    let budget = budget_override.or(request.budget).unwrap_or_default();
    let selection = select_bullets(&ranked, budget);

    Ok(ScoreResponse { ranked, selection })
}
