//! Signal Scorer — weighted linear relevance of each bullet against a job's signal profile.
//!
//! score(bullet) = Σ weight(tag) × intensity(tag) over the bullet's distinct tags.
//!
//! Pure: no I/O, no logging, no hidden state. Ranking is a stable descending sort, so
//! equal scores keep their input order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::signals::catalogue::{CategoryWeights, SignalCategory};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// Setup bug (unknown category, bad weight or intensity). Not retryable.
    #[error("Invalid scoring configuration: {0}")]
    InvalidConfiguration(String),
}

/// Presence/intensity of each category in one job description. Absent categories
/// have intensity 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobSignalProfile(BTreeMap<SignalCategory, f64>);

impl JobSignalProfile {
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<SignalCategory>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn intensity(&self, category: &SignalCategory) -> f64 {
        self.0.get(category).copied().unwrap_or(0.0)
    }

    fn validate(&self) -> Result<(), ScoringError> {
        for (category, intensity) in &self.0 {
            if !intensity.is_finite() || *intensity < 0.0 {
                return Err(ScoringError::InvalidConfiguration(format!(
                    "profile intensity for '{category}' is {intensity}; must be finite and >= 0"
                )));
            }
        }
        Ok(())
    }
}

/// One resume bullet and the categories it was tagged with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeBullet {
    pub text: String,
    #[serde(default)]
    pub tags: Vec<SignalCategory>,
}

impl ResumeBullet {
    #[cfg(test)]
    pub fn new<I, K>(text: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<SignalCategory>,
    {
        Self {
            text: text.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Character count, the unit of a length budget.
    pub fn length(&self) -> usize {
        self.text.chars().count()
    }
}

/// A bullet paired with its computed score and its position in the input sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredBullet {
    pub bullet: ResumeBullet,
    pub score: f64,
    pub position: usize,
}

/// Scores every bullet and returns them ranked by descending score.
///
/// Errors with `InvalidConfiguration` if any bullet carries a tag absent from `weights`,
/// or if weights/intensities are out of range. An empty input yields an empty output.
pub fn score_bullets(
    profile: &JobSignalProfile,
    weights: &CategoryWeights,
    bullets: &[ResumeBullet],
) -> Result<Vec<ScoredBullet>, ScoringError> {
    weights.validate()?;
    profile.validate()?;

    let mut scored = bullets
        .iter()
        .enumerate()
        .map(|(position, bullet)| {
            let score = score_bullet(bullet, position, profile, weights)?;
            Ok(ScoredBullet {
                bullet: bullet.clone(),
                score,
                position,
            })
        })
        .collect::<Result<Vec<_>, ScoringError>>()?;

    // Vec::sort_by is stable
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));

    Ok(scored)
}

fn score_bullet(
    bullet: &ResumeBullet,
    position: usize,
    profile: &JobSignalProfile,
    weights: &CategoryWeights,
) -> Result<f64, ScoringError> {
    let mut seen = BTreeSet::new();
    let mut score = 0.0;

    for tag in &bullet.tags {
        let weight = weights.get(tag).ok_or_else(|| {
            ScoringError::InvalidConfiguration(format!(
                "bullet {position} references unknown category '{tag}'"
            ))
        })?;
        if seen.insert(tag) {
            score += weight * profile.intensity(tag);
        }
    }

    Ok(score)
}
