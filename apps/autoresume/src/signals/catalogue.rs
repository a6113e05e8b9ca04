//! Signal catalogue — the fixed set of thematic clusters used to characterize both
//! job descriptions and resume bullets, plus the per-run category weight mapping.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::scoring::ScoringError;

/// The twelve clusters the analyzer and tagger are asked to use, with the definitions
/// sent to the model.
pub const CATALOGUE: &[(&str, &str)] = &[
    ("backend", "server-side logic, APIs, databases, services"),
    ("frontend", "UI, UX, web or mobile interfaces"),
    ("fullstack", "end-to-end ownership across frontend and backend"),
    ("data_ml", "data pipelines, analytics, ML, statistics, modeling"),
    ("cloud_devops", "cloud platforms, CI/CD, containers, deployment"),
    ("testing_quality", "testing, QA, reliability, validation"),
    ("performance_scalability", "speed, latency, scaling, optimization"),
    ("security_reliability", "security, robustness, fault tolerance"),
    (
        "product_user_focus",
        "user needs, UX, customer impact, domain workflows",
    ),
    (
        "teamwork_communication",
        "collaboration, communication, culture, cross-functional work",
    ),
    (
        "learning_growth",
        "onboarding, mentorship, training, continuous improvement",
    ),
    (
        "domain_industry",
        "specific industry or domain (e.g., K-12, healthcare, finance, etc.)",
    ),
];

/// A named signal category. Names are normalized on construction so that
/// `"Data ML"`, `"data-ml"` and `"data_ml"` are the same category.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SignalCategory(String);

impl SignalCategory {
    pub fn new(name: &str) -> Self {
        let normalized = name
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c.is_whitespace() { '_' } else { c })
            .collect();
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SignalCategory {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for SignalCategory {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<SignalCategory> for String {
    fn from(value: SignalCategory) -> Self {
        value.0
    }
}

impl fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable per-run mapping from category to weight.
///
/// Loaded once (file or default) and passed by reference into the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryWeights(BTreeMap<SignalCategory, f64>);

impl Default for CategoryWeights {
    /// Every catalogue cluster at weight 1.0, so a bullet's score is the plain sum of the
    /// JD intensities of its tags.
    fn default() -> Self {
        Self(
            CATALOGUE
                .iter()
                .map(|(name, _)| (SignalCategory::new(name), 1.0))
                .collect(),
        )
    }
}

impl CategoryWeights {
    #[cfg(test)]
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<SignalCategory>,
    {
        Self(pairs.into_iter().map(|(k, w)| (k.into(), w)).collect())
    }

    /// Reads a JSON object of `{"category": weight}` and validates it.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read category weights from {}", path.display()))?;
        let weights: CategoryWeights = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid category weights JSON in {}", path.display()))?;
        if weights.is_empty() {
            bail!("Category weights in {} define no categories", path.display());
        }
        weights.validate()?;
        Ok(weights)
    }

    pub fn get(&self, category: &SignalCategory) -> Option<f64> {
        self.0.get(category).copied()
    }

    pub fn contains(&self, category: &SignalCategory) -> bool {
        self.0.contains_key(category)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Weights must be finite and strictly positive.
    pub fn validate(&self) -> Result<(), ScoringError> {
        for (category, weight) in &self.0 {
            if !weight.is_finite() || *weight <= 0.0 {
                return Err(ScoringError::InvalidConfiguration(format!(
                    "category '{category}' has weight {weight}; weights must be finite and > 0"
                )));
            }
        }
        Ok(())
    }
}

/// Comma-separated catalogue names, as embedded in prompts.
pub fn catalogue_names() -> String {
    CATALOGUE
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// One `- name: definition` line per cluster, as embedded in prompts.
pub fn catalogue_definitions() -> String {
    CATALOGUE
        .iter()
        .map(|(name, def)| format!("- {name}: {def}"))
        .collect::<Vec<_>>()
        .join("\n")
}
