//! Budgeted selection — greedy pick of ranked bullets under a count or length budget.
//!
//! Greedy-by-score is not an optimal packing under a length budget: an over-long bullet
//! is skipped (never truncated) and the walk continues down the ranking.

use serde::{Deserialize, Serialize};

use crate::scoring::scorer::ScoredBullet;

/// How much content the tailored document may carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "limit", rename_all = "snake_case")]
pub enum SelectionBudget {
    #[default]
    Unlimited,
    /// Maximum number of bullets.
    MaxCount(usize),
    /// Maximum total characters of bullet text.
    MaxLength(usize),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedBullet {
    pub position: usize,
    pub reason: String,
}

/// Selected bullets in rank order, plus the ones left out and why.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Selection {
    pub selected: Vec<ScoredBullet>,
    pub skipped: Vec<SkippedBullet>,
    pub total_length: usize,
}

impl Selection {
    pub fn contains_position(&self, position: usize) -> bool {
        self.selected.iter().any(|s| s.position == position)
    }
}

/// Walks `ranked` in order and keeps each bullet that still fits `budget`.
pub fn select_bullets(ranked: &[ScoredBullet], budget: SelectionBudget) -> Selection {
    let mut selection = Selection::default();

    for scored in ranked {
        let length = scored.bullet.length();

        let rejection = match budget {
            SelectionBudget::Unlimited => None,
            SelectionBudget::MaxCount(max) if selection.selected.len() >= max => {
                Some(format!("Count budget reached ({max} max)"))
            }
            SelectionBudget::MaxCount(_) => None,
            SelectionBudget::MaxLength(0) => Some("Length budget is 0".to_string()),
            SelectionBudget::MaxLength(max) if selection.total_length + length > max => {
                Some(format!(
                    "Would exceed length budget ({} + {length} > {max} chars)",
                    selection.total_length
                ))
            }
            SelectionBudget::MaxLength(_) => None,
        };

        match rejection {
            Some(reason) => selection.skipped.push(SkippedBullet {
                position: scored.position,
                reason,
            }),
            None => {
                selection.total_length += length;
                selection.selected.push(scored.clone());
            }
        }
    }

    selection
}
