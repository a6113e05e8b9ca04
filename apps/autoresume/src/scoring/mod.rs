// Signal scoring and budgeted selection.
// Pure computation: no LLM calls, no I/O. Callers own configuration and logging.

pub mod request;
pub mod scorer;
pub mod selection;

pub use request::{run_score_request, ScoreRequest, ScoreResponse};
pub use scorer::{score_bullets, JobSignalProfile, ResumeBullet, ScoredBullet, ScoringError};
pub use selection::{select_bullets, Selection, SelectionBudget};
