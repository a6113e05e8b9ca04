// Job-description signals: the cluster catalogue, category weights, and LLM analysis.

pub mod analyzer;
pub mod catalogue;
pub mod prompts;

pub use analyzer::{analyze_job_description, JobSignals};
pub use catalogue::CategoryWeights;
